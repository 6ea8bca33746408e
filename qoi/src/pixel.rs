use crate::{consts::QOI_CACHE_SIZE, Channels};

/// A single RGBA pixel.
///
/// RGB images are handled as RGBA pixels with an implicit alpha of 255.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pixel {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Pixel {
    /// The "previous pixel" before the first pixel of every image.
    pub const OPAQUE_BLACK: Pixel = Pixel::new(0, 0, 0, 255);

    /// Initial value of every color cache slot.
    pub const TRANSPARENT: Pixel = Pixel::new(0, 0, 0, 0);

    #[inline]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    #[inline]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    /// Index of this pixel in the color cache: `(r * 3 + g * 5 + b * 7 + a * 11) % 64`.
    #[inline]
    pub const fn hash(self) -> u8 {
        let sum = self.r as u32 * 3 + self.g as u32 * 5 + self.b as u32 * 7 + self.a as u32 * 11;
        (sum % QOI_CACHE_SIZE as u32) as u8
    }

    /// Reads a pixel from interleaved channel bytes. `bytes` must hold at least as many bytes as
    /// `channels` says; RGB pixels get an alpha of 255.
    #[inline]
    pub fn from_channels(bytes: &[u8], channels: Channels) -> Self {
        match channels {
            Channels::Rgb => Self::rgb(bytes[0], bytes[1], bytes[2]),
            Channels::Rgba => Self::new(bytes[0], bytes[1], bytes[2], bytes[3]),
        }
    }

    /// Writes the first `channels` components of this pixel into `out`.
    #[inline]
    pub fn write_channels(self, out: &mut [u8], channels: Channels) {
        let bytes = self.to_array();
        let len = channels.count();
        out[..len].copy_from_slice(&bytes[..len]);
    }

    #[inline]
    pub const fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl From<[u8; 4]> for Pixel {
    #[inline]
    fn from([r, g, b, a]: [u8; 4]) -> Self {
        Self::new(r, g, b, a)
    }
}

/// The color cache ("index") shared in lock-step by the encoder and the decoder.
///
/// Slot `h` holds the most recently seen pixel whose [`Pixel::hash`] is `h`, or
/// [`Pixel::TRANSPARENT`] if no such pixel has been seen yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelCache {
    slots: [Pixel; QOI_CACHE_SIZE],
}

impl PixelCache {
    pub const fn new() -> Self {
        Self {
            slots: [Pixel::TRANSPARENT; QOI_CACHE_SIZE],
        }
    }

    /// Returns the pixel in slot `index`. Only the lowest 6 bits of `index` are used.
    #[inline]
    pub fn get(&self, index: u8) -> Pixel {
        self.slots[usize::from(index) % QOI_CACHE_SIZE]
    }

    /// Stores `pixel` in its hash slot, replacing whatever was there. Returns the slot index.
    #[inline]
    pub fn insert(&mut self, pixel: Pixel) -> u8 {
        let index = pixel.hash();
        self.slots[usize::from(index)] = pixel;
        index
    }

    /// Returns the slot index of `pixel` if the cache currently holds it.
    #[inline]
    pub fn find(&self, pixel: Pixel) -> Option<u8> {
        let index = pixel.hash();
        (self.slots[usize::from(index)] == pixel).then_some(index)
    }

    pub fn slots(&self) -> &[Pixel; QOI_CACHE_SIZE] {
        &self.slots
    }
}

impl Default for PixelCache {
    fn default() -> Self {
        Self::new()
    }
}
