use crate::consts::{QOI_HEADER_SIZE, QOI_MAGIC, QOI_PIXELS_MAX};
use byteorder::{BigEndian, ByteOrder};
use snafu::{ensure, Snafu};

/// Number of interleaved channels per pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Channels {
    Rgb = 3,
    Rgba = 4,
}

impl Channels {
    #[inline]
    pub const fn count(self) -> usize {
        self as usize
    }
}

impl TryFrom<u8> for Channels {
    type Error = HeaderError;

    fn try_from(channels: u8) -> Result<Self, Self::Error> {
        match channels {
            3 => Ok(Channels::Rgb),
            4 => Ok(Channels::Rgba),
            _ => header_error::InvalidChannelCountSnafu { channels }.fail(),
        }
    }
}

/// Purely informative: it is stored in the header but does not affect how chunks are encoded or
/// decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum Colorspace {
    /// Gamma-encoded RGB channels with a linear alpha channel.
    #[default]
    Srgb = 0,
    /// All channels linear.
    Linear = 1,
}

impl TryFrom<u8> for Colorspace {
    type Error = HeaderError;

    fn try_from(colorspace: u8) -> Result<Self, Self::Error> {
        match colorspace {
            0 => Ok(Colorspace::Srgb),
            1 => Ok(Colorspace::Linear),
            _ => header_error::InvalidColorspaceSnafu { colorspace }.fail(),
        }
    }
}

#[derive(Debug, Snafu, PartialEq, Eq)]
#[snafu(module)]
pub enum HeaderError {
    #[snafu(display("Header is truncated: need {QOI_HEADER_SIZE} bytes, got {len}"))]
    UnexpectedEof { len: usize },
    #[snafu(display("Invalid magic {found:?}, expected \"qoif\""))]
    InvalidMagic { found: [u8; 4] },
    #[snafu(display("Invalid channel count {channels}, expected 3 or 4"))]
    InvalidChannelCount { channels: u8 },
    #[snafu(display("Invalid colorspace {colorspace}, expected 0 or 1"))]
    InvalidColorspace { colorspace: u8 },
    #[snafu(display("Image dimensions must be non-zero, got {width}x{height}"))]
    ZeroDimensions { width: u32, height: u32 },
    #[snafu(display(
        "Image of {width}x{height} exceeds the limit of {QOI_PIXELS_MAX} pixels"
    ))]
    SizeLimit { width: u32, height: u32 },
}

impl HeaderError {
    /// Whether the bytes are not a QOI header at all, as opposed to describing an image this
    /// codec refuses to handle.
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            HeaderError::UnexpectedEof { .. } | HeaderError::InvalidMagic { .. }
        )
    }
}

/// Image descriptor, stored in the first 14 bytes of every stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Header {
    pub width: u32,
    pub height: u32,
    pub channels: Channels,
    pub colorspace: Colorspace,
}

impl Header {
    /// Creates a header, checking that the dimensions are non-zero and within
    /// [`QOI_PIXELS_MAX`].
    pub fn new(
        width: u32,
        height: u32,
        channels: Channels,
        colorspace: Colorspace,
    ) -> Result<Self, HeaderError> {
        let header = Self {
            width,
            height,
            channels,
            colorspace,
        };
        header.validate()?;
        Ok(header)
    }

    /// Builds a header from raw channel and colorspace bytes, as handed over by callers that
    /// don't use the typed enums.
    pub fn from_raw(
        width: u32,
        height: u32,
        channels: u8,
        colorspace: u8,
    ) -> Result<Self, HeaderError> {
        Self::new(
            width,
            height,
            Channels::try_from(channels)?,
            Colorspace::try_from(colorspace)?,
        )
    }

    pub fn validate(&self) -> Result<(), HeaderError> {
        let (width, height) = (self.width, self.height);
        ensure!(
            width != 0 && height != 0,
            header_error::ZeroDimensionsSnafu { width, height }
        );
        ensure!(
            self.pixel_count_u64() <= QOI_PIXELS_MAX,
            header_error::SizeLimitSnafu { width, height }
        );
        Ok(())
    }

    #[inline]
    fn pixel_count_u64(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// Number of pixels in the image. Only meaningful for validated headers, which guarantee it
    /// fits into `usize` on 32-bit and larger targets.
    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.pixel_count_u64() as usize
    }

    /// Size in bytes of the raw pixel buffer holding this image with `channels` channels.
    #[inline]
    pub fn output_len(&self, channels: Channels) -> usize {
        self.pixel_count() * channels.count()
    }

    pub fn to_bytes(&self) -> [u8; QOI_HEADER_SIZE] {
        let mut bytes = [0; QOI_HEADER_SIZE];
        BigEndian::write_u32(&mut bytes[0..4], QOI_MAGIC);
        BigEndian::write_u32(&mut bytes[4..8], self.width);
        BigEndian::write_u32(&mut bytes[8..12], self.height);
        bytes[12] = self.channels as u8;
        bytes[13] = self.colorspace as u8;
        bytes
    }

    /// Parses and validates the header at the start of `data`.
    pub fn from_bytes(data: &[u8]) -> Result<Self, HeaderError> {
        ensure!(
            data.len() >= QOI_HEADER_SIZE,
            header_error::UnexpectedEofSnafu { len: data.len() }
        );

        let magic = BigEndian::read_u32(&data[0..4]);
        ensure!(
            magic == QOI_MAGIC,
            header_error::InvalidMagicSnafu {
                found: magic.to_be_bytes()
            }
        );

        Self::from_raw(
            BigEndian::read_u32(&data[4..8]),
            BigEndian::read_u32(&data[8..12]),
            data[12],
            data[13],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_layout() {
        let header = Header::new(0x0102_0304, 5, Channels::Rgba, Colorspace::Linear).unwrap();
        assert_eq!(
            header.to_bytes(),
            [b'q', b'o', b'i', b'f', 1, 2, 3, 4, 0, 0, 0, 5, 4, 1]
        );
        assert_eq!(Header::from_bytes(&header.to_bytes()), Ok(header));
    }

    #[test]
    fn rejects_wrong_magic() {
        let mut bytes = Header::new(1, 1, Channels::Rgb, Colorspace::Srgb)
            .unwrap()
            .to_bytes();
        bytes[3] = b'x';

        let err = Header::from_bytes(&bytes).unwrap_err();
        assert_eq!(err, HeaderError::InvalidMagic { found: *b"qoix" });
        assert!(err.is_format_error());
    }

    #[test]
    fn rejects_short_header() {
        let err = Header::from_bytes(b"qoif\0\0").unwrap_err();
        assert_eq!(err, HeaderError::UnexpectedEof { len: 6 });
        assert!(err.is_format_error());
    }

    #[test]
    fn rejects_invalid_fields() {
        assert_eq!(
            Header::from_raw(1, 1, 2, 0),
            Err(HeaderError::InvalidChannelCount { channels: 2 })
        );
        assert_eq!(
            Header::from_raw(1, 1, 3, 2),
            Err(HeaderError::InvalidColorspace { colorspace: 2 })
        );
        assert_eq!(
            Header::from_raw(0, 7, 3, 0),
            Err(HeaderError::ZeroDimensions {
                width: 0,
                height: 7
            })
        );
    }

    #[test]
    fn size_limit() {
        let err = Header::new(25_000, 25_000, Channels::Rgba, Colorspace::Srgb).unwrap_err();
        assert_eq!(
            err,
            HeaderError::SizeLimit {
                width: 25_000,
                height: 25_000
            }
        );
        assert!(!err.is_format_error());

        assert!(Header::new(20_000, 20_000, Channels::Rgba, Colorspace::Srgb).is_ok());
        assert!(Header::new(20_000, 20_001, Channels::Rgba, Colorspace::Srgb).is_err());
    }
}
