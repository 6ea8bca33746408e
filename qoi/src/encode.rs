use crate::{
    chunk::Chunk,
    consts::{QOI_END_MARKER, QOI_HEADER_SIZE, QOI_MAX_RUN},
    Channels, Header, HeaderError, Pixel, PixelCache,
};
use itertools::Itertools;
use snafu::{ensure, ResultExt, Snafu};

#[cfg(feature = "alloc")]
use alloc::vec::Vec;

#[cfg(feature = "std")]
mod std_api;
#[cfg(feature = "std")]
pub use std_api::*;

#[derive(Debug, Snafu)]
pub enum EncodeError {
    #[snafu(display("Invalid image header: {source}"))]
    InvalidHeader { source: HeaderError },
    #[snafu(display(
        "Specified image dimensions don't match the pixel buffer: {width} * {height} * {channels} == {expected} bytes, but {len} bytes were given"
    ))]
    InvalidDimensions {
        width: u32,
        height: u32,
        channels: usize,
        expected: usize,
        len: usize,
    },
    #[cfg(feature = "std")]
    WriteIo { source: std::io::Error },
}

/// Worst-case size of an encoded image: every pixel as a raw chunk, plus header and end marker.
pub fn max_encoded_len(header: &Header) -> usize {
    QOI_HEADER_SIZE + header.pixel_count() * (header.channels.count() + 1) + QOI_END_MARKER.len()
}

/// Validates `header` and checks that `pixels` has exactly the size it describes. Runs before
/// any output is produced.
pub(crate) fn check_input(header: &Header, pixels: &[u8]) -> Result<(), EncodeError> {
    header.validate().context(InvalidHeaderSnafu)?;

    let expected = header.output_len(header.channels);
    ensure!(
        pixels.len() == expected,
        InvalidDimensionsSnafu {
            width: header.width,
            height: header.height,
            channels: header.channels.count(),
            expected,
            len: pixels.len(),
        }
    );

    Ok(())
}

/// Encoder state: the previous pixel and the color cache.
#[derive(Debug, Clone)]
pub struct QoiEncodeContext {
    pub prev: Pixel,
    pub cache: PixelCache,
}

impl QoiEncodeContext {
    pub const fn new() -> Self {
        Self {
            prev: Pixel::OPAQUE_BLACK,
            cache: PixelCache::new(),
        }
    }
}

impl Default for QoiEncodeContext {
    fn default() -> Self {
        Self::new()
    }
}

impl QoiEncodeContext {
    /// Runs the chunk state machine over `pixels` (interleaved, `channels` bytes per pixel),
    /// handing every produced chunk to `emit`. Trailing bytes that don't form a full pixel are
    /// ignored.
    ///
    /// Runs are flushed at [`QOI_MAX_RUN`] pixels and at the end of `pixels`, so a call always
    /// leaves no run open.
    pub fn encode_chunks<E>(
        &mut self,
        pixels: &[u8],
        channels: Channels,
        mut emit: impl FnMut(Chunk) -> Result<(), E>,
    ) -> Result<(), E> {
        let groups = pixels
            .chunks_exact(channels.count())
            .map(|p| Pixel::from_channels(p, channels))
            .dedup_with_count();

        // mirrors the decoder, which caches the starting pixel before reading any chunk
        self.cache.insert(self.prev);

        for (count, pixel) in groups {
            let mut repeats = count;

            if pixel != self.prev {
                let chunk = match self.cache.find(pixel) {
                    Some(index) => Chunk::Index(index),
                    None => Chunk::delta(self.prev, pixel),
                };
                emit(chunk)?;

                self.prev = pixel;
                repeats -= 1;
            }

            // the decoder refreshes the slot for every pixel, runs included
            self.cache.insert(pixel);

            while repeats > 0 {
                let run = repeats.min(usize::from(QOI_MAX_RUN));
                emit(Chunk::Run(run as u8))?;
                repeats -= run;
            }
        }

        Ok(())
    }

    #[cfg(feature = "alloc")]
    pub fn encode_to_vec(
        header: &Header,
        pixels: &[u8],
        w: &mut Vec<u8>,
    ) -> Result<(), EncodeError> {
        let mut state = QoiEncodeContext::new();
        state.encode_to_vec_with_state(header, pixels, w)
    }

    /// Appends the encoded image to `w`.
    #[cfg(feature = "alloc")]
    pub fn encode_to_vec_with_state(
        &mut self,
        header: &Header,
        pixels: &[u8],
        w: &mut Vec<u8>,
    ) -> Result<(), EncodeError> {
        check_input(header, pixels)?;

        tracing::debug!(
            width = header.width,
            height = header.height,
            channels = header.channels.count(),
            "encoding image"
        );

        let start = w.len();
        w.reserve(max_encoded_len(header));
        w.extend_from_slice(&header.to_bytes());

        let mut buf = [0; crate::chunk::MAX_CHUNK_LEN];
        self.encode_chunks(pixels, header.channels, |chunk| {
            w.extend_from_slice(chunk.write(&mut buf));
            Ok::<_, core::convert::Infallible>(())
        })
        .unwrap_or_else(|never| match never {});

        w.extend_from_slice(&QOI_END_MARKER);

        tracing::debug!(bytes = w.len() - start, "encoded image");

        Ok(())
    }
}
