use crate::{
    chunk::Chunk,
    consts::QOI_HEADER_SIZE,
    Channels, Header, HeaderError, Pixel, PixelCache,
};
use snafu::{ensure, ResultExt, Snafu};

pub mod reader;

#[cfg(feature = "alloc")]
mod alloc_api;
#[cfg(feature = "alloc")]
pub use alloc_api::*;

pub use reader::ChunkReader;

/// What to do when the chunk stream runs out before every pixel has been decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TruncationPolicy {
    /// Fill the remaining pixels with the last decoded pixel and report how many pixels actually
    /// came from the stream. A partial image is usually more useful than none, but callers should
    /// treat a short count as a corrupt file.
    #[default]
    Lenient,
    /// Fail with [`DecodeError::Truncated`].
    Strict,
}

#[derive(Debug, Snafu)]
#[snafu(module)]
pub enum DecodeError {
    #[snafu(display("Invalid image header: {source}"))]
    InvalidHeader { source: HeaderError },
    #[snafu(display("Output buffer holds {max_len} pixels, but the image has {required}"))]
    OutputTooSmall { max_len: usize, required: usize },
    #[snafu(display("Chunk stream ended after {decoded} of {expected} pixels"))]
    Truncated { decoded: usize, expected: usize },
}

impl DecodeError {
    /// The input is not a QOI stream at all (bad magic or fewer than 14 bytes).
    pub fn is_format_error(&self) -> bool {
        matches!(self, DecodeError::InvalidHeader { source } if source.is_format_error())
    }
}

/// Decoder state: the current pixel, the color cache and the truncation policy.
#[derive(Debug, Clone)]
pub struct QoiDecodeContext {
    pub prev: Pixel,
    pub cache: PixelCache,
    pub policy: TruncationPolicy,
}

impl QoiDecodeContext {
    pub const fn new() -> Self {
        Self::with_policy(TruncationPolicy::Lenient)
    }

    pub const fn with_policy(policy: TruncationPolicy) -> Self {
        Self {
            prev: Pixel::OPAQUE_BLACK,
            cache: PixelCache::new(),
            policy,
        }
    }
}

impl Default for QoiDecodeContext {
    fn default() -> Self {
        Self::new()
    }
}

impl QoiDecodeContext {
    pub fn decode(
        data: &[u8],
        output: impl DecodeOutput,
    ) -> Result<(usize, Header), DecodeError> {
        let mut state = QoiDecodeContext::new();
        state.decode_with_state(data, output)
    }

    /// Decodes a complete stream (header, chunks, end marker) into `output`.
    ///
    /// Returns the number of pixels that were decoded from the chunk stream, and the header. With
    /// [`TruncationPolicy::Lenient`] the count may be lower than the header's pixel count, in
    /// which case the rest of the output repeats the last decoded pixel.
    pub fn decode_with_state(
        &mut self,
        data: &[u8],
        mut output: impl DecodeOutput,
    ) -> Result<(usize, Header), DecodeError> {
        let header = Header::from_bytes(data).context(decode_error::InvalidHeaderSnafu)?;
        let required = header.pixel_count();

        if let Some(max_len) = output.max_len() {
            ensure!(
                max_len >= required,
                decode_error::OutputTooSmallSnafu { max_len, required }
            );
        }

        tracing::debug!(
            width = header.width,
            height = header.height,
            channels = header.channels.count(),
            colorspace = header.colorspace as u8,
            "decoding image"
        );

        let decoded = self.decode_pixels(&data[QOI_HEADER_SIZE..], required, &mut output);

        if decoded < required {
            match self.policy {
                TruncationPolicy::Strict => {
                    return decode_error::TruncatedSnafu {
                        decoded,
                        expected: required,
                    }
                    .fail();
                }
                TruncationPolicy::Lenient => {
                    tracing::warn!(
                        decoded,
                        expected = required,
                        "chunk stream ended early, repeating last pixel"
                    );
                }
            }
        }

        Ok((decoded, header))
    }

    /// Decodes `pixel_count` pixels from `chunks` (the stream after the header, including the
    /// end marker) into `output`. Always writes exactly `pixel_count` pixels and returns how many
    /// of them came from the stream.
    pub fn decode_pixels(
        &mut self,
        chunks: &[u8],
        pixel_count: usize,
        output: &mut impl DecodeOutput,
    ) -> usize {
        let mut reader = ChunkReader::new(chunks);
        let mut run = 0usize;
        let mut decoded = 0;
        let mut exhausted = false;

        // the starting pixel is cached before the first tag, so INDEX chunks may refer to it
        self.cache.insert(self.prev);

        for _ in 0..pixel_count {
            if run > 0 {
                run -= 1;
                decoded += 1;
            } else if !exhausted {
                match reader.next_chunk() {
                    Some(chunk) => {
                        if let Chunk::Run(len) = chunk {
                            run = usize::from(len) - 1;
                        }
                        self.prev = chunk.apply(self.prev, &self.cache);
                        decoded += 1;
                    }
                    None => exhausted = true,
                }
            }

            self.cache.insert(self.prev);
            output.write_pixel(self.prev);
        }

        decoded
    }
}

pub trait DecodeOutput {
    fn write_pixel(&mut self, pixel: Pixel);

    /// Returns the maximum number of pixels that can be written to the output buffer.
    ///
    /// `None` if the output buffer is unbounded.
    fn max_len(&self) -> Option<usize>;
    fn current_output_position(&self) -> usize;
}

/// Writes pixels into a byte slice with `channels` bytes per pixel. The channel count does not
/// have to match the stream's: RGB streams decode to opaque RGBA, and RGBA streams lose their
/// alpha when decoded to RGB.
pub struct SliceDecodeOutput<'a> {
    output: &'a mut [u8],
    channels: Channels,
    output_idx: usize,
}

impl<'a> SliceDecodeOutput<'a> {
    #[inline]
    pub fn new(slice: &'a mut [u8], channels: Channels) -> Self {
        Self {
            output: slice,
            channels,
            output_idx: 0,
        }
    }
}

impl DecodeOutput for SliceDecodeOutput<'_> {
    #[inline]
    fn write_pixel(&mut self, pixel: Pixel) {
        let start = self.output_idx * self.channels.count();
        pixel.write_channels(&mut self.output[start..], self.channels);
        self.output_idx += 1;
    }

    #[inline]
    fn max_len(&self) -> Option<usize> {
        Some(self.output.len() / self.channels.count())
    }

    #[inline]
    fn current_output_position(&self) -> usize {
        self.output_idx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        consts::{QOI_END_MARKER, QOI_OP_INDEX, QOI_OP_RGB, QOI_OP_RGBA, QOI_OP_RUN},
        Colorspace,
    };

    fn stream(header: Header, chunks: &[u8]) -> Vec<u8> {
        let mut data = header.to_bytes().to_vec();
        data.extend_from_slice(chunks);
        data.extend_from_slice(&QOI_END_MARKER);
        data
    }

    fn rgba(width: u32) -> Header {
        Header::new(width, 1, Channels::Rgba, Colorspace::Srgb).unwrap()
    }

    #[test]
    fn decodes_all_chunk_kinds() {
        #[rustfmt::skip]
        let data = stream(
            rgba(7),
            &[
                QOI_OP_RGBA, 10, 20, 30, 128,
                0b01_11_10_01, // diff +1, 0, -1
                0b10_100010, 0x8F, // luma dg +2, dr-dg 0, db-dg +7
                QOI_OP_RGB, 1, 2, 3,
                QOI_OP_INDEX | Pixel::new(10, 20, 30, 128).hash(),
                QOI_OP_RUN | 1,
            ],
        );

        let mut out = [0u8; 28];
        let (decoded, header) =
            QoiDecodeContext::decode(&data, SliceDecodeOutput::new(&mut out, Channels::Rgba))
                .unwrap();

        assert_eq!(decoded, 7);
        assert_eq!(header, rgba(7));
        assert_eq!(
            out,
            [
                10, 20, 30, 128, //
                11, 20, 29, 128, //
                13, 22, 38, 128, //
                1, 2, 3, 128, //
                10, 20, 30, 128, //
                10, 20, 30, 128, //
                10, 20, 30, 128, //
            ]
        );
    }

    #[test]
    fn rejects_wrong_magic() {
        let mut data = stream(rgba(1), &[QOI_OP_RUN]);
        data[3] = b'x';

        let mut out = [0xAA; 4];
        let err = QoiDecodeContext::decode(&data, SliceDecodeOutput::new(&mut out, Channels::Rgba))
            .unwrap_err();
        assert!(err.is_format_error());
        assert_eq!(out, [0xAA; 4]);
    }

    #[test]
    fn output_too_small() {
        let data = stream(rgba(4), &[QOI_OP_RUN | 3]);
        let mut out = [0u8; 12];
        let err = QoiDecodeContext::decode(&data, SliceDecodeOutput::new(&mut out, Channels::Rgba))
            .unwrap_err();
        assert!(matches!(
            err,
            DecodeError::OutputTooSmall {
                max_len: 3,
                required: 4
            }
        ));
    }

    #[test]
    fn truncated_stream_repeats_last_pixel() {
        let data = stream(rgba(4), &[QOI_OP_RGBA, 5, 6, 7, 8]);
        let mut out = [0u8; 16];
        let (decoded, _) =
            QoiDecodeContext::decode(&data, SliceDecodeOutput::new(&mut out, Channels::Rgba))
                .unwrap();

        assert_eq!(decoded, 1);
        assert_eq!(&out[..], &[5u8, 6, 7, 8].repeat(4)[..]);
    }

    #[test]
    fn strict_policy_rejects_truncation() {
        let data = stream(rgba(4), &[QOI_OP_RUN | 1]);
        let mut out = [0u8; 16];
        let err = QoiDecodeContext::with_policy(TruncationPolicy::Strict)
            .decode_with_state(&data, SliceDecodeOutput::new(&mut out, Channels::Rgba))
            .unwrap_err();
        assert!(matches!(
            err,
            DecodeError::Truncated {
                decoded: 2,
                expected: 4
            }
        ));
    }

    #[test]
    fn rgb_stream_to_rgba_output() {
        let header = Header::new(2, 1, Channels::Rgb, Colorspace::Srgb).unwrap();
        let data = stream(header, &[QOI_OP_RGB, 1, 2, 3, QOI_OP_RUN]);
        let mut out = [0u8; 8];
        QoiDecodeContext::decode(&data, SliceDecodeOutput::new(&mut out, Channels::Rgba)).unwrap();
        assert_eq!(out, [1, 2, 3, 255, 1, 2, 3, 255]);
    }

    #[test]
    fn slice_output_tracks_position() {
        let mut out = [0u8; 7];
        let mut output = SliceDecodeOutput::new(&mut out, Channels::Rgb);
        assert_eq!(output.max_len(), Some(2));

        output.write_pixel(Pixel::new(1, 2, 3, 4));
        assert_eq!(output.current_output_position(), 1);
        assert_eq!(&out[..4], &[1u8, 2, 3, 0]);
    }

    #[test]
    fn starting_pixel_is_cached() {
        let data = stream(
            rgba(2),
            &[QOI_OP_RGB, 1, 2, 3, QOI_OP_INDEX | Pixel::OPAQUE_BLACK.hash()],
        );
        let mut out = [0u8; 8];
        let (decoded, _) =
            QoiDecodeContext::decode(&data, SliceDecodeOutput::new(&mut out, Channels::Rgba))
                .unwrap();

        assert_eq!(decoded, 2);
        assert_eq!(out, [1, 2, 3, 255, 0, 0, 0, 255]);
    }

    #[test]
    fn first_pixel_run_is_opaque_black() {
        let data = stream(rgba(2), &[QOI_OP_RUN | 1]);
        let mut out = [1u8; 8];
        QoiDecodeContext::decode(&data, SliceDecodeOutput::new(&mut out, Channels::Rgba)).unwrap();
        assert_eq!(out, [0, 0, 0, 255, 0, 0, 0, 255]);
    }
}
