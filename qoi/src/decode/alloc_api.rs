use crate::{
    decode::{decode_error, DecodeError, DecodeOutput, QoiDecodeContext},
    Channels, Header, Pixel,
};
use alloc::vec::Vec;
use snafu::ResultExt;

/// Appends pixels to a `Vec` with `channels` bytes per pixel.
pub struct VecDecodeOutput<'a> {
    output: &'a mut Vec<u8>,
    channels: Channels,
    written: usize,
}

impl<'a> VecDecodeOutput<'a> {
    #[inline]
    pub fn new(output: &'a mut Vec<u8>, channels: Channels) -> Self {
        Self {
            output,
            channels,
            written: 0,
        }
    }
}

impl DecodeOutput for VecDecodeOutput<'_> {
    #[inline]
    fn write_pixel(&mut self, pixel: Pixel) {
        let bytes = pixel.to_array();
        self.output
            .extend_from_slice(&bytes[..self.channels.count()]);
        self.written += 1;
    }

    #[inline]
    fn max_len(&self) -> Option<usize> {
        None
    }

    #[inline]
    fn current_output_position(&self) -> usize {
        self.written
    }
}

impl QoiDecodeContext {
    /// Decodes an image and appends its pixels to `w`.
    ///
    /// `channels` selects the channel count of the output; `None` uses the one from the header.
    pub fn decode_to_vec(
        data: &[u8],
        channels: Option<Channels>,
        w: &mut Vec<u8>,
    ) -> Result<Header, DecodeError> {
        let mut state = QoiDecodeContext::new();
        state.decode_to_vec_with_state(data, channels, w)
    }

    /// Like [`decode_to_vec`](Self::decode_to_vec), with the given state as starting state. On
    /// error, `w` is left as it was.
    pub fn decode_to_vec_with_state(
        &mut self,
        data: &[u8],
        channels: Option<Channels>,
        w: &mut Vec<u8>,
    ) -> Result<Header, DecodeError> {
        let header = Header::from_bytes(data).context(decode_error::InvalidHeaderSnafu)?;
        let channels = channels.unwrap_or(header.channels);

        let start = w.len();
        w.reserve_exact(header.output_len(channels));

        match self.decode_with_state(data, VecDecodeOutput::new(w, channels)) {
            Ok((_, header)) => Ok(header),
            Err(e) => {
                w.truncate(start);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        consts::{QOI_END_MARKER, QOI_OP_RGBA, QOI_OP_RUN},
        Colorspace, TruncationPolicy,
    };

    fn rgba_stream() -> Vec<u8> {
        let header = Header::new(2, 2, Channels::Rgba, Colorspace::Linear).unwrap();
        let mut data = header.to_bytes().to_vec();
        data.extend_from_slice(&[QOI_OP_RGBA, 9, 8, 7, 6, QOI_OP_RUN | 2]);
        data.extend_from_slice(&QOI_END_MARKER);
        data
    }

    #[test]
    fn decodes_with_header_channels() {
        let mut out = vec![0xEE];
        let header = QoiDecodeContext::decode_to_vec(&rgba_stream(), None, &mut out).unwrap();

        assert_eq!(header.colorspace, Colorspace::Linear);
        assert_eq!(out[0], 0xEE);
        assert_eq!(&out[1..], &[9u8, 8, 7, 6].repeat(4)[..]);
    }

    #[test]
    fn drops_alpha_for_rgb_output() {
        let mut out = Vec::new();
        QoiDecodeContext::decode_to_vec(&rgba_stream(), Some(Channels::Rgb), &mut out).unwrap();
        assert_eq!(out, [9u8, 8, 7].repeat(4));
    }

    #[test]
    fn strict_error_leaves_vec_untouched() {
        let mut data = rgba_stream();
        // shorten the run from 3 to 1 pixel
        data[19] = QOI_OP_RUN;

        let mut out = vec![1, 2, 3];
        let err = QoiDecodeContext::with_policy(TruncationPolicy::Strict)
            .decode_to_vec_with_state(&data, None, &mut out)
            .unwrap_err();

        assert!(matches!(err, DecodeError::Truncated { decoded: 2, .. }));
        assert_eq!(out, [1, 2, 3]);
    }
}
