use crate::{
    chunk::MAX_CHUNK_LEN,
    consts::QOI_END_MARKER,
    encode::{check_input, EncodeError, QoiEncodeContext, WriteIoSnafu},
    Header,
};
use snafu::ResultExt;
use std::io::Write;

impl QoiEncodeContext {
    /// Encodes an image into `w`. Chunks are written one at a time, so `w` should be buffered.
    pub fn encode<W: Write>(header: &Header, pixels: &[u8], w: W) -> Result<(), EncodeError> {
        let mut ctx = QoiEncodeContext::new();
        ctx.encode_with_state(header, pixels, w)
    }

    pub fn encode_header<W: Write>(header: &Header, mut w: W) -> Result<(), EncodeError> {
        w.write_all(&header.to_bytes()).context(WriteIoSnafu)
    }

    pub fn encode_with_state<W: Write>(
        &mut self,
        header: &Header,
        pixels: &[u8],
        mut w: W,
    ) -> Result<(), EncodeError> {
        check_input(header, pixels)?;

        tracing::debug!(
            width = header.width,
            height = header.height,
            channels = header.channels.count(),
            "encoding image"
        );

        Self::encode_header(header, &mut w)?;
        self.encode_pixels(header, pixels, &mut w)?;
        w.write_all(&QOI_END_MARKER).context(WriteIoSnafu)?;

        Ok(())
    }

    /// Writes the chunks for `pixels`, without header or end marker. `pixels` must match the
    /// dimensions in `header`.
    pub fn encode_pixels<W: Write>(
        &mut self,
        header: &Header,
        pixels: &[u8],
        mut w: W,
    ) -> Result<(), EncodeError> {
        check_input(header, pixels)?;

        let mut buf = [0; MAX_CHUNK_LEN];
        self.encode_chunks(pixels, header.channels, |chunk| {
            w.write_all(chunk.write(&mut buf)).context(WriteIoSnafu)
        })
    }
}
