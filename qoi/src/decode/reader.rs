use crate::{chunk::Chunk, consts::QOI_END_MARKER};

/// Reads chunks from the stream following the header, stopping before the trailing end marker.
///
/// The reader is bound to `len - 8` up front, so a chunk is never parsed out of the end marker
/// bytes. Streams shorter than the end marker yield no chunks at all.
#[derive(Debug, Clone)]
pub struct ChunkReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ChunkReader<'a> {
    pub fn new(chunks_and_marker: &'a [u8]) -> Self {
        let end = chunks_and_marker.len().saturating_sub(QOI_END_MARKER.len());
        Self {
            data: &chunks_and_marker[..end],
            pos: 0,
        }
    }

    /// Returns the next chunk, or `None` once the stream is exhausted. A chunk whose payload
    /// would cross the boundary counts as exhausted too.
    pub fn next_chunk(&mut self) -> Option<Chunk> {
        let &tag = self.data.get(self.pos)?;
        let end = self.pos + 1 + Chunk::payload_len(tag);
        let payload = self.data.get(self.pos + 1..end)?;
        self.pos = end;

        Some(Chunk::parse(tag, payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;

    #[test]
    fn stops_before_end_marker() {
        let mut stream = vec![QOI_OP_RUN | 3, QOI_OP_INDEX | 5];
        stream.extend_from_slice(&QOI_END_MARKER);

        let mut reader = ChunkReader::new(&stream);
        assert_eq!(reader.next_chunk(), Some(Chunk::Run(4)));
        assert_eq!(reader.next_chunk(), Some(Chunk::Index(5)));
        assert_eq!(reader.next_chunk(), None);
    }

    #[test]
    fn partial_chunk_is_exhaustion() {
        let mut stream = vec![QOI_OP_RGBA, 1, 2];
        stream.extend_from_slice(&QOI_END_MARKER);

        let mut reader = ChunkReader::new(&stream);
        assert_eq!(reader.next_chunk(), None);
        assert_eq!(reader.next_chunk(), None);
    }

    #[test]
    fn short_stream_is_empty() {
        let mut reader = ChunkReader::new(&[QOI_OP_RUN, 0, 1]);
        assert_eq!(reader.next_chunk(), None);
    }
}
