//! Chunked binary container used by the mesh exporters
//!
//! A file is a flat run of chunks. Each chunk is a 4-byte magic, a
//! little-endian `u32` payload length in bytes, then the payload itself: a
//! packed array of plain-old-data elements.

use bytemuck::Pod;

use super::MeshError;

/// Size of the magic + length header in front of every chunk
const HEADER_LEN: usize = 8;

/// One undecoded chunk
#[derive(Debug, Clone)]
struct RawChunk {
    magic: [u8; 4],
    payload: Vec<u8>,
}

/// Sequential reader over the chunks of one file
#[derive(Debug)]
pub struct ChunkReader {
    chunks: Vec<RawChunk>,
    cursor: usize,
    trailing_bytes: usize,
}

impl ChunkReader {
    /// Split `bytes` into chunks.
    ///
    /// A header or payload cut short by the end of the buffer is an error;
    /// fewer than [`HEADER_LEN`] leftover bytes are kept as trailing data.
    pub fn parse(bytes: &[u8]) -> Result<Self, MeshError> {
        let mut chunks = Vec::new();
        let mut offset = 0;

        while bytes.len() - offset >= HEADER_LEN {
            let mut magic = [0u8; 4];
            magic.copy_from_slice(&bytes[offset..offset + 4]);
            let mut len = [0u8; 4];
            len.copy_from_slice(&bytes[offset + 4..offset + 8]);
            let len = u32::from_le_bytes(len) as usize;

            let start = offset + HEADER_LEN;
            let end = start
                .checked_add(len)
                .filter(|&end| end <= bytes.len())
                .ok_or_else(|| MeshError::TruncatedChunk {
                    magic: magic_str(&magic),
                    declared: len,
                    available: bytes.len() - start,
                })?;

            chunks.push(RawChunk {
                magic,
                payload: bytes[start..end].to_vec(),
            });
            offset = end;
        }

        Ok(Self {
            chunks,
            cursor: 0,
            trailing_bytes: bytes.len() - offset,
        })
    }

    /// Decode the next chunk, which must carry `magic`
    pub fn expect<T: Pod>(&mut self, magic: &[u8; 4]) -> Result<Vec<T>, MeshError> {
        match self.chunks.get(self.cursor) {
            Some(chunk) if &chunk.magic == magic => {
                self.cursor += 1;
                decode(&self.chunks[self.cursor - 1])
            }
            Some(chunk) => Err(MeshError::UnexpectedChunk {
                expected: magic_str(magic),
                found: magic_str(&chunk.magic),
            }),
            None => Err(MeshError::UnexpectedChunk {
                expected: magic_str(magic),
                found: "end of file".to_string(),
            }),
        }
    }

    /// Decode the next chunk only if it carries `magic`
    pub fn optional<T: Pod>(&mut self, magic: &[u8; 4]) -> Result<Option<Vec<T>>, MeshError> {
        match self.chunks.get(self.cursor) {
            Some(chunk) if &chunk.magic == magic => self.expect(magic).map(Some),
            _ => Ok(None),
        }
    }

    /// Whether unread chunks or stray bytes remain after the last expected chunk
    pub fn has_trailing_data(&self) -> bool {
        self.cursor < self.chunks.len() || self.trailing_bytes > 0
    }
}

fn decode<T: Pod>(chunk: &RawChunk) -> Result<Vec<T>, MeshError> {
    let element = std::mem::size_of::<T>();
    if element == 0 || chunk.payload.len() % element != 0 {
        return Err(MeshError::ChunkSize {
            magic: magic_str(&chunk.magic),
            size: chunk.payload.len(),
            element,
        });
    }
    // pod_collect_to_vec copies, so the payload alignment does not matter
    Ok(bytemuck::pod_collect_to_vec(&chunk.payload))
}

/// Append one chunk holding `data` to `out`
pub fn write_chunk<T: Pod>(out: &mut Vec<u8>, magic: &[u8; 4], data: &[T]) {
    let payload: &[u8] = bytemuck::cast_slice(data);
    out.extend_from_slice(magic);
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend_from_slice(payload);
}

pub(crate) fn magic_str(magic: &[u8; 4]) -> String {
    String::from_utf8_lossy(magic).into_owned()
}
