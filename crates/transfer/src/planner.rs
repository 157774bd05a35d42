use crate::DEFAULT_CHUNK_SIZE;

/// One planned chunk: a half-open byte range `[byte_start, byte_end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkDescriptor {
    pub index: u32,
    pub byte_start: u64,
    pub byte_end: u64,
}

impl ChunkDescriptor {
    /// Length of the range in bytes.
    pub fn len(&self) -> u64 {
        self.byte_end - self.byte_start
    }

    pub fn is_empty(&self) -> bool {
        self.byte_end == self.byte_start
    }
}

/// Splits `file_size` bytes into contiguous chunks of at most `chunk_size`.
///
/// Always yields at least one descriptor, so an empty file plans a single
/// empty chunk. A `chunk_size` of 0 means [`DEFAULT_CHUNK_SIZE`]. Chunk
/// indices are `u32`; see [`effective_chunk_size`].
pub fn plan(file_size: u64, chunk_size: u64) -> Vec<ChunkDescriptor> {
    let chunk_size = effective_chunk_size(file_size, chunk_size);
    let count = file_size.div_ceil(chunk_size).max(1);
    let count = u32::try_from(count).unwrap_or(u32::MAX);

    (0..count)
        .map(|index| {
            let byte_start = (u64::from(index) * chunk_size).min(file_size);
            let byte_end = byte_start.saturating_add(chunk_size).min(file_size);
            ChunkDescriptor {
                index,
                byte_start,
                byte_end,
            }
        })
        .collect()
}

/// Chunk size [`plan`] actually uses.
///
/// Substitutes the default for 0, and grows the size when `file_size`
/// would otherwise need more than `u32::MAX` chunks.
pub(crate) fn effective_chunk_size(file_size: u64, chunk_size: u64) -> u64 {
    let chunk_size = if chunk_size == 0 {
        DEFAULT_CHUNK_SIZE
    } else {
        chunk_size
    };
    chunk_size.max(file_size.div_ceil(u64::from(u32::MAX)))
}
