use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::TransferError;
use crate::planner::ChunkDescriptor;

/// Computes SHA-256 of `data` and returns the hex-encoded digest.
pub fn checksum_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Reads exactly the bytes covered by `desc` from the file at `path`.
///
/// Fails with [`TransferError::ShortRead`] if the file shrank since the
/// chunk was planned.
pub fn read_range(path: &Path, desc: &ChunkDescriptor) -> Result<Vec<u8>, TransferError> {
    let mut file = std::fs::File::open(path)?;
    file.seek(SeekFrom::Start(desc.byte_start))?;

    let wanted = desc.len();
    let mut buf = Vec::with_capacity(wanted as usize);
    file.take(wanted).read_to_end(&mut buf)?;

    if buf.len() as u64 != wanted {
        return Err(TransferError::ShortRead {
            offset: desc.byte_start,
            wanted,
            got: buf.len() as u64,
        });
    }
    Ok(buf)
}
