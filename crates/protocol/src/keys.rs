//! Storage key scheme shared by every backend.
//!
//! Records live at `partials/<escaped-file-id>/chunk_<index>.json`.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Root namespace of all partial records.
pub const PARTIALS_ROOT: &str = "partials";

/// Bytes left unescaped, mirroring JavaScript's `encodeURIComponent`.
const FILE_ID_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Escapes a caller-supplied file id into a single key segment.
///
/// The dot-only ids `.` and `..` are encoded as well so the result never
/// names a relative directory.
pub fn escape_file_id(file_id: &str) -> String {
    match file_id {
        "." => "%2E".into(),
        ".." => "%2E%2E".into(),
        _ => utf8_percent_encode(file_id, FILE_ID_ESCAPE).to_string(),
    }
}

/// Key prefix holding every record of `file_id` (with trailing `/`).
pub fn file_prefix(file_id: &str) -> String {
    format!("{PARTIALS_ROOT}/{}/", escape_file_id(file_id))
}

/// Storage key of one chunk record.
pub fn partial_key(file_id: &str, chunk_index: u32) -> String {
    format!("{}chunk_{chunk_index}.json", file_prefix(file_id))
}

/// Extracts the chunk index from a key produced by [`partial_key`].
pub fn chunk_index_from_key(key: &str) -> Option<u32> {
    let name = key.rsplit('/').next()?;
    name.strip_prefix("chunk_")?
        .strip_suffix(".json")?
        .parse()
        .ok()
}
