use crate::TransferError;

/// Checks that a `/`-separated storage key names a location below the
/// backend root.
///
/// Keys are relative: no leading `/`, no empty, `.` or `..` segments. A
/// single trailing `/` is allowed so listing prefixes validate too.
/// Backslashes, `:` and NUL are rejected since a filesystem backend would
/// interpret them. Escaped segments such as `%2E%2E` are plain names.
pub fn validate_key(key: &str) -> Result<(), TransferError> {
    let invalid = |reason: &str| Err(TransferError::InvalidKey(format!("{reason}: {key:?}")));

    if key.is_empty() {
        return invalid("empty key");
    }
    if key.starts_with('/') {
        return invalid("key must be relative");
    }
    if let Some(c) = key.chars().find(|c| matches!(c, '\\' | ':' | '\0')) {
        return invalid(&format!("forbidden character {c:?} in key"));
    }

    let body = key.strip_suffix('/').unwrap_or(key);
    for segment in body.split('/') {
        match segment {
            "" => return invalid("empty segment in key"),
            "." | ".." => return invalid("dot segment in key"),
            _ => {}
        }
    }
    Ok(())
}
