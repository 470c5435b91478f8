//! Key validation and the nil-key panic policy.
//!
//! Every adapter runs [`check_key`] before calling into its engine, so that
//! engines with permissive native APIs still reject the nil key. A nil key is
//! a caller bug, not a runtime condition: it panics and is never reported as
//! a [`crate::StorageError`].

/// Returns `false` only for the nil key.
///
/// The zero-length key is valid.
#[must_use]
pub fn is_valid_key(key: Option<&[u8]>) -> bool {
    key.is_some()
}

/// Returns the key bytes, panicking if the key is nil.
///
/// # Panics
///
/// Panics with `nil key passed to <op>` when `key` is `None`.
#[track_caller]
pub fn check_key<'a>(key: Option<&'a [u8]>, op: &str) -> &'a [u8] {
    match key {
        Some(key) => key,
        None => panic!("nil key passed to {op}"),
    }
}

/// Returns the stored representation of a value: nil becomes zero-length.
#[must_use]
pub fn normalize_value(value: Option<&[u8]>) -> &[u8] {
    value.unwrap_or(&[])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nil_key_is_invalid() {
        assert!(!is_valid_key(None));
    }

    #[test]
    fn empty_key_is_valid() {
        assert!(is_valid_key(Some(b"")));
        assert_eq!(check_key(Some(b""), "get"), b"");
    }

    #[test]
    fn check_key_returns_bytes() {
        assert_eq!(check_key(Some(b"abc"), "set"), b"abc");
    }

    #[test]
    #[should_panic(expected = "nil key passed to delete")]
    fn check_key_panics_on_nil() {
        check_key(None, "delete");
    }

    #[test]
    fn nil_value_normalizes_to_empty() {
        assert_eq!(normalize_value(None), b"");
        assert_eq!(normalize_value(Some(b"")), b"");
        assert_eq!(normalize_value(Some(b"v")), b"v");
    }
}
