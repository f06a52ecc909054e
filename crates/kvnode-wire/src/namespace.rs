//! Splitting and validating the `<namespace>:<key>` wire key.

use crate::WireError;

/// Scans `wire_key` for the first `:` and splits it into `(namespace, key)`.
///
/// Fails with [`WireError::NamespaceMissing`] if there is no `:`, or if
/// either half would be empty.
pub fn split(wire_key: &[u8]) -> Result<(&[u8], &[u8]), WireError> {
    let pos = wire_key
        .iter()
        .position(|&b| b == b':')
        .ok_or(WireError::NamespaceMissing)?;
    let (namespace, rest) = wire_key.split_at(pos);
    let key = &rest[1..];
    if namespace.is_empty() || key.is_empty() {
        return Err(WireError::NamespaceMissing);
    }
    Ok((namespace, key))
}

/// Like [`split`] but discards the namespace half.
pub fn strip(wire_key: &[u8]) -> Result<&[u8], WireError> {
    split(wire_key).map(|(_, key)| key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_namespace_and_key() {
        assert_eq!(split(b"default:test:xx").unwrap(), (&b"default"[..], &b"test:xx"[..]));
    }

    #[test]
    fn strips_to_key_only() {
        assert_eq!(strip(b"default:k").unwrap(), &b"k"[..]);
    }

    #[test]
    fn missing_colon_is_rejected() {
        assert!(matches!(split(b"nokey"), Err(WireError::NamespaceMissing)));
    }

    #[test]
    fn empty_namespace_is_rejected() {
        assert!(matches!(split(b":k"), Err(WireError::NamespaceMissing)));
    }

    #[test]
    fn empty_key_is_rejected() {
        assert!(matches!(split(b"ns:"), Err(WireError::NamespaceMissing)));
    }
}
