//! Upload key layout shared by every backend and by the notification path.
//!
//! Key format: `uploads/{owner_id}/{file_id}-{file_name}`, where `file_id` is a
//! 64-character hex digest.

use std::borrow::Cow;

use crate::traits::{StorageError, StorageResult};
use wordtally_core::identity::DIGEST_HEX_LEN;

/// Prefix all uploads are written under.
pub const UPLOAD_PREFIX: &str = "uploads";

/// Replace path separators so the file name stays a single key segment.
pub fn sanitize_file_name(file_name: &str) -> String {
    let cleaned: String = file_name
        .chars()
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect();
    if cleaned.trim().is_empty() {
        "file".to_string()
    } else {
        cleaned
    }
}

/// Build the storage key for an upload.
pub fn build_upload_key(owner_id: &str, file_id: &str, file_name: &str) -> StorageResult<String> {
    if owner_id.is_empty()
        || owner_id.contains('/')
        || owner_id.contains('\\')
        || owner_id == "."
        || owner_id == ".."
    {
        return Err(StorageError::InvalidKey(format!(
            "owner id cannot be used as a key segment: {:?}",
            owner_id
        )));
    }
    Ok(format!(
        "{}/{}/{}-{}",
        UPLOAD_PREFIX,
        owner_id,
        file_id,
        sanitize_file_name(file_name)
    ))
}

/// Decode an object key as delivered in S3 event notifications
/// (form-encoded: `+` for space, percent escapes for the rest).
pub fn decode_notification_key(raw_key: &str) -> String {
    let spaced = raw_key.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(Cow::Borrowed(s)) => s.to_string(),
        Ok(Cow::Owned(s)) => s,
        // Leave undecodable keys as-is; parsing will reject them if they are foreign.
        Err(_) => spaced,
    }
}

/// Recover the file id from a decoded storage key.
///
/// Looks at the final path segment and expects a leading 64-character hex run
/// followed by `-`. The id is returned lower-cased.
pub fn file_id_from_key(storage_key: &str) -> Option<String> {
    let last_segment = storage_key.rsplit('/').next()?;
    let candidate = last_segment.get(..DIGEST_HEX_LEN)?;
    if !candidate.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    if last_segment.as_bytes().get(DIGEST_HEX_LEN) != Some(&b'-') {
        return None;
    }
    Some(candidate.to_ascii_lowercase())
}

/// Percent-encode each key segment for use inside a URL path.
pub fn encode_key_for_url(storage_key: &str) -> String {
    storage_key
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file_id() -> String {
        "0123456789abcdef".repeat(4)
    }

    #[test]
    fn test_build_and_parse() {
        let key = build_upload_key("owner-1", &file_id(), "notes.txt").unwrap();
        assert_eq!(key, format!("uploads/owner-1/{}-notes.txt", file_id()));
        assert_eq!(file_id_from_key(&key), Some(file_id()));
    }

    #[test]
    fn test_file_name_separators_are_replaced() {
        let key = build_upload_key("owner-1", &file_id(), "dir/sub\\a.txt").unwrap();
        assert!(key.ends_with("-dir_sub_a.txt"));
        assert_eq!(file_id_from_key(&key), Some(file_id()));
    }

    #[test]
    fn test_owner_with_separator_rejected() {
        assert!(build_upload_key("a/b", &file_id(), "x.txt").is_err());
        assert!(build_upload_key("..", &file_id(), "x.txt").is_err());
        assert!(build_upload_key("", &file_id(), "x.txt").is_err());
    }

    #[test]
    fn test_notification_key_decoding() {
        let raw = format!("uploads/owner%201/{}-my+notes%20%282%29.txt", file_id());
        let decoded = decode_notification_key(&raw);
        assert_eq!(
            decoded,
            format!("uploads/owner 1/{}-my notes (2).txt", file_id())
        );
        assert_eq!(file_id_from_key(&decoded), Some(file_id()));
    }

    #[test]
    fn test_uppercase_id_is_normalized() {
        let key = format!("uploads/o/{}-a.txt", file_id().to_uppercase());
        assert_eq!(file_id_from_key(&key), Some(file_id()));
    }

    #[test]
    fn test_foreign_keys_are_rejected() {
        assert_eq!(file_id_from_key("uploads/o/readme.txt"), None);
        assert_eq!(file_id_from_key(&format!("uploads/o/{}", file_id())), None);
        assert_eq!(file_id_from_key(&format!("uploads/o/{}_a.txt", file_id())), None);
        assert_eq!(file_id_from_key(&format!("uploads/o/{}x-a.txt", &file_id()[..63])), None);
        assert_eq!(file_id_from_key(""), None);
    }

    #[test]
    fn test_multibyte_segment_does_not_panic() {
        assert_eq!(file_id_from_key("uploads/o/ééééééééééééééééééééééééééééééééé"), None);
    }

    #[test]
    fn test_url_encoding_keeps_slashes() {
        let encoded = encode_key_for_url("uploads/owner 1/x y.txt");
        assert_eq!(encoded, "uploads/owner%201/x%20y.txt");
    }
}
