//! File identity derivation.
//!
//! A fingerprint is a SHA-256 digest over `name|size|lastModified`. It is cheap to
//! compute on the client because it never reads the file bytes, which also means two
//! different files sharing those three attributes collide.
//!
//! The file id is a SHA-256 digest over `ownerId:fingerprintHash`, so the same owner
//! uploading the same fingerprint always lands on the same record.

use sha2::{Digest, Sha256};

/// Length of every hex digest produced here.
pub const DIGEST_HEX_LEN: usize = 64;

/// Fingerprint for a file described by its name, byte length and modification time.
pub fn fingerprint(file_name: &str, size_bytes: u64, last_modified_ms: i64) -> String {
    let input = format!("{}|{}|{}", file_name, size_bytes, last_modified_ms);
    hex::encode(Sha256::digest(input.as_bytes()))
}

/// Deterministic file id for an owner and fingerprint.
pub fn derive_file_id(owner_id: &str, fingerprint_hash: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(owner_id.as_bytes());
    hasher.update(b":");
    hasher.update(fingerprint_hash.as_bytes());
    hex::encode(hasher.finalize())
}

/// True when `value` is a 64-character hex digest (either case).
pub fn is_file_id(value: &str) -> bool {
    value.len() == DIGEST_HEX_LEN && value.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Identity of a file as seen by the upload flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileIdentity {
    pub owner_id: String,
    pub fingerprint_hash: String,
    pub file_id: String,
}

impl FileIdentity {
    pub fn new(owner_id: impl Into<String>, fingerprint_hash: impl Into<String>) -> Self {
        let owner_id = owner_id.into();
        // Fingerprints are compared case-insensitively.
        let fingerprint_hash = fingerprint_hash.into().to_ascii_lowercase();
        let file_id = derive_file_id(&owner_id, &fingerprint_hash);
        Self {
            owner_id,
            fingerprint_hash,
            file_id,
        }
    }
}
