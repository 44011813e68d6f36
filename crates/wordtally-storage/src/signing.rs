//! Signed upload URLs for backends without native presigning (local filesystem).
//!
//! Signature = hex(HMAC-SHA256(secret, "{expires}\n{key}\n{content_type}")), where
//! `expires` is a unix timestamp in seconds. The URL carries `expires` and
//! `signature` as query parameters; the key comes from the path.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("Upload signature is malformed")]
    Malformed,
    #[error("Upload signature does not match")]
    Mismatch,
    #[error("Upload URL has expired")]
    Expired,
}

/// Issues and checks upload signatures.
#[derive(Clone)]
pub struct UploadSigner {
    secret: Vec<u8>,
}

impl std::fmt::Debug for UploadSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadSigner").finish_non_exhaustive()
    }
}

/// Seconds since the unix epoch.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

impl UploadSigner {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    fn mac(&self, storage_key: &str, content_type: &str, expires_at: u64) -> HmacSha256 {
        let mut mac = HmacSha256::new_from_slice(&self.secret).expect("HMAC accepts any key size");
        mac.update(expires_at.to_string().as_bytes());
        mac.update(b"\n");
        mac.update(storage_key.as_bytes());
        mac.update(b"\n");
        mac.update(content_type.as_bytes());
        mac
    }

    /// Expiry timestamp for a URL issued now.
    pub fn expiry_from_now(expires_in: Duration) -> u64 {
        unix_now().saturating_add(expires_in.as_secs())
    }

    /// Hex signature binding key, content type and expiry.
    pub fn sign(&self, storage_key: &str, content_type: &str, expires_at: u64) -> String {
        let tag = self.mac(storage_key, content_type, expires_at).finalize().into_bytes();
        hex::encode(tag)
    }

    /// Check a signature against the request it arrived with.
    pub fn verify(
        &self,
        storage_key: &str,
        content_type: &str,
        expires_at: u64,
        signature: &str,
        now: u64,
    ) -> Result<(), SignatureError> {
        let tag = hex::decode(signature).map_err(|_| SignatureError::Malformed)?;
        self.mac(storage_key, content_type, expires_at)
            .verify_slice(&tag)
            .map_err(|_| SignatureError::Mismatch)?;
        if now > expires_at {
            return Err(SignatureError::Expired);
        }
        Ok(())
    }
}
