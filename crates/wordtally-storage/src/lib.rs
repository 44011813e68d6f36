//! Wordtally Storage Library
//!
//! Blob storage abstraction with S3 and local filesystem backends.
//!
//! # Storage key format
//!
//! Every upload lives at `uploads/{owner_id}/{file_id}-{file_name}`. The final segment
//! alone is enough to recover the file id, which is how blob notifications are routed
//! back to their metadata record. Key building and parsing live in [`keys`].

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod signing;
pub mod traits;

// Re-export commonly used types
pub use factory::{create_storage, upload_signer};
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use signing::{SignatureError, UploadSigner};
pub use traits::{ByteStream, Storage, StorageError, StorageResult};
pub use wordtally_core::StorageBackend;
