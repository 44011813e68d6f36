//! Local file identity, computed the same way a browser client does before presigning.

use anyhow::Context;
use serde::Serialize;
use std::path::Path;
use std::time::UNIX_EPOCH;
use wordtally_core::{derive_file_id, fingerprint};
use wordtally_storage::keys::build_upload_key;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FingerprintReport {
    pub file_name: String,
    pub size_bytes: u64,
    pub last_modified_ms: i64,
    pub fingerprint_hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

/// Describe `path` by name, size and modification time; with an owner, also derive
/// the file id and the storage key an upload would be issued for.
pub async fn inspect_file(path: &Path, owner_id: Option<&str>) -> anyhow::Result<FingerprintReport> {
    let metadata = tokio::fs::metadata(path)
        .await
        .with_context(|| format!("Read metadata of {}", path.display()))?;
    anyhow::ensure!(metadata.is_file(), "{} is not a regular file", path.display());

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("{} has no UTF-8 file name", path.display()))?
        .to_string();

    let last_modified_ms = metadata
        .modified()
        .context("Modification time unavailable")?
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0);

    let fingerprint_hash = fingerprint(&file_name, metadata.len(), last_modified_ms);

    let (file_id, key) = match owner_id {
        Some(owner) => {
            let file_id = derive_file_id(owner, &fingerprint_hash);
            let key = build_upload_key(owner, &file_id, &file_name)?;
            (Some(file_id), Some(key))
        }
        None => (None, None),
    };

    Ok(FingerprintReport {
        file_name,
        size_bytes: metadata.len(),
        last_modified_ms,
        fingerprint_hash,
        owner_id: owner_id.map(String::from),
        file_id,
        key,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wordtally_core::is_file_id;

    #[tokio::test]
    async fn test_report_matches_core_fingerprint() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        tokio::fs::write(&path, b"hello world\n").await.unwrap();

        let report = inspect_file(&path, None).await.unwrap();
        assert_eq!(report.file_name, "notes.txt");
        assert_eq!(report.size_bytes, 12);
        assert_eq!(
            report.fingerprint_hash,
            fingerprint("notes.txt", 12, report.last_modified_ms)
        );
        assert!(report.file_id.is_none());
        assert!(report.key.is_none());
    }

    #[tokio::test]
    async fn test_owner_adds_file_id_and_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        tokio::fs::write(&path, b"hello").await.unwrap();

        let report = inspect_file(&path, Some("owner-1")).await.unwrap();
        let file_id = report.file_id.unwrap();
        assert!(is_file_id(&file_id));
        assert_eq!(file_id, derive_file_id("owner-1", &report.fingerprint_hash));
        let key = report.key.unwrap();
        assert!(key.contains(&file_id));
        assert!(key.ends_with("notes.txt"));
    }

    #[tokio::test]
    async fn test_directory_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        assert!(inspect_file(dir.path(), None).await.is_err());
    }
}
