//! Upload records and stored files.
//!
//! [`UploadStore`] is the seam between the request handler and wherever uploads
//! actually live. [`LocalStore`] keeps everything under one directory:
//!
//! ```text
//! <root>/records/<id>.json      upload records
//! <root>/uploads/<user>/<file>  raw CSV uploads
//! <root>/cleaned/<user>/...     cleaned outputs
//! ```

use crate::error::{PrepError, Result, ResultExt as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Component, Path, PathBuf};
use uuid::Uuid;

pub const RECORDS_DIR: &str = "records";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UploadStatus {
    Processing,
    Processed,
    Failed,
}

/// Storage area for objects.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Bucket {
    /// Raw uploads as received
    Uploads,
    /// Cleaned feature and label tables
    Cleaned,
}

impl Bucket {
    pub fn dir_name(self) -> &'static str {
        match self {
            Self::Uploads => "uploads",
            Self::Cleaned => "cleaned",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRecord {
    pub id: String,
    pub user_id: String,
    /// Object path of the raw upload in [`Bucket::Uploads`]
    pub csv_path: String,
    pub cleaned_csv_path: Option<String>,
    pub labels_csv_path: Option<String>,
    pub status: UploadStatus,
    pub updated_at: DateTime<Utc>,
}

impl UploadRecord {
    /// File name part of the raw upload path.
    pub fn file_name(&self) -> &str {
        self.csv_path
            .rsplit('/')
            .next()
            .unwrap_or(self.csv_path.as_str())
    }
}

pub trait UploadStore {
    /// Look up an upload record.
    ///
    /// # Errors
    ///
    /// [`PrepError::InputNotFound`] when no record has this id.
    fn record(&self, id: &str) -> Result<UploadRecord>;

    /// Create or overwrite a record.
    ///
    /// # Errors
    ///
    /// Fails when the record cannot be persisted.
    fn save_record(&self, record: &UploadRecord) -> Result<()>;

    /// Read a stored object.
    ///
    /// # Errors
    ///
    /// [`PrepError::InputNotFound`] when the object does not exist.
    fn download(&self, bucket: Bucket, path: &str) -> Result<Vec<u8>>;

    /// Write an object, replacing any previous content.
    ///
    /// # Errors
    ///
    /// Fails when the object cannot be written.
    fn upload(&self, bucket: Bucket, path: &str, bytes: &[u8]) -> Result<()>;

    /// Store a raw upload for `user_id` and create its record in `Processing` state.
    ///
    /// # Errors
    ///
    /// Fails when the file name is unusable or storage fails.
    fn register(&self, user_id: &str, file_name: &str, bytes: &[u8]) -> Result<UploadRecord> {
        let record = UploadRecord {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_owned(),
            csv_path: format!("{user_id}/{file_name}"),
            cleaned_csv_path: None,
            labels_csv_path: None,
            status: UploadStatus::Processing,
            updated_at: Utc::now(),
        };
        self.upload(Bucket::Uploads, &record.csv_path, bytes)?;
        self.save_record(&record)?;
        tracing::info!(id = %record.id, path = %record.csv_path, "Registered upload");
        Ok(record)
    }
}

/// Filesystem-backed store rooted at one directory.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    /// Open (and create if needed) a store at `root`.
    ///
    /// # Errors
    ///
    /// Fails when the directory layout cannot be created.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        for dir in [
            RECORDS_DIR,
            Bucket::Uploads.dir_name(),
            Bucket::Cleaned.dir_name(),
        ] {
            fs::create_dir_all(root.join(dir))
                .with_context(|| format!("Failed to create store directory {}", root.display()))?;
        }
        Ok(Self { root })
    }

    fn record_path(&self, id: &str) -> Result<PathBuf> {
        if id.is_empty() || !id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(PrepError::MalformedInput(format!("Invalid upload id '{id}'")));
        }
        Ok(self.root.join(RECORDS_DIR).join(format!("{id}.json")))
    }

    fn object_path(&self, bucket: Bucket, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path);
        let is_plain = !path.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !is_plain {
            return Err(PrepError::MalformedInput(format!(
                "Invalid object path '{path}'"
            )));
        }
        Ok(self.root.join(bucket.dir_name()).join(relative))
    }
}

impl UploadStore for LocalStore {
    fn record(&self, id: &str) -> Result<UploadRecord> {
        let path = self.record_path(id)?;
        if !path.exists() {
            return Err(PrepError::InputNotFound(format!("CSV record {id} not found")));
        }
        let json = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read record {}", path.display()))?;
        let record: UploadRecord = serde_json::from_str(&json)
            .map_err(|e| PrepError::ProcessingFailure(format!("Corrupt record {id}: {e}")))?;
        Ok(record)
    }

    fn save_record(&self, record: &UploadRecord) -> Result<()> {
        let path = self.record_path(&record.id)?;
        let json = serde_json::to_string_pretty(record)
            .map_err(|e| PrepError::ProcessingFailure(format!("Failed to serialize record: {e}")))?;
        fs::write(&path, json)
            .with_context(|| format!("Failed to write record {}", path.display()))?;
        Ok(())
    }

    fn download(&self, bucket: Bucket, path: &str) -> Result<Vec<u8>> {
        let full = self.object_path(bucket, path)?;
        if !full.is_file() {
            return Err(PrepError::InputNotFound(format!(
                "Object {path} not found in {}",
                bucket.dir_name()
            )));
        }
        fs::read(&full).with_context(|| format!("Failed to read {}", full.display()))
    }

    fn upload(&self, bucket: Bucket, path: &str, bytes: &[u8]) -> Result<()> {
        let full = self.object_path(bucket, path)?;
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(&full, bytes).with_context(|| format!("Failed to write {}", full.display()))?;
        tracing::debug!(bucket = bucket.dir_name(), path, bytes = bytes.len(), "Stored object");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_register_and_load_record() -> anyhow::Result<()> {
        let temp_dir = tempdir()?;
        let store = LocalStore::open(temp_dir.path())?;

        let record = store.register("user_1", "charges.csv", b"a,b\n1,2\n")?;
        assert_eq!(record.status, UploadStatus::Processing);
        assert_eq!(record.csv_path, "user_1/charges.csv");
        assert_eq!(record.file_name(), "charges.csv");

        let loaded = store.record(&record.id)?;
        assert_eq!(loaded, record);
        assert_eq!(store.download(Bucket::Uploads, &record.csv_path)?, b"a,b\n1,2\n");
        Ok(())
    }

    #[test]
    fn test_record_json_uses_camel_case() -> anyhow::Result<()> {
        let temp_dir = tempdir()?;
        let store = LocalStore::open(temp_dir.path())?;
        let record = store.register("u", "f.csv", b"x\n1\n")?;

        let json = fs::read_to_string(temp_dir.path().join(RECORDS_DIR).join(format!("{}.json", record.id)))?;
        assert!(json.contains("\"csvPath\""));
        assert!(json.contains("\"userId\""));
        assert!(json.contains("\"PROCESSING\""));
        Ok(())
    }

    #[test]
    fn test_unknown_record_is_not_found() -> anyhow::Result<()> {
        let temp_dir = tempdir()?;
        let store = LocalStore::open(temp_dir.path())?;

        let err = store.record("does-not-exist").unwrap_err();
        assert!(matches!(err, PrepError::InputNotFound(_)));
        assert_eq!(err.status_code(), 404);

        let err = store.download(Bucket::Uploads, "nobody/nothing.csv").unwrap_err();
        assert!(matches!(err, PrepError::InputNotFound(_)));
        Ok(())
    }

    #[test]
    fn test_path_traversal_rejected() -> anyhow::Result<()> {
        let temp_dir = tempdir()?;
        let store = LocalStore::open(temp_dir.path())?;

        for path in ["../escape.csv", "/etc/passwd", "a/../../b", ""] {
            let err = store.upload(Bucket::Cleaned, path, b"x").unwrap_err();
            assert!(matches!(err, PrepError::MalformedInput(_)), "{path} accepted");
        }
        let err = store.record("../records/x").unwrap_err();
        assert!(matches!(err, PrepError::MalformedInput(_)));
        Ok(())
    }
}
