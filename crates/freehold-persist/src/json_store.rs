//! A file-backed storage backend using JSON snapshots.
//!
//! Each record set lives in its own file as a versioned envelope. Writes
//! go to a sibling temp file first and are moved into place with a rename,
//! so a crash mid-write leaves the previous snapshot readable.

use std::fs;
use std::path::{Path, PathBuf};

use freehold_types::{Estate, PendingExpansionRequest};
use serde::{Serialize, de::DeserializeOwned};
use tracing::debug;

use crate::error::StorageError;
use crate::storage::EstateStorage;

/// The snapshot format version this build reads and writes.
const SNAPSHOT_VERSION: u32 = 1;

/// On-disk envelope wrapping a record set.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct Snapshot<T> {
    version: u32,
    records: Vec<T>,
}

/// JSON snapshot files under a single data directory.
#[derive(Debug, Clone)]
pub struct JsonStore {
    estates_path: PathBuf,
    requests_path: PathBuf,
}

impl JsonStore {
    /// Create a store rooted at the given data directory.
    ///
    /// The directory is created on first save, not here.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        let dir = data_dir.into();
        Self {
            estates_path: dir.join("estates.json"),
            requests_path: dir.join("expansion_requests.json"),
        }
    }

    fn load_file<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, StorageError> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let snapshot: Snapshot<T> = serde_json::from_str(&raw)?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(StorageError::UnsupportedVersion {
                found: snapshot.version,
                expected: SNAPSHOT_VERSION,
            });
        }
        Ok(snapshot.records)
    }

    fn save_file<T: Serialize + Clone>(path: &Path, records: &[T]) -> Result<(), StorageError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let snapshot = Snapshot {
            version: SNAPSHOT_VERSION,
            records: records.to_vec(),
        };
        let json = serde_json::to_string_pretty(&snapshot)?;

        // Write-then-rename keeps the previous snapshot intact on a crash.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, path)?;
        debug!(path = %path.display(), records = records.len(), "snapshot written");
        Ok(())
    }
}

impl EstateStorage for JsonStore {
    fn load_estates(&self) -> Result<Vec<Estate>, StorageError> {
        Self::load_file(&self.estates_path)
    }

    fn save_estates(&self, estates: &[Estate]) -> Result<(), StorageError> {
        Self::save_file(&self.estates_path, estates)
    }

    fn load_requests(&self) -> Result<Vec<PendingExpansionRequest>, StorageError> {
        Self::load_file(&self.requests_path)
    }

    fn save_requests(&self, requests: &[PendingExpansionRequest]) -> Result<(), StorageError> {
        Self::save_file(&self.requests_path, requests)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use freehold_types::{
        AccountId, BlockPos, Cuboid, EstateKind, WorldName, WorldRuleSet,
    };

    use super::*;

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("freehold-test-{}", uuid::Uuid::now_v7()))
    }

    fn sample_estate() -> Estate {
        Estate::new(
            AccountId::new(),
            EstateKind::Private,
            WorldName::from("overworld"),
            Cuboid::new(BlockPos::new(0, 0, 0), BlockPos::new(10, 255, 10)),
            &WorldRuleSet::default(),
            Utc::now(),
        )
    }

    #[test]
    fn missing_snapshot_loads_empty() {
        let store = JsonStore::new(temp_dir());
        assert!(store.load_estates().map(|e| e.is_empty()).unwrap_or(false));
        assert!(store.load_requests().map(|r| r.is_empty()).unwrap_or(false));
    }

    #[test]
    fn save_and_load_roundtrip() {
        let dir = temp_dir();
        let store = JsonStore::new(&dir);
        let estate = sample_estate();

        assert!(store.save_estates(&[estate.clone()]).is_ok());
        let loaded = store.load_estates().unwrap_or_default();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.first().map(|e| e.id), Some(estate.id));
        // The in-memory dirty marker is not persisted.
        assert_eq!(loaded.first().map(|e| e.dirty), Some(false));

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn save_replaces_previous_snapshot() {
        let dir = temp_dir();
        let store = JsonStore::new(&dir);

        assert!(store.save_estates(&[sample_estate(), sample_estate()]).is_ok());
        assert!(store.save_estates(&[sample_estate()]).is_ok());
        assert_eq!(store.load_estates().map(|e| e.len()).ok(), Some(1));

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn unknown_version_is_rejected() {
        let dir = temp_dir();
        let store = JsonStore::new(&dir);
        let path = dir.join("estates.json");
        let _ = fs::create_dir_all(&dir);
        let _ = fs::write(&path, r#"{"version": 99, "records": []}"#);

        let result = store.load_estates();
        assert!(matches!(
            result,
            Err(StorageError::UnsupportedVersion { found: 99, .. })
        ));

        let _ = fs::remove_dir_all(dir);
    }
}
