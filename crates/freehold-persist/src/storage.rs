//! The storage backend contract and an in-memory implementation.
//!
//! The coordinator never touches files or databases directly; it talks to
//! an [`EstateStorage`] backend. Backends store two independent record
//! sets: committed estates and expansion requests.

use std::sync::Mutex;

use freehold_types::{Estate, PendingExpansionRequest};

use crate::error::StorageError;

/// A durable backend for claim state snapshots.
///
/// Save operations replace the full record set atomically: readers never
/// observe a half-written snapshot, and a failed save leaves the previous
/// snapshot intact.
pub trait EstateStorage: Send + Sync {
    /// Load every persisted estate. An absent snapshot is an empty set,
    /// not an error.
    fn load_estates(&self) -> Result<Vec<Estate>, StorageError>;

    /// Replace the persisted estate set.
    fn save_estates(&self, estates: &[Estate]) -> Result<(), StorageError>;

    /// Load every persisted expansion request.
    fn load_requests(&self) -> Result<Vec<PendingExpansionRequest>, StorageError>;

    /// Replace the persisted expansion request set.
    fn save_requests(&self, requests: &[PendingExpansionRequest]) -> Result<(), StorageError>;
}

/// A backend that keeps snapshots in process memory.
///
/// Used by tests and ephemeral runs where durability is not wanted.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    estates: Mutex<Vec<Estate>>,
    requests: Mutex<Vec<PendingExpansionRequest>>,
}

impl MemoryStorage {
    /// Create an empty in-memory backend.
    pub fn new() -> Self {
        Self::default()
    }
}

impl EstateStorage for MemoryStorage {
    fn load_estates(&self) -> Result<Vec<Estate>, StorageError> {
        Ok(self.estates.lock().map(|e| e.clone()).unwrap_or_default())
    }

    fn save_estates(&self, estates: &[Estate]) -> Result<(), StorageError> {
        if let Ok(mut slot) = self.estates.lock() {
            *slot = estates.to_vec();
        }
        Ok(())
    }

    fn load_requests(&self) -> Result<Vec<PendingExpansionRequest>, StorageError> {
        Ok(self.requests.lock().map(|r| r.clone()).unwrap_or_default())
    }

    fn save_requests(&self, requests: &[PendingExpansionRequest]) -> Result<(), StorageError> {
        if let Ok(mut slot) = self.requests.lock() {
            *slot = requests.to_vec();
        }
        Ok(())
    }
}
