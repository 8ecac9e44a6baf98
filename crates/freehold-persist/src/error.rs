//! Error types for the persistence layer.

use thiserror::Error;

/// Errors that can occur while loading or saving claim state.
#[derive(Debug, Error)]
pub enum StorageError {
    /// A filesystem operation failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A snapshot could not be serialized or parsed.
    #[error("snapshot serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The snapshot on disk declares a version this build cannot read.
    #[error("unsupported snapshot version {found} (expected {expected})")]
    UnsupportedVersion {
        /// The version field found in the snapshot.
        found: u32,
        /// The version this build writes and reads.
        expected: u32,
    },
}
