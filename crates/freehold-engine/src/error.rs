//! Error types for the claim engine binary.
//!
//! [`EngineError`] is the top-level error type that wraps the failure
//! modes of engine startup, providing a single error type that `main` can
//! propagate with `?`.

/// Top-level error for the claim engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: crate::config::ConfigError,
    },

    /// A storage operation failed.
    #[error("storage error: {source}")]
    Storage {
        /// The underlying storage error.
        #[from]
        source: freehold_persist::StorageError,
    },
}
