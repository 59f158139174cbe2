//! Error types for PaperDB
//!
//! Provides a unified error type for all operations.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Result type alias using PaperError
pub type Result<T> = std::result::Result<T, PaperError>;

/// Unified error type for PaperDB operations
#[derive(Debug, Error)]
pub enum PaperError {
    // -------------------------------------------------------------------------
    // Naming Errors (raised before any filesystem access)
    // -------------------------------------------------------------------------
    #[error("Invalid key {key:?}: {reason}")]
    InvalidKey { key: String, reason: &'static str },

    #[error("Invalid book name {name:?}: {reason}")]
    InvalidBookName { name: String, reason: &'static str },

    #[error("{0} name is reserved for the default book")]
    ReservedName(String),

    // -------------------------------------------------------------------------
    // Entry Errors
    // -------------------------------------------------------------------------
    #[error("Cannot write an absent value for key {key:?}")]
    NullValue { key: String },

    #[error("Key not found: {key:?}")]
    KeyNotFound { key: String },

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Couldn't read/deserialize file {} for key {key:?}: {reason}", .path.display())]
    Deserialization {
        key: String,
        path: PathBuf,
        reason: String,
    },

    #[error("Couldn't serialize value for key {key:?}: {reason}")]
    Serialization { key: String, reason: String },

    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Registry has no root directory; call init() first")]
    NotInitialized,
}

/// Attaches the offending path to a raw `std::io::Error`.
pub(crate) trait IoContext<T> {
    fn at(self, path: &Path) -> Result<T>;
}

impl<T> IoContext<T> for std::io::Result<T> {
    fn at(self, path: &Path) -> Result<T> {
        self.map_err(|source| PaperError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}
