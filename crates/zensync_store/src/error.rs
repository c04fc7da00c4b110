//! Error types for entity store operations.

use std::io;
use std::path::PathBuf;
use thiserror::Error;
use zensync_model::Table;

/// Result type for entity store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur during entity store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A record could not be encoded or decoded.
    #[error("codec error in table '{table}': {source}")]
    Codec {
        /// Table of the record.
        table: Table,
        /// Underlying serde error.
        #[source]
        source: serde_json::Error,
    },

    /// The snapshot file is unreadable.
    #[error("store snapshot corrupted: {0}")]
    Corrupted(String),

    /// Another process holds the store.
    #[error("store is locked by another process: {}", .0.display())]
    Locked(PathBuf),
}

impl StoreError {
    pub(crate) fn codec(table: Table, source: serde_json::Error) -> Self {
        Self::Codec { table, source }
    }
}
