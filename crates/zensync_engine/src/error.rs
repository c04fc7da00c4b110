//! Error types for the sync engine.

use crate::kind::EntityKind;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use thiserror::Error;
use zensync_api::ApiError;
use zensync_model::ChannelId;
use zensync_store::StoreError;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur during sync operations.
///
/// Record-level errors fail one record and are counted; the batch goes on.
/// Every other error aborts the batch and rolls back its uncommitted writes.
#[derive(Error, Debug)]
pub enum SyncError {
    /// The payload is not the entity the processor handles.
    #[error("expected {expected} record, got {found}")]
    TypeMismatch {
        /// Entity the processor handles.
        expected: EntityKind,
        /// Kind of the payload.
        found: &'static str,
    },

    /// A remote record has no origin id.
    #[error("{0} record has no origin id")]
    MissingOriginId(EntityKind),

    /// A required reference is absent.
    #[error("{0}")]
    MissingRequiredLink(String),

    /// A reference could not be resolved locally.
    #[error("{0}")]
    UnresolvedReference(String),

    /// A remote write failed for this record only.
    #[error("remote write failed: {0}")]
    RemoteWrite(ApiError),

    /// The remote API failed for the whole batch.
    #[error("zendesk API error: {0}")]
    Api(ApiError),

    /// Persistence failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Another batch holds the lease.
    #[error("{kind} batch already running for channel {channel}")]
    BatchInProgress {
        /// Channel.
        channel: ChannelId,
        /// Entity kind.
        kind: EntityKind,
    },

    /// The lease registry failed.
    #[error("lock error: {0}")]
    Lock(#[from] std::io::Error),

    /// The persisted job queue could not be read or written.
    #[error("job queue {}: {message}", .path.display())]
    Queue {
        /// Queue file.
        path: PathBuf,
        /// What went wrong.
        message: String,
    },
}

impl SyncError {
    pub(crate) fn queue(path: &Path, error: impl Display) -> Self {
        Self::Queue {
            path: path.to_path_buf(),
            message: error.to_string(),
        }
    }

    /// Classifies a failed remote write.
    pub fn remote_write(error: ApiError) -> Self {
        if error.aborts_batch() {
            Self::Api(error)
        } else {
            Self::RemoteWrite(error)
        }
    }

    /// Returns true if only the current record failed.
    pub fn is_record_level(&self) -> bool {
        matches!(
            self,
            SyncError::TypeMismatch { .. }
                | SyncError::MissingOriginId(_)
                | SyncError::MissingRequiredLink(_)
                | SyncError::UnresolvedReference(_)
                | SyncError::RemoteWrite(_)
        )
    }

    /// Returns true if a failed batch can be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::Api(e) => e.is_retryable(),
            SyncError::Store(StoreError::Io(_)) => true,
            _ => false,
        }
    }
}

impl From<ApiError> for SyncError {
    fn from(error: ApiError) -> Self {
        Self::Api(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_level_errors() {
        assert!(SyncError::MissingRequiredLink("Comment Ticket required.".into()).is_record_level());
        assert!(SyncError::MissingOriginId(EntityKind::User).is_record_level());
        assert!(SyncError::remote_write(ApiError::Validation("bad".into())).is_record_level());
        assert!(!SyncError::Api(ApiError::Timeout).is_record_level());
    }

    #[test]
    fn batch_fatal_remote_errors() {
        let err = SyncError::remote_write(ApiError::Authentication("token".into()));
        assert!(matches!(err, SyncError::Api(_)));
        assert!(!err.is_record_level());
        assert!(!err.is_retryable());

        let err = SyncError::remote_write(ApiError::RateLimited { retry_after: None });
        assert!(err.is_retryable());
    }

    #[test]
    fn error_display() {
        let err = SyncError::TypeMismatch {
            expected: EntityKind::TicketComment,
            found: "user",
        };
        assert_eq!(err.to_string(), "expected ticket_comment record, got user");

        let err = SyncError::BatchInProgress {
            channel: ChannelId::new(3),
            kind: EntityKind::Ticket,
        };
        assert_eq!(err.to_string(), "ticket batch already running for channel channel:3");
    }
}
