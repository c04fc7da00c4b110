//! Error types for the entity model.

use thiserror::Error;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors that can occur while building model values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// A machine name does not belong to the lookup.
    #[error("unknown {kind} '{name}'")]
    UnknownLookup {
        /// Lookup kind (e.g. `ticket_status`).
        kind: &'static str,
        /// The rejected machine name.
        name: String,
    },
}
