//! Per-batch counters.

use crate::error::SyncError;
use std::fmt;

/// Counters of one batch.
///
/// Every processed record moves exactly one of `added`, `updated` or
/// `errors`, except cascades on export which may add more than one record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Records read from the source.
    pub read: u64,
    /// Records created.
    pub added: u64,
    /// Records updated.
    pub updated: u64,
    /// Records skipped because of an error.
    pub errors: u64,
    /// Fallbacks applied (default user substitutions).
    pub warnings: u64,
    /// Messages of record-level errors.
    pub error_messages: Vec<String>,
}

impl BatchReport {
    /// Creates an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts a read record.
    pub fn increment_read_count(&mut self) {
        self.read += 1;
    }

    /// Counts a created record.
    pub fn increment_add_count(&mut self) {
        self.added += 1;
    }

    /// Counts an updated record.
    pub fn increment_update_count(&mut self) {
        self.updated += 1;
    }

    /// Counts a fallback.
    pub fn increment_warning_count(&mut self) {
        self.warnings += 1;
    }

    /// Counts a skipped record.
    pub fn add_error(&mut self, error: &SyncError) {
        self.errors += 1;
        self.error_messages.push(error.to_string());
    }

    /// Adds the counters of another report.
    pub fn merge(&mut self, other: BatchReport) {
        self.read += other.read;
        self.added += other.added;
        self.updated += other.updated;
        self.errors += other.errors;
        self.warnings += other.warnings;
        self.error_messages.extend(other.error_messages);
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "read={} added={} updated={} errors={} warnings={}",
            self.read, self.added, self.updated, self.errors, self.warnings
        )
    }
}
