//! # ZenSync Engine
//!
//! Reconciliation of Zendesk tickets, comments and users with a CRM's
//! cases, case comments, users and contacts.
//!
//! This crate provides:
//! - Channel-scoped identity resolution
//! - Explicit field-level change sets
//! - Per-entity sync helpers and the case-ticket linkage
//! - Import processing and export writers
//! - Follow-up job scheduling, batch leases and the batch runner
//!
//! ## Architecture
//!
//! Import and export are batch jobs for one channel and one entity kind:
//! 1. The runner acquires the batch lease
//! 2. Records are processed one at a time; record-level failures are counted
//! 3. The store is flushed, or rolled back when the batch fails
//!
//! ## Key Invariants
//!
//! - A remote record maps to at most one local record per channel
//! - Every imported record moves exactly one of added, updated or errors
//! - A failed remote write leaves the local record untouched
//! - At most one batch per channel and entity kind runs at a time

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod changes;
mod config;
mod error;
mod export;
mod helper;
mod import;
mod kind;
mod linkage;
mod lock;
mod report;
mod resolver;
mod runner;
mod scheduler;

pub use changes::{CaseChanges, CaseField, ChangeSet, FieldSet, TicketChanges, TicketField};
pub use config::{RetryConfig, SyncConfig};
pub use error::{SyncError, SyncResult};
pub use export::{ExportWriter, TicketCommentExportWriter, TicketExportWriter, UserExportWriter};
pub use helper::{
    split_name, NameParts, SyncHelper, SyncScope, TicketCommentSyncHelper, TicketSyncHelper,
    UserSyncHelper,
};
pub use import::ImportProcessor;
pub use kind::EntityKind;
pub use linkage::{
    apply_case_to_ticket, case_comment_from_ticket_comment, case_from_ticket, case_priority,
    case_status, ticket_changes_from_case, ticket_comment_from_case_comment, ticket_priority,
    ticket_status,
};
pub use lock::{BatchLease, BatchLock, FileLocks, MemoryLocks};
pub use report::BatchReport;
pub use resolver::IdentityResolver;
pub use runner::{SyncRunner, IMPORT_ORDER};
pub use scheduler::{JobPayload, QueueScheduler, ScheduledJob, SyncScheduler};
