//! # ZenSync Model
//!
//! Records shared by every ZenSync crate.
//!
//! This crate provides:
//! - Zendesk-side records (tickets, comments, users) with local and origin ids
//! - CRM-side records (cases, case comments, CRM users, contacts)
//! - Lookup values with stable machine names and a separate label catalog
//! - Channel configuration
//! - Record metadata (tables, index keys) used by entity stores
//!
//! ## Identity
//!
//! Synced records carry a local id, assigned on first save, and an origin id
//! assigned by Zendesk. A record with no origin id has never been exported.
//! Every synced record belongs to exactly one channel.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod channel;
mod comment;
mod crm;
mod error;
mod ids;
mod labels;
mod lookup;
mod record;
mod ticket;
mod user;

pub use channel::{Channel, SyncPriority, SyncSettings, ZendeskCredentials};
pub use comment::TicketComment;
pub use crm::{Case, CaseComment, Contact, ContactEmail, CrmUser};
pub use error::{ModelError, ModelResult};
pub use ids::{
    same_reference, CaseCommentId, CaseId, ChannelId, ContactId, CrmUserId, LocalId, OriginId,
    RecordId, SyncRef,
};
pub use labels::{LabelCatalog, LabelKey};
pub use lookup::{
    CasePriority, CaseStatus, Lookup, TicketPriority, TicketStatus, TicketType, UserRole,
};
pub use record::{normalize_email, IndexKey, Record, Synced, Table};
pub use ticket::{Ticket, TicketRole};
pub use user::User;
