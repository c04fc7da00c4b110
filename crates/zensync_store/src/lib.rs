//! # ZenSync Store
//!
//! Entity store trait and implementations for ZenSync.
//!
//! Stores are **storage-agnostic record tables**: they persist any
//! [`zensync_model::Record`] and find records by the index keys the record
//! declares. They know nothing about sync rules.
//!
//! ## Available Stores
//!
//! - [`InMemoryStore`] - For testing and dry runs
//! - [`FileStore`] - JSON snapshot guarded by an exclusive lock file
//!
//! ## Example
//!
//! ```rust
//! use zensync_model::{Case, IndexKey, CaseComment};
//! use zensync_store::{EntityStore, InMemoryStore};
//!
//! let store = InMemoryStore::new();
//! let mut case = Case::new("Printer on fire");
//! let case_id = store.save(&mut case).unwrap();
//!
//! let mut comment = CaseComment::new(case_id, "On it");
//! store.save(&mut comment).unwrap();
//!
//! let comments: Vec<CaseComment> = store.find_all(&IndexKey::Case(case_id)).unwrap();
//! assert_eq!(comments.len(), 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod file;
mod memory;
mod snapshot;
mod store;

pub use error::{StoreError, StoreResult};
pub use file::FileStore;
pub use memory::InMemoryStore;
pub use store::EntityStore;
