//! # ZenSync Testkit
//!
//! Test utilities for ZenSync.
//!
//! This crate provides:
//! - Channel, user, ticket and case fixtures
//! - Temporary file stores
//! - A seeded mock Zendesk account
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust,ignore
//! use zensync_testkit::prelude::*;
//!
//! #[test]
//! fn imports_seeded_account() {
//!     let channel = test_channel();
//!     let account = seeded_account();
//!     // ... run an import against `account.transport`
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use fixtures::*;
pub use generators::*;
