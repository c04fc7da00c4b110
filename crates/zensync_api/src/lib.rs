//! # ZenSync API
//!
//! Zendesk REST API transport for ZenSync.
//!
//! This crate provides:
//! - JSON shapes of Zendesk users, tickets and comments
//! - Conversions between those shapes and [`zensync_model`] records
//! - The [`ZendeskTransport`] abstraction with an HTTP implementation
//! - [`MockTransport`], an in-memory Zendesk account for tests
//!
//! ## Errors
//!
//! Every failure is an [`ApiError`]. Connection, authentication and rate
//! limit failures abort the running batch; the others only fail the record
//! being written.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod client;
mod config;
mod convert;
mod error;
mod http;
mod transport;
mod wire;

pub use client::ReqwestClient;
pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use http::{HttpClient, HttpRequest, HttpResponse, HttpTransport, Method};
pub use transport::{ApiCall, MockTransport, ZendeskTransport};
pub use wire::{CreatedTicket, RemoteComment, RemoteRecord, RemoteTicket, RemoteUser};
