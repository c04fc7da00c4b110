//! CLI command implementations.

pub mod apply_cases;
pub mod channel;
pub mod export;
pub mod import;
pub mod jobs;
pub mod status;

use std::path::Path;
use thiserror::Error;
use zensync_api::{ApiConfig, HttpTransport, ReqwestClient};
use zensync_engine::{BatchReport, EntityKind, FileLocks, QueueScheduler, SyncConfig, SyncRunner};
use zensync_model::{Channel, ChannelId};
use zensync_store::{EntityStore, FileStore};

/// Directory of batch lock files, inside the store directory.
const LOCKS_DIR: &str = "locks";

/// Follow-up job queue, inside the store directory.
const QUEUE_FILE: &str = "jobs.json";

/// Errors raised by the CLI itself.
#[derive(Debug, Error)]
pub enum CliError {
    /// No channel registered under the id.
    #[error("channel {0} not found")]
    ChannelNotFound(u64),

    /// The channel file holds no channel.
    #[error("no channel in {0}")]
    EmptyChannelFile(String),
}

/// Runner over the on-disk store.
pub type Runner = SyncRunner<FileStore, FileLocks>;

/// Opens the store and its lock directory.
pub fn open_runner(path: &Path) -> Result<Runner, Box<dyn std::error::Error>> {
    let store = FileStore::open(path)?;
    let locks = FileLocks::open(&path.join(LOCKS_DIR))?;
    Ok(SyncRunner::new(store, SyncConfig::default(), locks))
}

/// Opens the persisted follow-up job queue of the store.
///
/// Open the runner first; the store lock covers the queue file.
pub fn open_queue(path: &Path) -> Result<QueueScheduler, Box<dyn std::error::Error>> {
    Ok(QueueScheduler::open(&path.join(QUEUE_FILE))?)
}

/// Loads a registered channel.
pub fn load_channel<S: EntityStore>(
    store: &S,
    id: u64,
) -> Result<Channel, Box<dyn std::error::Error>> {
    let channel = store.get::<Channel>(ChannelId::new(id))?;
    Ok(channel.ok_or(CliError::ChannelNotFound(id))?)
}

/// Builds the HTTP transport of a channel.
pub fn http_transport(
    channel: &Channel,
) -> Result<HttpTransport<ReqwestClient>, Box<dyn std::error::Error>> {
    let config = ApiConfig::default();
    let client = ReqwestClient::new(&config)?;
    Ok(HttpTransport::new(channel.base_url(), &channel.transport, client)
        .with_page_size(config.page_size))
}

/// Prints one line per batch, then any record-level errors.
pub fn print_reports(channel: &Channel, reports: &[(EntityKind, BatchReport)]) {
    for (kind, report) in reports {
        println!("{} [{}] {}: {}", channel.name, channel.id, kind, report);
        for message in &report.error_messages {
            println!("  error: {}", message);
        }
    }
}
