//! Follow-up job scheduling.
//!
//! Writers enqueue jobs and never look at the outcome. A job names the
//! channel, the entity kind and the local ids to export.
//!
//! A queue opened on a file rewrites it on every change, so jobs outlive
//! the process that scheduled them. A job leaves the queue only once it
//! has run.

use crate::error::{SyncError, SyncResult};
use crate::kind::EntityKind;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use zensync_model::{ChannelId, LocalId};

/// Payload of a scheduled job.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct JobPayload {
    /// Local ids of the records to sync.
    pub ids: Vec<LocalId>,
}

impl JobPayload {
    /// Creates a payload for the given ids.
    pub fn with_ids(ids: Vec<LocalId>) -> Self {
        Self { ids }
    }
}

/// A job waiting to run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledJob {
    /// Channel to sync.
    pub channel: ChannelId,
    /// Entity kind to export.
    pub kind: EntityKind,
    /// Records to export.
    pub payload: JobPayload,
}

/// Enqueues follow-up sync jobs.
pub trait SyncScheduler: Send + Sync {
    /// Enqueues a job. Fire and forget.
    fn schedule(&self, channel: ChannelId, kind: EntityKind, payload: JobPayload);
}

impl<T: SyncScheduler + ?Sized> SyncScheduler for &T {
    fn schedule(&self, channel: ChannelId, kind: EntityKind, payload: JobPayload) {
        (**self).schedule(channel, kind, payload);
    }
}

/// FIFO job queue, in memory or backed by a JSON file.
///
/// The file is not locked; callers hold the store lock while the queue is
/// open.
#[derive(Debug, Default)]
pub struct QueueScheduler {
    jobs: Mutex<VecDeque<ScheduledJob>>,
    path: Option<PathBuf>,
}

impl QueueScheduler {
    /// Creates an empty in-memory queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens the queue persisted at `path`, empty if the file is absent.
    ///
    /// # Errors
    ///
    /// Returns `Queue` if the file cannot be read or parsed.
    pub fn open(path: &Path) -> SyncResult<Self> {
        let jobs = if path.exists() {
            let data = fs::read(path).map_err(|e| SyncError::queue(path, e))?;
            if data.is_empty() {
                VecDeque::new()
            } else {
                serde_json::from_slice(&data).map_err(|e| SyncError::queue(path, e))?
            }
        } else {
            VecDeque::new()
        };
        tracing::debug!(path = %path.display(), jobs = jobs.len(), "opened job queue");
        Ok(Self {
            jobs: Mutex::new(jobs),
            path: Some(path.to_path_buf()),
        })
    }

    /// Returns the backing file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Number of waiting jobs.
    pub fn len(&self) -> usize {
        self.jobs.lock().len()
    }

    /// Returns true if no job is waiting.
    pub fn is_empty(&self) -> bool {
        self.jobs.lock().is_empty()
    }

    /// Copies the waiting jobs without removing them.
    pub fn pending(&self) -> Vec<ScheduledJob> {
        self.jobs.lock().iter().cloned().collect()
    }

    /// Removes and returns the oldest job.
    pub fn pop(&self) -> Option<ScheduledJob> {
        let mut jobs = self.jobs.lock();
        let job = jobs.pop_front();
        if job.is_some() {
            self.save_or_warn(&jobs);
        }
        job
    }

    /// Removes and returns every waiting job, oldest first.
    pub fn drain(&self) -> Vec<ScheduledJob> {
        let mut jobs = self.jobs.lock();
        let drained: Vec<_> = jobs.drain(..).collect();
        self.save_or_warn(&jobs);
        drained
    }

    /// Returns the oldest job of `channel`, leaving it queued.
    pub fn next_for(&self, channel: ChannelId) -> Option<ScheduledJob> {
        self.jobs.lock().iter().find(|job| job.channel == channel).cloned()
    }

    /// Removes a job that has run.
    ///
    /// # Errors
    ///
    /// Returns `Queue` if the backing file cannot be rewritten.
    pub fn complete(&self, job: &ScheduledJob) -> SyncResult<()> {
        let mut jobs = self.jobs.lock();
        if let Some(index) = jobs.iter().position(|queued| queued == job) {
            jobs.remove(index);
        }
        self.save(&jobs)
    }

    fn save(&self, jobs: &VecDeque<ScheduledJob>) -> SyncResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let data = serde_json::to_vec_pretty(jobs).map_err(|e| SyncError::queue(path, e))?;
        let temp_path = path.with_extension("json.tmp");
        let write = || -> std::io::Result<()> {
            let mut file = File::create(&temp_path)?;
            file.write_all(&data)?;
            file.sync_all()?;
            drop(file);
            fs::rename(&temp_path, path)
        };
        write().map_err(|e| SyncError::queue(path, e))
    }

    fn save_or_warn(&self, jobs: &VecDeque<ScheduledJob>) {
        if let Err(e) = self.save(jobs) {
            tracing::warn!(error = %e, "job queue not saved");
        }
    }
}

impl SyncScheduler for QueueScheduler {
    fn schedule(&self, channel: ChannelId, kind: EntityKind, payload: JobPayload) {
        tracing::debug!(%channel, %kind, ids = payload.ids.len(), "job scheduled");
        let mut jobs = self.jobs.lock();
        jobs.push_back(ScheduledJob {
            channel,
            kind,
            payload,
        });
        self.save_or_warn(&jobs);
    }
}
