//! Batch leases.
//!
//! At most one batch per channel and entity kind may run at a time. A
//! [`BatchLease`] is held for the duration of a batch and released on drop.
//!
//! Lock directory layout for [`FileLocks`]:
//!
//! ```text
//! <lock_dir>/
//! ├─ 1-user.lock
//! ├─ 1-ticket.lock
//! └─ 1-ticket_comment.lock
//! ```

use crate::error::{SyncError, SyncResult};
use crate::kind::EntityKind;
use fs2::FileExt;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use zensync_model::ChannelId;

type LeaseKey = (ChannelId, EntityKind);

/// Grants exclusive batch leases.
pub trait BatchLock: Send + Sync {
    /// Acquires the lease for one channel and kind without waiting.
    ///
    /// Returns [`SyncError::BatchInProgress`] if the lease is taken.
    fn acquire(&self, channel: ChannelId, kind: EntityKind) -> SyncResult<BatchLease>;
}

impl<T: BatchLock + ?Sized> BatchLock for &T {
    fn acquire(&self, channel: ChannelId, kind: EntityKind) -> SyncResult<BatchLease> {
        (**self).acquire(channel, kind)
    }
}

#[derive(Debug)]
enum Held {
    Memory(Arc<Mutex<HashSet<LeaseKey>>>),
    File(File),
}

/// A held batch lease.
#[derive(Debug)]
pub struct BatchLease {
    key: LeaseKey,
    held: Held,
}

impl BatchLease {
    /// Channel the lease covers.
    pub fn channel(&self) -> ChannelId {
        self.key.0
    }

    /// Entity kind the lease covers.
    pub fn kind(&self) -> EntityKind {
        self.key.1
    }
}

impl Drop for BatchLease {
    fn drop(&mut self) {
        match &self.held {
            Held::Memory(held) => {
                held.lock().remove(&self.key);
            }
            Held::File(file) => {
                if let Err(e) = file.unlock() {
                    tracing::warn!(error = %e, "failed to release batch lock");
                }
            }
        }
        tracing::debug!(channel = %self.key.0, kind = %self.key.1, "batch lease released");
    }
}

/// Leases held in process memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryLocks {
    held: Arc<Mutex<HashSet<LeaseKey>>>,
}

impl MemoryLocks {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the lease is currently held.
    pub fn is_held(&self, channel: ChannelId, kind: EntityKind) -> bool {
        self.held.lock().contains(&(channel, kind))
    }
}

impl BatchLock for MemoryLocks {
    fn acquire(&self, channel: ChannelId, kind: EntityKind) -> SyncResult<BatchLease> {
        let key = (channel, kind);
        if !self.held.lock().insert(key) {
            return Err(SyncError::BatchInProgress { channel, kind });
        }
        Ok(BatchLease {
            key,
            held: Held::Memory(Arc::clone(&self.held)),
        })
    }
}

/// Leases held as advisory file locks, shared between processes.
#[derive(Debug, Clone)]
pub struct FileLocks {
    dir: PathBuf,
}

impl FileLocks {
    /// Uses `dir` for lock files, creating it if needed.
    pub fn open(dir: &Path) -> SyncResult<Self> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    /// Returns the lock directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.dir
    }

    fn lock_path(&self, channel: ChannelId, kind: EntityKind) -> PathBuf {
        self.dir.join(format!("{}-{}.lock", channel.as_u64(), kind))
    }
}

impl BatchLock for FileLocks {
    fn acquire(&self, channel: ChannelId, kind: EntityKind) -> SyncResult<BatchLease> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(self.lock_path(channel, kind))?;
        if file.try_lock_exclusive().is_err() {
            return Err(SyncError::BatchInProgress { channel, kind });
        }
        Ok(BatchLease {
            key: (channel, kind),
            held: Held::File(file),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const CHANNEL: ChannelId = ChannelId::new(1);

    #[test]
    fn memory_lease_is_exclusive() {
        let locks = MemoryLocks::new();
        let lease = locks.acquire(CHANNEL, EntityKind::Ticket).unwrap();
        assert_eq!(lease.kind(), EntityKind::Ticket);

        let second = locks.acquire(CHANNEL, EntityKind::Ticket);
        assert!(matches!(second, Err(SyncError::BatchInProgress { .. })));

        // Other kinds and channels are independent.
        let _users = locks.acquire(CHANNEL, EntityKind::User).unwrap();
        let _other = locks.acquire(ChannelId::new(2), EntityKind::Ticket).unwrap();
    }

    #[test]
    fn memory_lease_released_on_drop() {
        let locks = MemoryLocks::new();
        {
            let _lease = locks.acquire(CHANNEL, EntityKind::User).unwrap();
            assert!(locks.is_held(CHANNEL, EntityKind::User));
        }
        assert!(!locks.is_held(CHANNEL, EntityKind::User));
        let _again = locks.acquire(CHANNEL, EntityKind::User).unwrap();
    }

    #[test]
    fn file_lease_is_exclusive() {
        let temp = tempdir().unwrap();
        let locks = FileLocks::open(&temp.path().join("locks")).unwrap();
        let other = FileLocks::open(locks.path()).unwrap();

        let _lease = locks.acquire(CHANNEL, EntityKind::TicketComment).unwrap();
        assert!(temp.path().join("locks/1-ticket_comment.lock").exists());

        let second = other.acquire(CHANNEL, EntityKind::TicketComment);
        assert!(matches!(second, Err(SyncError::BatchInProgress { .. })));
    }

    #[test]
    fn file_lease_released_on_drop() {
        let temp = tempdir().unwrap();
        let locks = FileLocks::open(temp.path()).unwrap();
        {
            let _lease = locks.acquire(CHANNEL, EntityKind::Ticket).unwrap();
        }
        let _again = locks.acquire(CHANNEL, EntityKind::Ticket).unwrap();
    }
}
