//! File-backed entity store.
//!
//! Layout of a store directory:
//!
//! ```text
//! <store_dir>/
//! ├─ LOCK              # Advisory lock for single-writer
//! └─ store.json        # Committed snapshot
//! ```

use crate::error::{StoreError, StoreResult};
use crate::snapshot::{Snapshot, Staged};
use crate::store::EntityStore;
use fs2::FileExt;
use parking_lot::RwLock;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use zensync_model::{IndexKey, Record};

const LOCK_FILE: &str = "LOCK";
const SNAPSHOT_FILE: &str = "store.json";
const SNAPSHOT_TEMP: &str = "store.json.tmp";

/// An entity store persisted as a JSON snapshot.
///
/// The store holds an exclusive lock on its directory for its whole
/// lifetime, so two sync processes never share one store. Staged writes are
/// kept in memory; `flush` writes the full snapshot with write-then-rename.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    state: RwLock<Staged>,
    _lock_file: File,
}

impl FileStore {
    /// Opens the store in `path`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Another process holds the lock (returns `Locked`)
    /// - The snapshot cannot be parsed
    /// - I/O errors occur
    pub fn open(path: &Path) -> StoreResult<Self> {
        fs::create_dir_all(path)?;

        let lock_path = path.join(LOCK_FILE);
        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;
        if lock_file.try_lock_exclusive().is_err() {
            return Err(StoreError::Locked(lock_path));
        }

        let committed = load_snapshot(&path.join(SNAPSHOT_FILE))?;
        tracing::debug!(path = %path.display(), records = committed.record_count(), "opened entity store");

        Ok(Self {
            path: path.to_path_buf(),
            state: RwLock::new(Staged::from_committed(committed)),
            _lock_file: lock_file,
        })
    }

    /// Returns the store directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_snapshot(&self, snapshot: &Snapshot) -> StoreResult<()> {
        let data = serde_json::to_vec_pretty(snapshot)
            .map_err(|e| StoreError::Corrupted(e.to_string()))?;

        let temp_path = self.path.join(SNAPSHOT_TEMP);
        let mut file = File::create(&temp_path)?;
        file.write_all(&data)?;
        file.sync_all()?;
        drop(file);

        fs::rename(&temp_path, self.path.join(SNAPSHOT_FILE))?;
        Ok(())
    }
}

fn load_snapshot(path: &Path) -> StoreResult<Snapshot> {
    if !path.exists() {
        return Ok(Snapshot::default());
    }
    let data = fs::read(path)?;
    if data.is_empty() {
        return Ok(Snapshot::default());
    }
    serde_json::from_slice(&data).map_err(|e| StoreError::Corrupted(e.to_string()))
}

impl EntityStore for FileStore {
    fn get<E: Record>(&self, id: E::Id) -> StoreResult<Option<E>> {
        self.state.read().working.get(id)
    }

    fn find_all<E: Record>(&self, key: &IndexKey) -> StoreResult<Vec<E>> {
        self.state.read().working.find_all(key)
    }

    fn all<E: Record>(&self) -> StoreResult<Vec<E>> {
        self.state.read().working.all()
    }

    fn save<E: Record>(&self, entity: &mut E) -> StoreResult<E::Id> {
        self.state.write().save(entity)
    }

    fn refresh<E: Record>(&self, id: E::Id) -> StoreResult<Option<E>> {
        self.state.write().refresh(id)
    }

    fn flush(&self) -> StoreResult<()> {
        let mut state = self.state.write();
        if !state.has_pending() {
            return Ok(());
        }
        self.write_snapshot(&state.working)?;
        state.commit();
        Ok(())
    }

    fn rollback(&self) {
        self.state.write().rollback();
    }

    fn has_pending(&self) -> bool {
        self.state.read().has_pending()
    }
}
