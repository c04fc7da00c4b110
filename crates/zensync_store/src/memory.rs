//! In-memory entity store for testing.

use crate::error::StoreResult;
use crate::snapshot::Staged;
use crate::store::EntityStore;
use parking_lot::RwLock;
use zensync_model::{IndexKey, Record};

/// An in-memory entity store.
///
/// This store keeps all records in memory and is suitable for:
/// - Unit tests
/// - Integration tests
/// - Dry runs that must not touch disk
///
/// # Thread Safety
///
/// This store is thread-safe and can be shared across threads.
///
/// # Example
///
/// ```rust
/// use zensync_model::CrmUser;
/// use zensync_store::{EntityStore, InMemoryStore};
///
/// let store = InMemoryStore::new();
/// let mut user = CrmUser::new("Ada", "ada@example.com");
/// let id = store.save(&mut user).unwrap();
/// assert_eq!(user.id, Some(id));
/// store.flush().unwrap();
/// ```
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<Staged>,
}

impl InMemoryStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of committed records across all tables.
    #[must_use]
    pub fn committed_len(&self) -> usize {
        self.state.read().committed.record_count()
    }
}

impl EntityStore for InMemoryStore {
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
        self.state.write().commit();
        Ok(())
    }

    fn rollback(&self) {
        self.state.write().rollback();
    }

    fn has_pending(&self) -> bool {
        self.state.read().has_pending()
    }
}
