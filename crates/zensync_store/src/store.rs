//! Entity store trait definition.

use crate::error::StoreResult;
use zensync_model::{IndexKey, Record};

/// Persistence capability used by the sync engine.
///
/// Stores hold typed records in tables and index them by the keys each
/// record declares. Writes are **staged**: they are visible to later reads
/// through the same store immediately, but only become durable on `flush`.
///
/// # Invariants
///
/// - `save` assigns an id to records that have none and never reuses an id
/// - `find_one` and `find_all` return records in ascending id order
/// - `flush` commits every staged write; `rollback` discards them
/// - `refresh` discards staged changes to one record
///
/// # Implementors
///
/// - [`super::InMemoryStore`] - For testing
/// - [`super::FileStore`] - JSON snapshot on disk
pub trait EntityStore: Send + Sync {
    /// Loads a record by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored record cannot be decoded.
    fn get<E: Record>(&self, id: E::Id) -> StoreResult<Option<E>>;

    /// Returns the first record indexed by `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if a stored record cannot be decoded.
    fn find_one<E: Record>(&self, key: &IndexKey) -> StoreResult<Option<E>> {
        Ok(self.find_all(key)?.into_iter().next())
    }

    /// Returns every record indexed by `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if a stored record cannot be decoded.
    fn find_all<E: Record>(&self, key: &IndexKey) -> StoreResult<Vec<E>>;

    /// Returns every record of a table.
    ///
    /// # Errors
    ///
    /// Returns an error if a stored record cannot be decoded.
    fn all<E: Record>(&self) -> StoreResult<Vec<E>>;

    /// Inserts or updates a record, assigning an id on first save.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be encoded.
    fn save<E: Record>(&self, entity: &mut E) -> StoreResult<E::Id>;

    /// Reloads the committed state of a record, dropping staged changes.
    ///
    /// Returns `None` if the record was never committed.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored record cannot be decoded.
    fn refresh<E: Record>(&self, id: E::Id) -> StoreResult<Option<E>>;

    /// Commits staged writes.
    ///
    /// # Errors
    ///
    /// Returns an error if the commit cannot be made durable.
    fn flush(&self) -> StoreResult<()>;

    /// Discards staged writes.
    fn rollback(&self);

    /// Returns true if there are uncommitted writes.
    fn has_pending(&self) -> bool;
}

impl<T: EntityStore> EntityStore for &T {
    fn get<E: Record>(&self, id: E::Id) -> StoreResult<Option<E>> {
        (**self).get(id)
    }

    fn find_one<E: Record>(&self, key: &IndexKey) -> StoreResult<Option<E>> {
        (**self).find_one(key)
    }

    fn find_all<E: Record>(&self, key: &IndexKey) -> StoreResult<Vec<E>> {
        (**self).find_all(key)
    }

    fn all<E: Record>(&self) -> StoreResult<Vec<E>> {
        (**self).all()
    }

    fn save<E: Record>(&self, entity: &mut E) -> StoreResult<E::Id> {
        (**self).save(entity)
    }

    fn refresh<E: Record>(&self, id: E::Id) -> StoreResult<Option<E>> {
        (**self).refresh(id)
    }

    fn flush(&self) -> StoreResult<()> {
        (**self).flush()
    }

    fn rollback(&self) {
        (**self).rollback();
    }

    fn has_pending(&self) -> bool {
        (**self).has_pending()
    }
}
