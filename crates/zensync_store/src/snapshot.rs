//! Table snapshot shared by the store implementations.
//!
//! Records are kept as JSON values alongside the index keys they declared
//! when saved. A [`Staged`] pair holds the committed snapshot and the working
//! copy that writes go to, plus the rows that differ between the two.
//! Commit and rollback copy only those rows.

use crate::error::{StoreError, StoreResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use zensync_model::{IndexKey, Record, RecordId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Row {
    keys: Vec<IndexKey>,
    body: serde_json::Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct TableData {
    next_id: u64,
    rows: BTreeMap<u64, Row>,
}

/// All tables of a store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct Snapshot {
    tables: BTreeMap<String, TableData>,
}

impl Snapshot {
    fn table<E: Record>(&self) -> Option<&TableData> {
        self.tables.get(&E::TABLE.to_string())
    }

    fn table_mut<E: Record>(&mut self) -> &mut TableData {
        self.tables.entry(E::TABLE.to_string()).or_default()
    }

    fn row<E: Record>(&self, id: E::Id) -> Option<&Row> {
        self.table::<E>().and_then(|t| t.rows.get(&id.raw()))
    }

    pub(crate) fn get<E: Record>(&self, id: E::Id) -> StoreResult<Option<E>> {
        self.row::<E>(id).map(decode::<E>).transpose()
    }

    pub(crate) fn find_all<E: Record>(&self, key: &IndexKey) -> StoreResult<Vec<E>> {
        let Some(table) = self.table::<E>() else {
            return Ok(Vec::new());
        };
        table
            .rows
            .values()
            .filter(|row| row.keys.contains(key))
            .map(decode::<E>)
            .collect()
    }

    pub(crate) fn all<E: Record>(&self) -> StoreResult<Vec<E>> {
        let Some(table) = self.table::<E>() else {
            return Ok(Vec::new());
        };
        table.rows.values().map(decode::<E>).collect()
    }

    pub(crate) fn save<E: Record>(&mut self, entity: &mut E) -> StoreResult<E::Id> {
        let table = self.table_mut::<E>();
        let id = match entity.id() {
            Some(id) => {
                table.next_id = table.next_id.max(id.raw() + 1);
                id
            }
            None => {
                let raw = table.next_id.max(1);
                table.next_id = raw + 1;
                let id = E::Id::from_raw(raw);
                entity.assign_id(id);
                id
            }
        };

        let body = serde_json::to_value(&*entity).map_err(|e| StoreError::codec(E::TABLE, e))?;
        let row = Row {
            keys: entity.index_keys(),
            body,
        };
        table.rows.insert(id.raw(), row);
        Ok(id)
    }

    /// Copies one row of `source` over this snapshot.
    fn restore<E: Record>(&mut self, source: &Snapshot, id: E::Id) {
        match source.row::<E>(id) {
            Some(row) => {
                self.table_mut::<E>().rows.insert(id.raw(), row.clone());
            }
            None => {
                self.table_mut::<E>().rows.remove(&id.raw());
            }
        }
    }

    /// Copies the given rows and the id counter of `table` from `source`.
    fn copy_rows(&mut self, source: &Snapshot, table: &str, ids: &BTreeSet<u64>) {
        let empty = TableData::default();
        let from = source.tables.get(table).unwrap_or(&empty);
        let to = self.tables.entry(table.to_string()).or_default();
        to.next_id = from.next_id;
        for id in ids {
            match from.rows.get(id) {
                Some(row) => {
                    to.rows.insert(*id, row.clone());
                }
                None => {
                    to.rows.remove(id);
                }
            }
        }
    }

    pub(crate) fn record_count(&self) -> usize {
        self.tables.values().map(|t| t.rows.len()).sum()
    }
}

fn decode<E: Record>(row: &Row) -> StoreResult<E> {
    serde_json::from_value(row.body.clone()).map_err(|e| StoreError::codec(E::TABLE, e))
}

/// Committed snapshot plus the working copy writes go to.
#[derive(Debug, Default)]
pub(crate) struct Staged {
    pub(crate) committed: Snapshot,
    pub(crate) working: Snapshot,
    /// Rows of `working` that differ from `committed`, per table.
    dirty: BTreeMap<String, BTreeSet<u64>>,
}

impl Staged {
    pub(crate) fn from_committed(committed: Snapshot) -> Self {
        Self {
            working: committed.clone(),
            committed,
            dirty: BTreeMap::new(),
        }
    }

    pub(crate) fn save<E: Record>(&mut self, entity: &mut E) -> StoreResult<E::Id> {
        let id = self.working.save(entity)?;
        let changed = self.working.row::<E>(id) != self.committed.row::<E>(id);
        if changed {
            self.dirty.entry(E::TABLE.to_string()).or_default().insert(id.raw());
        } else {
            self.clean::<E>(id);
        }
        Ok(id)
    }

    pub(crate) fn refresh<E: Record>(&mut self, id: E::Id) -> StoreResult<Option<E>> {
        self.working.restore::<E>(&self.committed, id);
        self.clean::<E>(id);
        self.committed.get(id)
    }

    pub(crate) fn commit(&mut self) {
        for (table, rows) in std::mem::take(&mut self.dirty) {
            self.committed.copy_rows(&self.working, &table, &rows);
        }
    }

    pub(crate) fn rollback(&mut self) {
        for (table, rows) in std::mem::take(&mut self.dirty) {
            self.working.copy_rows(&self.committed, &table, &rows);
        }
    }

    pub(crate) fn has_pending(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// Forgets a row that matches its committed state again.
    fn clean<E: Record>(&mut self, id: E::Id) {
        let table = E::TABLE.to_string();
        if let Some(rows) = self.dirty.get_mut(&table) {
            rows.remove(&id.raw());
            if rows.is_empty() {
                self.dirty.remove(&table);
            }
        }
    }
}
