use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::errors::StoreError;
use crate::state::entry::StoredEntry;

/// Direction of a range scan over the `dateTime` index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOrder {
    Ascending,
    Descending,
}

/// Durable log table: point access by id plus an ordered secondary index
/// keyed by `(partition_tag, date_time)`.
///
/// Writes must be visible to the next range read. Entries sharing a
/// `date_time` may come back in any relative order.
pub trait LogTable: Send + Sync {
    /// Name the table was configured with.
    fn name(&self) -> &str;

    /// Create or overwrite the entry stored under `entry.id`.
    fn put(&self, entry: StoredEntry) -> Result<(), StoreError>;

    fn get(&self, id: &str) -> Result<Option<StoredEntry>, StoreError>;

    fn len(&self) -> Result<usize, StoreError>;

    /// Up to `limit` entries of `partition`, ordered by `date_time`.
    fn query_partition(
        &self,
        partition: &str,
        order: ScanOrder,
        limit: usize,
    ) -> Result<Vec<StoredEntry>, StoreError>;
}

/// Shared table handle passed into every handler.
pub type SharedTable = Arc<dyn LogTable>;

#[derive(Default)]
struct Inner {
    items: HashMap<String, StoredEntry>,
    /// partition -> (date_time, id)
    index: HashMap<String, BTreeSet<(String, String)>>,
}

impl Inner {
    fn unindex(&mut self, entry: &StoredEntry) {
        if let Some(keys) = self.index.get_mut(&entry.partition_tag) {
            keys.remove(&(entry.date_time.clone(), entry.id.clone()));
            if keys.is_empty() {
                self.index.remove(&entry.partition_tag);
            }
        }
    }

    fn insert(&mut self, entry: StoredEntry) {
        if let Some(previous) = self.items.remove(&entry.id) {
            self.unindex(&previous);
        }

        self.index
            .entry(entry.partition_tag.clone())
            .or_default()
            .insert((entry.date_time.clone(), entry.id.clone()));
        self.items.insert(entry.id.clone(), entry);
    }
}

/// In-process log table. Persisted through snapshots, see `persistence`.
pub struct MemoryLogTable {
    name: String,
    inner: RwLock<Inner>,
}

impl MemoryLogTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inner: RwLock::new(Inner::default()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Inner>, StoreError> {
        self.inner.read().map_err(|_| StoreError::Poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Inner>, StoreError> {
        self.inner.write().map_err(|_| StoreError::Poisoned)
    }

    /// Copy of every entry, in ascending `date_time` order per partition.
    pub fn snapshot(&self) -> Result<Vec<StoredEntry>, StoreError> {
        let inner = self.read()?;

        let mut out = Vec::with_capacity(inner.items.len());
        for keys in inner.index.values() {
            out.extend(
                keys.iter()
                    .filter_map(|(_, id)| inner.items.get(id))
                    .cloned(),
            );
        }
        Ok(out)
    }

    /// Replace the whole content of the table.
    pub fn restore(&self, entries: Vec<StoredEntry>) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        *inner = Inner::default();
        for entry in entries {
            inner.insert(entry);
        }
        Ok(())
    }
}

impl LogTable for MemoryLogTable {
    fn name(&self) -> &str {
        &self.name
    }

    fn put(&self, entry: StoredEntry) -> Result<(), StoreError> {
        self.write()?.insert(entry);
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<StoredEntry>, StoreError> {
        Ok(self.read()?.items.get(id).cloned())
    }

    fn len(&self) -> Result<usize, StoreError> {
        Ok(self.read()?.items.len())
    }

    fn query_partition(
        &self,
        partition: &str,
        order: ScanOrder,
        limit: usize,
    ) -> Result<Vec<StoredEntry>, StoreError> {
        let inner = self.read()?;

        let Some(keys) = inner.index.get(partition) else {
            return Ok(Vec::new());
        };

        let lookup = |(_, id): &(String, String)| inner.items.get(id).cloned();
        let entries = match order {
            ScanOrder::Ascending => keys.iter().take(limit).filter_map(lookup).collect(),
            ScanOrder::Descending => keys.iter().rev().take(limit).filter_map(lookup).collect(),
        };
        Ok(entries)
    }
}
