use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{anyhow, Result};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// A row that can live in a [`MemoryTable`].
pub trait Record: Clone + Send + Sync + 'static {
    fn record_id(&self) -> Uuid;
}

impl Record for shared_models::User {
    fn record_id(&self) -> Uuid {
        self.id
    }
}

/// Outcome of a write that is only performed when no existing row blocks it.
#[derive(Debug, Clone, PartialEq)]
pub enum GuardedWrite<T> {
    Written(T),
    /// The rows that prevented the write. Nothing was stored.
    Blocked(Vec<T>),
    /// A replace targeted a row that does not exist.
    Missing,
}

/// In-process table keyed by the row's storage id.
///
/// Every guarded operation evaluates its predicate and performs the write
/// while holding the table's write lock, so concurrent callers can never both
/// pass the same check.
pub struct MemoryTable<T> {
    name: &'static str,
    rows: RwLock<BTreeMap<Uuid, T>>,
    sequence: AtomicU64,
}

impl<T: Record> MemoryTable<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            rows: RwLock::new(BTreeMap::new()),
            sequence: AtomicU64::new(0),
        }
    }

    /// Next value of the table's monotonic sequence, starting at 1.
    pub fn next_sequence(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub async fn insert(&self, row: T) -> Result<T> {
        let mut rows = self.rows.write().await;
        let id = row.record_id();
        if rows.contains_key(&id) {
            return Err(anyhow!("duplicate key {} in {}", id, self.name));
        }
        rows.insert(id, row.clone());
        debug!("Inserted {} into {}", id, self.name);
        Ok(row)
    }

    /// Inserts `row` unless some stored row satisfies `blocks`.
    pub async fn insert_unless<F>(&self, row: T, blocks: F) -> Result<GuardedWrite<T>>
    where
        F: Fn(&T) -> bool,
    {
        let mut rows = self.rows.write().await;
        let id = row.record_id();
        if rows.contains_key(&id) {
            return Err(anyhow!("duplicate key {} in {}", id, self.name));
        }

        let blocking: Vec<T> = rows.values().filter(|r| blocks(r)).cloned().collect();
        if !blocking.is_empty() {
            debug!("Insert of {} into {} blocked by {} rows", id, self.name, blocking.len());
            return Ok(GuardedWrite::Blocked(blocking));
        }

        rows.insert(id, row.clone());
        debug!("Inserted {} into {}", id, self.name);
        Ok(GuardedWrite::Written(row))
    }

    pub async fn get(&self, id: Uuid) -> Option<T> {
        self.rows.read().await.get(&id).cloned()
    }

    pub async fn filter<F>(&self, predicate: F) -> Vec<T>
    where
        F: Fn(&T) -> bool,
    {
        self.rows
            .read()
            .await
            .values()
            .filter(|r| predicate(r))
            .cloned()
            .collect()
    }

    pub async fn find_first<F>(&self, predicate: F) -> Option<T>
    where
        F: Fn(&T) -> bool,
    {
        self.rows.read().await.values().find(|r| predicate(r)).cloned()
    }

    pub async fn all(&self) -> Vec<T> {
        self.rows.read().await.values().cloned().collect()
    }

    /// Overwrites an existing row. Returns `None` when the id is unknown; the
    /// row is not inserted in that case.
    pub async fn replace(&self, row: T) -> Option<T> {
        let mut rows = self.rows.write().await;
        let slot = rows.get_mut(&row.record_id())?;
        *slot = row.clone();
        Some(row)
    }

    /// Overwrites an existing row unless some *other* stored row satisfies `blocks`.
    pub async fn replace_unless<F>(&self, row: T, blocks: F) -> GuardedWrite<T>
    where
        F: Fn(&T) -> bool,
    {
        let mut rows = self.rows.write().await;
        let id = row.record_id();
        if !rows.contains_key(&id) {
            return GuardedWrite::Missing;
        }

        let blocking: Vec<T> = rows
            .iter()
            .filter(|(key, r)| **key != id && blocks(r))
            .map(|(_, r)| r.clone())
            .collect();
        if !blocking.is_empty() {
            return GuardedWrite::Blocked(blocking);
        }

        rows.insert(id, row.clone());
        GuardedWrite::Written(row)
    }

    pub async fn remove(&self, id: Uuid) -> Option<T> {
        let removed = self.rows.write().await.remove(&id);
        if removed.is_some() {
            debug!("Removed {} from {}", id, self.name);
        }
        removed
    }

    pub async fn count(&self) -> usize {
        self.rows.read().await.len()
    }
}
