//! In-memory record store for testing and development.

use async_trait::async_trait;
use std::sync::RwLock;

use crate::error::{StoreError, StoreResult};
use crate::traits::store::RecordStore;
use crate::types::record::StoredCrawlRecord;
use crate::types::request::UrlRole;

/// In-memory record storage.
///
/// Data is lost on restart. Records keep an insertion sequence number so
/// reads are newest first even when timestamps tie.
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<Vec<(u64, StoredCrawlRecord)>>,
}

impl MemoryStore {
    /// Create a new empty memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clear all stored records.
    pub fn clear(&self) {
        if let Ok(mut records) = self.records.write() {
            records.clear();
        }
    }
}

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Database("memory store lock poisoned".into())
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn insert_record(&self, record: &StoredCrawlRecord) -> StoreResult<()> {
        let mut records = self.records.write().map_err(poisoned)?;
        let seq = records.len() as u64;
        records.push((seq, record.clone()));
        Ok(())
    }

    async fn records_for_owner(
        &self,
        owner_id: &str,
        role: UrlRole,
        limit: Option<usize>,
    ) -> StoreResult<Vec<StoredCrawlRecord>> {
        let records = self.records.read().map_err(poisoned)?;

        let mut matching: Vec<&(u64, StoredCrawlRecord)> = records
            .iter()
            .filter(|(_, r)| r.owner_id == owner_id && r.role() == role)
            .collect();
        matching.sort_by(|(seq_a, a), (seq_b, b)| {
            b.created_at.cmp(&a.created_at).then(seq_b.cmp(seq_a))
        });

        Ok(matching
            .into_iter()
            .take(limit.unwrap_or(usize::MAX))
            .map(|(_, r)| r.clone())
            .collect())
    }
}
