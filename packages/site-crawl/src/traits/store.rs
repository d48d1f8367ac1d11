//! Append-only storage for crawl records.

use async_trait::async_trait;

use crate::error::StoreResult;
use crate::types::record::StoredCrawlRecord;
use crate::types::request::UrlRole;

/// Raw persistence for [`StoredCrawlRecord`]s.
///
/// Records are only ever inserted, never updated. Reads return newest
/// first; records inserted in the same instant come back in reverse
/// insertion order.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Append a record.
    async fn insert_record(&self, record: &StoredCrawlRecord) -> StoreResult<()>;

    /// Records for an owner and role, most recent first.
    async fn records_for_owner(
        &self,
        owner_id: &str,
        role: UrlRole,
        limit: Option<usize>,
    ) -> StoreResult<Vec<StoredCrawlRecord>>;

    /// Most recent record for an owner and role.
    async fn latest_record(
        &self,
        owner_id: &str,
        role: UrlRole,
    ) -> StoreResult<Option<StoredCrawlRecord>> {
        Ok(self
            .records_for_owner(owner_id, role, Some(1))
            .await?
            .into_iter()
            .next())
    }
}
