//! Owner-scoped crawl history.

use tracing::{debug, error};

use crate::traits::store::RecordStore;
use crate::types::record::StoredCrawlRecord;
use crate::types::request::UrlRole;
use crate::types::result::CanonicalCrawlResult;

/// Saves and reads canonical results per owner and URL role.
///
/// Persistence is best effort. Nothing here returns an error: a failed save
/// is `false`, a failed read is `None` or empty, and both are logged.
pub struct ResultStore<S> {
    store: S,
}

impl<S: RecordStore> ResultStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The underlying record store.
    pub fn inner(&self) -> &S {
        &self.store
    }

    /// Append a result to the owner's history. Never updates existing rows.
    pub async fn save(&self, owner_id: &str, result: &CanonicalCrawlResult, role: UrlRole) -> bool {
        if owner_id.trim().is_empty() {
            error!(url = %result.url, "Refusing to save crawl result without an owner id");
            return false;
        }

        let record = StoredCrawlRecord::from_result(owner_id, result, role);
        match self.store.insert_record(&record).await {
            Ok(()) => {
                debug!(owner_id, role = %role, record_id = %record.id, "Saved crawl result");
                true
            }
            Err(e) => {
                error!(owner_id, role = %role, url = %result.url, error = %e, "Failed to save crawl result");
                false
            }
        }
    }

    /// Most recent result for an owner and role.
    pub async fn get_latest(&self, owner_id: &str, role: UrlRole) -> Option<CanonicalCrawlResult> {
        match self.store.latest_record(owner_id, role).await {
            Ok(record) => record.map(StoredCrawlRecord::into_result),
            Err(e) => {
                error!(owner_id, role = %role, error = %e, "Failed to load latest crawl result");
                None
            }
        }
    }

    /// All results for an owner and role, most recent first.
    pub async fn get_all(&self, owner_id: &str, role: UrlRole) -> Vec<CanonicalCrawlResult> {
        match self.store.records_for_owner(owner_id, role, None).await {
            Ok(records) => records.into_iter().map(StoredCrawlRecord::into_result).collect(),
            Err(e) => {
                error!(owner_id, role = %role, error = %e, "Failed to load crawl history");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{StoreError, StoreResult};
    use crate::stores::MemoryStore;
    use crate::types::result::PageRecord;
    use crate::types::status::CrawlStatus;
    use async_trait::async_trait;

    struct BrokenStore;

    #[async_trait]
    impl RecordStore for BrokenStore {
        async fn insert_record(&self, _record: &StoredCrawlRecord) -> StoreResult<()> {
            Err(StoreError::Database("disk full".into()))
        }

        async fn records_for_owner(
            &self,
            _owner_id: &str,
            _role: UrlRole,
            _limit: Option<usize>,
        ) -> StoreResult<Vec<StoredCrawlRecord>> {
            Err(StoreError::Database("connection refused".into()))
        }
    }

    fn result(summary: &str) -> CanonicalCrawlResult {
        let data = vec![PageRecord::from_markdown("Body text")];
        CanonicalCrawlResult {
            success: true,
            url: "https://example.com".into(),
            pages_crawled: data.len(),
            data,
            content_extracted: true,
            summary: summary.into(),
            keywords_found: vec!["body".into()],
            technologies: vec![],
            job_id: Some("job-1".into()),
            error: None,
            status: Some(CrawlStatus::Completed),
            failure: None,
        }
    }

    #[tokio::test]
    async fn test_save_then_get_latest() {
        let store = ResultStore::new(MemoryStore::new());
        assert!(store.save("s1", &result("older"), UrlRole::Primary).await);
        assert!(store.save("s1", &result("newer"), UrlRole::Primary).await);

        let latest = store.get_latest("s1", UrlRole::Primary).await.unwrap();
        assert_eq!(latest.summary, "newer");
        assert!(latest.success);
        assert_eq!(latest.pages_crawled, 1);

        let all = store.get_all("s1", UrlRole::Primary).await;
        assert_eq!(all.len(), 2);
        assert_eq!(all[1].summary, "older");
        assert!(store.get_all("s1", UrlRole::Referenced).await.is_empty());
    }

    #[tokio::test]
    async fn test_empty_owner_rejected() {
        let store = ResultStore::new(MemoryStore::new());
        assert!(!store.save("  ", &result("x"), UrlRole::Primary).await);
        assert!(store.inner().is_empty());
    }

    #[tokio::test]
    async fn test_storage_failures_become_values() {
        let store = ResultStore::new(BrokenStore);
        assert!(!store.save("s1", &result("x"), UrlRole::Primary).await);
        assert!(store.get_latest("s1", UrlRole::Primary).await.is_none());
        assert!(store.get_all("s1", UrlRole::Primary).await.is_empty());
    }
}
