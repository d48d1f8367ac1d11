//! Persisted crawl records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::request::UrlRole;
use super::result::{CanonicalCrawlResult, PageRecord};
use super::status::CrawlStatus;

/// The `extracted_content` envelope of a stored record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedContent {
    pub data: Vec<PageRecord>,
    pub summary: String,
    pub keywords: Vec<String>,
    pub url_type: UrlRole,
    #[serde(default)]
    pub technologies: Vec<String>,
}

/// One row of crawl history for an owner.
///
/// Records are append-only: nothing ever updates a stored record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredCrawlRecord {
    pub id: Uuid,
    pub owner_id: String,
    pub url: String,
    pub status: String,
    pub extracted_content: ExtractedContent,
    pub created_at: DateTime<Utc>,
}

impl StoredCrawlRecord {
    /// Map a canonical result into a new record.
    pub fn from_result(owner_id: impl Into<String>, result: &CanonicalCrawlResult, role: UrlRole) -> Self {
        Self {
            id: Uuid::now_v7(),
            owner_id: owner_id.into(),
            url: result.url.clone(),
            status: result.effective_status().as_str().to_string(),
            extracted_content: ExtractedContent {
                data: result.data.clone(),
                summary: result.summary.clone(),
                keywords: result.keywords_found.clone(),
                url_type: role,
                technologies: result.technologies.clone(),
            },
            created_at: Utc::now(),
        }
    }

    /// The role this record was stored under.
    pub fn role(&self) -> UrlRole {
        self.extracted_content.url_type
    }

    /// Map the record back into a canonical result.
    pub fn into_result(self) -> CanonicalCrawlResult {
        let status = self
            .status
            .parse::<CrawlStatus>()
            .unwrap_or_else(|_| CrawlStatus::from_upstream(&self.status));
        let content = self.extracted_content;
        let success = status.is_success() || (status == CrawlStatus::Timeout && !content.data.is_empty());
        let data = if success { content.data } else { Vec::new() };
        let content_extracted = success && data.iter().any(PageRecord::has_content);

        CanonicalCrawlResult {
            success,
            url: self.url,
            pages_crawled: data.len(),
            data,
            content_extracted,
            summary: content.summary,
            keywords_found: content.keywords,
            technologies: content.technologies,
            job_id: None,
            error: None,
            status: Some(status),
            failure: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_result() -> CanonicalCrawlResult {
        let data = vec![PageRecord::from_markdown("# Hello\n\nWorld").with_title("Hello")];
        CanonicalCrawlResult {
            success: true,
            url: "https://example.com".into(),
            pages_crawled: data.len(),
            data,
            content_extracted: true,
            summary: "World".into(),
            keywords_found: vec!["hello".into()],
            technologies: vec!["WordPress".into()],
            job_id: Some("job-1".into()),
            error: None,
            status: Some(CrawlStatus::Completed),
            failure: None,
        }
    }

    #[test]
    fn test_record_round_trip_keeps_content() {
        let result = sample_result();
        let record = StoredCrawlRecord::from_result("s1", &result, UrlRole::Referenced);
        assert_eq!(record.status, "completed");
        assert_eq!(record.role(), UrlRole::Referenced);

        let back = record.into_result();
        assert!(back.success);
        assert_eq!(back.summary, result.summary);
        assert_eq!(back.keywords_found, result.keywords_found);
        assert_eq!(back.data, result.data);
        assert_eq!(back.technologies, result.technologies);
        assert_eq!(back.pages_crawled, 1);
    }

    #[test]
    fn test_stored_timeout_reads_back_as_timeout() {
        let result = sample_result().with_status(CrawlStatus::Timeout);
        let record = StoredCrawlRecord::from_result("s1", &result, UrlRole::Primary);
        assert_eq!(record.status, "timeout");

        let back = record.into_result();
        assert_eq!(back.status, Some(CrawlStatus::Timeout));
        assert!(back.success);
    }

    #[test]
    fn test_envelope_json_shape() {
        let record = StoredCrawlRecord::from_result("s1", &sample_result(), UrlRole::Primary);
        let json = serde_json::to_value(&record.extracted_content).unwrap();
        assert_eq!(json["url_type"], "primary");
        assert!(json["data"].is_array());
        assert!(json["keywords"].is_array());
    }

    #[test]
    fn test_envelope_without_technologies_still_reads() {
        let json = serde_json::json!({
            "data": [],
            "summary": "",
            "keywords": [],
            "url_type": "referenced"
        });
        let content: ExtractedContent = serde_json::from_value(json).unwrap();
        assert!(content.technologies.is_empty());
        assert_eq!(content.url_type, UrlRole::Referenced);
    }
}
