//! Job handles and crawl status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::raw::RawPayload;

/// Lifecycle state of an upstream job.
///
/// `Timeout` is never sent by upstream; it is synthesized locally when the
/// polling budget runs out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrawlStatus {
    Queued,
    InProgress,
    Completed,
    CompletedWithErrors,
    Failed,
    Timeout,
}

impl CrawlStatus {
    /// No further polling can change the outcome.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed | Self::CompletedWithErrors | Self::Failed | Self::Timeout
        )
    }

    /// Terminal states that upstream itself reports (everything but `Timeout`).
    pub fn is_upstream_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed | Self::CompletedWithErrors | Self::Failed
        )
    }

    /// Upstream finished and data is expected.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed | Self::CompletedWithErrors)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::CompletedWithErrors => "completed_with_errors",
            Self::Failed => "failed",
            Self::Timeout => "timeout",
        }
    }

    /// Map an upstream status string onto a status.
    ///
    /// Unknown strings are treated as still running so polling continues.
    /// An upstream-side timeout is a failed job: `Timeout` is reserved for an
    /// exhausted local polling budget.
    pub fn from_upstream(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "queued" | "pending" | "waiting" => Self::Queued,
            "completed" | "complete" | "done" | "success" | "succeeded" => Self::Completed,
            "completed_with_errors" | "partial" => Self::CompletedWithErrors,
            "failed" | "error" | "cancelled" | "canceled" | "aborted" | "timeout"
            | "timed_out" => Self::Failed,
            _ => Self::InProgress,
        }
    }
}

impl std::str::FromStr for CrawlStatus {
    type Err = String;

    /// Parse a status previously written with [`CrawlStatus::as_str`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "queued" => Ok(Self::Queued),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "completed_with_errors" => Ok(Self::CompletedWithErrors),
            "failed" => Ok(Self::Failed),
            "timeout" => Ok(Self::Timeout),
            other => Err(format!("unknown crawl status: {other}")),
        }
    }
}

impl std::fmt::Display for CrawlStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which upstream endpoint family a job belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    Scrape,
    Crawl,
}

impl JobKind {
    /// Path segment of the endpoint family (`/scrape`, `/crawl`).
    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::Scrape => "scrape",
            Self::Crawl => "crawl",
        }
    }
}

/// An in-flight upstream job.
///
/// Only lives between submission and a terminal status; never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlJobHandle {
    /// Upstream-assigned job id
    pub id: String,

    /// Endpoint family to poll
    pub kind: JobKind,

    /// URL the job was submitted for
    pub url: String,

    /// When the job was submitted
    pub submitted_at: DateTime<Utc>,
}

impl CrawlJobHandle {
    pub fn new(id: impl Into<String>, kind: JobKind, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            url: url.into(),
            submitted_at: Utc::now(),
        }
    }

    /// Status endpoint path relative to the API base (`/crawl/{id}`).
    pub fn status_path(&self) -> String {
        format!("/{}/{}", self.kind.endpoint(), self.id)
    }
}

/// One status-check answer for a job.
#[derive(Debug, Clone, PartialEq)]
pub struct JobStatus {
    pub status: CrawlStatus,

    /// Pages returned so far (partial until terminal)
    pub data: Option<RawPayload>,

    /// Pages finished, as reported by upstream
    pub completed: Option<u32>,

    /// Pages discovered, as reported by upstream
    pub total: Option<u32>,

    /// Upstream error message, if any
    pub error: Option<String>,
}

impl JobStatus {
    pub fn new(status: CrawlStatus) -> Self {
        Self {
            status,
            data: None,
            completed: None,
            total: None,
            error: None,
        }
    }

    pub fn with_data(mut self, data: RawPayload) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_progress(mut self, completed: u32, total: u32) -> Self {
        self.completed = Some(completed);
        self.total = Some(total);
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Whether any page data came back.
    pub fn has_data(&self) -> bool {
        self.data.as_ref().is_some_and(|d| !d.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_set() {
        assert!(!CrawlStatus::Queued.is_terminal());
        assert!(!CrawlStatus::InProgress.is_terminal());
        assert!(CrawlStatus::Completed.is_terminal());
        assert!(CrawlStatus::CompletedWithErrors.is_terminal());
        assert!(CrawlStatus::Failed.is_terminal());
        assert!(CrawlStatus::Timeout.is_terminal());
        assert!(!CrawlStatus::Timeout.is_upstream_terminal());
    }

    #[test]
    fn test_from_upstream_vocabulary() {
        assert_eq!(CrawlStatus::from_upstream("scraping"), CrawlStatus::InProgress);
        assert_eq!(CrawlStatus::from_upstream("COMPLETED"), CrawlStatus::Completed);
        assert_eq!(
            CrawlStatus::from_upstream("completed-with-errors"),
            CrawlStatus::CompletedWithErrors
        );
        assert_eq!(CrawlStatus::from_upstream("cancelled"), CrawlStatus::Failed);
        assert_eq!(CrawlStatus::from_upstream("timeout"), CrawlStatus::Failed);
        assert_eq!(CrawlStatus::from_upstream("Timed-Out"), CrawlStatus::Failed);
        assert!(CrawlStatus::from_upstream("timed_out").is_upstream_terminal());
        assert_eq!(CrawlStatus::from_upstream("pending"), CrawlStatus::Queued);
        assert_eq!(CrawlStatus::from_upstream("something-new"), CrawlStatus::InProgress);
    }

    #[test]
    fn test_parse_round_trips_as_str() {
        for status in [
            CrawlStatus::Queued,
            CrawlStatus::InProgress,
            CrawlStatus::Completed,
            CrawlStatus::CompletedWithErrors,
            CrawlStatus::Failed,
            CrawlStatus::Timeout,
        ] {
            assert_eq!(status.as_str().parse::<CrawlStatus>(), Ok(status));
        }
        assert!("scraping".parse::<CrawlStatus>().is_err());
    }

    #[test]
    fn test_status_serde_matches_as_str() {
        for status in [
            CrawlStatus::Queued,
            CrawlStatus::InProgress,
            CrawlStatus::Completed,
            CrawlStatus::CompletedWithErrors,
            CrawlStatus::Failed,
            CrawlStatus::Timeout,
        ] {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
    }

    #[test]
    fn test_status_path() {
        let handle = CrawlJobHandle::new("job-1", JobKind::Crawl, "https://example.com");
        assert_eq!(handle.status_path(), "/crawl/job-1");

        let handle = CrawlJobHandle::new("abc", JobKind::Scrape, "https://example.com");
        assert_eq!(handle.status_path(), "/scrape/abc");
    }
}
