//! Raw upstream payloads, before normalization.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::status::{CrawlJobHandle, CrawlStatus, JobStatus};
use crate::error::FailureKind;

/// Page data exactly as upstream sent it: one page object or a list.
///
/// Pages stay as untyped JSON here; the content processor decides what is
/// usable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawPayload {
    Pages(Vec<Value>),
    Single(Value),
}

impl RawPayload {
    /// Number of page entries.
    pub fn len(&self) -> usize {
        match self {
            Self::Pages(pages) => pages.len(),
            Self::Single(_) => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A response from upstream that carries (or failed to carry) page data.
#[derive(Debug, Clone, PartialEq)]
pub struct RawUpstreamResponse {
    pub success: bool,
    pub data: Option<RawPayload>,
    pub error: Option<String>,
    pub job_id: Option<String>,
    pub status: Option<CrawlStatus>,
    pub failure: Option<FailureKind>,
}

impl RawUpstreamResponse {
    /// A successful inline response.
    pub fn immediate(data: RawPayload) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            job_id: None,
            status: Some(CrawlStatus::Completed),
            failure: None,
        }
    }

    /// Upstream refused the request (non-2xx, or `success: false`).
    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            job_id: None,
            status: Some(CrawlStatus::Failed),
            failure: Some(FailureKind::UpstreamRejected),
        }
    }

    /// Build from the final status of a polled job.
    ///
    /// Upstream failures keep their message; a locally synthesized timeout is
    /// successful only if partial data made it back.
    pub fn from_job(handle: &CrawlJobHandle, status: JobStatus) -> Self {
        let has_data = status.has_data();
        let (success, failure) = match status.status {
            s if s.is_success() => (true, None),
            CrawlStatus::Timeout if has_data => (true, None),
            CrawlStatus::Timeout => (false, None),
            _ => (false, Some(FailureKind::UpstreamRejected)),
        };

        let error = match (&status.error, status.status) {
            (Some(e), _) => Some(e.clone()),
            (None, CrawlStatus::Failed) => Some(format!("{} job {} failed", handle.kind.endpoint(), handle.id)),
            _ => None,
        };

        Self {
            success,
            data: status.data,
            error,
            job_id: Some(handle.id.clone()),
            status: Some(status.status),
            failure,
        }
    }

    pub fn with_job_id(mut self, job_id: impl Into<String>) -> Self {
        self.job_id = Some(job_id.into());
        self
    }
}

/// What a single-page submission came back with.
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    /// Result (or rejection) embedded in the response
    Immediate(RawUpstreamResponse),
    /// Only a job id; poll for the result
    Deferred(CrawlJobHandle),
}
