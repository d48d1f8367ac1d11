//! Content processing: raw upstream payload in, canonical result out.
//!
//! [`normalize`] is a pure function. It never panics on upstream data and
//! never returns an error; anything it cannot make sense of becomes a
//! failure-shaped [`CanonicalCrawlResult`].

pub mod keywords;
pub mod pages;
pub mod summary;
pub mod technology;

pub use keywords::{derive_keywords, extract_keywords};
pub use pages::PAGE_SEPARATOR;
pub use summary::summarize;
pub use technology::detect_technologies;

use tracing::warn;

use crate::error::FailureKind;
use crate::types::raw::RawUpstreamResponse;
use crate::types::result::CanonicalCrawlResult;
use crate::types::status::CrawlStatus;

/// Payload shape could not be turned into pages.
#[derive(Debug, thiserror::Error)]
#[error("unexpected payload shape: {0}")]
pub(crate) struct NormalizationError(pub(crate) String);

/// Normalize a raw upstream response into the canonical result.
///
/// Deterministic: the same input always yields an identical result.
pub fn normalize(raw: Option<&RawUpstreamResponse>, source_url: &str) -> CanonicalCrawlResult {
    let Some(raw) = raw else {
        return CanonicalCrawlResult::failure(
            source_url,
            "no response from upstream",
            FailureKind::UpstreamRejected,
        );
    };

    if !raw.success {
        return upstream_failure(raw, source_url);
    }

    let status = raw.status.unwrap_or(CrawlStatus::Completed);

    let Some(payload) = raw.data.as_ref() else {
        // Success with no data at all: nothing crawled
        return CanonicalCrawlResult {
            success: true,
            url: source_url.to_string(),
            data: Vec::new(),
            pages_crawled: 0,
            content_extracted: false,
            summary: String::new(),
            keywords_found: Vec::new(),
            technologies: Vec::new(),
            job_id: raw.job_id.clone(),
            error: raw.error.clone(),
            status: Some(status),
            failure: None,
        };
    };

    let data = match pages::pages_from_payload(payload) {
        Ok(data) => data,
        Err(e) => {
            warn!(url = %source_url, error = %e, "Failed to normalize upstream payload");
            return CanonicalCrawlResult::failure(
                source_url,
                e.to_string(),
                FailureKind::NormalizationFailure,
            )
            .with_job_id(raw.job_id.clone());
        }
    };

    let text = pages::concatenated_text(&data);
    let markup = pages::concatenated_markup(&data);

    CanonicalCrawlResult {
        success: true,
        url: source_url.to_string(),
        pages_crawled: data.len(),
        content_extracted: !text.trim().is_empty(),
        summary: summarize(&data, &text),
        keywords_found: extract_keywords(&data, &text),
        technologies: detect_technologies(&markup),
        data,
        job_id: raw.job_id.clone(),
        error: raw.error.clone(),
        status: Some(status),
        failure: None,
    }
}

fn upstream_failure(raw: &RawUpstreamResponse, source_url: &str) -> CanonicalCrawlResult {
    let status = raw.status.unwrap_or(CrawlStatus::Failed);
    let message = raw
        .error
        .clone()
        .unwrap_or_else(|| format!("upstream reported failure for {source_url}"));

    let mut result =
        CanonicalCrawlResult::failure(source_url, message, FailureKind::UpstreamRejected)
            .with_status(status)
            .with_job_id(raw.job_id.clone());

    // A timeout is a terminal status, not a failure kind
    result.failure = match (raw.failure, status) {
        (Some(kind), _) => Some(kind),
        (None, CrawlStatus::Timeout) => None,
        (None, _) => Some(FailureKind::UpstreamRejected),
    };
    result
}
