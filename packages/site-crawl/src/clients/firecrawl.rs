//! Firecrawl HTTP client.
//!
//! Speaks the Firecrawl v1 API: `POST /scrape`, `POST /crawl`,
//! `GET /{scrape|crawl}/{id}` and `GET /team/credit-usage`. It only moves
//! bytes; polling and normalization live elsewhere.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{CrawlError, CrawlResult, FailureKind};
use crate::security::SecretString;
use crate::traits::backend::CrawlBackend;
use crate::types::config::FirecrawlConfig;
use crate::types::raw::{RawPayload, RawUpstreamResponse, Submission};
use crate::types::request::CrawlRequest;
use crate::types::status::{CrawlJobHandle, CrawlStatus, JobKind, JobStatus};

/// Client for the Firecrawl API.
///
/// # Example
///
/// ```rust,ignore
/// use site_crawl::{FirecrawlClient, FirecrawlConfig, CrawlRequest, SecretString};
/// use site_crawl::traits::CrawlBackend;
///
/// let client = FirecrawlClient::with_config(FirecrawlConfig::from_env()?)?;
/// let key = SecretString::new(std::env::var("FIRECRAWL_API_KEY")?);
/// let submission = client.scrape(&CrawlRequest::new("https://example.com"), &key).await?;
/// ```
pub struct FirecrawlClient {
    client: Client,
    config: FirecrawlConfig,
}

// Request/Response types for the Firecrawl API

#[derive(Serialize)]
struct ScrapeBody<'a> {
    url: &'a str,
    formats: &'a [String],
    /// Milliseconds
    timeout: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CrawlBody<'a> {
    url: &'a str,
    formats: &'a [String],
    depth: u32,
    max_pages: u32,
    include_external_links: bool,
    selectors: &'a [String],
}

#[derive(Deserialize)]
struct SubmitResponse {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    data: Option<RawPayload>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct StatusResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    data: Option<RawPayload>,
    #[serde(default)]
    completed: Option<u32>,
    #[serde(default)]
    total: Option<u32>,
    #[serde(default)]
    error: Option<String>,
}

impl StatusResponse {
    fn into_job_status(self) -> JobStatus {
        let status = match (&self.status, self.success, &self.data) {
            (Some(raw), _, _) => CrawlStatus::from_upstream(raw),
            (None, Some(false), _) => CrawlStatus::Failed,
            (None, _, Some(_)) => CrawlStatus::Completed,
            (None, _, None) => CrawlStatus::InProgress,
        };

        JobStatus {
            status,
            data: self.data,
            completed: self.completed,
            total: self.total,
            error: self.error,
        }
    }
}

impl FirecrawlClient {
    /// Create a client with default configuration.
    pub fn new() -> CrawlResult<Self> {
        Self::with_config(FirecrawlConfig::default())
    }

    /// Create a client with the given configuration.
    pub fn with_config(config: FirecrawlConfig) -> CrawlResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| CrawlError::Transport(Box::new(e)))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &FirecrawlConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    async fn send(&self, request: RequestBuilder, credential: &SecretString) -> CrawlResult<Response> {
        let response = request
            .bearer_auth(credential.expose())
            .send()
            .await
            .map_err(|e| CrawlError::Transport(Box::new(e)))?;
        Ok(response)
    }
}

/// Pull a human-readable message out of an error response body.
async fn rejection_message(response: Response) -> String {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();

    let from_json = serde_json::from_str::<Value>(&text).ok().and_then(|body| {
        ["error", "message", "details"]
            .iter()
            .find_map(|key| body.get(*key).and_then(Value::as_str).map(str::to_string))
    });

    match from_json {
        Some(message) => message,
        None if !text.trim().is_empty() => text.trim().to_string(),
        None => status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string(),
    }
}

#[async_trait]
impl CrawlBackend for FirecrawlClient {
    async fn scrape(
        &self,
        request: &CrawlRequest,
        credential: &SecretString,
    ) -> CrawlResult<Submission> {
        info!(url = %request.url, "Submitting Firecrawl scrape");

        let body = ScrapeBody {
            url: &request.url,
            formats: &self.config.formats,
            timeout: self.config.request_timeout.as_millis() as u64,
        };
        let response = self
            .send(self.client.post(self.url("/scrape")).json(&body), credential)
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = rejection_message(response).await;
            warn!(
                url = %request.url,
                status = status.as_u16(),
                failure_kind = %FailureKind::UpstreamRejected,
                error = %message,
                "Firecrawl rejected scrape"
            );
            return Ok(Submission::Immediate(RawUpstreamResponse::rejected(format!(
                "scrape of {} rejected ({}): {}",
                request.url,
                status.as_u16(),
                message
            ))));
        }

        let reply: SubmitResponse = response.json().await?;

        if reply.success == Some(false) {
            let message = reply.error.unwrap_or_else(|| "scrape failed".to_string());
            return Ok(Submission::Immediate(RawUpstreamResponse::rejected(format!(
                "scrape of {} failed: {}",
                request.url, message
            ))));
        }

        match (reply.data, reply.id) {
            (Some(data), id) => {
                debug!(url = %request.url, pages = data.len(), "Scrape returned inline data");
                let mut raw = RawUpstreamResponse::immediate(data);
                raw.job_id = id;
                Ok(Submission::Immediate(raw))
            }
            (None, Some(id)) => {
                info!(url = %request.url, job_id = %id, "Scrape deferred to job");
                Ok(Submission::Deferred(CrawlJobHandle::new(
                    id,
                    JobKind::Scrape,
                    &request.url,
                )))
            }
            (None, None) => Err(CrawlError::Decode(
                "scrape response has neither data nor job id".to_string(),
            )),
        }
    }

    async fn start_crawl(
        &self,
        request: &CrawlRequest,
        credential: &SecretString,
    ) -> CrawlResult<CrawlJobHandle> {
        info!(
            url = %request.url,
            max_depth = request.options.max_depth,
            max_pages = request.options.max_pages,
            "Starting Firecrawl crawl"
        );

        let body = CrawlBody {
            url: &request.url,
            formats: &self.config.formats,
            depth: request.options.max_depth,
            max_pages: request.options.max_pages,
            include_external_links: request.options.include_external_links,
            selectors: &request.options.selectors,
        };
        let response = self
            .send(self.client.post(self.url("/crawl")).json(&body), credential)
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = rejection_message(response).await;
            return Err(CrawlError::UpstreamRejected {
                status: status.as_u16(),
                message: format!("crawl of {} rejected: {}", request.url, message),
            });
        }

        let reply: SubmitResponse = response.json().await?;
        let id = reply.id.ok_or_else(|| {
            CrawlError::Decode(
                reply
                    .error
                    .unwrap_or_else(|| "crawl response has no job id".to_string()),
            )
        })?;

        info!(url = %request.url, job_id = %id, "Crawl started, polling for results");
        Ok(CrawlJobHandle::new(id, JobKind::Crawl, &request.url))
    }

    async fn check_status(
        &self,
        handle: &CrawlJobHandle,
        credential: &SecretString,
    ) -> CrawlResult<JobStatus> {
        let response = self
            .send(self.client.get(self.url(&handle.status_path())), credential)
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = rejection_message(response).await;
            return Err(CrawlError::UpstreamRejected {
                status: status.as_u16(),
                message,
            });
        }

        let reply: StatusResponse = response.json().await?;
        let job = reply.into_job_status();
        debug!(
            job_id = %handle.id,
            status = %job.status,
            completed = ?job.completed,
            total = ?job.total,
            "Checked job status"
        );
        Ok(job)
    }

    async fn validate_credential(&self, credential: &SecretString) -> bool {
        let request = self
            .client
            .get(self.url("/team/credit-usage"))
            .timeout(self.config.validation_timeout);

        match self.send(request, credential).await {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                let status = response.status();
                if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
                    info!(status = status.as_u16(), "Firecrawl credential rejected");
                } else {
                    warn!(status = status.as_u16(), "Unexpected status validating credential");
                }
                false
            }
            Err(e) => {
                warn!(
                    error = %e,
                    failure_kind = %FailureKind::TransportFailure,
                    "Could not reach Firecrawl to validate credential"
                );
                false
            }
        }
    }

    fn name(&self) -> &str {
        "firecrawl"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn status(value: Value) -> JobStatus {
        serde_json::from_value::<StatusResponse>(value)
            .unwrap()
            .into_job_status()
    }

    #[test]
    fn test_create_client() {
        let client = FirecrawlClient::new().unwrap();
        assert_eq!(client.name(), "firecrawl");
        assert_eq!(client.url("/scrape"), "https://api.firecrawl.dev/v1/scrape");
    }

    #[test]
    fn test_status_inference() {
        assert_eq!(status(json!({"status": "scraping"})).status, CrawlStatus::InProgress);
        assert_eq!(status(json!({"status": "completed", "data": []})).status, CrawlStatus::Completed);
        assert_eq!(status(json!({"success": false})).status, CrawlStatus::Failed);
        assert_eq!(status(json!({"data": {"markdown": "x"}})).status, CrawlStatus::Completed);
        assert_eq!(status(json!({})).status, CrawlStatus::InProgress);
    }

    #[test]
    fn test_status_keeps_progress() {
        let job = status(json!({"status": "scraping", "completed": 3, "total": 10}));
        assert_eq!(job.completed, Some(3));
        assert_eq!(job.total, Some(10));
        assert!(!job.has_data());
    }

    #[test]
    fn test_crawl_body_shape() {
        let formats = vec!["markdown".to_string()];
        let selectors = vec!["main".to_string()];
        let body = CrawlBody {
            url: "https://example.com",
            formats: &formats,
            depth: 2,
            max_pages: 50,
            include_external_links: false,
            selectors: &selectors,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["maxPages"], 50);
        assert_eq!(json["depth"], 2);
        assert_eq!(json["includeExternalLinks"], false);
        assert_eq!(json["selectors"], json!(["main"]));
    }
}
