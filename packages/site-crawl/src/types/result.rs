//! The canonical crawl result, independent of upstream response shape.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::status::CrawlStatus;
use crate::error::FailureKind;

/// Keyword metadata as upstream sends it: a comma list or a real list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeywordField {
    List(Vec<String>),
    Text(String),
}

impl KeywordField {
    /// Individual keywords, trimmed, empties dropped.
    pub fn values(&self) -> Vec<String> {
        let raw: Vec<&str> = match self {
            Self::List(items) => items.iter().map(String::as_str).collect(),
            Self::Text(text) => text.split(',').collect(),
        };
        raw.into_iter()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Page-level metadata.
///
/// Known fields are typed; anything else upstream sends is kept verbatim
/// in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageMetadata {
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, deserialize_with = "lenient_keywords", skip_serializing_if = "Option::is_none")]
    pub keywords: Option<KeywordField>,

    #[serde(
        rename = "sourceURL",
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub source_url: Option<String>,

    #[serde(
        rename = "statusCode",
        default,
        deserialize_with = "lenient_u16",
        skip_serializing_if = "Option::is_none"
    )]
    pub status_code: Option<u16>,

    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// One extracted page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub markdown: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,

    /// Upstream-provided summary, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    #[serde(default)]
    pub metadata: PageMetadata,
}

impl PageRecord {
    pub fn from_markdown(markdown: impl Into<String>) -> Self {
        Self {
            markdown: Some(markdown.into()),
            ..Default::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.metadata.title = Some(title.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.metadata.description = Some(description.into());
        self
    }

    /// Any content at all (markdown or HTML).
    pub fn has_content(&self) -> bool {
        self.markdown.as_deref().is_some_and(|m| !m.trim().is_empty())
            || self.html.as_deref().is_some_and(|h| !h.trim().is_empty())
    }
}

/// The stable internal result of a scrape or crawl.
///
/// When `success` is false, `content_extracted` is false and `data` is
/// empty. When `success` is true, `pages_crawled == data.len()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalCrawlResult {
    pub success: bool,
    pub url: String,
    pub data: Vec<PageRecord>,
    pub pages_crawled: usize,
    pub content_extracted: bool,
    pub summary: String,
    pub keywords_found: Vec<String>,
    pub technologies: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<CrawlStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,
}

impl CanonicalCrawlResult {
    /// A failure-shaped result.
    pub fn failure(url: impl Into<String>, message: impl Into<String>, kind: FailureKind) -> Self {
        Self {
            success: false,
            url: url.into(),
            data: Vec::new(),
            pages_crawled: 0,
            content_extracted: false,
            summary: String::new(),
            keywords_found: Vec::new(),
            technologies: Vec::new(),
            job_id: None,
            error: Some(message.into()),
            status: Some(CrawlStatus::Failed),
            failure: Some(kind),
        }
    }

    pub fn with_status(mut self, status: CrawlStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_job_id(mut self, job_id: Option<String>) -> Self {
        self.job_id = job_id;
        self
    }

    /// The status to record for this result.
    pub fn effective_status(&self) -> CrawlStatus {
        self.status.unwrap_or(if self.success {
            CrawlStatus::Completed
        } else {
            CrawlStatus::Failed
        })
    }
}

pub(crate) fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Array(items)) => items.into_iter().find_map(|v| match v {
            Value::String(s) => Some(s),
            _ => None,
        }),
        _ => None,
    })
}

/// Metadata that is not an object is dropped rather than rejected.
pub(crate) fn lenient_metadata<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<PageMetadata>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(value @ Value::Object(_)) => PageMetadata::deserialize(value).ok(),
        _ => None,
    })
}

fn lenient_u16<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u16>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_u64().and_then(|n| u16::try_from(n).ok()),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_keywords<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<KeywordField>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(KeywordField::Text(s)),
        Some(Value::Array(items)) => Some(KeywordField::List(
            items
                .into_iter()
                .filter_map(|v| match v {
                    Value::String(s) => Some(s),
                    _ => None,
                })
                .collect(),
        )),
        _ => None,
    })
}
