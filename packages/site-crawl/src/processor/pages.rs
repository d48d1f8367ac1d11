//! Page extraction from raw payloads.

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::sync::LazyLock;

use super::NormalizationError;
use crate::types::raw::RawPayload;
use crate::types::result::{lenient_metadata, lenient_string, PageMetadata, PageRecord};

/// Separator placed between pages when their text is concatenated.
pub const PAGE_SEPARATOR: &str = "\n\n---\n\n";

static SCRIPT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script[^>]*>.*?</script>").expect("valid regex"));
static STYLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<style[^>]*>.*?</style>").expect("valid regex"));
static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<h([1-6])[^>]*>(.*?)</h[1-6]>").expect("valid regex"));
static PARAGRAPH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<p[^>]*>(.*?)</p>").expect("valid regex"));
static LINE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>").expect("valid regex"));
static LIST_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<li[^>]*>(.*?)</li>").expect("valid regex"));
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));
static MULTI_NEWLINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid regex"));

/// A page as upstream sends it. Field names vary between endpoints, and so
/// do field types; anything of the wrong type reads as absent.
#[derive(Deserialize)]
struct WirePage {
    #[serde(default, deserialize_with = "lenient_string")]
    markdown: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    content: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    html: Option<String>,
    #[serde(default, rename = "rawHtml", deserialize_with = "lenient_string")]
    raw_html: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    summary: Option<String>,
    #[serde(default, deserialize_with = "lenient_metadata")]
    metadata: Option<PageMetadata>,
}

impl WirePage {
    fn has_content_field(&self) -> bool {
        self.markdown.is_some() || self.content.is_some() || self.html.is_some() || self.raw_html.is_some()
    }

    fn into_record(self) -> PageRecord {
        PageRecord {
            markdown: self.markdown.or(self.content),
            html: self.html.or(self.raw_html),
            summary: self.summary.filter(|s| !s.trim().is_empty()),
            metadata: self.metadata.unwrap_or_default(),
        }
    }
}

fn parse_page(value: &Value, index: usize) -> Result<WirePage, NormalizationError> {
    if !value.is_object() {
        return Err(NormalizationError(format!(
            "page {index} is not an object"
        )));
    }
    WirePage::deserialize(value)
        .map_err(|e| NormalizationError(format!("page {index} is malformed: {e}")))
}

/// Turn either payload shape into an ordered page list.
///
/// A single page must carry some content field; list entries only need to
/// be objects, so a list of N entries always yields N pages.
pub(crate) fn pages_from_payload(payload: &RawPayload) -> Result<Vec<PageRecord>, NormalizationError> {
    match payload {
        RawPayload::Single(value) => {
            let page = parse_page(value, 0)?;
            if !page.has_content_field() {
                return Err(NormalizationError(
                    "page payload has no content field".to_string(),
                ));
            }
            Ok(vec![page.into_record()])
        }
        RawPayload::Pages(values) => values
            .iter()
            .enumerate()
            .map(|(i, v)| parse_page(v, i).map(WirePage::into_record))
            .collect(),
    }
}

/// Readable text for one page: markdown when present, else HTML as markdown.
pub(crate) fn page_text(page: &PageRecord) -> String {
    match (&page.markdown, &page.html) {
        (Some(markdown), _) if !markdown.trim().is_empty() => markdown.trim().to_string(),
        (_, Some(html)) => html_to_markdown(html),
        _ => String::new(),
    }
}

/// All page text joined with [`PAGE_SEPARATOR`], skipping empty pages.
pub(crate) fn concatenated_text(pages: &[PageRecord]) -> String {
    pages
        .iter()
        .map(page_text)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(PAGE_SEPARATOR)
}

/// Everything a technology marker could appear in: raw HTML, markdown,
/// and metadata values.
pub(crate) fn concatenated_markup(pages: &[PageRecord]) -> String {
    let mut markup = String::new();
    for page in pages {
        if let Some(html) = &page.html {
            markup.push_str(html);
            markup.push('\n');
        }
        if let Some(markdown) = &page.markdown {
            markup.push_str(markdown);
            markup.push('\n');
        }
        for value in page.metadata.extra.values() {
            match value {
                Value::String(s) => markup.push_str(s),
                other => markup.push_str(&other.to_string()),
            }
            markup.push('\n');
        }
    }
    markup
}

/// Convert HTML to markdown (simplified).
pub(crate) fn html_to_markdown(html: &str) -> String {
    let mut text = SCRIPT.replace_all(html, "").into_owned();
    text = STYLE.replace_all(&text, "").into_owned();

    text = HEADING
        .replace_all(&text, |caps: &regex::Captures| {
            let level = caps[1].parse::<usize>().unwrap_or(1);
            format!("\n\n{} {}\n\n", "#".repeat(level), caps[2].trim())
        })
        .into_owned();

    text = PARAGRAPH.replace_all(&text, "\n\n$1\n\n").into_owned();
    text = LINE_BREAK.replace_all(&text, "\n").into_owned();
    text = LIST_ITEM.replace_all(&text, "- $1\n").into_owned();
    text = TAG.replace_all(&text, "").into_owned();

    text = text
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'");

    let text = text
        .lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n");

    MULTI_NEWLINE.replace_all(&text, "\n\n").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_single_page_requires_content_field() {
        let ok = RawPayload::Single(json!({"markdown": "# Hi"}));
        assert_eq!(pages_from_payload(&ok).unwrap().len(), 1);

        let content_alias = RawPayload::Single(json!({"content": "Body"}));
        let pages = pages_from_payload(&content_alias).unwrap();
        assert_eq!(pages[0].markdown.as_deref(), Some("Body"));

        let missing = RawPayload::Single(json!({"metadata": {"title": "x"}}));
        assert!(pages_from_payload(&missing).is_err());
    }

    #[test]
    fn test_list_keeps_every_object_entry() {
        let payload = RawPayload::Pages(vec![
            json!({"markdown": "one"}),
            json!({"metadata": {"sourceURL": "https://example.com/empty"}}),
            json!({"rawHtml": "<p>three</p>"}),
        ]);
        let pages = pages_from_payload(&payload).unwrap();
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[2].html.as_deref(), Some("<p>three</p>"));
    }

    #[test]
    fn test_mistyped_fields_do_not_drop_the_page() {
        let payload = RawPayload::Pages(vec![
            json!({"markdown": "# Home"}),
            json!({"markdown": "# About", "metadata": ["unexpected"]}),
            json!({"markdown": 42, "html": "<h1>Blog</h1>", "summary": {"x": 1}}),
            json!({"metadata": "text", "content": "Contact"}),
        ]);
        let pages = pages_from_payload(&payload).unwrap();
        assert_eq!(pages.len(), 4);
        assert_eq!(pages[1].markdown.as_deref(), Some("# About"));
        assert_eq!(pages[1].metadata, PageMetadata::default());
        assert_eq!(pages[2].markdown, None);
        assert_eq!(pages[2].html.as_deref(), Some("<h1>Blog</h1>"));
        assert_eq!(pages[2].summary, None);
        assert_eq!(pages[3].markdown.as_deref(), Some("Contact"));
    }

    #[test]
    fn test_non_object_entry_is_malformed() {
        let payload = RawPayload::Pages(vec![json!({"markdown": "ok"}), json!("nope")]);
        let err = pages_from_payload(&payload).unwrap_err();
        assert!(err.0.contains("page 1"));

        let payload = RawPayload::Single(json!(42));
        assert!(pages_from_payload(&payload).is_err());
    }

    #[test]
    fn test_html_to_markdown() {
        let html = r#"<html><head><style>p{}</style><script>track()</script></head>
            <body><h1>Title</h1><p>First &amp; best.</p><ul><li>One</li></ul></body></html>"#;
        let md = html_to_markdown(html);
        assert!(md.contains("# Title"));
        assert!(md.contains("First & best."));
        assert!(md.contains("- One"));
        assert!(!md.contains("track()"));
        assert!(!md.contains('<'));
    }

    #[test]
    fn test_concatenated_text_uses_separator() {
        let pages = vec![
            PageRecord::from_markdown("alpha"),
            PageRecord::default(),
            PageRecord::from_markdown("beta"),
        ];
        assert_eq!(concatenated_text(&pages), format!("alpha{PAGE_SEPARATOR}beta"));
    }
}
