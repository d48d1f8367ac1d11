//! Summary generation.

use regex::Regex;
use std::sync::LazyLock;

use crate::types::result::PageRecord;

/// Below this many characters of text, metadata makes a better summary.
pub const MIN_CONTENT_CHARS: usize = 200;

/// Character budget for a paragraph-based summary.
pub const SUMMARY_BUDGET: usize = 500;

static PARAGRAPH_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n").expect("valid regex"));
static IMAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[[^\]]*\]\([^)]*\)").expect("valid regex"));
static LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]*)\]\([^)]*\)").expect("valid regex"));
static EMPHASIS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\*{1,3}|_{2,3}|`)").expect("valid regex"));
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Pick or build the summary for a set of pages.
///
/// An upstream summary wins. Short content with a description in the
/// metadata gets a title/description summary. Otherwise the leading prose
/// paragraphs are used.
pub fn summarize(pages: &[PageRecord], text: &str) -> String {
    if let Some(summary) = pages
        .iter()
        .filter_map(|p| p.summary.as_deref())
        .map(str::trim)
        .find(|s| !s.is_empty())
    {
        return summary.to_string();
    }

    if text.chars().count() < MIN_CONTENT_CHARS {
        if let Some(summary) = pages.first().and_then(metadata_summary) {
            return summary;
        }
    }

    let summary = leading_paragraphs(text, SUMMARY_BUDGET);
    if !summary.is_empty() {
        return summary;
    }

    // Nothing but headings: use them.
    let headings = text
        .lines()
        .filter(|l| l.trim_start().starts_with('#'))
        .map(clean_inline)
        .filter(|h| !h.is_empty())
        .collect::<Vec<_>>()
        .join(". ");
    truncate_words(&headings, SUMMARY_BUDGET)
}

fn metadata_summary(page: &PageRecord) -> Option<String> {
    let title = page.metadata.title.as_deref().map(str::trim).filter(|t| !t.is_empty());
    let description = page
        .metadata
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())?;

    Some(match title {
        Some(title) => format!("{title}: {description}"),
        None => description.to_string(),
    })
}

/// Leading prose paragraphs up to `budget` characters.
///
/// Headings, images, separators and table rows are skipped. If the first
/// usable paragraph alone is over budget it is cut at a word boundary.
pub fn leading_paragraphs(text: &str, budget: usize) -> String {
    let mut summary = String::new();

    for paragraph in PARAGRAPH_BREAK.split(text) {
        if !is_prose(paragraph) {
            continue;
        }
        let cleaned = clean_inline(paragraph);
        if cleaned.is_empty() {
            continue;
        }

        let separator = usize::from(!summary.is_empty());
        if summary.chars().count() + separator + cleaned.chars().count() > budget {
            if summary.is_empty() {
                summary = truncate_words(&cleaned, budget);
            }
            break;
        }

        if !summary.is_empty() {
            summary.push(' ');
        }
        summary.push_str(&cleaned);
    }

    summary
}

fn is_prose(paragraph: &str) -> bool {
    let trimmed = paragraph.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('|') {
        return false;
    }
    if trimmed.chars().all(|c| matches!(c, '-' | '*' | '_' | '=' | ' ')) {
        return false;
    }
    if trimmed.to_ascii_lowercase().starts_with("<img") {
        return false;
    }
    // Image-only paragraphs
    !IMAGE.replace_all(trimmed, "").trim().is_empty()
}

/// Strip markdown inline syntax and collapse whitespace.
pub(crate) fn clean_inline(text: &str) -> String {
    let text = text.trim().trim_start_matches('#');
    let text = IMAGE.replace_all(text, "");
    let text = LINK.replace_all(&text, "$1");
    let text = EMPHASIS.replace_all(&text, "");
    WHITESPACE.replace_all(text.trim(), " ").into_owned()
}

/// Cut to at most `max` characters at a word boundary, marking the cut.
pub(crate) fn truncate_words(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }

    let cut: String = text.chars().take(max).collect();
    let cut = match cut.rfind(char::is_whitespace) {
        Some(idx) if idx > 0 => &cut[..idx],
        _ => cut.as_str(),
    };
    format!("{}...", cut.trim_end())
}
