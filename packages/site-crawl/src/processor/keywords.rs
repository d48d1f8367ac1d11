//! Keyword extraction.
//!
//! Explicit keyword metadata always wins. Without it, keywords are derived
//! from the text: multi-word phrases from headings and emphasis first (in
//! order of appearance), then the most frequent single words.

use indexmap::{IndexMap, IndexSet};
use regex::Regex;
use std::sync::LazyLock;

use crate::types::result::PageRecord;

/// Cap on derived keywords.
pub const MAX_KEYWORDS: usize = 8;

/// Shorter tokens are never keywords.
pub const MIN_TOKEN_CHARS: usize = 4;

const STOP_WORDS: &[&str] = &[
    "about", "also", "been", "best", "could", "each", "even", "from", "have", "here", "home",
    "into", "just", "like", "make", "many", "more", "most", "much", "only", "other", "over",
    "page", "should", "some", "such", "than", "that", "their", "them", "then", "there", "these",
    "they", "this", "those", "very", "were", "what", "when", "where", "which", "while", "will",
    "with", "would", "your",
];

static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s{0,3}#{1,6}\s+(.+?)\s*#*\s*$").expect("valid regex"));
static EMPHASIS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*([^*\n]+)\*\*|__([^_\n]+)__").expect("valid regex"));
static LINK_TARGET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\]\([^)]*\)").expect("valid regex"));
static BARE_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://\S+").expect("valid regex"));

/// Keywords for a set of pages.
pub fn extract_keywords(pages: &[PageRecord], text: &str) -> Vec<String> {
    let explicit = explicit_keywords(pages);
    if !explicit.is_empty() {
        return explicit;
    }
    derive_keywords(text)
}

/// Keyword metadata across all pages, deduplicated case-insensitively.
fn explicit_keywords(pages: &[PageRecord]) -> Vec<String> {
    let mut seen = IndexSet::new();
    let mut keywords = Vec::new();

    for field in pages.iter().filter_map(|p| p.metadata.keywords.as_ref()) {
        for keyword in field.values() {
            if seen.insert(keyword.to_lowercase()) {
                keywords.push(keyword);
            }
        }
    }

    keywords
}

/// Derive up to [`MAX_KEYWORDS`] keywords from text.
pub fn derive_keywords(text: &str) -> Vec<String> {
    let mut keywords: IndexSet<String> = IndexSet::new();

    for phrase in key_phrases(text) {
        if keywords.len() >= MAX_KEYWORDS {
            break;
        }
        keywords.insert(phrase);
    }

    for (word, _) in word_frequencies(text) {
        if keywords.len() >= MAX_KEYWORDS {
            break;
        }
        keywords.insert(word);
    }

    keywords.into_iter().collect()
}

/// Multi-word phrases from headings and emphasis, in order of appearance.
fn key_phrases(text: &str) -> Vec<String> {
    let mut found: Vec<(usize, String)> = Vec::new();

    for caps in HEADING.captures_iter(text) {
        if let Some(m) = caps.get(1) {
            found.push((m.start(), m.as_str().to_string()));
        }
    }
    for caps in EMPHASIS.captures_iter(text) {
        if let Some(m) = caps.get(1).or_else(|| caps.get(2)) {
            found.push((m.start(), m.as_str().to_string()));
        }
    }
    found.sort_by_key(|(pos, _)| *pos);

    let mut phrases = IndexSet::new();
    for (_, raw) in found {
        let phrase = normalize_words(&raw).join(" ");
        let word_count = phrase.split(' ').count();
        if (2..=4).contains(&word_count) && phrase.chars().count() >= MIN_TOKEN_CHARS {
            phrases.insert(phrase);
        }
    }
    phrases.into_iter().collect()
}

/// Word counts, most frequent first; ties keep first-appearance order.
fn word_frequencies(text: &str) -> Vec<(String, usize)> {
    let text = LINK_TARGET.replace_all(text, "]");
    let text = BARE_URL.replace_all(&text, " ");

    let mut counts: IndexMap<String, usize> = IndexMap::new();
    for word in normalize_words(&text) {
        if word.chars().count() < MIN_TOKEN_CHARS
            || word.chars().all(|c| c.is_ascii_digit())
            || STOP_WORDS.contains(&word.as_str())
        {
            continue;
        }
        *counts.entry(word).or_insert(0) += 1;
    }

    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    // Stable sort keeps first-appearance order among equal counts
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked
}

/// Lower-cased words with punctuation removed.
fn normalize_words(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::result::KeywordField;

    #[test]
    fn test_heading_and_emphasis_phrase_deduplicated() {
        let text = "## Growth Hacking\n\nThis is about **Growth Hacking** strategies.";
        let keywords = derive_keywords(text);
        assert_eq!(
            keywords.iter().filter(|k| *k == "growth hacking").count(),
            1
        );
        assert_eq!(keywords[0], "growth hacking");
        assert!(keywords.contains(&"strategies".to_string()));
        assert!(!keywords.contains(&"this".to_string()));
        assert!(!keywords.contains(&"about".to_string()));
    }

    #[test]
    fn test_frequency_order_and_cap() {
        let text = "rust rust rust tokio tokio serde alpha bravo charlie delta echo foxtrot golf";
        let keywords = derive_keywords(text);
        assert_eq!(keywords.len(), MAX_KEYWORDS);
        assert_eq!(&keywords[..3], &["rust", "tokio", "serde"]);
        // Ties keep first appearance
        assert_eq!(keywords[3], "alpha");
    }

    #[test]
    fn test_short_tokens_and_urls_ignored() {
        let text = "See [our docs](https://docs.example.com/start) or visit https://example.com now. API API";
        let keywords = derive_keywords(text);
        assert!(keywords.iter().all(|k| k.chars().count() >= MIN_TOKEN_CHARS));
        assert!(!keywords.iter().any(|k| k == "https" || k == "example"));
        assert!(keywords.contains(&"docs".to_string()));
    }

    #[test]
    fn test_explicit_keywords_preferred() {
        let mut page = PageRecord::from_markdown("growth growth growth");
        page.metadata.keywords = Some(KeywordField::Text("SaaS, Marketing, saas".into()));
        let mut second = PageRecord::default();
        second.metadata.keywords = Some(KeywordField::List(vec!["Analytics".into(), "marketing".into()]));

        let keywords = extract_keywords(&[page, second], "growth growth growth");
        assert_eq!(keywords, vec!["SaaS", "Marketing", "Analytics"]);
    }

    #[test]
    fn test_empty_text_yields_no_keywords() {
        assert!(derive_keywords("").is_empty());
        assert!(extract_keywords(&[], "").is_empty());
    }
}
