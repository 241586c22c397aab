// ============================================================================
// File: src/source.rs
// Normalization of raw source records
// ============================================================================

use url::Url;

use crate::models::{RawSource, Source};

/// Title used for search and follow-up sources without one
pub const SEARCH_TITLE_FALLBACK: &str = "Untitled";

/// Title used for chat sources without one
pub const CHAT_TITLE_FALLBACK: &str = "Source";

impl Source {
    /// Build a canonical source from a raw record.
    ///
    /// The first non-empty candidate wins for each field; domain and favicon
    /// are best-effort and never fail.
    pub fn from_raw(raw: &RawSource, title_fallback: &str) -> Self {
        let url = first_non_empty(&[&raw.url, &raw.link]).unwrap_or_default();
        let snippet =
            first_non_empty(&[&raw.snippet, &raw.description, &raw.content]).unwrap_or_default();
        let title = first_non_empty(&[&raw.title]).unwrap_or_else(|| title_fallback.to_string());

        Self {
            domain: extract_domain(&url),
            favicon: favicon_url(&url),
            title,
            url,
            snippet,
        }
    }
}

/// Normalize a list of raw records, preserving order
pub fn normalize_sources(raw: &[RawSource], title_fallback: &str) -> Vec<Source> {
    raw.iter()
        .map(|r| Source::from_raw(r, title_fallback))
        .collect()
}

fn first_non_empty(candidates: &[&Option<String>]) -> Option<String> {
    candidates
        .iter()
        .filter_map(|c| c.as_deref())
        .find(|c| !c.is_empty())
        .map(str::to_string)
}

fn host_of(url: &str) -> Option<String> {
    Url::parse(url).ok()?.host_str().map(str::to_string)
}

/// Host of `url` without a leading `www.`, or empty
pub fn extract_domain(url: &str) -> String {
    match host_of(url) {
        Some(host) => host.strip_prefix("www.").unwrap_or(&host).to_string(),
        None => String::new(),
    }
}

/// Favicon service URL for the host of `url`, or empty
pub fn favicon_url(url: &str) -> String {
    match host_of(url) {
        Some(host) => format!("https://www.google.com/s2/favicons?domain={}&sz=32", host),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(json: &str) -> RawSource {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn link_and_description_fill_in_for_url_and_snippet() {
        let source = Source::from_raw(
            &raw(r#"{"title": "Docs", "link": "https://www.rust-lang.org/learn", "description": "Learn Rust"}"#),
            SEARCH_TITLE_FALLBACK,
        );
        assert_eq!(source.url, "https://www.rust-lang.org/learn");
        assert_eq!(source.snippet, "Learn Rust");
        assert_eq!(source.domain, "rust-lang.org");
        assert_eq!(
            source.favicon,
            "https://www.google.com/s2/favicons?domain=www.rust-lang.org&sz=32"
        );
    }

    #[test]
    fn empty_url_falls_through_to_link() {
        let source = Source::from_raw(
            &raw(r#"{"url": "", "link": "http://b.example", "snippet": "", "content": "body"}"#),
            SEARCH_TITLE_FALLBACK,
        );
        assert_eq!(source.url, "http://b.example");
        assert_eq!(source.snippet, "body");
    }

    #[test]
    fn missing_fields_use_defaults() {
        let search = Source::from_raw(&RawSource::default(), SEARCH_TITLE_FALLBACK);
        assert_eq!(search.title, "Untitled");
        assert_eq!(search.url, "");
        assert_eq!(search.snippet, "");
        assert_eq!(search.domain, "");
        assert_eq!(search.favicon, "");

        let chat = Source::from_raw(&RawSource::default(), CHAT_TITLE_FALLBACK);
        assert_eq!(chat.title, "Source");
    }

    #[test]
    fn unparseable_url_yields_empty_derivations() {
        assert_eq!(extract_domain("not a url"), "");
        assert_eq!(favicon_url("not a url"), "");
    }

    #[test]
    fn normalize_keeps_order() {
        let sources = normalize_sources(
            &[raw(r#"{"title": "A"}"#), raw(r#"{"title": "B"}"#)],
            SEARCH_TITLE_FALLBACK,
        );
        let titles: Vec<_> = sources.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, ["A", "B"]);
    }
}
