//! URL extraction: pick one source URL out of a note.
//!
//! The search order is fixed: frontmatter fields by priority, then the
//! first markdown-style link in the body, then the first bare `http(s)`
//! token. The first hit wins and no URL validation happens here; a
//! malformed value passes through unchanged, because validity is the
//! transformer's and the fetch collaborator's concern.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::pipeline::frontmatter::{self, Scalar};

/// Frontmatter fields consulted for a source URL, in priority order.
/// The first field present with a non-empty value wins, even when a
/// lower-priority field is also set. Key match is case-sensitive and exact.
pub const URL_FIELDS: [&str; 5] = ["url", "link", "source", "web_url", "article_url"];

static RE_MARKDOWN_LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[[^\]]+\]\(([^)]+)\)").unwrap());

static RE_BARE_URL: Lazy<Regex> = Lazy::new(|| Regex::new(r"https?://\S+").unwrap());

/// Extract the best-effort source URL from a note's full text.
///
/// `scan_limit` bounds the frontmatter locator (see
/// [`frontmatter::locate`]). Returns `None` when neither the frontmatter
/// nor the body references a URL.
pub fn extract_url(text: &str, scan_limit: usize) -> Option<String> {
    let info = frontmatter::locate(text, scan_limit);

    if info.exists {
        let fm = frontmatter::parse_block(&text[info.from..info.to]);
        for field in URL_FIELDS {
            if let Some(value) = fm.get(field) {
                let rendered = match value {
                    Scalar::Str(s) => s.clone(),
                    other => other.to_string(),
                };
                if !rendered.trim().is_empty() {
                    return Some(rendered);
                }
            }
        }
    }

    // Fall back to the body, skipping the frontmatter so a `url:` field
    // already rejected above is not re-found as a bare token.
    let body = &text[info.to..];

    if let Some(caps) = RE_MARKDOWN_LINK.captures(body) {
        return Some(caps[1].to_string());
    }

    RE_BARE_URL.find(body).map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCAN: usize = 100;

    #[test]
    fn frontmatter_field_priority_link_beats_source() {
        let text = "---\nsource: A\nlink: B\n---\nbody\n";
        assert_eq!(extract_url(text, SCAN), Some("B".into()));
    }

    #[test]
    fn frontmatter_url_beats_everything() {
        let text = "---\narticle_url: D\nurl: http://primary.test\nlink: B\n---\n";
        assert_eq!(extract_url(text, SCAN), Some("http://primary.test".into()));
    }

    #[test]
    fn empty_field_falls_through_to_next_priority() {
        let text = "---\nurl:\nlink: http://second.test\n---\n";
        assert_eq!(extract_url(text, SCAN), Some("http://second.test".into()));
    }

    #[test]
    fn markdown_link_beats_bare_url() {
        let text = "Check out [here](http://x.test/a) and also http://y.test/b\n";
        assert_eq!(extract_url(text, SCAN), Some("http://x.test/a".into()));
    }

    #[test]
    fn bare_url_found_when_no_markdown_link() {
        let text = "reading list:\nhttps://y.test/b today\n";
        assert_eq!(extract_url(text, SCAN), Some("https://y.test/b".into()));
    }

    #[test]
    fn body_search_runs_when_no_frontmatter_field_matches() {
        let text = "---\ntitle: no urls in here\n---\nsee [ref](http://z.test/c)\n";
        assert_eq!(extract_url(text, SCAN), Some("http://z.test/c".into()));
    }

    #[test]
    fn nothing_found_reports_absent() {
        assert_eq!(extract_url("just prose, no links at all\n", SCAN), None);
        assert_eq!(extract_url("", SCAN), None);
    }

    #[test]
    fn malformed_url_passes_through_unvalidated() {
        let text = "---\nurl: notaurl\n---\n";
        assert_eq!(extract_url(text, SCAN), Some("notaurl".into()));
    }

    #[test]
    fn key_match_is_case_sensitive() {
        let text = "---\nURL: http://caps.test\n---\nhttp://body.test\n";
        assert_eq!(extract_url(text, SCAN), Some("http://body.test".into()));
    }
}
