//! Idempotency marker: stamp a note as processed without disturbing it.
//!
//! The marker is a single reserved boolean frontmatter field. The
//! invariants here are stricter than for ordinary metadata edits:
//!
//! * once the marker is `true` the note text is returned byte-identical,
//!   so repeated batch runs never churn formatting;
//! * when the marker is added, every unrelated field keeps its original
//!   order and value (round-trip is value-equal, not byte-identical:
//!   whitespace and quoting may normalise);
//! * the body after the block is spliced back verbatim.

use crate::pipeline::frontmatter::{self, Scalar};

/// The reserved frontmatter field used for idempotency tracking.
pub const MARKER_KEY: &str = "article_processed";

/// True when the note already carries `article_processed: true`.
///
/// Absence of a block, a malformed block, or any non-`true` value all
/// count as not processed.
pub fn is_processed(text: &str, scan_limit: usize) -> bool {
    let info = frontmatter::locate(text, scan_limit);
    if !info.exists {
        return false;
    }
    matches!(
        frontmatter::parse_block(&text[info.from..info.to]).get(MARKER_KEY),
        Some(Scalar::Bool(true))
    )
}

/// Return `text` with the processed marker set.
///
/// * No block: synthesize one containing only the marker, separated from
///   the body by a blank line.
/// * Marker already `true`: return the text unchanged.
/// * Otherwise: set the marker, re-serialise the whole mapping in its
///   original field order (marker appended if new), splice over the old
///   block bounds, body untouched.
pub fn set_processed_marker(text: &str, scan_limit: usize) -> String {
    let info = frontmatter::locate(text, scan_limit);

    if !info.exists {
        return format!("{}\n{MARKER_KEY}: true\n{}\n\n{text}", frontmatter::DELIMITER, frontmatter::DELIMITER);
    }

    let mut fm = frontmatter::parse_block(&text[info.from..info.to]);
    if matches!(fm.get(MARKER_KEY), Some(Scalar::Bool(true))) {
        return text.to_string();
    }

    fm.set(MARKER_KEY, Scalar::Bool(true));
    let mut out = String::with_capacity(text.len() + MARKER_KEY.len() + 8);
    out.push_str(&fm.to_block());
    out.push_str(&text[info.to..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCAN: usize = 100;

    #[test]
    fn no_block_synthesizes_marker_block() {
        let text = "Just a note body.\n";
        let stamped = set_processed_marker(text, SCAN);
        assert_eq!(
            stamped,
            "---\narticle_processed: true\n---\n\nJust a note body.\n"
        );
        assert!(is_processed(&stamped, SCAN));
    }

    #[test]
    fn marker_already_true_is_byte_identical_noop() {
        let text = "---\ntitle:   oddly spaced\narticle_processed: true\n---\nbody\n";
        assert_eq!(set_processed_marker(text, SCAN), text);
    }

    #[test]
    fn marker_false_is_flipped_in_place() {
        let text = "---\narticle_processed: false\nurl: http://x.test\n---\nbody\n";
        let stamped = set_processed_marker(text, SCAN);
        assert_eq!(
            stamped,
            "---\narticle_processed: true\nurl: http://x.test\n---\nbody\n"
        );
    }

    #[test]
    fn marker_absent_is_appended_after_existing_fields() {
        let text = "---\nurl: http://x.test\ntags: reading\n---\nbody\n";
        let stamped = set_processed_marker(text, SCAN);
        assert_eq!(
            stamped,
            "---\nurl: http://x.test\ntags: reading\narticle_processed: true\n---\nbody\n"
        );
    }

    #[test]
    fn stamping_is_idempotent() {
        let cases = [
            "no block at all\n",
            "---\nurl: http://x.test\n---\nbody\n",
            "---\narticle_processed: false\n---\n",
            "---\narticle_processed: true\n---\nbody\n",
        ];
        for text in cases {
            let once = set_processed_marker(text, SCAN);
            let twice = set_processed_marker(&once, SCAN);
            assert_eq!(once, twice, "double application drifted for {text:?}");
        }
    }

    #[test]
    fn unrelated_fields_survive_value_equal() {
        let text = "---\ntitle: \"A quoted title\"\ncount: 42\nratio: 1.5\nflag: false\n---\nbody\n";
        let stamped = set_processed_marker(text, SCAN);

        let info = frontmatter::locate(&stamped, SCAN);
        let fm = frontmatter::parse_block(&stamped[info.from..info.to]);
        assert_eq!(fm.get("title"), Some(&Scalar::Str("A quoted title".into())));
        assert_eq!(fm.get("count"), Some(&Scalar::Int(42)));
        assert_eq!(fm.get("ratio"), Some(&Scalar::Float(1.5)));
        assert_eq!(fm.get("flag"), Some(&Scalar::Bool(false)));
        assert_eq!(fm.get(MARKER_KEY), Some(&Scalar::Bool(true)));
    }

    #[test]
    fn body_is_left_verbatim() {
        let body = "\nline one\n\n  indented, with: a colon\n---\nnot frontmatter\n";
        let text = format!("---\nurl: http://x.test\n---{body}");
        let stamped = set_processed_marker(&text, SCAN);
        assert!(stamped.ends_with(body));
    }

    #[test]
    fn marker_with_string_true_is_rewritten_to_boolean() {
        // Only a boolean true short-circuits; a quoted string is re-set.
        let text = "---\narticle_processed: \"true\"\n---\n";
        let stamped = set_processed_marker(text, SCAN);
        assert!(is_processed(&stamped, SCAN));
    }
}
