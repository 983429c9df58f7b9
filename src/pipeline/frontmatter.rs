//! Frontmatter location and flat `key: value` parsing.
//!
//! ## Why not a YAML crate?
//!
//! The notes this crate manipulates only ever use flat scalar fields in
//! their frontmatter, and the mutator must re-serialise a block while
//! preserving field order and unrelated values exactly. A line-oriented
//! parser over the `key: value` subset gives us both for a few dozen lines
//! of code, with no surprises from anchors, multi-line strings, or nested
//! collections. This is a stated limitation: nested YAML in a block is
//! treated as opaque string values or skipped as malformed lines, never as
//! an error.
//!
//! Parsing is total: malformed lines are skipped, and a block that yields
//! nothing parses to an empty mapping. Metadata presence is advisory, so
//! the caller never sees a parse failure.

use std::fmt;

/// The fixed three-character delimiter line that opens and closes a block.
pub const DELIMITER: &str = "---";

/// Byte bounds of a leading frontmatter block.
///
/// `[from, to)` covers the block including both delimiter lines (and the
/// closing delimiter's newline). `from` is always 0 when `exists` is true:
/// a note whose very first content is not a delimiter line has no block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrontMatterInfo {
    pub exists: bool,
    pub from: usize,
    pub to: usize,
}

impl FrontMatterInfo {
    const ABSENT: FrontMatterInfo = FrontMatterInfo {
        exists: false,
        from: 0,
        to: 0,
    };
}

/// Locate the leading frontmatter block of `text`.
///
/// At most `scan_limit` lines after the opening delimiter are inspected;
/// if no closing delimiter shows up within that many lines, the note is
/// treated as having no block. This keeps location cost independent of
/// note size.
pub fn locate(text: &str, scan_limit: usize) -> FrontMatterInfo {
    let first_end = text.find('\n');
    let first_line = match first_end {
        Some(i) => &text[..i],
        None => text,
    };
    if first_line.trim_end_matches('\r') != DELIMITER {
        return FrontMatterInfo::ABSENT;
    }
    // An opening delimiter with no further lines cannot be a block.
    let Some(first_end) = first_end else {
        return FrontMatterInfo::ABSENT;
    };

    let mut offset = first_end + 1;
    for _ in 0..scan_limit {
        if offset >= text.len() {
            return FrontMatterInfo::ABSENT;
        }
        let rest = &text[offset..];
        let line_end = rest.find('\n');
        let line = match line_end {
            Some(i) => &rest[..i],
            None => rest,
        };
        let next = match line_end {
            Some(i) => offset + i + 1,
            None => text.len(),
        };
        if line.trim_end_matches('\r') == DELIMITER {
            return FrontMatterInfo {
                exists: true,
                from: 0,
                to: next,
            };
        }
        offset = next;
    }
    FrontMatterInfo::ABSENT
}

// ── Scalar values ────────────────────────────────────────────────────────

/// A flat frontmatter value.
///
/// `true`/`false` parse as booleans and numeric literals as numbers;
/// everything else is a string (with one pair of surrounding quotes
/// stripped). `Display` renders the literal form the parser reads back,
/// so round-trips are value-equal.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(b) => write!(f, "{b}"),
            Scalar::Int(n) => write!(f, "{n}"),
            Scalar::Float(x) => write!(f, "{x}"),
            Scalar::Str(s) => f.write_str(s),
        }
    }
}

fn parse_scalar(raw: &str) -> Scalar {
    match raw {
        "true" => return Scalar::Bool(true),
        "false" => return Scalar::Bool(false),
        _ => {}
    }
    if let Ok(n) = raw.parse::<i64>() {
        return Scalar::Int(n);
    }
    if let Ok(x) = raw.parse::<f64>() {
        return Scalar::Float(x);
    }
    Scalar::Str(unquote(raw).to_string())
}

fn unquote(raw: &str) -> &str {
    let b = raw.as_bytes();
    if b.len() >= 2
        && ((b[0] == b'"' && b[b.len() - 1] == b'"')
            || (b[0] == b'\'' && b[b.len() - 1] == b'\''))
    {
        &raw[1..raw.len() - 1]
    } else {
        raw
    }
}

// ── Mapping ──────────────────────────────────────────────────────────────

/// An ordered `key -> scalar` mapping parsed from a frontmatter block.
///
/// Keys are unique; setting an existing key replaces its value in place so
/// the original declaration order survives a round-trip. The mapping is
/// parsed fresh from text on each read and never cached across notes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrontMatter {
    fields: Vec<(String, Scalar)>,
}

impl FrontMatter {
    pub fn get(&self, key: &str) -> Option<&Scalar> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Insert or replace a field. Replacement keeps the field's original
    /// position; new keys append at the end.
    pub fn set(&mut self, key: impl Into<String>, value: Scalar) {
        let key = key.into();
        if let Some(slot) = self.fields.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            self.fields.push((key, value));
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Scalar)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Serialise back into delimited block form, one `key: value` line per
    /// field, in mapping order. Booleans and numbers are written as
    /// literals and strings unquoted, matching what the parser reads.
    pub fn to_block(&self) -> String {
        let mut out = String::with_capacity(self.fields.len() * 24 + 8);
        out.push_str(DELIMITER);
        out.push('\n');
        for (key, value) in &self.fields {
            out.push_str(key);
            out.push_str(": ");
            out.push_str(&value.to_string());
            out.push('\n');
        }
        out.push_str(DELIMITER);
        out.push('\n');
        out
    }
}

/// Parse the text of a located block (delimiters included) into a mapping.
///
/// Delimiter lines, blank lines, and lines without a `:` are skipped.
/// Duplicate keys collapse to a single entry: the last value wins, the
/// first position is kept.
pub fn parse_block(block: &str) -> FrontMatter {
    let mut fm = FrontMatter::default();
    for line in block.lines() {
        let line = line.trim_end_matches('\r');
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed == DELIMITER {
            continue;
        }
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        fm.set(key, parse_scalar(value.trim()));
    }
    fm
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCAN: usize = 100;

    #[test]
    fn locate_simple_block() {
        let text = "---\nurl: http://x.test/a\n---\nbody here\n";
        let info = locate(text, SCAN);
        assert!(info.exists);
        assert_eq!(info.from, 0);
        assert_eq!(&text[info.from..info.to], "---\nurl: http://x.test/a\n---\n");
        assert_eq!(&text[info.to..], "body here\n");
    }

    #[test]
    fn locate_requires_block_at_offset_zero() {
        let text = "\n---\nurl: http://x.test\n---\n";
        assert!(!locate(text, SCAN).exists);
    }

    #[test]
    fn locate_rejects_longer_dash_runs() {
        assert!(!locate("----\na: 1\n----\n", SCAN).exists);
    }

    #[test]
    fn locate_unterminated_block_is_absent() {
        assert!(!locate("---\nurl: http://x.test\nno closing line\n", SCAN).exists);
    }

    #[test]
    fn locate_gives_up_past_scan_limit() {
        let mut text = String::from("---\n");
        for i in 0..50 {
            text.push_str(&format!("k{i}: {i}\n"));
        }
        text.push_str("---\nbody\n");
        assert!(!locate(&text, 10).exists);
        assert!(locate(&text, 51).exists);
    }

    #[test]
    fn locate_closing_delimiter_at_eof_without_newline() {
        let text = "---\nurl: http://x.test\n---";
        let info = locate(text, SCAN);
        assert!(info.exists);
        assert_eq!(info.to, text.len());
    }

    #[test]
    fn locate_handles_crlf() {
        let text = "---\r\nurl: http://x.test\r\n---\r\nbody";
        let info = locate(text, SCAN);
        assert!(info.exists);
        assert_eq!(&text[info.to..], "body");
    }

    #[test]
    fn parse_scalars_by_shape() {
        let fm = parse_block("---\nflag: true\ncount: 3\nratio: 0.5\ntitle: Hello world\n---\n");
        assert_eq!(fm.get("flag"), Some(&Scalar::Bool(true)));
        assert_eq!(fm.get("count"), Some(&Scalar::Int(3)));
        assert_eq!(fm.get("ratio"), Some(&Scalar::Float(0.5)));
        assert_eq!(fm.get("title"), Some(&Scalar::Str("Hello world".into())));
    }

    #[test]
    fn parse_strips_one_pair_of_quotes() {
        let fm = parse_block("title: \"Quoted title\"\nother: 'single'\n");
        assert_eq!(fm.get("title"), Some(&Scalar::Str("Quoted title".into())));
        assert_eq!(fm.get("other"), Some(&Scalar::Str("single".into())));
    }

    #[test]
    fn parse_keeps_colons_inside_values() {
        let fm = parse_block("url: https://x.test/a?b=1\n");
        assert_eq!(
            fm.get("url"),
            Some(&Scalar::Str("https://x.test/a?b=1".into()))
        );
    }

    #[test]
    fn parse_skips_malformed_lines() {
        let fm = parse_block("---\njust some prose\nkey: value\n: no key\n---\n");
        assert_eq!(fm.len(), 1);
        assert_eq!(fm.get("key"), Some(&Scalar::Str("value".into())));
    }

    #[test]
    fn parse_empty_block_yields_empty_mapping() {
        assert!(parse_block("---\n---\n").is_empty());
    }

    #[test]
    fn duplicate_keys_keep_first_position_last_value() {
        let fm = parse_block("a: 1\nb: 2\na: 3\n");
        assert_eq!(fm.len(), 2);
        assert_eq!(fm.get("a"), Some(&Scalar::Int(3)));
        let order: Vec<&str> = fm.iter().map(|(k, _)| k).collect();
        assert_eq!(order, ["a", "b"]);
    }

    #[test]
    fn block_round_trip_is_value_equal() {
        let original = "---\ntitle: Some note\ncount: 3\nflag: false\n---\n";
        let fm = parse_block(original);
        let reparsed = parse_block(&fm.to_block());
        assert_eq!(fm, reparsed);
    }

    #[test]
    fn to_block_preserves_field_order() {
        let mut fm = FrontMatter::default();
        fm.set("zeta", Scalar::Int(1));
        fm.set("alpha", Scalar::Int(2));
        fm.set("zeta", Scalar::Int(3));
        assert_eq!(fm.to_block(), "---\nzeta: 3\nalpha: 2\n---\n");
    }
}
