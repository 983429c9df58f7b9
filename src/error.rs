//! Error types for the clipmark library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ClipmarkError`] is **fatal**: the requested operation cannot proceed
//!   at all (invalid configuration, the vault cannot be listed, no active
//!   note). Returned as `Err(ClipmarkError)` from the top-level `Processor`
//!   entry points.
//!
//! * [`NoteError`] is **non-fatal**: a single note failed (no URL in it,
//!   the article could not be fetched) but the rest of the batch is fine.
//!   Carried inside [`crate::outcome::Outcome::Failed`] so callers can
//!   inspect partial success rather than losing the whole batch to one
//!   bad note.
//!
//! The separation lets callers decide their own tolerance: abort on the
//! first note failure, log and continue, or collect all errors for a
//! post-run report. Frontmatter parse failures are not errors at all:
//! metadata is advisory, so a malformed block degrades to an empty mapping
//! and processing continues.

use thiserror::Error;

/// All fatal errors returned by the clipmark library.
///
/// Note-level failures use [`NoteError`] and are stored in
/// [`crate::outcome::Outcome`] rather than propagated here.
#[derive(Debug, Error)]
pub enum ClipmarkError {
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The storage collaborator failed to read, write, or list notes.
    #[error("Storage operation failed for '{path}': {detail}")]
    Storage { path: String, detail: String },

    /// No active note is available for the active-note commands.
    #[error("No active note found")]
    NoActiveNote,

    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single note.
///
/// Stored inside [`crate::outcome::Outcome::Failed`] when a note fails.
/// A batch continues past any number of these.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum NoteError {
    /// Neither the frontmatter fields nor the body yielded a URL.
    #[error("No URL found in note '{path}'")]
    NoUrlFound { path: String },

    /// The fetch collaborator returned no content for the URL.
    #[error("Failed to fetch article from '{url}': {detail}")]
    FetchFailed { url: String, detail: String },

    /// A storage operation on this note failed; the note is left as it was.
    #[error("Storage operation failed for '{path}': {detail}")]
    Storage { path: String, detail: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_url_display_names_the_note() {
        let e = NoteError::NoUrlFound {
            path: "Articles/monday.md".into(),
        };
        assert!(e.to_string().contains("Articles/monday.md"));
    }

    #[test]
    fn fetch_failed_display_carries_url_and_detail() {
        let e = NoteError::FetchFailed {
            url: "http://x.test/a".into(),
            detail: "HTTP 502".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("http://x.test/a"));
        assert!(msg.contains("HTTP 502"));
    }

    #[test]
    fn invalid_config_display() {
        let e = ClipmarkError::InvalidConfig("proxy health timeout must be > 0".into());
        assert!(e.to_string().starts_with("Invalid configuration"));
    }
}
