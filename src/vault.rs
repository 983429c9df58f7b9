//! Collaborator boundary: storage, article fetching, and notifications.
//!
//! The processing core never touches the filesystem or the network
//! directly. It talks to three narrow traits injected at construction
//! time, so a host application (or a test) can supply whatever backing it
//! wants: a directory of files, an in-memory map, a remote vault.
//!
//! Reference implementations live in [`crate::fsvault`] and
//! [`crate::fetch`]; tests use in-memory fakes.

use crate::error::ClipmarkError;
use async_trait::async_trait;

/// Note storage as seen by the processing core.
///
/// Paths are vault-relative strings (`"Articles/monday.md"`). The vault
/// owns its notes; the core holds a note's text only for the duration of
/// one operation and re-reads before every mutation.
#[async_trait]
pub trait Vault: Send + Sync {
    /// Read a note's full text.
    async fn read(&self, path: &str) -> Result<String, ClipmarkError>;

    /// Replace a note's text, creating the note if it does not exist.
    async fn write(&self, path: &str, text: &str) -> Result<(), ClipmarkError>;

    /// Append text verbatim to an existing note.
    async fn append(&self, path: &str, text: &str) -> Result<(), ClipmarkError>;

    /// List note paths under the given path prefix, in a stable order.
    async fn list_notes(&self, prefix: &str) -> Result<Vec<String>, ClipmarkError>;

    /// The note currently open in the host, if the host has such a notion.
    async fn active_note(&self) -> Option<String>;
}

/// The external service that turns a URL into rendered article markdown.
///
/// Failure is signalled by `None`; there is no exception contract at this
/// boundary, and retry policy is the collaborator's own concern.
#[async_trait]
pub trait ArticleFetcher: Send + Sync {
    /// Fetch and render the article behind `url`. `None` means failure.
    async fn fetch_rendered_markdown(&self, url: &str) -> Option<String>;

    /// Fire-and-forget batch entry point: `urls` is newline-joined. No
    /// per-URL result is guaranteed by this boundary.
    async fn fetch_batch(&self, urls: &str);
}

/// Sink for human-readable progress and outcome messages.
///
/// The core emits exactly one notification per terminal outcome for
/// single-note commands and one aggregate summary per batch. Wording is
/// not part of the contract. The default method is a no-op so hosts only
/// override when they have somewhere to put the message.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str) {
        let _ = message;
    }
}

/// A no-op implementation for callers that don't surface notifications.
pub struct NoopNotifier;

impl Notifier for NoopNotifier {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    struct RecordingNotifier {
        messages: Mutex<Vec<String>>,
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, message: &str) {
            self.messages.lock().unwrap().push(message.to_string());
        }
    }

    #[test]
    fn noop_notifier_does_not_panic() {
        NoopNotifier.notify("ignored");
    }

    #[test]
    fn arc_dyn_notifier_works() {
        let recorder = Arc::new(RecordingNotifier {
            messages: Mutex::new(Vec::new()),
        });
        let notifier: Arc<dyn Notifier> = Arc::clone(&recorder) as Arc<dyn Notifier>;
        notifier.notify("clipped 3 articles");
        assert_eq!(
            recorder.messages.lock().unwrap().as_slice(),
            ["clipped 3 articles"]
        );
    }
}
