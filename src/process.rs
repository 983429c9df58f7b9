//! Note processing orchestration.
//!
//! [`Processor`] sequences the per-note flow (read, skip check, extract,
//! transform, fetch, merge, stamp) and fans it out over folders. Batches
//! are strictly sequential: one note's side effects are fully committed
//! before the next note starts, which keeps aggregate counts predictable
//! and presents the rate-limited fetch collaborator with exactly one
//! in-flight request.
//!
//! ## Atomicity per note
//!
//! A note is either fully processed (content merged, and, when tracking,
//! marker stamped) or left exactly as it was. The marker write happens
//! only after the merge has landed, so a fetch or merge failure can never
//! leave a note marked processed with no article in it. Failures are
//! converted to [`Outcome::Failed`] at this boundary and never abort a
//! batch.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::{MergeMode, ProcessConfig};
use crate::error::{ClipmarkError, NoteError};
use crate::outcome::{BatchSummary, Outcome};
use crate::pipeline::transform::{self, ProxyHealthCache, ProxyProber};
use crate::pipeline::{annotate, extract};
use crate::vault::{ArticleFetcher, Notifier, NoopNotifier, Vault};

/// Fixed separator inserted above appended article content.
pub const SEPARATOR_HEADING: &str = "\n\n---\n\n## Retrieved Article Content\n\n";

/// Sequences extraction, transformation, fetching, and persistence over
/// one note or a folder of notes.
///
/// The proxy health cache is the only state shared across notes; it lives
/// here for the processor's lifetime, so keeping one `Processor` across
/// batch runs reuses probe results (a pure optimisation, safe to drop).
pub struct Processor {
    vault: Arc<dyn Vault>,
    fetcher: Arc<dyn ArticleFetcher>,
    notifier: Arc<dyn Notifier>,
    prober: Arc<dyn ProxyProber>,
    config: ProcessConfig,
    health: ProxyHealthCache,
}

impl Processor {
    /// Create a processor with a no-op notifier and the default HTTP
    /// proxy prober.
    pub fn new(
        vault: Arc<dyn Vault>,
        fetcher: Arc<dyn ArticleFetcher>,
        config: ProcessConfig,
    ) -> Self {
        Self {
            vault,
            fetcher,
            notifier: Arc::new(NoopNotifier),
            prober: Arc::new(crate::fetch::HttpProber),
            config,
            health: ProxyHealthCache::new(),
        }
    }

    /// Route notifications somewhere visible.
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Swap the proxy reachability probe (tests inject fakes here).
    pub fn with_prober(mut self, prober: Arc<dyn ProxyProber>) -> Self {
        self.prober = prober;
        self
    }

    /// Seed the proxy health cache, e.g. with entries retained from a
    /// previous run.
    pub fn with_health_cache(mut self, cache: ProxyHealthCache) -> Self {
        self.health = cache;
        self
    }

    pub fn config(&self) -> &ProcessConfig {
        &self.config
    }

    pub fn health_cache(&self) -> &ProxyHealthCache {
        &self.health
    }

    // ── Single-note commands ─────────────────────────────────────────────

    /// Process one note and notify its terminal outcome.
    pub async fn process_note(&mut self, path: &str, mode: MergeMode, track: bool) -> Outcome {
        let outcome = self.process_inner(path, mode, track).await;
        match &outcome {
            Outcome::Processed { url } => self
                .notifier
                .notify(&format!("Clipped article from {url} into '{path}'")),
            Outcome::Skipped => self
                .notifier
                .notify(&format!("'{path}' is already processed, skipping")),
            Outcome::Failed(err) => self
                .notifier
                .notify(&format!("Failed to process '{path}': {err}")),
        }
        outcome
    }

    /// Process the host's active note, if there is one.
    pub async fn process_active(
        &mut self,
        mode: MergeMode,
        track: bool,
    ) -> Result<Outcome, ClipmarkError> {
        let Some(path) = self.vault.active_note().await else {
            self.notifier.notify("No active note found");
            return Err(ClipmarkError::NoActiveNote);
        };
        Ok(self.process_note(&path, mode, track).await)
    }

    // ── Batch commands ───────────────────────────────────────────────────

    /// Process every note under `prefix`, in listing order, one at a time.
    ///
    /// A single note's failure is counted and iteration continues; only a
    /// failure to list the folder aborts. One aggregate summary is
    /// notified at the end.
    pub async fn process_folder(
        &mut self,
        prefix: &str,
        mode: MergeMode,
        track: bool,
    ) -> Result<BatchSummary, ClipmarkError> {
        let notes = self.vault.list_notes(prefix).await?;
        if notes.is_empty() {
            self.notifier
                .notify(&format!("No notes found under '{prefix}'"));
            return Ok(BatchSummary::default());
        }

        info!("processing {} notes under '{}'", notes.len(), prefix);
        self.notifier
            .notify(&format!("Processing {} notes...", notes.len()));

        let mut summary = BatchSummary::default();
        for path in &notes {
            let outcome = self.process_inner(path, mode, track).await;
            if let Outcome::Failed(err) = &outcome {
                warn!("'{}' failed: {}", path, err);
            }
            summary.record(&outcome);
        }

        self.notifier.notify(&format!(
            "Completed: {} processed, {} skipped, {} failed",
            summary.processed, summary.skipped, summary.failed
        ));
        Ok(summary)
    }

    /// Read a note of newline-separated URLs and hand them to the fetch
    /// collaborator's fire-and-forget batch entry point. Returns how many
    /// URLs were dispatched.
    pub async fn process_url_batch(&mut self, path: &str) -> Result<usize, ClipmarkError> {
        let text = self.vault.read(path).await?;
        let urls: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|line| line.starts_with("http://") || line.starts_with("https://"))
            .collect();

        if urls.is_empty() {
            self.notifier.notify("No URLs found in note");
            return Ok(0);
        }

        info!("dispatching {} URLs from '{}'", urls.len(), path);
        self.fetcher.fetch_batch(&urls.join("\n")).await;
        self.notifier
            .notify(&format!("Dispatched {} URLs for batch processing", urls.len()));
        Ok(urls.len())
    }

    // ── Per-note flow ────────────────────────────────────────────────────

    async fn process_inner(&mut self, path: &str, mode: MergeMode, track: bool) -> Outcome {
        let scan = self.config.frontmatter_scan_lines;

        let text = match self.vault.read(path).await {
            Ok(text) => text,
            Err(err) => {
                return Outcome::Failed(NoteError::Storage {
                    path: path.to_string(),
                    detail: err.to_string(),
                })
            }
        };

        if track && annotate::is_processed(&text, scan) {
            debug!("'{}' already carries the processed marker", path);
            return Outcome::Skipped;
        }

        let Some(url) = extract::extract_url(&text, scan) else {
            return Outcome::Failed(NoteError::NoUrlFound {
                path: path.to_string(),
            });
        };
        info!("extracted URL from '{}': {}", path, url);

        let result =
            transform::transform(&url, &self.config, &mut self.health, self.prober.as_ref()).await;
        let fetch_url = result.fetch_url().to_string();
        if result.applied_rule.is_some() {
            debug!(
                "'{}' rewritten to '{}' (rule {:?}, proxy healthy: {})",
                url, fetch_url, result.applied_rule, result.proxy_healthy
            );
        }

        let markdown = match self.fetcher.fetch_rendered_markdown(&fetch_url).await {
            Some(markdown) if !markdown.trim().is_empty() => markdown,
            _ => {
                return Outcome::Failed(NoteError::FetchFailed {
                    url: fetch_url,
                    detail: "fetch collaborator returned no content".to_string(),
                })
            }
        };

        let merge = match mode {
            MergeMode::Append => {
                let section = format!("{SEPARATOR_HEADING}{markdown}");
                self.vault.append(path, &section).await
            }
            MergeMode::CreateNote => {
                let target = article_note_path(path);
                info!("creating '{}' from '{}'", target, path);
                self.vault.write(&target, &markdown).await
            }
        };
        if let Err(err) = merge {
            return Outcome::Failed(NoteError::Storage {
                path: path.to_string(),
                detail: err.to_string(),
            });
        }

        // Stamp only after the merge has landed, and against a fresh read:
        // in append mode the note just grew, and stamping the stale text
        // would clobber the appended section.
        if track {
            let current = match self.vault.read(path).await {
                Ok(current) => current,
                Err(err) => {
                    return Outcome::Failed(NoteError::Storage {
                        path: path.to_string(),
                        detail: err.to_string(),
                    })
                }
            };
            let stamped = annotate::set_processed_marker(&current, scan);
            if stamped != current {
                if let Err(err) = self.vault.write(path, &stamped).await {
                    return Outcome::Failed(NoteError::Storage {
                        path: path.to_string(),
                        detail: err.to_string(),
                    });
                }
            }
        }

        Outcome::Processed { url }
    }
}

/// Path of the note created in [`MergeMode::CreateNote`]: the source
/// note's stem with an ` (Article)` suffix, next to the source.
fn article_note_path(source: &str) -> String {
    match source.rsplit_once('.') {
        Some((stem, ext)) if ext.eq_ignore_ascii_case("md") => format!("{stem} (Article).md"),
        _ => format!("{source} (Article).md"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn article_note_path_replaces_md_extension() {
        assert_eq!(
            article_note_path("Articles/monday.md"),
            "Articles/monday (Article).md"
        );
    }

    #[test]
    fn article_note_path_handles_dotless_names() {
        assert_eq!(article_note_path("inbox/note"), "inbox/note (Article).md");
    }

    #[test]
    fn article_note_path_ignores_dots_in_directories() {
        assert_eq!(
            article_note_path("v1.2/note"),
            "v1.2/note (Article).md"
        );
    }
}
