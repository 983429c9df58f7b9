//! # clipmark
//!
//! Clip linked web articles into a markdown note vault.
//!
//! ## Why this crate?
//!
//! Notes that bookmark a URL ("read this later") tend to stay empty
//! bookmarks forever, and the URLs themselves are often tracking or
//! short-link wrappers that a fetcher cannot render directly. This crate
//! walks a vault of markdown notes, finds the URL each note references
//! (frontmatter first, inline links second), rewrites it into a fetchable
//! form through a configurable rule engine, fetches a rendered article
//! representation, and merges the result back as a new note or an
//! appended section. A frontmatter marker makes repeated batch runs
//! idempotent: a note is clipped once, then skipped forever.
//!
//! ## Pipeline Overview
//!
//! ```text
//! note
//!  │
//!  ├─ 1. Frontmatter  locate and parse the leading `---` block
//!  ├─ 2. Extract      pick the source URL (fields, links, bare tokens)
//!  ├─ 3. Transform    rewrite via prioritized rules + proxy health cache
//!  ├─ 4. Fetch        rendered article markdown (external collaborator)
//!  ├─ 5. Merge        append under a separator, or create a new note
//!  └─ 6. Annotate     stamp `article_processed: true`
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use clipmark::{
//!     FsVault, HttpArticleFetcher, MergeMode, ProcessConfig, Processor,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let vault = Arc::new(FsVault::new("./vault"));
//!     let fetcher = Arc::new(HttpArticleFetcher::new());
//!     let config = ProcessConfig::builder().build()?;
//!
//!     let mut processor = Processor::new(vault, fetcher, config);
//!     let summary = processor
//!         .process_folder("Articles", MergeMode::Append, true)
//!         .await?;
//!     eprintln!(
//!         "{} processed, {} skipped, {} failed",
//!         summary.processed, summary.skipped, summary.failed
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `clipmark` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only
//! deps:
//! ```toml
//! clipmark = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod fetch;
pub mod fsvault;
pub mod outcome;
pub mod pipeline;
pub mod process;
pub mod vault;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    MergeMode, ProcessConfig, ProcessConfigBuilder, RuleSet, TransformationRule,
    TransformationType,
};
pub use error::{ClipmarkError, NoteError};
pub use fetch::{HttpArticleFetcher, HttpProber};
pub use fsvault::FsVault;
pub use outcome::{BatchSummary, Outcome};
pub use pipeline::transform::{ProxyHealthCache, ProxyProber, TransformationResult};
pub use process::{Processor, SEPARATOR_HEADING};
pub use vault::{ArticleFetcher, Notifier, NoopNotifier, Vault};
