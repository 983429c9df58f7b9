//! Pipeline stages for turning a linked note into a clipped article.
//!
//! Each submodule implements exactly one transformation step.
//! Keeping stages separate makes each independently testable and lets us
//! swap implementations (e.g. a different rewrite-rule engine) without
//! touching other stages.
//!
//! ## Data Flow
//!
//! ```text
//! frontmatter ──▶ extract ──▶ transform ──▶ (fetch) ──▶ annotate
//! (locate/parse)  (find URL)  (rewrite URL)  (external)  (set marker)
//! ```
//!
//! 1. [`frontmatter`] — locate the leading `---` block and parse its flat
//!    `key: value` fields without a full YAML parser
//! 2. [`extract`]     — pick the note's source URL: frontmatter fields by
//!    priority, then the first markdown link, then the first bare URL
//! 3. [`transform`]   — rewrite opaque tracking/short URLs into fetchable
//!    targets via prioritized rules and a health-checked proxy layer
//! 4. [`annotate`]    — idempotently stamp `article_processed: true` after
//!    a successful merge

pub mod annotate;
pub mod extract;
pub mod frontmatter;
pub mod transform;
