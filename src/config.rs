//! Configuration types for note processing.
//!
//! All processing behaviour is controlled through [`ProcessConfig`], built
//! via its [`ProcessConfigBuilder`]. Keeping every knob in one struct makes
//! it trivial to share configs across commands, serialise them for logging,
//! and diff two runs to understand why their outputs differ.
//!
//! # Design choice: builder over constructor
//! A many-field constructor is unreadable and breaks on every new field.
//! The builder pattern lets callers set only what they care about and rely
//! on well-documented defaults for the rest.

use crate::error::ClipmarkError;
use serde::{Deserialize, Serialize};

/// Configuration for note processing and URL transformation.
///
/// Built via [`ProcessConfig::builder()`].
///
/// # Example
/// ```rust
/// use clipmark::{ProcessConfig, TransformationRule, TransformationType};
///
/// let config = ProcessConfig::builder()
///     .rule(TransformationRule {
///         id: "nitter".into(),
///         name: "Rewrite twitter links through nitter".into(),
///         enabled: true,
///         matchers: vec!["twitter.com".into(), "x.com".into()],
///         transformation: TransformationType::Prefix,
///         template: "https://nitter.net/proxy?url={url}".into(),
///         priority: 10,
///     })
///     .proxy_health_timeout_ms(2_000)
///     .build()
///     .unwrap();
/// assert_eq!(config.rules.len(), 1);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessConfig {
    /// Ordered URL rewrite rules. Declaration order matters: when two
    /// enabled matching rules share the same priority, the earlier one wins.
    pub rules: Vec<TransformationRule>,

    /// How long a proxy health probe result stays fresh, in minutes.
    /// Default: 10.
    ///
    /// Probing a proxy on every single URL would add one round-trip per note
    /// to a batch. Ten minutes is long enough to amortise the probe across a
    /// realistic batch and short enough that a proxy restart is noticed
    /// within one coffee break. An entry older than the TTL is re-probed.
    pub proxy_health_cache_ttl_minutes: u64,

    /// Timeout for a single proxy health probe, in milliseconds.
    /// Default: 3000.
    ///
    /// The probe exists to avoid routing article fetches through a dead
    /// proxy, so it has to answer faster than the fetch it protects. Three
    /// seconds distinguishes "down" from "slow" on typical networks without
    /// stalling a batch.
    pub proxy_health_timeout_ms: u64,

    /// How many lines the frontmatter locator inspects before concluding a
    /// note has an unterminated (and therefore absent) block. Default: 100.
    ///
    /// The cap keeps location cost independent of note size: a note whose
    /// body opens with `---` but never closes it would otherwise be scanned
    /// to the end.
    pub frontmatter_scan_lines: usize,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            rules: Vec::new(),
            proxy_health_cache_ttl_minutes: 10,
            proxy_health_timeout_ms: 3_000,
            frontmatter_scan_lines: 100,
        }
    }
}

impl ProcessConfig {
    /// Create a new builder for `ProcessConfig`.
    pub fn builder() -> ProcessConfigBuilder {
        ProcessConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ProcessConfig`].
#[derive(Debug)]
pub struct ProcessConfigBuilder {
    config: ProcessConfig,
}

impl ProcessConfigBuilder {
    /// Append a single rewrite rule, preserving declaration order.
    pub fn rule(mut self, rule: TransformationRule) -> Self {
        self.config.rules.push(rule);
        self
    }

    /// Replace the rule set wholesale (e.g. when loaded from a file).
    pub fn rules(mut self, rules: Vec<TransformationRule>) -> Self {
        self.config.rules = rules;
        self
    }

    pub fn proxy_health_cache_ttl_minutes(mut self, minutes: u64) -> Self {
        self.config.proxy_health_cache_ttl_minutes = minutes;
        self
    }

    pub fn proxy_health_timeout_ms(mut self, ms: u64) -> Self {
        self.config.proxy_health_timeout_ms = ms;
        self
    }

    pub fn frontmatter_scan_lines(mut self, lines: usize) -> Self {
        self.config.frontmatter_scan_lines = lines.max(1);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ProcessConfig, ClipmarkError> {
        let c = &self.config;
        if c.proxy_health_timeout_ms == 0 {
            return Err(ClipmarkError::InvalidConfig(
                "proxy_health_timeout_ms must be > 0".into(),
            ));
        }
        if c.frontmatter_scan_lines == 0 {
            return Err(ClipmarkError::InvalidConfig(
                "frontmatter_scan_lines must be > 0".into(),
            ));
        }
        for (i, rule) in c.rules.iter().enumerate() {
            if rule.id.is_empty() {
                return Err(ClipmarkError::InvalidConfig(format!(
                    "rule #{i} has an empty id"
                )));
            }
            if rule.template.is_empty() {
                return Err(ClipmarkError::InvalidConfig(format!(
                    "rule '{}' has an empty template",
                    rule.id
                )));
            }
            if c.rules[..i].iter().any(|r| r.id == rule.id) {
                return Err(ClipmarkError::InvalidConfig(format!(
                    "duplicate rule id '{}'",
                    rule.id
                )));
            }
        }
        Ok(self.config)
    }
}

// ── Rules ────────────────────────────────────────────────────────────────

/// A declarative, priority-ordered instruction for rewriting a URL into a
/// fetchable form.
///
/// Within an enabled, matching rule set exactly one rule is applied: the one
/// with the numerically highest `priority`, ties broken by declaration
/// order. Disabled rules are never matched. Matcher semantics are
/// case-sensitive substring containment against the URL, uniform for every
/// rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformationRule {
    /// Stable identifier, reported back in
    /// [`crate::pipeline::transform::TransformationResult::applied_rule`].
    pub id: String,

    /// Human-readable description, used only in logs.
    pub name: String,

    /// Disabled rules are skipped during matching.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Substring patterns; the rule matches when any pattern occurs in the
    /// URL. An empty list matches nothing.
    pub matchers: Vec<String>,

    /// How the template is filled in; see [`TransformationType`].
    pub transformation: TransformationType,

    /// Target URL template. `Prefix` rules substitute `{url}` with the
    /// original URL (or append it when the placeholder is absent);
    /// `PathExtraction` rules substitute `{id}` with the last non-empty
    /// path segment of the original URL.
    pub template: String,

    /// Higher wins. Equal priorities fall back to declaration order.
    #[serde(default)]
    pub priority: i32,
}

fn default_enabled() -> bool {
    true
}

/// Rewrite strategies for [`TransformationRule`].
///
/// `Prefix` produces a URL that routes the original through a rewriting
/// proxy, so the proxy's health is checked before the result is handed out.
/// `PathExtraction` produces a direct canonical URL from an identifier
/// embedded in the original, with no proxy in the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransformationType {
    /// Wrap the whole original URL in a proxy template.
    Prefix,
    /// Extract an identifier from the original URL's path and build a
    /// direct URL from it.
    PathExtraction,
}

/// On-disk rule set, as loaded from a TOML or JSON document with a
/// top-level `rules` array.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleSet {
    #[serde(default)]
    pub rules: Vec<TransformationRule>,
}

// ── Merge mode ───────────────────────────────────────────────────────────

/// Where the rendered article content ends up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MergeMode {
    /// Write the rendered article to a new note next to the source note.
    CreateNote,
    /// Append the rendered article to the source note under a separator
    /// heading.
    Append,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(id: &str, priority: i32) -> TransformationRule {
        TransformationRule {
            id: id.into(),
            name: format!("test rule {id}"),
            enabled: true,
            matchers: vec!["t.co".into()],
            transformation: TransformationType::Prefix,
            template: "https://proxy.test/{url}".into(),
            priority,
        }
    }

    #[test]
    fn builder_defaults() {
        let config = ProcessConfig::builder().build().unwrap();
        assert_eq!(config.proxy_health_cache_ttl_minutes, 10);
        assert_eq!(config.proxy_health_timeout_ms, 3_000);
        assert_eq!(config.frontmatter_scan_lines, 100);
        assert!(config.rules.is_empty());
    }

    #[test]
    fn builder_rejects_zero_timeout() {
        let err = ProcessConfig::builder()
            .proxy_health_timeout_ms(0)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("proxy_health_timeout_ms"));
    }

    #[test]
    fn builder_rejects_duplicate_rule_ids() {
        let err = ProcessConfig::builder()
            .rule(rule("dup", 1))
            .rule(rule("dup", 2))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("duplicate rule id"));
    }

    #[test]
    fn builder_rejects_empty_template() {
        let mut bad = rule("r1", 1);
        bad.template.clear();
        let err = ProcessConfig::builder().rule(bad).build().unwrap_err();
        assert!(err.to_string().contains("empty template"));
    }

    #[test]
    fn rule_deserialises_from_kebab_case_json() {
        let json = r#"{
            "id": "gh-raw",
            "name": "Raw github readmes",
            "matchers": ["github.com"],
            "transformation": "path-extraction",
            "template": "https://raw.githubusercontent.test/{id}",
            "priority": 5
        }"#;
        let rule: TransformationRule = serde_json::from_str(json).unwrap();
        assert!(rule.enabled, "enabled defaults to true");
        assert_eq!(rule.transformation, TransformationType::PathExtraction);
        assert_eq!(rule.priority, 5);
    }

    #[test]
    fn rule_set_defaults_to_empty() {
        let set: RuleSet = serde_json::from_str("{}").unwrap();
        assert!(set.rules.is_empty());
    }
}
