//! URL transformation: prioritized rewrite rules over a health-checked
//! proxy layer.
//!
//! ## Why a safety fallback chain?
//!
//! Rewrite rules exist to turn opaque tracking/short URLs into targets the
//! fetch collaborator can actually render, and `Prefix` rules do that by
//! routing through a proxy service. A dead proxy would turn every matching
//! note into a fetch failure, which is strictly worse than fetching the
//! original URL directly. So the engine never hands out a URL through a
//! proxy it knows to be down: an unhealthy probe result, a template error,
//! or an unparseable proxy target all degrade to the original URL, with
//! the attempted rule still recorded so the caller can see a rewrite was
//! bypassed.
//!
//! ## Rule selection
//!
//! Deterministic single-winner: enabled rules whose matcher set hits the
//! URL compete on numeric priority, and equal priorities resolve to the
//! earliest-declared rule. Matching is case-sensitive substring
//! containment, uniform across all rules.
//!
//! ## Health cache
//!
//! Probe results are cached per proxy origin with a TTL; a stale entry is
//! treated as absent and re-probed. The cache is plain mutable state owned
//! by the caller (the orchestrator threads it through), which keeps tests
//! free to inject a fresh cache per case. Retention across runs is purely
//! a performance optimisation, never a correctness dependency.

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::{ProcessConfig, TransformationRule, TransformationType};

/// Placeholder substituted with the original URL in `Prefix` templates.
pub const URL_PLACEHOLDER: &str = "{url}";

/// Placeholder substituted with the extracted identifier in
/// `PathExtraction` templates.
pub const ID_PLACEHOLDER: &str = "{id}";

/// The result of one transformation attempt. Produced fresh per URL and
/// never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformationResult {
    /// The URL as extracted from the note.
    pub original_url: String,

    /// The rewritten URL, or `None` when no rule matched. On proxy
    /// fallback this is the original URL, so [`Self::fetch_url`] is always
    /// safe to fetch.
    pub transformed_url: Option<String>,

    /// Id of the winning rule, recorded even when the proxy fallback
    /// bypassed its result.
    pub applied_rule: Option<String>,

    /// False only when a proxy was consulted and found (or assumed) dead.
    pub proxy_healthy: bool,

    /// Detail of a substitution or probe error, if one occurred.
    pub error: Option<String>,
}

impl TransformationResult {
    /// The URL the caller should hand to the fetch collaborator.
    pub fn fetch_url(&self) -> &str {
        self.transformed_url.as_deref().unwrap_or(&self.original_url)
    }

    fn passthrough(url: &str) -> Self {
        Self {
            original_url: url.to_string(),
            transformed_url: None,
            applied_rule: None,
            proxy_healthy: true,
            error: None,
        }
    }

    fn fallback(url: &str, rule_id: &str, error: Option<String>) -> Self {
        Self {
            original_url: url.to_string(),
            transformed_url: Some(url.to_string()),
            applied_rule: Some(rule_id.to_string()),
            proxy_healthy: false,
            error,
        }
    }

    fn rewritten(url: &str, rule_id: &str, target: String) -> Self {
        Self {
            original_url: url.to_string(),
            transformed_url: Some(target),
            applied_rule: Some(rule_id.to_string()),
            proxy_healthy: true,
            error: None,
        }
    }
}

// ── Proxy health cache ───────────────────────────────────────────────────

/// One probe observation for a proxy origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProxyHealthEntry {
    pub healthy: bool,
    pub last_checked_ms: u64,
}

/// TTL-bounded record of proxy reachability, keyed by origin
/// (`scheme://host[:port]`).
#[derive(Debug, Clone, Default)]
pub struct ProxyHealthCache {
    entries: HashMap<String, ProxyHealthEntry>,
}

impl ProxyHealthCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh entry's verdict, or `None` when the origin is unknown or
    /// the entry has outlived `ttl_minutes` and must be re-probed.
    pub fn lookup(&self, origin: &str, ttl_minutes: u64, now_ms: u64) -> Option<bool> {
        let entry = self.entries.get(origin)?;
        let ttl_ms = ttl_minutes.saturating_mul(60_000);
        if now_ms.saturating_sub(entry.last_checked_ms) >= ttl_ms {
            return None;
        }
        Some(entry.healthy)
    }

    /// Record a probe outcome, replacing any previous entry for `origin`.
    pub fn record(&mut self, origin: impl Into<String>, healthy: bool, now_ms: u64) {
        self.entries.insert(
            origin.into(),
            ProxyHealthEntry {
                healthy,
                last_checked_ms: now_ms,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Reachability check against a proxy origin, bounded by a timeout.
///
/// Injected so tests can fake proxy health without a network. The default
/// implementation is [`crate::fetch::HttpProber`].
#[async_trait]
pub trait ProxyProber: Send + Sync {
    async fn probe(&self, origin: &str, timeout_ms: u64) -> bool;
}

/// Milliseconds since the Unix epoch.
pub fn epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

// ── Engine ───────────────────────────────────────────────────────────────

/// Transform `url` through the configured rule set.
///
/// Never fails and never returns a URL through a known-dead proxy: every
/// error path degrades to the original URL with `proxy_healthy = false`
/// and the error captured in the result.
pub async fn transform(
    url: &str,
    config: &ProcessConfig,
    cache: &mut ProxyHealthCache,
    prober: &dyn ProxyProber,
) -> TransformationResult {
    let Some(rule) = select_rule(&config.rules, url) else {
        return TransformationResult::passthrough(url);
    };
    debug!("rule '{}' matched '{}'", rule.id, url);

    let target = match apply_rule(rule, url) {
        Ok(target) => target,
        Err(detail) => {
            warn!("rule '{}' failed on '{}': {}", rule.id, url, detail);
            return TransformationResult::fallback(url, &rule.id, Some(detail));
        }
    };

    // Path-extraction targets are direct canonical URLs; only prefix
    // targets route through a proxy whose health matters.
    if rule.transformation == TransformationType::PathExtraction {
        return TransformationResult::rewritten(url, &rule.id, target);
    }

    let origin = match proxy_origin(&target) {
        Ok(origin) => origin,
        Err(detail) => {
            warn!("rule '{}' produced an unusable proxy target: {}", rule.id, detail);
            return TransformationResult::fallback(url, &rule.id, Some(detail));
        }
    };

    let now_ms = epoch_ms();
    let healthy = match cache.lookup(&origin, config.proxy_health_cache_ttl_minutes, now_ms) {
        Some(cached) => cached,
        None => {
            let probed = prober.probe(&origin, config.proxy_health_timeout_ms).await;
            cache.record(origin.clone(), probed, now_ms);
            probed
        }
    };

    if !healthy {
        warn!("proxy {} is unhealthy; using original URL for '{}'", origin, url);
        return TransformationResult::fallback(url, &rule.id, None);
    }

    TransformationResult::rewritten(url, &rule.id, target)
}

/// Single-winner rule selection: highest priority among enabled matching
/// rules, earliest declaration on ties.
fn select_rule<'a>(rules: &'a [TransformationRule], url: &str) -> Option<&'a TransformationRule> {
    let mut best: Option<&TransformationRule> = None;
    for rule in rules {
        if !rule.enabled {
            continue;
        }
        if !rule.matchers.iter().any(|m| url.contains(m.as_str())) {
            continue;
        }
        match best {
            // Strictly-greater replacement keeps the earliest rule on ties.
            Some(current) if rule.priority <= current.priority => {}
            _ => best = Some(rule),
        }
    }
    best
}

fn apply_rule(rule: &TransformationRule, url: &str) -> Result<String, String> {
    match rule.transformation {
        TransformationType::Prefix => Ok(if rule.template.contains(URL_PLACEHOLDER) {
            rule.template.replace(URL_PLACEHOLDER, url)
        } else {
            format!("{}{}", rule.template, url)
        }),
        TransformationType::PathExtraction => {
            let id = last_path_segment(url)
                .ok_or_else(|| format!("no extractable path segment in '{url}'"))?;
            Ok(if rule.template.contains(ID_PLACEHOLDER) {
                rule.template.replace(ID_PLACEHOLDER, &id)
            } else {
                format!("{}{}", rule.template, id)
            })
        }
    }
}

fn last_path_segment(url: &str) -> Option<String> {
    let parsed = reqwest::Url::parse(url).ok()?;
    parsed
        .path_segments()?
        .rev()
        .find(|segment| !segment.is_empty())
        .map(str::to_string)
}

/// The health-cache key for a proxy target: its `scheme://host[:port]`.
fn proxy_origin(target: &str) -> Result<String, String> {
    let parsed = reqwest::Url::parse(target)
        .map_err(|e| format!("invalid proxy target '{target}': {e}"))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| format!("proxy target '{target}' has no host"))?;
    Ok(match parsed.port() {
        Some(port) => format!("{}://{}:{}", parsed.scheme(), host, port),
        None => format!("{}://{}", parsed.scheme(), host),
    })
}
