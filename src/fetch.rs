//! Reference fetch collaborators: HTTP article fetching and the proxy
//! reachability probe.
//!
//! The processing core only knows the [`ArticleFetcher`] and
//! [`ProxyProber`] traits; these implementations are what the CLI wires
//! in. A host embedding the library can substitute a richer rendering
//! service without touching the core.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::pipeline::transform::ProxyProber;
use crate::vault::ArticleFetcher;

/// Fetches a URL over HTTP and renders the HTML body to readable
/// markdown-flavoured text.
///
/// Rendering is intentionally basic (tag stripping, link and heading
/// preservation); the contract only promises *a* rendered representation,
/// and failures are reported as `None` rather than errors.
pub struct HttpArticleFetcher {
    timeout_secs: u64,
    render_width: usize,
}

impl HttpArticleFetcher {
    pub fn new() -> Self {
        Self {
            timeout_secs: 30,
            render_width: 100,
        }
    }

    /// Overall timeout for one article fetch.
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs.max(1);
        self
    }

    /// Column width the HTML renderer wraps text at.
    pub fn with_render_width(mut self, width: usize) -> Self {
        self.render_width = width.max(20);
        self
    }
}

impl Default for HttpArticleFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ArticleFetcher for HttpArticleFetcher {
    async fn fetch_rendered_markdown(&self, url: &str) -> Option<String> {
        info!("fetching article from {}", url);

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .build()
            .ok()?;

        let response = match client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("fetch failed for {}: {}", url, e);
                return None;
            }
        };
        if !response.status().is_success() {
            warn!("fetch failed for {}: HTTP {}", url, response.status());
            return None;
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                warn!("failed to read body from {}: {}", url, e);
                return None;
            }
        };

        match html2text::from_read(body.as_bytes(), self.render_width) {
            Ok(rendered) if !rendered.trim().is_empty() => Some(rendered),
            Ok(_) => {
                warn!("{} rendered to an empty document", url);
                None
            }
            Err(e) => {
                warn!("failed to render {}: {}", url, e);
                None
            }
        }
    }

    /// Sequential fire-and-forget: each URL is fetched in turn and
    /// failures are only logged, matching the boundary's "no per-URL
    /// result" contract.
    async fn fetch_batch(&self, urls: &str) {
        for url in urls.lines().map(str::trim).filter(|l| !l.is_empty()) {
            if self.fetch_rendered_markdown(url).await.is_none() {
                warn!("batch fetch failed for {}", url);
            }
        }
    }
}

/// Bounded-timeout reachability check against a proxy origin.
///
/// Any HTTP response counts as reachable: the probe asks "is something
/// answering there", not "is it serving good content".
pub struct HttpProber;

#[async_trait]
impl ProxyProber for HttpProber {
    async fn probe(&self, origin: &str, timeout_ms: u64) -> bool {
        let Ok(client) = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
        else {
            return false;
        };
        match client.get(origin).send().await {
            Ok(_) => {
                debug!("proxy {} is reachable", origin);
                true
            }
            Err(e) => {
                debug!("proxy probe failed for {}: {}", origin, e);
                false
            }
        }
    }
}
