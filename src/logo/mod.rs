//! Logo backfill.
//!
//! For every merged record still lacking artwork, a fixed, ordered list of
//! candidate URLs is probed and the first reachable one is adopted. The
//! candidates come from two templates; the raw channel name is substituted
//! first for both (names like `CCTV5+` resolve literally on these hosts),
//! then the percent-encoded form. Probing is an existence check only, with
//! a bounded per-probe timeout; a failed or timed-out probe simply moves on
//! to the next candidate. The probe is behind a trait so tests can supply a
//! double instead of the network.

use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use tracing::debug;

use crate::models::Channel;

pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_PROBE_CONCURRENCY: usize = 8;

/// Existence probe for a candidate artwork URL.
#[async_trait]
pub trait LogoProbe: Send + Sync {
    async fn exists(&self, url: &str) -> bool;
}

/// HTTP prober: HEAD first, falling back to GET when HEAD is rejected.
/// Either way only reachability is checked, never content.
pub struct HttpLogoProbe {
    client: reqwest::Client,
}

impl Default for HttpLogoProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpLogoProbe {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl LogoProbe for HttpLogoProbe {
    async fn exists(&self, url: &str) -> bool {
        match self.client.head(url).timeout(PROBE_TIMEOUT).send().await {
            Ok(response) if response.status() == reqwest::StatusCode::OK => return true,
            Ok(_) | Err(_) => {}
        }

        match self.client.get(url).timeout(PROBE_TIMEOUT).send().await {
            Ok(response) => response.status() == reqwest::StatusCode::OK,
            Err(_) => false,
        }
    }
}

fn template_urls(name: &str) -> [String; 2] {
    [
        format!("https://epg.112114.xyz/logo/{name}.png"),
        format!("https://live.fanmingming.com/tv/{name}.png"),
    ]
}

/// Ordered candidate list for a channel name: both templates with the raw
/// name, then both with the percent-encoded name when that differs.
pub fn candidate_urls(name: &str) -> Vec<String> {
    let mut urls = template_urls(name).to_vec();
    let encoded = urlencoding::encode(name);
    if encoded != name {
        urls.extend(template_urls(&encoded));
    }
    urls
}

/// Tries each candidate in order and returns the first reachable URL.
pub async fn find_logo(probe: &dyn LogoProbe, name: &str) -> Option<String> {
    for url in candidate_urls(name) {
        if probe.exists(&url).await {
            return Some(url);
        }
        debug!(url, "logo candidate not reachable");
    }
    None
}

/// Probes all logo-less channels, at most `concurrency` in flight at once,
/// and writes results back per record. Returns how many logos were filled.
/// Candidates within one record stay sequential; no record is probed twice.
pub async fn backfill_logos(
    channels: &mut [Channel],
    probe: &dyn LogoProbe,
    concurrency: usize,
) -> usize {
    let lookups: Vec<(usize, String)> = channels
        .iter()
        .enumerate()
        .filter(|(_, c)| !c.has_logo())
        .filter_map(|(idx, c)| c.identity_name().map(|name| (idx, name.to_string())))
        .collect();

    let results: Vec<(usize, Option<String>)> = stream::iter(lookups)
        .map(|(idx, name)| async move { (idx, find_logo(probe, &name).await) })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    let mut filled = 0;
    for (idx, logo) in results {
        if let Some(url) = logo {
            channels[idx].tvg_logo = Some(url);
            filled += 1;
        }
    }
    filled
}
