use anyhow::Result;
use std::{
    collections::HashMap,
    future::Future,
    sync::{Mutex, PoisonError},
    time::{Duration, Instant},
};
use tracing::debug;

use super::Fetch;

/// How long the release files are reused before fetching again.
pub const DEFAULT_TTL: Duration = Duration::from_secs(6 * 60 * 60);

struct CacheEntry {
    fetched_at: Instant,
    body: Vec<u8>,
}

/// Wraps any [`Fetch`] and keeps each URL's bytes for a fixed time-to-live.
/// Expired entries are replaced on the next access.
pub struct CachedFetcher<F> {
    inner: F,
    ttl: Duration,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl<F> CachedFetcher<F> {
    pub fn new(inner: F, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_default_ttl(inner: F) -> Self {
        Self::new(inner, DEFAULT_TTL)
    }

    fn lookup(&self, url: &str) -> Option<Vec<u8>> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(url)
            .filter(|e| e.fetched_at.elapsed() < self.ttl)
            .map(|e| e.body.clone())
    }

    fn store(&self, url: &str, body: Vec<u8>) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(
            url.to_string(),
            CacheEntry {
                fetched_at: Instant::now(),
                body,
            },
        );
    }

    /// Drop every cached entry.
    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl<F: Fetch + Sync> Fetch for CachedFetcher<F> {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<Vec<u8>>> + Send {
        async move {
            if let Some(body) = self.lookup(url) {
                debug!(url, bytes = body.len(), "cache hit");
                return Ok(body);
            }
            debug!(url, "cache miss");
            let body = self.inner.fetch(url).await?;
            self.store(url, body.clone());
            Ok(body)
        }
    }
}
