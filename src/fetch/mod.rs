// src/fetch/mod.rs
//! Byte sources for the pipeline. The core never fetches anything itself;
//! callers hand it whatever a [`Fetch`] implementation returned.

pub mod cache;
pub mod http;

use anyhow::{Context, Result};
use std::future::Future;
use std::path::PathBuf;

pub use cache::CachedFetcher;
pub use http::HttpFetcher;

/// `fetch(url) -> bytes`, with whatever caching policy the implementor likes.
pub trait Fetch {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<Vec<u8>>> + Send;
}

/// Reads local paths; `url` is taken as a path relative to `root`.
#[derive(Debug, Clone, Default)]
pub struct FileFetcher {
    root: PathBuf,
}

impl FileFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl Fetch for FileFetcher {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<Vec<u8>>> + Send {
        let path = self.root.join(url.trim_start_matches("file://"));
        async move {
            tokio::fs::read(&path)
                .await
                .with_context(|| format!("reading {:?}", path))
        }
    }
}

/// `http://` and `https://` sources go over the network, anything else is a file.
pub fn is_remote(source: &str) -> bool {
    let lower = source.trim().to_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}
