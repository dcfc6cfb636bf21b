use anyhow::{Context, Result};
use reqwest::Client;
use std::future::Future;
use tokio::time::Instant;
use tracing::info;
use url::Url;

use super::Fetch;

/// Plain HTTP GET. Non-2xx responses are errors; nothing is retried.
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl Fetch for HttpFetcher {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<Vec<u8>>> + Send {
        async move {
            let url = Url::parse(url).with_context(|| format!("parsing URL {}", url))?;
            info!(url = %url, "downloading");
            let start = Instant::now();

            let bytes = self
                .client
                .get(url.as_str())
                .send()
                .await
                .with_context(|| format!("GET {}", url))?
                .error_for_status()?
                .bytes()
                .await
                .with_context(|| format!("reading body from {}", url))?;

            info!(url = %url, bytes = bytes.len(), elapsed = ?start.elapsed(), "downloaded");
            Ok(bytes.to_vec())
        }
    }
}
