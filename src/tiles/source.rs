use std::future::Future;
use std::time::Duration;

use crate::foundation::error::{GeoCamError, GeoCamResult};

/// Raw tile transport. Implementations return the encoded image bytes for `url`.
pub trait TileSource {
    fn fetch(&self, url: &str) -> impl Future<Output = GeoCamResult<Vec<u8>>>;
}

/// Anonymous HTTP(S) GET against public tile mirrors.
/// Anonymous HTTP GET with a fixed user agent.
#[derive(Clone, Debug)]
pub struct HttpTileSource {
    client: reqwest::Client,
}

impl HttpTileSource {
    /// `timeout` bounds the whole request; the fetcher applies its own per-tile race on top.
    pub fn new(user_agent: &str, timeout: Duration) -> GeoCamResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| GeoCamError::network(format!("failed to build http client: {e}")))?;
        Ok(Self { client })
    }
}

impl TileSource for HttpTileSource {
    async fn fetch(&self, url: &str) -> GeoCamResult<Vec<u8>> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| GeoCamError::network(format!("GET {url}: {e}")))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(GeoCamError::network(format!("GET {url}: http {status}")));
        }
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| GeoCamError::network(format!("GET {url}: read body: {e}")))?;
        Ok(bytes.to_vec())
    }
}

/// Tile source for offline runs: every tile is unavailable, so thumbnails use the placeholder.
/// Every tile is unavailable; thumbnails fall back to the placeholder.
#[derive(Clone, Copy, Debug, Default)]
pub struct OfflineTileSource;

impl TileSource for OfflineTileSource {
    async fn fetch(&self, url: &str) -> GeoCamResult<Vec<u8>> {
        Err(GeoCamError::network(format!("offline: {url}")))
    }
}
