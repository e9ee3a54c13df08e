//! ProofSnap asset directory client.
//!
//! Lists the verifiable assets owned by the holder of a capture token. The token
//! is opaque to this service; it is forwarded as-is and never validated locally.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::asset::ProofSnapAsset;

pub mod handlers;

pub const DEFAULT_API_URL: &str = "https://dia-backend.numbersprotocol.io/api/v3";
const MAX_ATTEMPTS: u32 = 3;
const DEFAULT_RETRY_BASE: Duration = Duration::from_millis(500);

#[derive(Debug, Error)]
pub enum AssetDirectoryError {
    #[error("Capture token was rejected by ProofSnap")]
    Unauthorized,

    #[error("ProofSnap is unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait AssetDirectory: Send + Sync {
    async fn fetch_assets(&self, token: &str) -> Result<Vec<ProofSnapAsset>, AssetDirectoryError>;
}

#[derive(Debug, Deserialize)]
struct AssetPage {
    #[serde(default)]
    results: Option<Vec<ProofSnapAsset>>,
}

#[derive(Clone)]
pub struct ProofSnapClient {
    client: Client,
    base_url: String,
    retry_base: Duration,
}

impl ProofSnapClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            retry_base: DEFAULT_RETRY_BASE,
        })
    }

    /// Overrides the first backoff delay; later delays double from it.
    pub fn with_retry_base(mut self, retry_base: Duration) -> Self {
        self.retry_base = retry_base;
        self
    }

    fn assets_url(&self) -> String {
        format!("{}/assets/", self.base_url)
    }
}

#[async_trait]
impl AssetDirectory for ProofSnapClient {
    /// Retries network errors, timeouts, 429 and 5xx with exponential backoff.
    async fn fetch_assets(&self, token: &str) -> Result<Vec<ProofSnapAsset>, AssetDirectoryError> {
        let url = self.assets_url();
        let mut last_error = String::new();

        for attempt in 0..MAX_ATTEMPTS {
            if attempt > 0 {
                let delay = self.retry_base * (1 << (attempt - 1));
                warn!(
                    "ProofSnap fetch attempt {} failed ({last_error}), retrying after {}ms",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = match self
                .client
                .get(&url)
                .header("Authorization", format!("token {token}"))
                .send()
                .await
            {
                Ok(r) => r,
                Err(e) => {
                    last_error = if e.is_timeout() {
                        "request timed out".to_string()
                    } else {
                        e.to_string()
                    };
                    continue;
                }
            };

            let status = response.status();
            if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                return Err(AssetDirectoryError::Unauthorized);
            }
            if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                last_error = format!("status {status}");
                continue;
            }
            if !status.is_success() {
                return Err(AssetDirectoryError::Unavailable(format!(
                    "unexpected status {status}"
                )));
            }

            let page: AssetPage = response
                .json()
                .await
                .map_err(|e| AssetDirectoryError::Unavailable(format!("invalid response: {e}")))?;
            let assets = page.results.unwrap_or_default();
            debug!(count = assets.len(), "Fetched ProofSnap assets");
            return Ok(assets);
        }

        Err(AssetDirectoryError::Unavailable(format!(
            "gave up after {MAX_ATTEMPTS} attempts: {last_error}"
        )))
    }
}
