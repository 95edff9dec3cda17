//! HTTP client for the separately-deployed scraper-control service.
//!
//! The dashboard never talks to scrapers directly; it proxies start/stop and
//! status/metrics reads through scraperd. Reads use short timeouts so a dead
//! scraperd degrades the dashboard instead of hanging it; control calls get a
//! generous timeout because scraperd stops workers synchronously.

pub mod error;
pub mod types;

pub use error::{Result, ScraperdError};
pub use types::{ControlResponse, CostMetrics, CycleStatus, ScraperStatus, SuccessRate};

use std::time::Duration;

use serde::de::DeserializeOwned;

const STATUS_TIMEOUT: Duration = Duration::from_secs(3);
const METRICS_TIMEOUT: Duration = Duration::from_secs(5);
const CONTROL_TIMEOUT: Duration = Duration::from_secs(20);

pub struct ScraperdClient {
    client: reqwest::Client,
    base_url: String,
}

impl ScraperdClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Current scraper state. 3 s timeout; callers are expected to fall back
    /// to a cached value when this errors.
    pub async fn status(&self) -> Result<ScraperStatus> {
        self.get_json("/status", STATUS_TIMEOUT).await
    }

    /// Ask scraperd to begin a scrape cycle.
    pub async fn start(&self) -> Result<ControlResponse> {
        self.post_json("/start", CONTROL_TIMEOUT).await
    }

    /// Ask scraperd to stop the current cycle and idle its workers.
    pub async fn stop(&self) -> Result<ControlResponse> {
        self.post_json("/stop", CONTROL_TIMEOUT).await
    }

    pub async fn success_rate(&self) -> Result<SuccessRate> {
        self.get_json("/success-rate", METRICS_TIMEOUT).await
    }

    pub async fn cost_metrics(&self) -> Result<CostMetrics> {
        self.get_json("/cost-metrics", METRICS_TIMEOUT).await
    }

    pub async fn cycle_status(&self) -> Result<CycleStatus> {
        self.get_json("/cycle-status", STATUS_TIMEOUT).await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, timeout: Duration) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self.client.get(&url).timeout(timeout).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ScraperdError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        Ok(resp.json().await?)
    }

    async fn post_json<T: DeserializeOwned>(&self, path: &str, timeout: Duration) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self.client.post(&url).timeout(timeout).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(path, status = status.as_u16(), "scraperd control call failed");
            return Err(ScraperdError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        Ok(resp.json().await?)
    }
}
