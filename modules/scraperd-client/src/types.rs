use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Response from `GET /status`. Fields default so older scraperd deployments
/// that omit some of them still decode.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScraperStatus {
    #[serde(default)]
    pub running: bool,
    #[serde(default)]
    pub current_job: Option<String>,
    #[serde(default)]
    pub queue_depth: i64,
    #[serde(default)]
    pub last_run_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub version: Option<String>,
}

/// Response from `POST /start` and `POST /stop`.
#[derive(Debug, Clone, Deserialize)]
pub struct ControlResponse {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

/// Response from `GET /success-rate`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SuccessRate {
    #[serde(default)]
    pub window_hours: u32,
    #[serde(default)]
    pub success_rate: f64,
    #[serde(default)]
    pub total_requests: u64,
    #[serde(default)]
    pub failed_requests: u64,
}

/// Response from `GET /cost-metrics`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CostMetrics {
    #[serde(default)]
    pub daily_cost_usd: f64,
    #[serde(default)]
    pub monthly_cost_usd: f64,
    #[serde(default)]
    pub rows_scraped_today: u64,
}

/// Response from `GET /cycle-status`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CycleStatus {
    #[serde(default)]
    pub cycle_id: Option<Uuid>,
    #[serde(default)]
    pub phase: Option<String>,
    /// Completion fraction of the current cycle, 0.0-1.0.
    #[serde(default)]
    pub progress: f64,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub eta_seconds: Option<i64>,
}
