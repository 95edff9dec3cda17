//! Thin proxy to the scraper-control service.
//!
//! Reads degrade silently: a dead scraperd shows the last known status (or
//! defaults) rather than an error page. Control calls do surface failures,
//! as 503s, because the operator needs to know a start/stop did not land.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use tracing::warn;

use scraperd_client::{CostMetrics, CycleStatus, SuccessRate};

use crate::AppState;

/// GET /api/scraper/status: falls back to the cached status on failure.
pub async fn status(State(state): State<Arc<AppState>>) -> Response {
    match state.scraperd.status().await {
        Ok(current) => {
            let mut cache = state.last_scraper_status.lock().await;
            *cache = Some(current.clone());
            Json(serde_json::json!({ "status": current, "stale": false })).into_response()
        }
        Err(e) => {
            warn!(error = %e, "scraperd status unavailable, serving cached value");
            let cached = state
                .last_scraper_status
                .lock()
                .await
                .clone()
                .unwrap_or_default();
            Json(serde_json::json!({ "status": cached, "stale": true })).into_response()
        }
    }
}

/// POST /api/scraper/start
pub async fn start(State(state): State<Arc<AppState>>) -> Response {
    match state.scraperd.start().await {
        Ok(resp) => Json(serde_json::json!({
            "status": resp.status,
            "message": resp.message,
        }))
        .into_response(),
        Err(e) => unavailable(e),
    }
}

/// POST /api/scraper/stop
pub async fn stop(State(state): State<Arc<AppState>>) -> Response {
    match state.scraperd.stop().await {
        Ok(resp) => Json(serde_json::json!({
            "status": resp.status,
            "message": resp.message,
        }))
        .into_response(),
        Err(e) => unavailable(e),
    }
}

/// GET /api/scraper/success-rate: defaults on failure.
pub async fn success_rate(State(state): State<Arc<AppState>>) -> Response {
    match state.scraperd.success_rate().await {
        Ok(metrics) => Json(metrics).into_response(),
        Err(e) => {
            warn!(error = %e, "scraperd success-rate unavailable, serving defaults");
            Json(SuccessRate::default()).into_response()
        }
    }
}

/// GET /api/scraper/cost-metrics: defaults on failure.
pub async fn cost_metrics(State(state): State<Arc<AppState>>) -> Response {
    match state.scraperd.cost_metrics().await {
        Ok(metrics) => Json(metrics).into_response(),
        Err(e) => {
            warn!(error = %e, "scraperd cost-metrics unavailable, serving defaults");
            Json(CostMetrics::default()).into_response()
        }
    }
}

/// GET /api/scraper/cycle-status: defaults on failure.
pub async fn cycle_status(State(state): State<Arc<AppState>>) -> Response {
    match state.scraperd.cycle_status().await {
        Ok(cycle) => Json(cycle).into_response(),
        Err(e) => {
            warn!(error = %e, "scraperd cycle-status unavailable, serving defaults");
            Json(CycleStatus::default()).into_response()
        }
    }
}

fn unavailable(e: scraperd_client::ScraperdError) -> Response {
    warn!(error = %e, "scraperd control call failed");
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(serde_json::json!({ "error": "scraper control service unavailable" })),
    )
        .into_response()
}
