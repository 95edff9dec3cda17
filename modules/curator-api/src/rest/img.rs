//! Server-side image proxy.
//!
//! Reddit and Instagram CDNs refuse hotlinked requests from browser origins,
//! so thumbnails are fetched here with browser-like headers and streamed
//! through. Only http(s) URLs against the configured CDN allow-list are
//! fetched; images are the one response this service lets clients cache.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::Deserialize;
use tracing::warn;

use curator_common::safety::ProxyUrlError;
use curator_common::validate_proxy_url;

use crate::AppState;

const CACHE_POLICY: &str = "public, max-age=86400";
const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

#[derive(Deserialize)]
pub struct ImgQuery {
    url: String,
}

/// GET /api/img?url=...
pub async fn proxy(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ImgQuery>,
) -> Response {
    let target = match validate_proxy_url(&params.url, &state.img_allowed_hosts) {
        Ok(url) => url,
        Err(e @ ProxyUrlError::HostNotAllowed) => {
            return (
                StatusCode::FORBIDDEN,
                Json(serde_json::json!({ "error": e.to_string() })),
            )
                .into_response();
        }
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": e.to_string() })),
            )
                .into_response();
        }
    };

    let upstream = match state
        .img_client
        .get(target.clone())
        .header(header::USER_AGENT, USER_AGENT)
        .header(header::ACCEPT, "image/avif,image/webp,image/png,image/*,*/*;q=0.8")
        .header(header::ACCEPT_LANGUAGE, "en-US,en;q=0.9")
        .send()
        .await
    {
        Ok(resp) => resp,
        Err(e) => {
            warn!(url = %target, error = %e, "Image fetch failed");
            return (
                StatusCode::BAD_GATEWAY,
                Json(serde_json::json!({ "error": "failed to fetch upstream image" })),
            )
                .into_response();
        }
    };

    if !upstream.status().is_success() {
        warn!(url = %target, status = upstream.status().as_u16(), "Upstream returned error");
        return (
            StatusCode::BAD_GATEWAY,
            Json(serde_json::json!({ "error": "upstream returned an error" })),
        )
            .into_response();
    }

    let content_type = upstream
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();

    let body = Body::from_stream(upstream.bytes_stream());

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CACHE_CONTROL, CACHE_POLICY)
        .body(body)
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}
