use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Json, Response},
};
use serde::Deserialize;

use curator_common::UserSort;
use curator_db::UserQuery;

use crate::rest::{bad_request, store_error, DEFAULT_LIMIT, MAX_LIMIT};
use crate::AppState;

#[derive(Deserialize)]
pub struct UserParams {
    search: Option<String>,
    min_quality: Option<f64>,
    creators_only: Option<bool>,
    sort: Option<String>,
    limit: Option<i64>,
    offset: Option<i64>,
}

#[derive(Deserialize)]
pub struct CreatorFlagBody {
    pub is_creator: bool,
}

/// GET /api/users: quality analysis list.
pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(params): Query<UserParams>,
) -> Response {
    let sort = match params.sort.as_deref() {
        None | Some("") | Some("quality_score") => UserSort::QualityScore,
        Some("karma") => UserSort::Karma,
        Some("recently_seen") => UserSort::RecentlySeen,
        Some(other) => return bad_request(format!("unknown sort '{other}'")),
    };
    let query = UserQuery {
        search: params.search.unwrap_or_default(),
        min_quality: params.min_quality,
        creators_only: params.creators_only.unwrap_or(false),
        sort,
    };
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let offset = params.offset.unwrap_or(0).max(0);

    match state.users.page(&query, offset, limit).await {
        Ok(page) => Json(serde_json::json!({
            "rows": page.rows,
            "total": page.total,
        }))
        .into_response(),
        Err(e) => store_error(e, "Failed to load users"),
    }
}

/// PATCH /api/users/{id}/creator: toggle the creator flag.
pub async fn set_creator(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(body): Json<CreatorFlagBody>,
) -> Response {
    match state.users.set_creator_flag(id, body.is_creator).await {
        Ok(user) => Json(user).into_response(),
        Err(e) => store_error(e, "Failed to toggle creator flag"),
    }
}
