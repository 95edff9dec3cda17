use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Deserialize;

use curator_db::categories::{MergeRequest, NewCategory, UpdateCategory};

use crate::rest::store_error;
use crate::AppState;

#[derive(Deserialize)]
pub struct ListParams {
    search: Option<String>,
}

/// GET /api/categories: the sidebar list, categories with usage counts plus
/// the uncategorized row count.
pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> Response {
    match state
        .categories
        .list_with_counts_matching(params.search.as_deref())
        .await
    {
        Ok((categories, uncategorized)) => Json(serde_json::json!({
            "categories": categories,
            "uncategorized": uncategorized,
        }))
        .into_response(),
        Err(e) => store_error(e, "Failed to load categories"),
    }
}

/// POST /api/categories: create. 409 when the normalized name collides.
pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NewCategory>,
) -> Response {
    match state.categories.create(req).await {
        Ok(category) => (StatusCode::CREATED, Json(category)).into_response(),
        Err(e) => store_error(e, "Failed to create category"),
    }
}

/// PATCH /api/categories/{id}: rename and/or restyle.
pub async fn update(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateCategory>,
) -> Response {
    match state.categories.update(id, req).await {
        Ok(category) => Json(category).into_response(),
        Err(e) => store_error(e, "Failed to update category"),
    }
}

/// DELETE /api/categories/{id}: refused while referenced or while child
/// categories point at it.
pub async fn remove(State(state): State<Arc<AppState>>, Path(id): Path<i64>) -> Response {
    match state.categories.delete(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => store_error(e, "Failed to delete category"),
    }
}

/// POST /api/categories/merge: move every reference from the source
/// categories onto the target, optionally renaming it and deleting the
/// emptied sources.
pub async fn merge(
    State(state): State<Arc<AppState>>,
    Json(req): Json<MergeRequest>,
) -> Response {
    match state.categories.merge(req).await {
        Ok(outcome) => Json(outcome).into_response(),
        Err(e) => store_error(e, "Failed to merge categories"),
    }
}

/// POST /api/categories/recount: re-derive usage counts from the rows.
pub async fn recount(State(state): State<Arc<AppState>>) -> Response {
    match state.categories.recount_usage().await {
        Ok(updated) => Json(serde_json::json!({ "updated": updated })).into_response(),
        Err(e) => store_error(e, "Failed to recount category usage"),
    }
}
