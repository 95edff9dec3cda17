//! Creator endpoints. Same shapes as the subreddit endpoints over the
//! `creators` table.

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};

use curator_common::{CuratorError, ReviewStatus};
use curator_db::BulkOutcome;

use crate::rest::subreddits::{BulkCategoryBody, BulkReviewBody, ReviewBody};
use crate::rest::{bad_request, store_error, CatalogParams};
use crate::AppState;

/// GET /api/creators
pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CatalogParams>,
) -> Response {
    let req = match params.resolve() {
        Ok(req) => req,
        Err(resp) => return resp,
    };
    match state.creators.page(&req.query, req.offset, req.limit).await {
        Ok(page) => Json(serde_json::json!({
            "rows": page.rows,
            "total": page.total,
        }))
        .into_response(),
        Err(e) => store_error(e, "Failed to load creators"),
    }
}

/// GET /api/creators/stats
pub async fn stats(State(state): State<Arc<AppState>>) -> Response {
    match state.creators.stats().await {
        Ok(stats) => Json(stats).into_response(),
        Err(e) => store_error(e, "Failed to load creator stats"),
    }
}

/// POST /api/creators/bulk-category
pub async fn bulk_category(
    State(state): State<Arc<AppState>>,
    Json(body): Json<BulkCategoryBody>,
) -> Response {
    if body.ids.is_empty() {
        return bad_request("ids must not be empty");
    }

    let category = match body.category_id {
        Some(id) => match state.categories.get(id).await {
            Ok(Some(c)) => Some(c),
            Ok(None) => {
                return store_error(
                    CuratorError::NotFound(format!("category {id} not found")),
                    "Failed to load category",
                )
            }
            Err(e) => return store_error(e, "Failed to load category"),
        },
        None => None,
    };

    match state
        .creators
        .set_category(&body.ids, category.as_ref())
        .await
    {
        Ok(BulkOutcome::Updated(updated)) => {
            Json(serde_json::json!({ "updated": updated })).into_response()
        }
        Ok(BulkOutcome::MissingIds(missing)) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({
                "error": "some requested creators do not exist",
                "missing_ids": missing,
            })),
        )
            .into_response(),
        Err(e) => store_error(e, "Failed to bulk-assign category"),
    }
}

/// POST /api/creators/bulk-review
pub async fn bulk_review(
    State(state): State<Arc<AppState>>,
    Json(body): Json<BulkReviewBody>,
) -> Response {
    if body.ids.is_empty() {
        return bad_request("ids must not be empty");
    }
    let review = match ReviewStatus::from_str(&body.review) {
        Ok(review) => review,
        Err(e) => return bad_request(e),
    };

    match state.creators.set_review(&body.ids, review).await {
        Ok(BulkOutcome::Updated(updated)) => {
            Json(serde_json::json!({ "updated": updated })).into_response()
        }
        Ok(BulkOutcome::MissingIds(missing)) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({
                "error": "some requested creators do not exist",
                "missing_ids": missing,
            })),
        )
            .into_response(),
        Err(e) => store_error(e, "Failed to bulk-update review"),
    }
}

/// PATCH /api/creators/{id}/review
pub async fn set_review(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(body): Json<ReviewBody>,
) -> Response {
    let review = match ReviewStatus::from_str(&body.review) {
        Ok(review) => review,
        Err(e) => return bad_request(e),
    };

    match state.creators.set_review(&[id], review).await {
        Ok(BulkOutcome::Updated(_)) => match state.creators.get(id).await {
            Ok(Some(row)) => Json(row).into_response(),
            Ok(None) => StatusCode::NOT_FOUND.into_response(),
            Err(e) => store_error(e, "Failed to reload creator"),
        },
        Ok(BulkOutcome::MissingIds(_)) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": format!("creator {id} not found") })),
        )
            .into_response(),
        Err(e) => store_error(e, "Failed to update review"),
    }
}
