use std::str::FromStr;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Deserialize;

use curator_common::{CuratorError, ReviewStatus};
use curator_db::BulkOutcome;

use crate::rest::{bad_request, store_error, CatalogParams};
use crate::AppState;

#[derive(Deserialize)]
pub struct BulkCategoryBody {
    pub ids: Vec<i64>,
    /// `null` clears the assignment.
    pub category_id: Option<i64>,
}

#[derive(Deserialize)]
pub struct BulkReviewBody {
    pub ids: Vec<i64>,
    pub review: String,
}

#[derive(Deserialize)]
pub struct ReviewBody {
    pub review: String,
}

/// GET /api/subreddits: one filtered, sorted, offset-paginated window.
pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CatalogParams>,
) -> Response {
    let req = match params.resolve() {
        Ok(req) => req,
        Err(resp) => return resp,
    };
    match state.subreddits.page(&req.query, req.offset, req.limit).await {
        Ok(page) => Json(serde_json::json!({
            "rows": page.rows,
            "total": page.total,
        }))
        .into_response(),
        Err(e) => store_error(e, "Failed to load subreddits"),
    }
}

/// GET /api/subreddits/stats: review totals for the metrics cards.
pub async fn stats(State(state): State<Arc<AppState>>) -> Response {
    match state.subreddits.stats().await {
        Ok(stats) => Json(stats).into_response(),
        Err(e) => store_error(e, "Failed to load subreddit stats"),
    }
}

/// POST /api/subreddits/bulk-category: assign or clear the category on a
/// set of rows. Unknown ids reject the whole request with the missing list.
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
        .subreddits
        .set_category(&body.ids, category.as_ref())
        .await
    {
        Ok(BulkOutcome::Updated(updated)) => {
            Json(serde_json::json!({ "updated": updated })).into_response()
        }
        Ok(BulkOutcome::MissingIds(missing)) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({
                "error": "some requested subreddits do not exist",
                "missing_ids": missing,
            })),
        )
            .into_response(),
        Err(e) => store_error(e, "Failed to bulk-assign category"),
    }
}

/// POST /api/subreddits/bulk-review: same contract for review status.
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

    match state.subreddits.set_review(&body.ids, review).await {
        Ok(BulkOutcome::Updated(updated)) => {
            Json(serde_json::json!({ "updated": updated })).into_response()
        }
        Ok(BulkOutcome::MissingIds(missing)) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({
                "error": "some requested subreddits do not exist",
                "missing_ids": missing,
            })),
        )
            .into_response(),
        Err(e) => store_error(e, "Failed to bulk-update review"),
    }
}

/// PATCH /api/subreddits/{id}/review: single-row review toggle.
pub async fn set_review(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(body): Json<ReviewBody>,
) -> Response {
    let review = match ReviewStatus::from_str(&body.review) {
        Ok(review) => review,
        Err(e) => return bad_request(e),
    };

    match state.subreddits.set_review(&[id], review).await {
        Ok(BulkOutcome::Updated(_)) => match state.subreddits.get(id).await {
            Ok(Some(row)) => Json(row).into_response(),
            Ok(None) => StatusCode::NOT_FOUND.into_response(),
            Err(e) => store_error(e, "Failed to reload subreddit"),
        },
        Ok(BulkOutcome::MissingIds(_)) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": format!("subreddit {id} not found") })),
        )
            .into_response(),
        Err(e) => store_error(e, "Failed to update review"),
    }
}
