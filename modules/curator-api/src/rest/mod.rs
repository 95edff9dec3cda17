pub mod categories;
pub mod creators;
pub mod img;
pub mod scraper;
pub mod subreddits;
pub mod users;

use std::str::FromStr;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Deserialize;
use tracing::warn;

use curator_common::{
    CatalogSort, CategoryFilter, CuratorError, ListQuery, ReviewStatus,
};

pub const DEFAULT_LIMIT: i64 = 50;
pub const MAX_LIMIT: i64 = 100;

/// Map a store error onto the conventional status codes, logging server-side
/// failures.
pub fn store_error(e: CuratorError, context: &str) -> Response {
    let (status, message) = match &e {
        CuratorError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
        CuratorError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
        CuratorError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
        _ => {
            warn!(error = %e, "{context}");
            (StatusCode::INTERNAL_SERVER_ERROR, context.to_string())
        }
    };
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

pub fn bad_request(message: impl Into<String>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({ "error": message.into() })),
    )
        .into_response()
}

// --- Query structs shared by the catalog endpoints ---

#[derive(Deserialize)]
pub struct CatalogParams {
    pub search: Option<String>,
    pub category_id: Option<i64>,
    pub uncategorized: Option<bool>,
    pub review: Option<String>,
    pub sort: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

pub struct CatalogRequest {
    pub query: ListQuery,
    pub limit: i64,
    pub offset: i64,
}

impl CatalogParams {
    /// Resolve raw query params into a store query. String fields that fail
    /// to parse are client errors.
    pub fn resolve(self) -> Result<CatalogRequest, Response> {
        let review = match self.review.as_deref() {
            None | Some("") | Some("all") => None,
            Some(raw) => Some(
                ReviewStatus::from_str(raw).map_err(|e| bad_request(e))?,
            ),
        };

        let sort = match self.sort.as_deref() {
            None | Some("") => CatalogSort::default(),
            Some(raw) => parse_sort(raw).ok_or_else(|| {
                bad_request(format!("unknown sort '{raw}'"))
            })?,
        };

        let category = if self.uncategorized.unwrap_or(false) {
            CategoryFilter::Uncategorized
        } else {
            match self.category_id {
                Some(id) => CategoryFilter::Id(id),
                None => CategoryFilter::All,
            }
        };

        Ok(CatalogRequest {
            query: ListQuery {
                search: self.search.unwrap_or_default(),
                category,
                review,
                sort,
            },
            limit: self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT),
            offset: self.offset.unwrap_or(0).max(0),
        })
    }
}

fn parse_sort(raw: &str) -> Option<CatalogSort> {
    match raw {
        "audience" | "subscribers" | "followers" => Some(CatalogSort::Audience),
        "engagement" => Some(CatalogSort::Engagement),
        "name" => Some(CatalogSort::Name),
        "recently_updated" => Some(CatalogSort::RecentlyUpdated),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> CatalogParams {
        CatalogParams {
            search: None,
            category_id: None,
            uncategorized: None,
            review: None,
            sort: None,
            limit: None,
            offset: None,
        }
    }

    #[test]
    fn defaults_resolve_to_first_page_of_fifty() {
        let req = params().resolve().unwrap();
        assert_eq!(req.limit, 50);
        assert_eq!(req.offset, 0);
        assert_eq!(req.query.category, CategoryFilter::All);
        assert!(req.query.review.is_none());
    }

    #[test]
    fn limit_is_capped_at_one_hundred() {
        let mut p = params();
        p.limit = Some(5000);
        assert_eq!(p.resolve().unwrap().limit, 100);
    }

    #[test]
    fn uncategorized_flag_wins_over_category_id() {
        let mut p = params();
        p.uncategorized = Some(true);
        p.category_id = Some(7);
        assert_eq!(
            p.resolve().unwrap().query.category,
            CategoryFilter::Uncategorized
        );
    }

    #[test]
    fn unknown_review_and_sort_are_client_errors() {
        let mut p = params();
        p.review = Some("pending".into());
        assert!(p.resolve().is_err());

        let mut p = params();
        p.sort = Some("karma".into());
        assert!(p.resolve().is_err());
    }

    #[test]
    fn aliases_for_audience_sort_parse() {
        for raw in ["audience", "subscribers", "followers"] {
            assert_eq!(parse_sort(raw), Some(CatalogSort::Audience));
        }
    }
}
