use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// --- Review workflow ---

/// Review state of a scraped row. Stored as text in the hosted database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "text", rename_all = "snake_case")]
pub enum ReviewStatus {
    Unreviewed,
    Approved,
    Excluded,
    Banned,
}

impl std::fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReviewStatus::Unreviewed => write!(f, "unreviewed"),
            ReviewStatus::Approved => write!(f, "approved"),
            ReviewStatus::Excluded => write!(f, "excluded"),
            ReviewStatus::Banned => write!(f, "banned"),
        }
    }
}

impl std::str::FromStr for ReviewStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unreviewed" => Ok(ReviewStatus::Unreviewed),
            "approved" => Ok(ReviewStatus::Approved),
            "excluded" => Ok(ReviewStatus::Excluded),
            "banned" => Ok(ReviewStatus::Banned),
            other => Err(format!("unknown review status '{other}'")),
        }
    }
}

// --- Rows (schema owned by the hosted database) ---

/// A scraped subreddit row.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Subreddit {
    pub id: i64,
    pub name: String,
    pub title: Option<String>,
    pub subscribers: i64,
    pub engagement: f64,
    /// Legacy free-text category label, still populated by older scraper runs.
    pub category_text: Option<String>,
    pub category_id: Option<i64>,
    pub review: ReviewStatus,
    pub icon_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A scraped Instagram creator row.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Creator {
    pub id: i64,
    pub username: String,
    pub full_name: Option<String>,
    pub followers: i64,
    pub engagement_rate: f64,
    pub category_text: Option<String>,
    pub category_id: Option<i64>,
    pub review: ReviewStatus,
    pub avatar_url: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// A curation category. `normalized_name` is the case/whitespace-insensitive
/// uniqueness key; `usage_count` approximates the number of referencing rows.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub normalized_name: String,
    pub parent_id: Option<i64>,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub description: Option<String>,
    pub usage_count: i64,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A Reddit user row, read-mostly for quality analysis views.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct RedditUser {
    pub id: i64,
    pub username: String,
    pub link_karma: i64,
    pub comment_karma: i64,
    pub quality_score: f64,
    pub is_creator: bool,
    pub last_seen: DateTime<Utc>,
}

// --- Query parameters ---

/// Category filter for list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    /// Rows with no category assigned (neither FK nor legacy text).
    Uncategorized,
    Id(i64),
}

/// Sort order for subreddit/creator catalog pages. `Audience` is subscribers
/// for subreddits and followers for creators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogSort {
    #[default]
    Audience,
    Engagement,
    Name,
    RecentlyUpdated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserSort {
    #[default]
    QualityScore,
    Karma,
    RecentlySeen,
}

/// Server-side filter set for a catalog page query.
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    /// Free-text search over name/title. Empty means no search filter.
    pub search: String,
    pub category: CategoryFilter,
    pub review: Option<ReviewStatus>,
    pub sort: CatalogSort,
}

// --- Aggregates ---

/// One window of an offset-paginated result set.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub rows: Vec<T>,
    pub total: u64,
}

/// Per-category usage, as shown in the category sidebar.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CategoryUsage {
    pub id: i64,
    pub name: String,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub parent_id: Option<i64>,
    pub sort_order: i32,
    pub usage_count: i64,
}

/// Review-status totals for the metrics cards.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReviewStats {
    pub total: i64,
    pub unreviewed: i64,
    pub approved: i64,
    pub excluded: i64,
    pub banned: i64,
    pub uncategorized: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn review_status_round_trips_through_display() {
        for status in [
            ReviewStatus::Unreviewed,
            ReviewStatus::Approved,
            ReviewStatus::Excluded,
            ReviewStatus::Banned,
        ] {
            let parsed = ReviewStatus::from_str(&status.to_string()).unwrap();
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn review_status_rejects_unknown() {
        assert!(ReviewStatus::from_str("pending").is_err());
    }
}
