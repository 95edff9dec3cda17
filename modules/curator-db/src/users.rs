//! Read-mostly access to the `reddit_users` table, used by the quality
//! analysis views.

use sqlx::{PgPool, QueryBuilder};
use tracing::info;

use curator_common::error::{CuratorError, Result};
use curator_common::{Page, RedditUser, UserSort};

pub struct UserStore {
    pool: PgPool,
}

/// Filters for the user analysis list.
#[derive(Debug, Clone, Default)]
pub struct UserQuery {
    pub search: String,
    pub min_quality: Option<f64>,
    pub creators_only: bool,
    pub sort: UserSort,
}

impl UserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, id: i64) -> Result<Option<RedditUser>> {
        let row = sqlx::query_as::<_, RedditUser>("SELECT * FROM reddit_users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn page(&self, query: &UserQuery, offset: i64, limit: i64) -> Result<Page<RedditUser>> {
        let mut count_qb = QueryBuilder::new("SELECT COUNT(*) FROM reddit_users");
        push_user_filters(&mut count_qb, query);
        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let mut qb = QueryBuilder::new("SELECT * FROM reddit_users");
        push_user_filters(&mut qb, query);
        qb.push(match query.sort {
            UserSort::QualityScore => " ORDER BY quality_score DESC, id",
            UserSort::Karma => " ORDER BY link_karma + comment_karma DESC, id",
            UserSort::RecentlySeen => " ORDER BY last_seen DESC, id",
        });
        qb.push(" LIMIT ");
        qb.push_bind(limit);
        qb.push(" OFFSET ");
        qb.push_bind(offset);

        let rows = qb
            .build_query_as::<RedditUser>()
            .fetch_all(&self.pool)
            .await?;

        Ok(Page {
            rows,
            total: total as u64,
        })
    }

    /// Toggle the creator flag on a user.
    pub async fn set_creator_flag(&self, id: i64, is_creator: bool) -> Result<RedditUser> {
        let row = sqlx::query_as::<_, RedditUser>(
            r#"
            UPDATE reddit_users
            SET is_creator = $2
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(is_creator)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| CuratorError::NotFound(format!("user {id} not found")))?;

        info!(user = %row.username, is_creator, "Toggled creator flag");
        Ok(row)
    }
}

fn push_user_filters(qb: &mut QueryBuilder<'_, sqlx::Postgres>, query: &UserQuery) {
    qb.push(" WHERE TRUE");
    let term = query.search.trim();
    if !term.is_empty() {
        let pattern = format!("%{}%", crate::filter::escape_like(term));
        qb.push(" AND username ILIKE ");
        qb.push_bind(pattern);
    }
    if let Some(min) = query.min_quality {
        qb.push(" AND quality_score >= ");
        qb.push_bind(min);
    }
    if query.creators_only {
        qb.push(" AND is_creator");
    }
}
