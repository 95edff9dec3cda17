//! Paginated reads and bulk updates over the `subreddits` table.

use sqlx::{PgPool, QueryBuilder};
use tracing::info;

use curator_common::error::Result;
use curator_common::{Category, ListQuery, Page, ReviewStats, ReviewStatus, Subreddit};

use crate::bulk::{dedupe_ids, missing_ids};
use crate::filter::{order_clause, push_filters};
use crate::BulkOutcome;

pub struct SubredditStore {
    pool: PgPool,
}

impl SubredditStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, id: i64) -> Result<Option<Subreddit>> {
        let row = sqlx::query_as::<_, Subreddit>("SELECT * FROM subreddits WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// One fixed-size window of the filtered, sorted result set, plus the
    /// total row count for the same filters.
    pub async fn page(&self, query: &ListQuery, offset: i64, limit: i64) -> Result<Page<Subreddit>> {
        let mut count_qb = QueryBuilder::new("SELECT COUNT(*) FROM subreddits");
        push_filters(&mut count_qb, query, &["name", "title"]);
        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let mut qb = QueryBuilder::new("SELECT * FROM subreddits");
        push_filters(&mut qb, query, &["name", "title"]);
        qb.push(order_clause(query.sort, "subscribers", "engagement", "name"));
        qb.push(" LIMIT ");
        qb.push_bind(limit);
        qb.push(" OFFSET ");
        qb.push_bind(offset);

        let rows = qb
            .build_query_as::<Subreddit>()
            .fetch_all(&self.pool)
            .await?;

        Ok(Page {
            rows,
            total: total as u64,
        })
    }

    /// Totals for the metrics cards.
    pub async fn stats(&self) -> Result<ReviewStats> {
        let (total, unreviewed, approved, excluded, banned, uncategorized): (
            i64,
            i64,
            i64,
            i64,
            i64,
            i64,
        ) = sqlx::query_as(
            r#"
            SELECT COUNT(*),
                   COUNT(*) FILTER (WHERE review = 'unreviewed'),
                   COUNT(*) FILTER (WHERE review = 'approved'),
                   COUNT(*) FILTER (WHERE review = 'excluded'),
                   COUNT(*) FILTER (WHERE review = 'banned'),
                   COUNT(*) FILTER (WHERE category_id IS NULL
                                      AND (category_text IS NULL OR btrim(category_text) = ''))
            FROM subreddits
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(ReviewStats {
            total,
            unreviewed,
            approved,
            excluded,
            banned,
            uncategorized,
        })
    }

    /// Assign (or clear, with `None`) the category on a set of rows.
    ///
    /// All-or-nothing: unknown ids abort the update and are reported back.
    /// Usage counters on the affected categories are adjusted in the same
    /// transaction.
    pub async fn set_category(
        &self,
        ids: &[i64],
        category: Option<&Category>,
    ) -> Result<BulkOutcome> {
        let ids = dedupe_ids(ids);
        if ids.is_empty() {
            return Ok(BulkOutcome::Updated(0));
        }
        let ids = ids.as_slice();

        let mut tx = self.pool.begin().await?;

        if let Some(missing) = missing_ids(&mut *tx, "subreddits", ids).await? {
            return Ok(BulkOutcome::MissingIds(missing));
        }

        // Usage bookkeeping: decrement the categories the rows are leaving,
        // increment the one they move to. Rows already in the target get both
        // a decrement and an increment, which nets out.
        let departures: Vec<(i64, i64)> = sqlx::query_as(
            r#"
            SELECT category_id, COUNT(*)
            FROM subreddits
            WHERE id = ANY($1) AND category_id IS NOT NULL
            GROUP BY category_id
            "#,
        )
        .bind(ids)
        .fetch_all(&mut *tx)
        .await?;

        let result = sqlx::query(
            r#"
            UPDATE subreddits
            SET category_id = $2, category_text = $3, updated_at = now()
            WHERE id = ANY($1)
            "#,
        )
        .bind(ids)
        .bind(category.map(|c| c.id))
        .bind(category.map(|c| c.name.as_str()))
        .execute(&mut *tx)
        .await?;

        for (old_category, n) in &departures {
            sqlx::query(
                "UPDATE categories SET usage_count = GREATEST(usage_count - $1, 0) WHERE id = $2",
            )
            .bind(n)
            .bind(old_category)
            .execute(&mut *tx)
            .await?;
        }
        if let Some(target) = category {
            sqlx::query("UPDATE categories SET usage_count = usage_count + $1 WHERE id = $2")
                .bind(ids.len() as i64)
                .bind(target.id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        info!(
            rows = result.rows_affected(),
            category = category.map(|c| c.name.as_str()).unwrap_or("<none>"),
            "Bulk-assigned subreddit category"
        );
        Ok(BulkOutcome::Updated(result.rows_affected()))
    }

    /// Set the review status on a set of rows, with the same missing-id
    /// contract as `set_category`.
    pub async fn set_review(&self, ids: &[i64], review: ReviewStatus) -> Result<BulkOutcome> {
        let ids = dedupe_ids(ids);
        if ids.is_empty() {
            return Ok(BulkOutcome::Updated(0));
        }
        let ids = ids.as_slice();

        let mut tx = self.pool.begin().await?;
        if let Some(missing) = missing_ids(&mut *tx, "subreddits", ids).await? {
            return Ok(BulkOutcome::MissingIds(missing));
        }

        let result = sqlx::query(
            "UPDATE subreddits SET review = $2, updated_at = now() WHERE id = ANY($1)",
        )
        .bind(ids)
        .bind(review.to_string())
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(BulkOutcome::Updated(result.rows_affected()))
    }
}
