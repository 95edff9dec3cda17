//! Paginated reads and bulk updates over the `creators` table. Mirrors the
//! subreddit store; the two tables share the category columns and review
//! workflow but carry different metrics.

use sqlx::{PgPool, QueryBuilder};
use tracing::info;

use curator_common::error::Result;
use curator_common::{Category, Creator, ListQuery, Page, ReviewStats, ReviewStatus};

use crate::bulk::{dedupe_ids, missing_ids};
use crate::filter::{order_clause, push_filters};
use crate::BulkOutcome;

pub struct CreatorStore {
    pool: PgPool,
}

impl CreatorStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, id: i64) -> Result<Option<Creator>> {
        let row = sqlx::query_as::<_, Creator>("SELECT * FROM creators WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn page(&self, query: &ListQuery, offset: i64, limit: i64) -> Result<Page<Creator>> {
        let mut count_qb = QueryBuilder::new("SELECT COUNT(*) FROM creators");
        push_filters(&mut count_qb, query, &["username", "full_name"]);
        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let mut qb = QueryBuilder::new("SELECT * FROM creators");
        push_filters(&mut qb, query, &["username", "full_name"]);
        qb.push(order_clause(
            query.sort,
            "followers",
            "engagement_rate",
            "username",
        ));
        qb.push(" LIMIT ");
        qb.push_bind(limit);
        qb.push(" OFFSET ");
        qb.push_bind(offset);

        let rows = qb
            .build_query_as::<Creator>()
            .fetch_all(&self.pool)
            .await?;

        Ok(Page {
            rows,
            total: total as u64,
        })
    }

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
            FROM creators
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

    /// Assign (or clear) the category on a set of creator rows. Same
    /// all-or-nothing missing-id contract as the subreddit store.
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

        if let Some(missing) = missing_ids(&mut *tx, "creators", ids).await? {
            return Ok(BulkOutcome::MissingIds(missing));
        }

        let departures: Vec<(i64, i64)> = sqlx::query_as(
            r#"
            SELECT category_id, COUNT(*)
            FROM creators
            WHERE id = ANY($1) AND category_id IS NOT NULL
            GROUP BY category_id
            "#,
        )
        .bind(ids)
        .fetch_all(&mut *tx)
        .await?;

        let result = sqlx::query(
            r#"
            UPDATE creators
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
            "Bulk-assigned creator category"
        );
        Ok(BulkOutcome::Updated(result.rows_affected()))
    }

    pub async fn set_review(&self, ids: &[i64], review: ReviewStatus) -> Result<BulkOutcome> {
        let ids = dedupe_ids(ids);
        if ids.is_empty() {
            return Ok(BulkOutcome::Updated(0));
        }
        let ids = ids.as_slice();

        let mut tx = self.pool.begin().await?;
        if let Some(missing) = missing_ids(&mut *tx, "creators", ids).await? {
            return Ok(BulkOutcome::MissingIds(missing));
        }

        let result = sqlx::query(
            "UPDATE creators SET review = $2, updated_at = now() WHERE id = ANY($1)",
        )
        .bind(ids)
        .bind(review.to_string())
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(BulkOutcome::Updated(result.rows_affected()))
    }
}
