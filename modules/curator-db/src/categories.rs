//! Category CRUD and the merge operation.
//!
//! Categories are unique on `normalized_name`. Merge rewrites foreign keys
//! across the `subreddits` and `creators` tables inside one transaction, so a
//! failure at any step leaves no partially-migrated rows and no dangling
//! `category_id`.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, Transaction};
use tracing::info;

use curator_common::error::{CuratorError, Result};
use curator_common::{normalize_category_name, Category, CategoryUsage};

pub struct CategoryStore {
    pool: PgPool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewCategory {
    pub name: String,
    pub parent_id: Option<i64>,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub description: Option<String>,
    pub sort_order: Option<i32>,
}

/// PATCH-style update. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCategory {
    pub name: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub description: Option<String>,
    pub sort_order: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MergeRequest {
    pub source_names: Vec<String>,
    pub target_name: String,
    /// New name for the target after the merge.
    #[serde(default)]
    pub rename_to: Option<String>,
    /// Delete the now-empty source rows once their references are moved.
    #[serde(default = "default_true")]
    pub delete_sources: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize)]
pub struct MergeOutcome {
    pub target_id: i64,
    pub target_name: String,
    pub subreddits_moved: u64,
    pub creators_moved: u64,
    pub usage_count: i64,
    pub deleted_source_ids: Vec<i64>,
}

impl CategoryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, search: Option<&str>) -> Result<Vec<Category>> {
        let rows = match search.map(str::trim).filter(|s| !s.is_empty()) {
            Some(term) => {
                let pattern = format!("%{}%", crate::filter::escape_like(term));
                sqlx::query_as::<_, Category>(
                    r#"
                    SELECT * FROM categories
                    WHERE name ILIKE $1
                    ORDER BY sort_order, name
                    "#,
                )
                .bind(pattern)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Category>(
                    "SELECT * FROM categories ORDER BY sort_order, name",
                )
                .fetch_all(&self.pool)
                .await?
            }
        };
        Ok(rows)
    }

    /// Sidebar view: every category with its usage count, plus the number of
    /// rows that carry no category at all.
    pub async fn list_with_counts(&self) -> Result<(Vec<CategoryUsage>, i64)> {
        self.list_with_counts_matching(None).await
    }

    /// `list_with_counts` narrowed by a name search.
    pub async fn list_with_counts_matching(
        &self,
        search: Option<&str>,
    ) -> Result<(Vec<CategoryUsage>, i64)> {
        let categories = match search.map(str::trim).filter(|s| !s.is_empty()) {
            Some(term) => {
                let pattern = format!("%{}%", crate::filter::escape_like(term));
                sqlx::query_as::<_, CategoryUsage>(
                    r#"
                    SELECT id, name, color, icon, parent_id, sort_order, usage_count
                    FROM categories
                    WHERE name ILIKE $1
                    ORDER BY sort_order, name
                    "#,
                )
                .bind(pattern)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, CategoryUsage>(
                    r#"
                    SELECT id, name, color, icon, parent_id, sort_order, usage_count
                    FROM categories
                    ORDER BY sort_order, name
                    "#,
                )
                .fetch_all(&self.pool)
                .await?
            }
        };

        let uncategorized: i64 = sqlx::query_scalar(
            r#"
            SELECT
                (SELECT COUNT(*) FROM subreddits
                 WHERE category_id IS NULL
                   AND (category_text IS NULL OR btrim(category_text) = ''))
              + (SELECT COUNT(*) FROM creators
                 WHERE category_id IS NULL
                   AND (category_text IS NULL OR btrim(category_text) = ''))
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok((categories, uncategorized))
    }

    pub async fn get(&self, id: i64) -> Result<Option<Category>> {
        let row = sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn get_by_normalized(&self, key: &str) -> Result<Option<Category>> {
        let row =
            sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE normalized_name = $1")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row)
    }

    pub async fn create(&self, req: NewCategory) -> Result<Category> {
        let name = req.name.trim().to_string();
        let key = normalize_category_name(&name);
        if key.is_empty() {
            return Err(CuratorError::Validation("category name is empty".into()));
        }

        if self.get_by_normalized(&key).await?.is_some() {
            return Err(CuratorError::Conflict(format!(
                "a category named '{name}' already exists"
            )));
        }

        let row = sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories
                (name, normalized_name, parent_id, color, icon, description, sort_order)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(&name)
        .bind(&key)
        .bind(req.parent_id)
        .bind(&req.color)
        .bind(&req.icon)
        .bind(&req.description)
        .bind(req.sort_order.unwrap_or(0))
        .fetch_one(&self.pool)
        .await?;

        info!(category = %row.name, id = row.id, "Created category");
        Ok(row)
    }

    /// Rename and/or restyle a category. Renames re-check normalized-name
    /// uniqueness against every other category.
    pub async fn update(&self, id: i64, req: UpdateCategory) -> Result<Category> {
        let current = self
            .get(id)
            .await?
            .ok_or_else(|| CuratorError::NotFound(format!("category {id} not found")))?;

        let (name, key) = match &req.name {
            Some(new_name) => {
                let new_name = new_name.trim().to_string();
                let new_key = normalize_category_name(&new_name);
                if new_key.is_empty() {
                    return Err(CuratorError::Validation("category name is empty".into()));
                }
                if new_key != current.normalized_name {
                    let clash: Option<i64> = sqlx::query_scalar(
                        "SELECT id FROM categories WHERE normalized_name = $1 AND id <> $2",
                    )
                    .bind(&new_key)
                    .bind(id)
                    .fetch_optional(&self.pool)
                    .await?;
                    if clash.is_some() {
                        return Err(CuratorError::Conflict(format!(
                            "a category named '{new_name}' already exists"
                        )));
                    }
                }
                (new_name, new_key)
            }
            None => (current.name.clone(), current.normalized_name.clone()),
        };

        let row = sqlx::query_as::<_, Category>(
            r#"
            UPDATE categories SET
                name = $2,
                normalized_name = $3,
                color = COALESCE($4, color),
                icon = COALESCE($5, icon),
                description = COALESCE($6, description),
                sort_order = COALESCE($7, sort_order),
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&name)
        .bind(&key)
        .bind(&req.color)
        .bind(&req.icon)
        .bind(&req.description)
        .bind(req.sort_order)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    /// Delete a category. Refused while rows still reference it or while it
    /// has child categories.
    pub async fn delete(&self, id: i64) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let existing: Option<i64> = sqlx::query_scalar("SELECT id FROM categories WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if existing.is_none() {
            return Err(CuratorError::NotFound(format!("category {id} not found")));
        }

        let children: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM categories WHERE parent_id = $1")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;
        if children > 0 {
            return Err(CuratorError::Conflict(format!(
                "category {id} has {children} child categories"
            )));
        }

        let referenced: i64 = sqlx::query_scalar(
            r#"
            SELECT (SELECT COUNT(*) FROM subreddits WHERE category_id = $1)
                 + (SELECT COUNT(*) FROM creators WHERE category_id = $1)
            "#,
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;
        if referenced > 0 {
            return Err(CuratorError::Conflict(format!(
                "category {id} is still referenced by {referenced} rows"
            )));
        }

        sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        info!(id, "Deleted category");
        Ok(())
    }

    /// Re-derive `usage_count` from the actual referencing rows. Returns the
    /// number of categories whose count was off.
    pub async fn recount_usage(&self) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE categories c
            SET usage_count = counted.n, updated_at = now()
            FROM (
                SELECT c2.id,
                       (SELECT COUNT(*) FROM subreddits s WHERE s.category_id = c2.id)
                     + (SELECT COUNT(*) FROM creators cr WHERE cr.category_id = c2.id) AS n
                FROM categories c2
            ) counted
            WHERE counted.id = c.id AND c.usage_count <> counted.n
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Merge one or more source categories into a target.
    ///
    /// Referencing rows in both tables move to the target (matching either the
    /// `category_id` foreign key or the legacy `category_text` label), usage
    /// counts are summed onto the target, and the target can optionally be
    /// renamed. Runs in a single transaction.
    pub async fn merge(&self, req: MergeRequest) -> Result<MergeOutcome> {
        if req.source_names.is_empty() {
            return Err(CuratorError::Validation(
                "at least one source category is required".into(),
            ));
        }
        let target_key = normalize_category_name(&req.target_name);
        if target_key.is_empty() {
            return Err(CuratorError::Validation("target category name is empty".into()));
        }

        let mut source_keys: Vec<String> = Vec::new();
        for name in &req.source_names {
            let key = normalize_category_name(name);
            if key.is_empty() {
                return Err(CuratorError::Validation(format!(
                    "source category name '{name}' is empty"
                )));
            }
            if key == target_key {
                return Err(CuratorError::Validation(format!(
                    "target '{}' appears in the source list",
                    req.target_name
                )));
            }
            if !source_keys.contains(&key) {
                source_keys.push(key);
            }
        }

        let mut tx = self.pool.begin().await?;

        let target = sqlx::query_as::<_, Category>(
            "SELECT * FROM categories WHERE normalized_name = $1",
        )
        .bind(&target_key)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| {
            CuratorError::NotFound(format!("target category '{}' not found", req.target_name))
        })?;

        let sources = sqlx::query_as::<_, Category>(
            "SELECT * FROM categories WHERE normalized_name = ANY($1)",
        )
        .bind(&source_keys)
        .fetch_all(&mut *tx)
        .await?;

        if sources.len() != source_keys.len() {
            let found: HashSet<&str> =
                sources.iter().map(|c| c.normalized_name.as_str()).collect();
            let missing: Vec<&str> = source_keys
                .iter()
                .map(String::as_str)
                .filter(|k| !found.contains(k))
                .collect();
            return Err(CuratorError::NotFound(format!(
                "source categories not found: {}",
                missing.join(", ")
            )));
        }
        let source_ids: Vec<i64> = sources.iter().map(|c| c.id).collect();

        // Merging a parent away would orphan its children.
        let children: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM categories WHERE parent_id = ANY($1) ORDER BY name",
        )
        .bind(&source_ids)
        .fetch_all(&mut *tx)
        .await?;
        if !children.is_empty() {
            return Err(CuratorError::Conflict(format!(
                "cannot merge categories that have children: {}",
                children.join(", ")
            )));
        }

        // Resolve the final target name up front so migrated rows get the
        // right legacy text, and so a doomed rename fails before any rewrite.
        let final_name = match &req.rename_to {
            Some(rename) => {
                let rename = rename.trim();
                if rename.is_empty() {
                    return Err(CuratorError::Validation("rename_to is empty".into()));
                }
                let rename_key = normalize_category_name(rename);
                let mut exempt = source_ids.clone();
                exempt.push(target.id);
                let clash: Option<i64> = sqlx::query_scalar(
                    "SELECT id FROM categories WHERE normalized_name = $1 AND id <> ALL($2)",
                )
                .bind(&rename_key)
                .bind(&exempt)
                .fetch_optional(&mut *tx)
                .await?;
                if clash.is_some() {
                    return Err(CuratorError::Conflict(format!(
                        "another category is already named '{rename}'"
                    )));
                }
                rename.to_string()
            }
            None => target.name.clone(),
        };

        let subreddits_moved =
            reassign_rows(&mut tx, "subreddits", &source_ids, &source_keys, target.id, &final_name)
                .await?;
        let creators_moved =
            reassign_rows(&mut tx, "creators", &source_ids, &source_keys, target.id, &final_name)
                .await?;

        let source_usage: i64 = sources.iter().map(|c| c.usage_count).sum();
        let usage_count: i64 = sqlx::query_scalar(
            r#"
            UPDATE categories
            SET usage_count = usage_count + $1, updated_at = now()
            WHERE id = $2
            RETURNING usage_count
            "#,
        )
        .bind(source_usage)
        .bind(target.id)
        .fetch_one(&mut *tx)
        .await?;

        if final_name != target.name {
            let rename_key = normalize_category_name(&final_name);
            sqlx::query(
                r#"
                UPDATE categories
                SET name = $1, normalized_name = $2, updated_at = now()
                WHERE id = $3
                "#,
            )
            .bind(&final_name)
            .bind(&rename_key)
            .bind(target.id)
            .execute(&mut *tx)
            .await?;

            // Rows that already pointed at the target keep their legacy text
            // in sync with the new name.
            for table in ["subreddits", "creators"] {
                let sql = format!(
                    "UPDATE {table} SET category_text = $1 WHERE category_id = $2"
                );
                sqlx::query(&sql)
                    .bind(&final_name)
                    .bind(target.id)
                    .execute(&mut *tx)
                    .await?;
            }
        }

        let deleted_source_ids = if req.delete_sources {
            sqlx::query("DELETE FROM categories WHERE id = ANY($1)")
                .bind(&source_ids)
                .execute(&mut *tx)
                .await?;
            source_ids.clone()
        } else {
            Vec::new()
        };

        tx.commit().await?;

        info!(
            target = %final_name,
            sources = source_ids.len(),
            subreddits_moved,
            creators_moved,
            "Merged categories"
        );

        Ok(MergeOutcome {
            target_id: target.id,
            target_name: final_name,
            subreddits_moved,
            creators_moved,
            usage_count,
            deleted_source_ids,
        })
    }
}

/// Move every row referencing a source category onto the target. Matches both
/// the `category_id` foreign key and the legacy free-text label (compared in
/// normalized form).
async fn reassign_rows(
    tx: &mut Transaction<'_, Postgres>,
    table: &str,
    source_ids: &[i64],
    source_keys: &[String],
    target_id: i64,
    final_name: &str,
) -> Result<u64> {
    let sql = format!(
        r#"
        UPDATE {table}
        SET category_id = $1,
            category_text = $2,
            updated_at = now()
        WHERE category_id = ANY($3)
           OR (category_text IS NOT NULL
               AND lower(regexp_replace(btrim(category_text), '\s+', ' ', 'g')) = ANY($4))
        "#
    );
    let result = sqlx::query(&sql)
        .bind(target_id)
        .bind(final_name)
        .bind(source_ids)
        .bind(source_keys)
        .execute(&mut **tx)
        .await?;
    Ok(result.rows_affected())
}
