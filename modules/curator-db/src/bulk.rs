//! Shared validation for the bulk-update endpoints.

use std::collections::HashSet;

use sqlx::Postgres;

use curator_common::error::Result;

/// Drop duplicate ids while preserving request order.
pub(crate) fn dedupe_ids(ids: &[i64]) -> Vec<i64> {
    let mut seen = HashSet::new();
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

/// Which of the requested (deduplicated) ids do not exist in `table`?
/// Returns `None` when every id is present.
pub(crate) async fn missing_ids<'e, E>(
    executor: E,
    table: &str,
    ids: &[i64],
) -> Result<Option<Vec<i64>>>
where
    E: sqlx::Executor<'e, Database = Postgres>,
{
    let sql = format!("SELECT id FROM {table} WHERE id = ANY($1)");
    let found: Vec<i64> = sqlx::query_scalar(&sql).bind(ids).fetch_all(executor).await?;
    if found.len() == ids.len() {
        return Ok(None);
    }
    let found: HashSet<i64> = found.into_iter().collect();
    let mut missing: Vec<i64> = ids.iter().copied().filter(|id| !found.contains(id)).collect();
    missing.sort_unstable();
    Ok(Some(missing))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedupe_preserves_order() {
        assert_eq!(dedupe_ids(&[3, 1, 3, 2, 1]), vec![3, 1, 2]);
    }

    #[test]
    fn dedupe_of_empty_is_empty() {
        assert!(dedupe_ids(&[]).is_empty());
    }
}
