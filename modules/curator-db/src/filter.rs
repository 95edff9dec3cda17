//! Shared WHERE/ORDER construction for the catalog page queries.

use sqlx::{Postgres, QueryBuilder};

use curator_common::{CatalogSort, CategoryFilter, ListQuery};

/// Escape LIKE wildcards so user search terms match literally.
pub(crate) fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Append the filter clauses for a catalog query. `search_cols` are the
/// columns matched by the free-text search.
pub(crate) fn push_filters(
    qb: &mut QueryBuilder<'_, Postgres>,
    q: &ListQuery,
    search_cols: &[&str],
) {
    qb.push(" WHERE TRUE");

    let term = q.search.trim();
    if !term.is_empty() {
        let pattern = format!("%{}%", escape_like(term));
        qb.push(" AND (");
        for (i, col) in search_cols.iter().enumerate() {
            if i > 0 {
                qb.push(" OR ");
            }
            qb.push(*col);
            qb.push(" ILIKE ");
            qb.push_bind(pattern.clone());
        }
        qb.push(")");
    }

    match q.category {
        CategoryFilter::All => {}
        CategoryFilter::Uncategorized => {
            qb.push(
                " AND category_id IS NULL AND (category_text IS NULL OR btrim(category_text) = '')",
            );
        }
        CategoryFilter::Id(id) => {
            qb.push(" AND category_id = ");
            qb.push_bind(id);
        }
    }

    if let Some(review) = q.review {
        qb.push(" AND review = ");
        qb.push_bind(review.to_string());
    }
}

/// ORDER BY clause for a catalog query. The column names are fixed per table,
/// never user input. A trailing id keeps offset windows stable.
pub(crate) fn order_clause(
    sort: CatalogSort,
    audience_col: &str,
    engagement_col: &str,
    name_col: &str,
) -> String {
    match sort {
        CatalogSort::Audience => format!(" ORDER BY {audience_col} DESC, id"),
        CatalogSort::Engagement => format!(" ORDER BY {engagement_col} DESC, id"),
        CatalogSort::Name => format!(" ORDER BY {name_col} ASC, id"),
        CatalogSort::RecentlyUpdated => " ORDER BY updated_at DESC, id".to_string(),
    }
}
