use async_trait::async_trait;

use curator_common::error::Result;
use curator_common::{Category, CategoryUsage, Creator, ListQuery, Page, Subreddit};

/// A row the feed can display and optimistically patch.
pub trait FeedRow: Clone + Send + Sync + 'static {
    fn id(&self) -> i64;
    fn category_id(&self) -> Option<i64>;
    fn apply_category(&mut self, category: Option<&Category>);
}

/// Where the feed's data comes from. Production uses the Postgres stores;
/// tests use an in-memory source.
#[async_trait]
pub trait FeedSource: Send + Sync + 'static {
    type Row: FeedRow;

    async fn fetch_page(&self, query: &ListQuery, offset: i64, limit: i64)
        -> Result<Page<Self::Row>>;

    /// Per-category usage plus the uncategorized count.
    async fn category_counts(&self) -> Result<(Vec<CategoryUsage>, i64)>;

    /// Persist a category assignment for a set of rows. Must either apply to
    /// every id or fail without side effects.
    async fn assign_category(&self, ids: &[i64], category: Option<&Category>) -> Result<()>;
}

impl FeedRow for Subreddit {
    fn id(&self) -> i64 {
        self.id
    }

    fn category_id(&self) -> Option<i64> {
        self.category_id
    }

    fn apply_category(&mut self, category: Option<&Category>) {
        self.category_id = category.map(|c| c.id);
        self.category_text = category.map(|c| c.name.clone());
    }
}

impl FeedRow for Creator {
    fn id(&self) -> i64 {
        self.id
    }

    fn category_id(&self) -> Option<i64> {
        self.category_id
    }

    fn apply_category(&mut self, category: Option<&Category>) {
        self.category_id = category.map(|c| c.id);
        self.category_text = category.map(|c| c.name.clone());
    }
}
