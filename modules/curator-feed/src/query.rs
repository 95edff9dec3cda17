use typed_builder::TypedBuilder;

use curator_common::{CatalogSort, CategoryFilter, ListQuery, ReviewStatus};

/// Fixed window size for feed pages.
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Filter state of a feed, as driven by the page toolbar.
#[derive(Debug, Clone, TypedBuilder)]
pub struct FeedQuery {
    #[builder(default, setter(into))]
    pub search: String,
    #[builder(default)]
    pub category: CategoryFilter,
    #[builder(default)]
    pub review: Option<ReviewStatus>,
    #[builder(default)]
    pub sort: CatalogSort,
    #[builder(default = DEFAULT_PAGE_SIZE)]
    pub page_size: usize,
}

impl Default for FeedQuery {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl FeedQuery {
    pub fn to_list_query(&self) -> ListQuery {
        ListQuery {
            search: self.search.clone(),
            category: self.category,
            review: self.review,
            sort: self.sort,
        }
    }
}
