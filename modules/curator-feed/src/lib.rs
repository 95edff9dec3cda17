//! The categorization feed engine.
//!
//! Dashboard pages page through large filtered row sets while curators type
//! into a search box, bulk-assign categories, and watch counters move. This
//! crate owns that data flow: debounced search, offset pagination with
//! infinite scroll, optimistic patches with category-count reconciliation,
//! and coalesced refreshes when the scraper writes behind our back. The UI
//! layer only renders `FeedSnapshot`s.

pub mod db;
pub mod feed;
pub mod query;
pub mod source;

pub use feed::{Feed, FeedHandle, FeedSnapshot};
pub use query::FeedQuery;
pub use source::{FeedRow, FeedSource};
