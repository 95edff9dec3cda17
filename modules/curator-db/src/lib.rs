//! Postgres data access for the curation service.
//!
//! The schema is owned by the hosted database; this crate only reads and
//! mutates rows within the constraints it enforces itself (normalized-name
//! uniqueness checks, usage-count bookkeeping, merge atomicity). A snapshot
//! of the schema ships in `schema.sql` solely to seed test containers.

pub mod categories;
pub mod creators;
pub mod listen;
pub mod subreddits;
pub mod users;

#[cfg(feature = "test-utils")]
pub mod testutil;

mod bulk;
mod filter;

pub use categories::{CategoryStore, MergeOutcome, MergeRequest, NewCategory, UpdateCategory};
pub use creators::CreatorStore;
pub use listen::{spawn_change_listener, ChangeEvent};
pub use subreddits::SubredditStore;
pub use users::{UserQuery, UserStore};

/// Outcome of a bulk row update. Bulk endpoints refuse to partially apply:
/// if any requested id does not exist, nothing is written and the missing
/// ids are reported back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BulkOutcome {
    Updated(u64),
    MissingIds(Vec<i64>),
}

/// Connect a pool against the hosted database.
pub async fn connect(database_url: &str) -> Result<sqlx::PgPool, sqlx::Error> {
    sqlx::postgres::PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
}
