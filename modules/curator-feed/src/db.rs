//! Production feed sources backed by the Postgres stores, plus the bridge
//! from the database change listener to a feed refresh stream.

use async_trait::async_trait;
use sqlx::PgPool;
use tokio::sync::{broadcast, mpsc};

use curator_common::error::{CuratorError, Result};
use curator_common::{Category, CategoryUsage, Creator, ListQuery, Page, Subreddit};
use curator_db::{BulkOutcome, CategoryStore, ChangeEvent, CreatorStore, SubredditStore};

use crate::source::FeedSource;

pub struct SubredditFeedSource {
    subreddits: SubredditStore,
    categories: CategoryStore,
}

impl SubredditFeedSource {
    pub fn new(pool: PgPool) -> Self {
        Self {
            subreddits: SubredditStore::new(pool.clone()),
            categories: CategoryStore::new(pool),
        }
    }
}

#[async_trait]
impl FeedSource for SubredditFeedSource {
    type Row = Subreddit;

    async fn fetch_page(
        &self,
        query: &ListQuery,
        offset: i64,
        limit: i64,
    ) -> Result<Page<Subreddit>> {
        self.subreddits.page(query, offset, limit).await
    }

    async fn category_counts(&self) -> Result<(Vec<CategoryUsage>, i64)> {
        self.categories.list_with_counts().await
    }

    async fn assign_category(&self, ids: &[i64], category: Option<&Category>) -> Result<()> {
        match self.subreddits.set_category(ids, category).await? {
            BulkOutcome::Updated(_) => Ok(()),
            BulkOutcome::MissingIds(missing) => Err(CuratorError::NotFound(format!(
                "subreddits not found: {missing:?}"
            ))),
        }
    }
}

pub struct CreatorFeedSource {
    creators: CreatorStore,
    categories: CategoryStore,
}

impl CreatorFeedSource {
    pub fn new(pool: PgPool) -> Self {
        Self {
            creators: CreatorStore::new(pool.clone()),
            categories: CategoryStore::new(pool),
        }
    }
}

#[async_trait]
impl FeedSource for CreatorFeedSource {
    type Row = Creator;

    async fn fetch_page(
        &self,
        query: &ListQuery,
        offset: i64,
        limit: i64,
    ) -> Result<Page<Creator>> {
        self.creators.page(query, offset, limit).await
    }

    async fn category_counts(&self) -> Result<(Vec<CategoryUsage>, i64)> {
        self.categories.list_with_counts().await
    }

    async fn assign_category(&self, ids: &[i64], category: Option<&Category>) -> Result<()> {
        match self.creators.set_category(ids, category).await? {
            BulkOutcome::Updated(_) => Ok(()),
            BulkOutcome::MissingIds(missing) => Err(CuratorError::NotFound(format!(
                "creators not found: {missing:?}"
            ))),
        }
    }
}

/// Subscribe a feed refresh stream to the database's change notifications.
pub async fn live_refresh(pool: &PgPool) -> Result<mpsc::UnboundedReceiver<()>> {
    let changes = curator_db::spawn_change_listener(pool)
        .await
        .map_err(CuratorError::Database)?;
    Ok(refresh_events(changes))
}

/// Adapt the broadcast change stream into the feed's refresh input. Lagged
/// receivers still produce one event, which is all a refetch needs.
pub fn refresh_events(mut changes: broadcast::Receiver<ChangeEvent>) -> mpsc::UnboundedReceiver<()> {
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        loop {
            match changes.recv().await {
                Ok(_) => {
                    if tx.send(()).is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(_)) => {
                    if tx.send(()).is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });
    rx
}
