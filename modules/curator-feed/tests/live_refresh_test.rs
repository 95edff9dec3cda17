//! End-to-end: a feed over the Postgres stores picks up rows written behind
//! its back once the change notification lands. Runs on real time because it
//! crosses a real database connection.

use std::time::Duration;

use curator_feed::db::{live_refresh, SubredditFeedSource};
use curator_feed::{Feed, FeedQuery};

async fn insert_subreddit(pool: &sqlx::PgPool, name: &str) {
    sqlx::query("INSERT INTO subreddits (name, subscribers) VALUES ($1, 1000)")
        .bind(name)
        .execute(pool)
        .await
        .unwrap();
}

#[tokio::test]
async fn external_writes_reach_the_feed_after_a_notification() {
    let (_pg, pool) = curator_db::testutil::postgres_container().await;

    insert_subreddit(&pool, "lifting").await;

    let refresh = live_refresh(&pool).await.unwrap();
    let source = SubredditFeedSource::new(pool.clone());
    let (_handle, mut rx) = Feed::spawn_with_refresh(source, FeedQuery::default(), refresh);

    // Initial fetch.
    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    loop {
        if rx.borrow().rows.len() == 1 {
            break;
        }
        tokio::time::timeout_at(deadline, rx.changed())
            .await
            .expect("initial fetch should complete")
            .unwrap();
    }

    // A scraper run inserts a row and notifies.
    insert_subreddit(&pool, "running").await;
    sqlx::query(r#"SELECT pg_notify('curator_changes', '{"table":"subreddits","op":"insert"}')"#)
        .execute(&pool)
        .await
        .unwrap();

    // The feed refetches after the 2 s coalescing window.
    let deadline = tokio::time::Instant::now() + Duration::from_secs(15);
    loop {
        if rx.borrow().rows.len() == 2 {
            break;
        }
        tokio::time::timeout_at(deadline, rx.changed())
            .await
            .expect("refetch should pick up the new row")
            .unwrap();
    }

    let total = rx.borrow().total;
    assert_eq!(total, 2);
}
