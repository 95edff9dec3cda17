//! Shared seeding helpers for the store integration tests. Each test spins up
//! its own Postgres container via `curator_db::testutil`.

use sqlx::PgPool;

use curator_common::Category;
use curator_db::categories::NewCategory;
use curator_db::CategoryStore;

pub async fn seed_category(pool: &PgPool, name: &str) -> Category {
    CategoryStore::new(pool.clone())
        .create(NewCategory {
            name: name.to_string(),
            ..Default::default()
        })
        .await
        .expect("seed category")
}

pub async fn seed_child_category(pool: &PgPool, name: &str, parent_id: i64) -> Category {
    CategoryStore::new(pool.clone())
        .create(NewCategory {
            name: name.to_string(),
            parent_id: Some(parent_id),
            ..Default::default()
        })
        .await
        .expect("seed child category")
}

/// Insert a subreddit row. `category` sets the FK (and matching text);
/// `legacy_text` sets only the free-text label, the way pre-FK scraper runs
/// left rows behind.
pub async fn seed_subreddit(
    pool: &PgPool,
    name: &str,
    subscribers: i64,
    category: Option<&Category>,
    legacy_text: Option<&str>,
) -> i64 {
    let category_text = legacy_text
        .map(str::to_string)
        .or_else(|| category.map(|c| c.name.clone()));
    sqlx::query_scalar(
        r#"
        INSERT INTO subreddits (name, title, subscribers, engagement, category_text, category_id)
        VALUES ($1, $2, $3, 0.5, $4, $5)
        RETURNING id
        "#,
    )
    .bind(name)
    .bind(format!("{name} community"))
    .bind(subscribers)
    .bind(category_text)
    .bind(category.map(|c| c.id))
    .fetch_one(pool)
    .await
    .expect("seed subreddit")
}

pub async fn seed_creator(
    pool: &PgPool,
    username: &str,
    followers: i64,
    category: Option<&Category>,
    legacy_text: Option<&str>,
) -> i64 {
    let category_text = legacy_text
        .map(str::to_string)
        .or_else(|| category.map(|c| c.name.clone()));
    sqlx::query_scalar(
        r#"
        INSERT INTO creators (username, full_name, followers, engagement_rate, category_text, category_id)
        VALUES ($1, $2, $3, 0.03, $4, $5)
        RETURNING id
        "#,
    )
    .bind(username)
    .bind(format!("{username} creator"))
    .bind(followers)
    .bind(category_text)
    .bind(category.map(|c| c.id))
    .fetch_one(pool)
    .await
    .expect("seed creator")
}

pub async fn seed_user(pool: &PgPool, username: &str, quality: f64, is_creator: bool) -> i64 {
    sqlx::query_scalar(
        r#"
        INSERT INTO reddit_users (username, link_karma, comment_karma, quality_score, is_creator)
        VALUES ($1, 1000, 500, $2, $3)
        RETURNING id
        "#,
    )
    .bind(username)
    .bind(quality)
    .bind(is_creator)
    .fetch_one(pool)
    .await
    .expect("seed user")
}

pub async fn subreddit_category(pool: &PgPool, id: i64) -> (Option<i64>, Option<String>) {
    sqlx::query_as("SELECT category_id, category_text FROM subreddits WHERE id = $1")
        .bind(id)
        .fetch_one(pool)
        .await
        .expect("read subreddit category")
}

pub async fn creator_category(pool: &PgPool, id: i64) -> (Option<i64>, Option<String>) {
    sqlx::query_as("SELECT category_id, category_text FROM creators WHERE id = $1")
        .bind(id)
        .fetch_one(pool)
        .await
        .expect("read creator category")
}

pub async fn category_usage(pool: &PgPool, id: i64) -> i64 {
    sqlx::query_scalar("SELECT usage_count FROM categories WHERE id = $1")
        .bind(id)
        .fetch_one(pool)
        .await
        .expect("read usage_count")
}
