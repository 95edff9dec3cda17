//! Server-side filter/sort/paginate queries and the stats aggregates.

mod harness;

use curator_common::{
    CatalogSort, CategoryFilter, ListQuery, ReviewStatus, UserSort,
};
use curator_db::{CategoryStore, SubredditStore, UserQuery, UserStore};

use harness::*;

#[tokio::test]
async fn page_filters_and_sorts_server_side() {
    let (_pg, pool) = curator_db::testutil::postgres_container().await;
    let store = SubredditStore::new(pool.clone());

    let fitness = seed_category(&pool, "Fitness").await;
    seed_subreddit(&pool, "lifting", 5000, Some(&fitness), None).await;
    seed_subreddit(&pool, "running", 9000, Some(&fitness), None).await;
    seed_subreddit(&pool, "knitting", 300, None, None).await;
    seed_subreddit(&pool, "homegym", 700, None, Some("fitness")).await;

    // Category filter matches the FK only; the legacy-text row needs a merge
    // or bulk assign before it shows up here.
    let q = ListQuery {
        category: CategoryFilter::Id(fitness.id),
        sort: CatalogSort::Audience,
        ..Default::default()
    };
    let page = store.page(&q, 0, 50).await.unwrap();
    assert_eq!(page.total, 2);
    let names: Vec<&str> = page.rows.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["running", "lifting"]);

    // Uncategorized excludes rows with a legacy text label.
    let q = ListQuery {
        category: CategoryFilter::Uncategorized,
        ..Default::default()
    };
    let page = store.page(&q, 0, 50).await.unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.rows[0].name, "knitting");
}

#[tokio::test]
async fn search_matches_name_and_title_literally() {
    let (_pg, pool) = curator_db::testutil::postgres_container().await;
    let store = SubredditStore::new(pool.clone());

    seed_subreddit(&pool, "lifting", 5000, None, None).await;
    seed_subreddit(&pool, "powerlifting", 2000, None, None).await;
    seed_subreddit(&pool, "running", 9000, None, None).await;

    let q = ListQuery {
        search: "LIFT".to_string(),
        sort: CatalogSort::Name,
        ..Default::default()
    };
    let page = store.page(&q, 0, 50).await.unwrap();
    let names: Vec<&str> = page.rows.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["lifting", "powerlifting"]);

    // LIKE wildcards in the term are literals, not patterns.
    let q = ListQuery {
        search: "100%".to_string(),
        ..Default::default()
    };
    let page = store.page(&q, 0, 50).await.unwrap();
    assert_eq!(page.total, 0);
}

#[tokio::test]
async fn offset_windows_are_stable_and_disjoint() {
    let (_pg, pool) = curator_db::testutil::postgres_container().await;
    let store = SubredditStore::new(pool.clone());

    for i in 0..7 {
        seed_subreddit(&pool, &format!("sub{i}"), 1000, None, None).await;
    }

    let q = ListQuery {
        sort: CatalogSort::Name,
        ..Default::default()
    };
    let first = store.page(&q, 0, 3).await.unwrap();
    let second = store.page(&q, 3, 3).await.unwrap();
    let third = store.page(&q, 6, 3).await.unwrap();

    assert_eq!(first.total, 7);
    assert_eq!(first.rows.len(), 3);
    assert_eq!(second.rows.len(), 3);
    assert_eq!(third.rows.len(), 1);

    let mut seen: Vec<i64> = first
        .rows
        .iter()
        .chain(&second.rows)
        .chain(&third.rows)
        .map(|r| r.id)
        .collect();
    seen.sort_unstable();
    seen.dedup();
    assert_eq!(seen.len(), 7);
}

#[tokio::test]
async fn review_filter_and_stats_agree() {
    let (_pg, pool) = curator_db::testutil::postgres_container().await;
    let store = SubredditStore::new(pool.clone());

    let a = seed_subreddit(&pool, "lifting", 5000, None, None).await;
    seed_subreddit(&pool, "running", 9000, None, None).await;
    store
        .set_review(&[a], ReviewStatus::Approved)
        .await
        .unwrap();

    let q = ListQuery {
        review: Some(ReviewStatus::Approved),
        ..Default::default()
    };
    assert_eq!(store.page(&q, 0, 50).await.unwrap().total, 1);

    let stats = store.stats().await.unwrap();
    assert_eq!(stats.total, 2);
    assert_eq!(stats.approved, 1);
    assert_eq!(stats.unreviewed, 1);
    assert_eq!(stats.uncategorized, 2);
}

#[tokio::test]
async fn category_sidebar_counts_include_uncategorized() {
    let (_pg, pool) = curator_db::testutil::postgres_container().await;
    let categories = CategoryStore::new(pool.clone());

    let fitness = seed_category(&pool, "Fitness").await;
    seed_subreddit(&pool, "lifting", 5000, Some(&fitness), None).await;
    seed_subreddit(&pool, "knitting", 300, None, None).await;
    seed_creator(&pool, "wanderer", 1000, None, None).await;
    categories.recount_usage().await.unwrap();

    let (usages, uncategorized) = categories.list_with_counts().await.unwrap();
    assert_eq!(usages.len(), 1);
    assert_eq!(usages[0].usage_count, 1);
    assert_eq!(uncategorized, 2);
}

#[tokio::test]
async fn user_page_filters_quality_and_creator_flag() {
    let (_pg, pool) = curator_db::testutil::postgres_container().await;
    let store = UserStore::new(pool.clone());

    seed_user(&pool, "lurker", 0.2, false).await;
    let promising = seed_user(&pool, "promising", 0.9, false).await;
    seed_user(&pool, "known_creator", 0.8, true).await;

    let q = UserQuery {
        min_quality: Some(0.5),
        sort: UserSort::QualityScore,
        ..Default::default()
    };
    let page = store.page(&q, 0, 50).await.unwrap();
    assert_eq!(page.total, 2);
    assert_eq!(page.rows[0].username, "promising");

    let q = UserQuery {
        creators_only: true,
        ..Default::default()
    };
    let page = store.page(&q, 0, 50).await.unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.rows[0].username, "known_creator");

    let toggled = store.set_creator_flag(promising, true).await.unwrap();
    assert!(toggled.is_creator);
    assert!(store.set_creator_flag(404_404, true).await.is_err());
}
