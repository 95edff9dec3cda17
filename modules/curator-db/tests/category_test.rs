//! Category CRUD and merge behavior against a real Postgres.

mod harness;

use curator_common::CuratorError;
use curator_db::categories::{MergeRequest, NewCategory, UpdateCategory};
use curator_db::CategoryStore;

use harness::*;

fn merge_req(sources: &[&str], target: &str) -> MergeRequest {
    MergeRequest {
        source_names: sources.iter().map(|s| s.to_string()).collect(),
        target_name: target.to_string(),
        rename_to: None,
        delete_sources: true,
    }
}

#[tokio::test]
async fn create_is_unique_on_normalized_name() {
    let (_pg, pool) = curator_db::testutil::postgres_container().await;
    let store = CategoryStore::new(pool.clone());

    seed_category(&pool, "Fitness & Health").await;

    let dup = store
        .create(NewCategory {
            name: "  fitness  &  HEALTH ".to_string(),
            ..Default::default()
        })
        .await;
    assert!(matches!(dup, Err(CuratorError::Conflict(_))));
}

#[tokio::test]
async fn list_orders_and_searches_by_name() {
    let (_pg, pool) = curator_db::testutil::postgres_container().await;
    let store = CategoryStore::new(pool.clone());

    seed_category(&pool, "Travel").await;
    seed_category(&pool, "Fitness").await;
    seed_category(&pool, "Fine Art").await;

    let all = store.list(None).await.unwrap();
    let names: Vec<&str> = all.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Fine Art", "Fitness", "Travel"]);

    let hits = store.list(Some("fi")).await.unwrap();
    let names: Vec<&str> = hits.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Fine Art", "Fitness"]);
}

#[tokio::test]
async fn rename_checks_collisions_against_other_categories() {
    let (_pg, pool) = curator_db::testutil::postgres_container().await;
    let store = CategoryStore::new(pool.clone());

    let a = seed_category(&pool, "Outdoors").await;
    seed_category(&pool, "Travel").await;

    let clash = store
        .update(
            a.id,
            UpdateCategory {
                name: Some("travel".to_string()),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(clash, Err(CuratorError::Conflict(_))));

    // Renaming to itself (case change only) is fine.
    let renamed = store
        .update(
            a.id,
            UpdateCategory {
                name: Some("OUTDOORS".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.name, "OUTDOORS");
    assert_eq!(renamed.normalized_name, "outdoors");
}

#[tokio::test]
async fn delete_refuses_referenced_or_parent_categories() {
    let (_pg, pool) = curator_db::testutil::postgres_container().await;
    let store = CategoryStore::new(pool.clone());

    let parent = seed_category(&pool, "Sports").await;
    seed_child_category(&pool, "Climbing", parent.id).await;
    let used = seed_category(&pool, "Cooking").await;
    seed_subreddit(&pool, "recipes", 100, Some(&used), None).await;

    assert!(matches!(
        store.delete(parent.id).await,
        Err(CuratorError::Conflict(_))
    ));
    assert!(matches!(
        store.delete(used.id).await,
        Err(CuratorError::Conflict(_))
    ));
    assert!(matches!(
        store.delete(999_999).await,
        Err(CuratorError::NotFound(_))
    ));

    let empty = seed_category(&pool, "Empty").await;
    store.delete(empty.id).await.unwrap();
    assert!(store.get(empty.id).await.unwrap().is_none());
}

#[tokio::test]
async fn merge_rejects_target_in_sources() {
    let (_pg, pool) = curator_db::testutil::postgres_container().await;
    let store = CategoryStore::new(pool.clone());

    seed_category(&pool, "Fitness").await;
    seed_category(&pool, "Health").await;

    // Normalized comparison: different case/spacing still counts as the target.
    let result = store
        .merge(merge_req(&["Health", "  FITNESS "], "Fitness"))
        .await;
    assert!(matches!(result, Err(CuratorError::Validation(_))));
}

#[tokio::test]
async fn merge_rejects_sources_with_children() {
    let (_pg, pool) = curator_db::testutil::postgres_container().await;
    let store = CategoryStore::new(pool.clone());

    let sports = seed_category(&pool, "Sports").await;
    seed_child_category(&pool, "Climbing", sports.id).await;
    seed_category(&pool, "Athletics").await;

    let result = store.merge(merge_req(&["Sports"], "Athletics")).await;
    match result {
        Err(CuratorError::Conflict(msg)) => assert!(msg.contains("Climbing")),
        other => panic!("expected conflict, got {other:?}"),
    }
}

#[tokio::test]
async fn merge_reports_missing_sources() {
    let (_pg, pool) = curator_db::testutil::postgres_container().await;
    let store = CategoryStore::new(pool.clone());

    seed_category(&pool, "Fitness").await;

    let result = store.merge(merge_req(&["Nope", "Missing"], "Fitness")).await;
    match result {
        Err(CuratorError::NotFound(msg)) => {
            assert!(msg.contains("nope"));
            assert!(msg.contains("missing"));
        }
        other => panic!("expected not-found, got {other:?}"),
    }
}

#[tokio::test]
async fn merge_moves_fk_and_legacy_text_rows_in_both_tables() {
    let (_pg, pool) = curator_db::testutil::postgres_container().await;
    let store = CategoryStore::new(pool.clone());

    let fitness = seed_category(&pool, "Fitness").await;
    let workout = seed_category(&pool, "Workout").await;
    let gym = seed_category(&pool, "Gym Life").await;

    let by_fk = seed_subreddit(&pool, "lifting", 5000, Some(&workout), None).await;
    // Legacy row: free-text label only, never linked by FK, messy spacing.
    let by_text = seed_subreddit(&pool, "homegym", 900, None, Some("  gym   LIFE ")).await;
    let untouched = seed_subreddit(&pool, "knitting", 100, None, Some("Crafts")).await;
    let creator_by_fk = seed_creator(&pool, "fitcoach", 20_000, Some(&gym), None).await;

    store.recount_usage().await.unwrap();
    let outcome = store
        .merge(merge_req(&["Workout", "Gym Life"], "Fitness"))
        .await
        .unwrap();

    assert_eq!(outcome.subreddits_moved, 2);
    assert_eq!(outcome.creators_moved, 1);
    assert_eq!(outcome.deleted_source_ids.len(), 2);

    for id in [by_fk, by_text] {
        let (cat_id, cat_text) = subreddit_category(&pool, id).await;
        assert_eq!(cat_id, Some(fitness.id));
        assert_eq!(cat_text.as_deref(), Some("Fitness"));
    }
    let (cat_id, cat_text) = creator_category(&pool, creator_by_fk).await;
    assert_eq!(cat_id, Some(fitness.id));
    assert_eq!(cat_text.as_deref(), Some("Fitness"));

    // Unrelated rows stay put.
    let (cat_id, cat_text) = subreddit_category(&pool, untouched).await;
    assert_eq!(cat_id, None);
    assert_eq!(cat_text.as_deref(), Some("Crafts"));

    // Sources are gone, usage accumulated on the target.
    assert!(store.get(workout.id).await.unwrap().is_none());
    assert!(store.get(gym.id).await.unwrap().is_none());
    assert_eq!(category_usage(&pool, fitness.id).await, 2);
}

#[tokio::test]
async fn merge_rename_ignores_categories_being_merged_away() {
    let (_pg, pool) = curator_db::testutil::postgres_container().await;
    let store = CategoryStore::new(pool.clone());

    let keep = seed_category(&pool, "Fitness").await;
    seed_category(&pool, "Workout").await;
    seed_category(&pool, "Wellness").await;
    let row = seed_subreddit(&pool, "lifting", 5000, None, Some("workout")).await;

    // Renaming the target to a source's name is allowed because the source is
    // deleted by the same merge...
    let outcome = store
        .merge(MergeRequest {
            source_names: vec!["Workout".to_string()],
            target_name: "Fitness".to_string(),
            rename_to: Some("Workout".to_string()),
            delete_sources: true,
        })
        .await
        .unwrap();
    assert_eq!(outcome.target_name, "Workout");

    let (cat_id, cat_text) = subreddit_category(&pool, row).await;
    assert_eq!(cat_id, Some(keep.id));
    assert_eq!(cat_text.as_deref(), Some("Workout"));

    // ...but renaming onto an unrelated live category is a conflict, and the
    // failed merge must leave the rows where they were.
    seed_category(&pool, "Cardio").await;
    let before = subreddit_category(&pool, row).await;
    let result = store
        .merge(MergeRequest {
            source_names: vec!["Workout".to_string()],
            target_name: "Wellness".to_string(),
            rename_to: Some("  CARDIO ".to_string()),
            delete_sources: true,
        })
        .await;
    assert!(matches!(result, Err(CuratorError::Conflict(_))));
    assert_eq!(subreddit_category(&pool, row).await, before);
    assert!(store.get_by_normalized("workout").await.unwrap().is_some());
}

#[tokio::test]
async fn merge_can_keep_sources() {
    let (_pg, pool) = curator_db::testutil::postgres_container().await;
    let store = CategoryStore::new(pool.clone());

    let target = seed_category(&pool, "Fitness").await;
    let source = seed_category(&pool, "Workout").await;
    seed_subreddit(&pool, "lifting", 5000, Some(&source), None).await;

    let outcome = store
        .merge(MergeRequest {
            source_names: vec!["Workout".to_string()],
            target_name: "Fitness".to_string(),
            rename_to: None,
            delete_sources: false,
        })
        .await
        .unwrap();

    assert!(outcome.deleted_source_ids.is_empty());
    assert!(store.get(source.id).await.unwrap().is_some());
    assert_eq!(outcome.target_id, target.id);
}

#[tokio::test]
async fn recount_fixes_drifted_usage_counts() {
    let (_pg, pool) = curator_db::testutil::postgres_container().await;
    let store = CategoryStore::new(pool.clone());

    let cat = seed_category(&pool, "Fitness").await;
    seed_subreddit(&pool, "lifting", 5000, Some(&cat), None).await;
    seed_creator(&pool, "fitcoach", 20_000, Some(&cat), None).await;

    sqlx::query("UPDATE categories SET usage_count = 99 WHERE id = $1")
        .bind(cat.id)
        .execute(&pool)
        .await
        .unwrap();

    let fixed = store.recount_usage().await.unwrap();
    assert_eq!(fixed, 1);
    assert_eq!(category_usage(&pool, cat.id).await, 2);
}
