//! Change-notification listener against a real Postgres.

use std::time::Duration;

use curator_db::spawn_change_listener;

#[tokio::test]
async fn decodes_notifications_from_the_change_channel() {
    let (_pg, pool) = curator_db::testutil::postgres_container().await;

    let mut events = spawn_change_listener(&pool).await.unwrap();

    sqlx::query(
        r#"SELECT pg_notify('curator_changes', '{"table":"subreddits","op":"update","id":42}')"#,
    )
    .execute(&pool)
    .await
    .unwrap();

    let event = tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("notification should arrive")
        .unwrap();
    assert_eq!(event.table, "subreddits");
    assert_eq!(event.op, "update");
    assert_eq!(event.id, Some(42));
}

#[tokio::test]
async fn garbage_payloads_still_produce_an_event() {
    let (_pg, pool) = curator_db::testutil::postgres_container().await;

    let mut events = spawn_change_listener(&pool).await.unwrap();

    sqlx::query("SELECT pg_notify('curator_changes', 'not json')")
        .execute(&pool)
        .await
        .unwrap();

    let event = tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("notification should arrive")
        .unwrap();
    assert_eq!(event.table, "");
    assert_eq!(event.id, None);
}
