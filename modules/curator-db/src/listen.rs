//! Change notifications from the hosted database.
//!
//! The database fires `pg_notify` on the `curator_changes` channel when
//! scraper runs touch the curated tables. Payloads are decoded and fanned out
//! over a broadcast channel; the feed engine debounces them into refetches.

use serde::Deserialize;
use sqlx::postgres::PgListener;
use sqlx::PgPool;
use tokio::sync::broadcast;
use tracing::{debug, warn};

const CHANNEL: &str = "curator_changes";

/// A decoded change notification. Unparseable payloads degrade to a generic
/// event so a refresh still happens.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChangeEvent {
    #[serde(default)]
    pub table: String,
    #[serde(default)]
    pub op: String,
    #[serde(default)]
    pub id: Option<i64>,
}

/// Subscribe to database change notifications. The listener task runs until
/// the connection drops; receivers lagging behind simply miss events, which
/// is fine because every event only ever triggers a refetch.
pub async fn spawn_change_listener(
    pool: &PgPool,
) -> Result<broadcast::Receiver<ChangeEvent>, sqlx::Error> {
    let mut listener = PgListener::connect_with(pool).await?;
    listener.listen(CHANNEL).await?;

    let (tx, rx) = broadcast::channel(64);

    tokio::spawn(async move {
        loop {
            match listener.recv().await {
                Ok(notification) => {
                    let event = serde_json::from_str::<ChangeEvent>(notification.payload())
                        .unwrap_or_else(|_| ChangeEvent::default());
                    debug!(table = %event.table, op = %event.op, "Database change notification");
                    if tx.send(event).is_err() {
                        // No receivers left; stop listening.
                        break;
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Change listener connection lost");
                    break;
                }
            }
        }
    });

    Ok(rx)
}
