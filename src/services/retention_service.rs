use std::sync::Arc;
use std::time::Duration;

use chrono::Duration as ChronoDuration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::error::Result;
use crate::store::AuditStore;

/// Delay before the first sweep so startup I/O settles first.
const STARTUP_GRACE: Duration = Duration::from_secs(30);

/// Periodically deletes audit events older than the retention window.
///
/// One instance runs per process on its own store handle. A failed
/// sweep is logged and the loop keeps going; deleting by age is
/// idempotent, so the next sweep covers anything a failed one missed.
pub struct RetentionSweeper {
    store: Arc<dyn AuditStore>,
    interval: Duration,
    retention: ChronoDuration,
}

impl RetentionSweeper {
    pub fn new(store: Arc<dyn AuditStore>, interval_hours: u64, retention_days: u64) -> Self {
        Self {
            store,
            interval: Duration::from_secs(interval_hours.max(1) * 3600),
            retention: ChronoDuration::days(retention_days.max(1) as i64),
        }
    }

    /// Runs until `cancel` fires. Cancellation interrupts the startup
    /// grace period and the sleep between sweeps; a sweep already in
    /// flight runs to completion.
    pub async fn run(self, cancel: CancellationToken) {
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(STARTUP_GRACE) => {}
        }

        loop {
            match self.sweep_once().await {
                Ok(deleted) => info!(deleted, "audit retention sweep complete"),
                Err(e) => error!(error = ?e, "audit retention sweep failed"),
            }

            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
    }

    pub async fn sweep_once(&self) -> Result<u64> {
        let cutoff = crate::utils::time::now() - self.retention;
        self.store.delete_older_than(cutoff).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::audit_event::NewAuditEvent;
    use crate::store::memory::MemoryAuditStore;
    use chrono::Utc;

    async fn seed_aged(store: &MemoryAuditStore, action: &str, age_days: i64) {
        store
            .insert(NewAuditEvent {
                event_time: Utc::now() - ChronoDuration::days(age_days),
                performed_by_user_id: None,
                action: action.to_string(),
                details: String::new(),
                entity_type: None,
                entity_id: None,
                metadata: None,
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn sweep_deletes_only_events_past_the_cutoff() {
        let store = Arc::new(MemoryAuditStore::new());
        seed_aged(&store, "old", 100).await;
        seed_aged(&store, "recent", 10).await;

        let sweeper = RetentionSweeper::new(store.clone(), 24, 90);
        assert_eq!(sweeper.sweep_once().await.unwrap(), 1);

        let remaining = store.recent(10).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].action, "recent");
    }

    #[tokio::test]
    async fn sweep_is_idempotent() {
        let store = Arc::new(MemoryAuditStore::new());
        seed_aged(&store, "old", 100).await;

        let sweeper = RetentionSweeper::new(store.clone(), 24, 90);
        assert_eq!(sweeper.sweep_once().await.unwrap(), 1);
        assert_eq!(sweeper.sweep_once().await.unwrap(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn run_waits_out_the_grace_period_then_sweeps_on_interval() {
        let store = Arc::new(MemoryAuditStore::new());
        seed_aged(&store, "old", 100).await;

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(
            RetentionSweeper::new(store.clone(), 1, 90).run(cancel.clone()),
        );

        // Before the grace period elapses nothing is deleted.
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(store.recent(10).await.unwrap().len(), 1);

        tokio::time::sleep(STARTUP_GRACE).await;
        assert!(store.recent(10).await.unwrap().is_empty());

        // Aged rows appearing later are caught by the next tick.
        seed_aged(&store, "older", 200).await;
        tokio::time::sleep(Duration::from_secs(3601)).await;
        assert!(store.recent(10).await.unwrap().is_empty());

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_the_grace_period() {
        let store = Arc::new(MemoryAuditStore::new());
        seed_aged(&store, "old", 100).await;

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(
            RetentionSweeper::new(store.clone(), 24, 90).run(cancel.clone()),
        );

        tokio::time::sleep(Duration::from_secs(1)).await;
        cancel.cancel();
        handle.await.unwrap();

        // Cancelled before the first sweep ever ran.
        assert_eq!(store.recent(10).await.unwrap().len(), 1);
    }
}
