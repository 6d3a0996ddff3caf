use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::audit_event::{AuditEvent, NewAuditEvent};
use crate::store::AuditStore;

/// In-memory audit store used by tests and local tooling. Ids are
/// assigned from a process-local counter; ordering matches the
/// Postgres store (`event_time` desc, id as tie-break).
#[derive(Default)]
pub struct MemoryAuditStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    next_id: i64,
    events: Vec<AuditEvent>,
}

impl MemoryAuditStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuditStore for MemoryAuditStore {
    async fn insert(&self, event: NewAuditEvent) -> Result<AuditEvent> {
        let mut inner = self.inner.lock().expect("memory store poisoned");
        inner.next_id += 1;
        let now = Utc::now();
        let row = AuditEvent {
            id: inner.next_id,
            event_time: event.event_time,
            performed_by_user_id: event.performed_by_user_id,
            action: event.action,
            details: event.details,
            entity_type: event.entity_type,
            entity_id: event.entity_id,
            metadata: event.metadata,
            created_at: now,
            modified_at: now,
        };
        inner.events.push(row.clone());
        Ok(row)
    }

    async fn recent(&self, limit: i64) -> Result<Vec<AuditEvent>> {
        let inner = self.inner.lock().expect("memory store poisoned");
        let mut events = inner.events.clone();
        events.sort_by(|a, b| {
            b.event_time
                .cmp(&a.event_time)
                .then_with(|| b.id.cmp(&a.id))
        });
        events.truncate(limit.max(0) as usize);
        Ok(events)
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let mut inner = self.inner.lock().expect("memory store poisoned");
        let before = inner.events.len();
        inner.events.retain(|e| e.event_time >= cutoff);
        Ok((before - inner.events.len()) as u64)
    }

    async fn delete_all(&self) -> Result<u64> {
        let mut inner = self.inner.lock().expect("memory store poisoned");
        let deleted = inner.events.len() as u64;
        inner.events.clear();
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn new_event(action: &str, age_minutes: i64) -> NewAuditEvent {
        NewAuditEvent {
            event_time: Utc::now() - Duration::minutes(age_minutes),
            performed_by_user_id: None,
            action: action.to_string(),
            details: format!("{} happened", action),
            entity_type: None,
            entity_id: None,
            metadata: None,
        }
    }

    #[tokio::test]
    async fn recent_orders_newest_first_and_limits() {
        let store = MemoryAuditStore::new();
        store.insert(new_event("A", 30)).await.unwrap();
        store.insert(new_event("B", 10)).await.unwrap();
        store.insert(new_event("C", 20)).await.unwrap();

        let events = store.recent(2).await.unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].action, "B");
        assert_eq!(events[1].action, "C");
    }

    #[tokio::test]
    async fn delete_older_than_only_removes_stale_rows() {
        let store = MemoryAuditStore::new();
        store.insert(new_event("old", 120)).await.unwrap();
        store.insert(new_event("fresh", 5)).await.unwrap();

        let deleted = store
            .delete_older_than(Utc::now() - Duration::minutes(60))
            .await
            .unwrap();
        assert_eq!(deleted, 1);

        let remaining = store.recent(10).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].action, "fresh");
    }

    #[tokio::test]
    async fn delete_all_empties_the_store() {
        let store = MemoryAuditStore::new();
        store.insert(new_event("A", 1)).await.unwrap();
        store.insert(new_event("B", 2)).await.unwrap();

        assert_eq!(store.delete_all().await.unwrap(), 2);
        assert!(store.recent(10).await.unwrap().is_empty());
    }
}
