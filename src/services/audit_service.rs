use std::sync::Arc;

use serde_json::Value as JsonValue;

use crate::error::Result;
use crate::models::audit_event::{AuditEvent, NewAuditEvent};
use crate::store::AuditStore;

/// Records administrative actions as immutable audit events.
///
/// `record` inserts exactly one event per call and stamps `event_time`
/// itself; duplicate consecutive events are allowed at write time and
/// collapsed at read time by the activity feed. Storage failures are
/// returned to the caller unretried; callers decide whether a failed
/// append aborts their own flow.
#[derive(Clone)]
pub struct AuditService {
    store: Arc<dyn AuditStore>,
}

impl AuditService {
    pub fn new(store: Arc<dyn AuditStore>) -> Self {
        Self { store }
    }

    /// `entity` carries the referenced entity as `(type, id)` so the
    /// two columns are always written together or not at all.
    pub async fn record(
        &self,
        action: &str,
        details: &str,
        performed_by_user_id: Option<&str>,
        entity: Option<(&str, &str)>,
        metadata: Option<JsonValue>,
    ) -> Result<AuditEvent> {
        let event = NewAuditEvent {
            event_time: crate::utils::time::now(),
            performed_by_user_id: performed_by_user_id.map(str::to_string),
            action: action.to_string(),
            details: details.to_string(),
            entity_type: entity.map(|(t, _)| t.to_string()),
            entity_id: entity.map(|(_, id)| id.to_string()),
            metadata,
        };
        self.store.insert(event).await
    }

    /// Unconditional bulk delete, used by the admin "clear recent
    /// activity" action. Returns the number of events removed.
    pub async fn clear_all(&self) -> Result<u64> {
        self.store.delete_all().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryAuditStore;
    use chrono::Utc;

    #[tokio::test]
    async fn record_stamps_event_time_and_keeps_entity_pair() {
        let service = AuditService::new(Arc::new(MemoryAuditStore::new()));
        let before = Utc::now();
        let event = service
            .record(
                "CreateSitio",
                "Created sitio 'Riverside'",
                Some("admin-1"),
                Some(("Sitio", "7")),
                None,
            )
            .await
            .unwrap();
        let after = Utc::now();

        assert!(event.event_time >= before && event.event_time <= after);
        assert_eq!(event.entity_type.as_deref(), Some("Sitio"));
        assert_eq!(event.entity_id.as_deref(), Some("7"));
        assert_eq!(event.performed_by_user_id.as_deref(), Some("admin-1"));
    }

    #[tokio::test]
    async fn record_persists_blank_values_as_given() {
        let service = AuditService::new(Arc::new(MemoryAuditStore::new()));
        let event = service.record("", "", None, None, None).await.unwrap();
        assert_eq!(event.action, "");
        assert_eq!(event.details, "");
        assert!(event.entity_type.is_none());
        assert!(event.entity_id.is_none());
    }

    #[tokio::test]
    async fn clear_all_reports_count() {
        let store = Arc::new(MemoryAuditStore::new());
        let service = AuditService::new(store.clone());
        service
            .record("CreateUser", "Created user A", None, None, None)
            .await
            .unwrap();
        service
            .record("CreateUser", "Created user B", None, None, None)
            .await
            .unwrap();

        assert_eq!(service.clear_all().await.unwrap(), 2);
        assert!(store.recent(10).await.unwrap().is_empty());
    }
}
