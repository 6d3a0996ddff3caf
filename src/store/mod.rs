pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::audit_event::{AuditEvent, NewAuditEvent};

/// Storage backend for audit events: insert-one, query-recent,
/// bulk-delete-by-age and bulk-delete-all. Implementations must be
/// `Send + Sync` so the store can be shared between request handlers
/// and the retention sweeper.
#[async_trait]
pub trait AuditStore: Send + Sync {
    /// Persist one event and return it with its assigned id.
    async fn insert(&self, event: NewAuditEvent) -> Result<AuditEvent>;

    /// Most recent events ordered by `event_time` descending.
    async fn recent(&self, limit: i64) -> Result<Vec<AuditEvent>>;

    /// Delete every event with `event_time < cutoff`. Returns the count.
    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64>;

    /// Delete every event. Returns the count.
    async fn delete_all(&self) -> Result<u64>;
}
