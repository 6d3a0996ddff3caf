use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::FromRow;

/// Immutable record of an administrative action. Rows are only ever
/// inserted and bulk-deleted, never updated.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AuditEvent {
    pub id: i64,
    /// When the action occurred, set by the recorder.
    pub event_time: DateTime<Utc>,
    pub performed_by_user_id: Option<String>,
    pub action: String,
    pub details: String,
    /// "User", "Sitio" or "System". Present iff `entity_id` is present.
    pub entity_type: Option<String>,
    /// Id in the referenced entity's key space, stored as text because
    /// sitio ids are numeric while user ids are opaque strings.
    pub entity_id: Option<String>,
    pub metadata: Option<JsonValue>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

/// Insert payload for a new audit event.
#[derive(Debug, Clone)]
pub struct NewAuditEvent {
    pub event_time: DateTime<Utc>,
    pub performed_by_user_id: Option<String>,
    pub action: String,
    pub details: String,
    pub entity_type: Option<String>,
    pub entity_id: Option<String>,
    pub metadata: Option<JsonValue>,
}
