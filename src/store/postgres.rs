use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::error::Result;
use crate::models::audit_event::{AuditEvent, NewAuditEvent};
use crate::store::AuditStore;

#[derive(Clone)]
pub struct PgAuditStore {
    pool: PgPool,
}

impl PgAuditStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditStore for PgAuditStore {
    async fn insert(&self, event: NewAuditEvent) -> Result<AuditEvent> {
        let row = sqlx::query_as::<_, AuditEvent>(
            r#"
            INSERT INTO audit_events (event_time, performed_by_user_id, action, details, entity_type, entity_id, metadata)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, event_time, performed_by_user_id, action, details, entity_type, entity_id, metadata, created_at, modified_at
            "#,
        )
        .bind(event.event_time)
        .bind(event.performed_by_user_id)
        .bind(event.action)
        .bind(event.details)
        .bind(event.entity_type)
        .bind(event.entity_id)
        .bind(event.metadata)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn recent(&self, limit: i64) -> Result<Vec<AuditEvent>> {
        let rows = sqlx::query_as::<_, AuditEvent>(
            r#"
            SELECT id, event_time, performed_by_user_id, action, details, entity_type, entity_id, metadata, created_at, modified_at
            FROM audit_events
            ORDER BY event_time DESC, id DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let res = sqlx::query("DELETE FROM audit_events WHERE event_time < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected())
    }

    async fn delete_all(&self) -> Result<u64> {
        let res = sqlx::query("DELETE FROM audit_events")
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected())
    }
}
