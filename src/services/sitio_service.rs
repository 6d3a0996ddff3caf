use sqlx::PgPool;
use tracing::warn;

use crate::dto::sitio_dto::{CreateSitioPayload, UpdateSitioPayload};
use crate::error::Result;
use crate::models::sitio::Sitio;
use crate::services::audit_service::AuditService;

const SITIO_COLUMNS: &str = "id, name, bhw_user_id, created_at, updated_at";

#[derive(Clone)]
pub struct SitioService {
    pool: PgPool,
    audit: AuditService,
}

impl SitioService {
    pub fn new(pool: PgPool, audit: AuditService) -> Self {
        Self { pool, audit }
    }

    pub async fn create(&self, payload: CreateSitioPayload, actor: Option<&str>) -> Result<Sitio> {
        let sitio = sqlx::query_as::<_, Sitio>(&format!(
            r#"
            INSERT INTO sitios (name, bhw_user_id)
            VALUES ($1, $2)
            RETURNING {SITIO_COLUMNS}
            "#
        ))
        .bind(&payload.name)
        .bind(payload.bhw_user_id)
        .fetch_one(&self.pool)
        .await?;

        self.audit_sitio(
            "CreateSitio",
            &format!("Created sitio '{}'", sitio.name),
            actor,
            &sitio,
        )
        .await;
        Ok(sitio)
    }

    pub async fn update(
        &self,
        id: i64,
        payload: UpdateSitioPayload,
        actor: Option<&str>,
    ) -> Result<Sitio> {
        let sitio = sqlx::query_as::<_, Sitio>(&format!(
            r#"
            UPDATE sitios
            SET
                name = COALESCE($2, name),
                bhw_user_id = COALESCE($3, bhw_user_id),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {SITIO_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(payload.name)
        .bind(payload.bhw_user_id)
        .fetch_one(&self.pool)
        .await?;

        self.audit_sitio(
            "EditSitio",
            &format!("Edited sitio '{}'", sitio.name),
            actor,
            &sitio,
        )
        .await;
        Ok(sitio)
    }

    pub async fn delete(&self, id: i64, actor: Option<&str>) -> Result<()> {
        let sitio = self.get_by_id(id).await?;
        sqlx::query("DELETE FROM sitios WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        self.audit_sitio(
            "DeleteSitio",
            &format!("Deleted sitio '{}'", sitio.name),
            actor,
            &sitio,
        )
        .await;
        Ok(())
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Sitio> {
        let sitio = sqlx::query_as::<_, Sitio>(&format!(
            "SELECT {SITIO_COLUMNS} FROM sitios WHERE id = $1"
        ))
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(sitio)
    }

    pub async fn list(&self, limit: i64) -> Result<Vec<Sitio>> {
        let limit = if limit <= 0 { 50 } else { limit.min(200) };
        let sitios = sqlx::query_as::<_, Sitio>(&format!(
            "SELECT {SITIO_COLUMNS} FROM sitios ORDER BY name ASC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(sitios)
    }

    async fn audit_sitio(&self, action: &str, details: &str, actor: Option<&str>, sitio: &Sitio) {
        if let Err(e) = self
            .audit
            .record(
                action,
                details,
                actor,
                Some(("Sitio", &sitio.id.to_string())),
                None,
            )
            .await
        {
            warn!(error = ?e, action, "failed to record audit event");
        }
    }
}
