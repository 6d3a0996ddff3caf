use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

use crate::dto::user_dto::{CreateUserPayload, UpdateUserPayload};
use crate::error::Result;
use crate::models::user::User;
use crate::services::audit_service::AuditService;

const USER_COLUMNS: &str =
    "id, user_number, name, email, role, is_active, created_at, updated_at";

#[derive(Clone)]
pub struct UserService {
    pool: PgPool,
    audit: AuditService,
}

impl UserService {
    pub fn new(pool: PgPool, audit: AuditService) -> Self {
        Self { pool, audit }
    }

    pub async fn create(&self, payload: CreateUserPayload, actor: Option<&str>) -> Result<User> {
        let role = payload.role.unwrap_or_else(|| "bhw".to_string());
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (name, email, role)
            VALUES ($1, $2, $3)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&payload.name)
        .bind(&payload.email)
        .bind(&role)
        .fetch_one(&self.pool)
        .await?;

        self.audit_user(
            "CreateUser",
            &format!("Created user {} (Id: {})", user.name, user.user_number),
            actor,
            &user,
        )
        .await;
        Ok(user)
    }

    pub async fn update(
        &self,
        id: Uuid,
        payload: UpdateUserPayload,
        actor: Option<&str>,
    ) -> Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET
                name = COALESCE($2, name),
                email = COALESCE($3, email),
                role = COALESCE($4, role),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(payload.name)
        .bind(payload.email)
        .bind(payload.role)
        .fetch_one(&self.pool)
        .await?;

        self.audit_user(
            "EditUser",
            &format!("Edited user {} (Id: {})", user.name, user.user_number),
            actor,
            &user,
        )
        .await;
        Ok(user)
    }

    pub async fn set_active(&self, id: Uuid, active: bool, actor: Option<&str>) -> Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET is_active = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(active)
        .fetch_one(&self.pool)
        .await?;

        let (action, verb) = if active {
            ("ActivateUser", "Activated")
        } else {
            ("DeactivateUser", "Deactivated")
        };
        self.audit_user(
            action,
            &format!("{} user {} (Id: {})", verb, user.name, user.user_number),
            actor,
            &user,
        )
        .await;
        Ok(user)
    }

    pub async fn delete(&self, id: Uuid, actor: Option<&str>) -> Result<()> {
        let user = self.get_by_id(id).await?;
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        self.audit_user(
            "DeleteUser",
            &format!("Deleted user {} (Id: {})", user.name, user.user_number),
            actor,
            &user,
        )
        .await;
        Ok(())
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }

    pub async fn list(&self, limit: i64) -> Result<Vec<User>> {
        let limit = if limit <= 0 { 50 } else { limit.min(200) };
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    /// The mutation has already committed; a failed append must not
    /// undo the caller's success, so it is logged and dropped here.
    async fn audit_user(&self, action: &str, details: &str, actor: Option<&str>, user: &User) {
        if let Err(e) = self
            .audit
            .record(
                action,
                details,
                actor,
                Some(("User", &user.id.to_string())),
                None,
            )
            .await
        {
            warn!(error = ?e, action, "failed to record audit event");
        }
    }
}
