use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use crate::directory::{EntityDirectory, UserRef};
use crate::error::Result;

#[derive(Clone)]
pub struct PgEntityDirectory {
    pool: PgPool,
}

impl PgEntityDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EntityDirectory for PgEntityDirectory {
    async fn lookup_users(&self, ids: &[String]) -> Result<HashMap<String, UserRef>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows = sqlx::query(
            r#"
            SELECT id::text AS id, name, user_number
            FROM users
            WHERE id::text = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        let mut out = HashMap::new();
        for row in rows {
            let id: String = row.try_get("id")?;
            let name: String = row.try_get("name")?;
            let user_number: i64 = row.try_get("user_number")?;
            out.insert(
                id,
                UserRef {
                    display_name: name,
                    user_number: Some(user_number),
                },
            );
        }
        Ok(out)
    }

    async fn lookup_sitios(&self, ids: &[String]) -> Result<HashMap<String, String>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows = sqlx::query(
            r#"
            SELECT id::text AS id, name
            FROM sitios
            WHERE id::text = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        let mut out = HashMap::new();
        for row in rows {
            let id: String = row.try_get("id")?;
            let name: String = row.try_get("name")?;
            out.insert(id, name);
        }
        Ok(out)
    }
}
