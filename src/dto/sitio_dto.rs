use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::sitio::Sitio;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateSitioPayload {
    #[validate(length(min = 1))]
    pub name: String,
    pub bhw_user_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateSitioPayload {
    #[validate(length(min = 1))]
    pub name: Option<String>,
    pub bhw_user_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SitioResponse {
    pub id: i64,
    pub name: String,
    pub bhw_user_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SitioListResponse {
    pub items: Vec<SitioResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SitioListQuery {
    pub limit: Option<i64>,
}

impl From<Sitio> for SitioResponse {
    fn from(value: Sitio) -> Self {
        Self {
            id: value.id,
            name: value.name,
            bhw_user_id: value.bhw_user_id,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}
