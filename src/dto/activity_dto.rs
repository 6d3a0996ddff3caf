use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::services::activity_service::ActivityEntry;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ActivityFeedQuery {
    /// How many raw events to consider, newest first.
    pub limit: Option<i64>,
    /// Feed entries returned after deduplication.
    pub size: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEntryResponse {
    pub timestamp: DateTime<Utc>,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityFeedResponse {
    pub items: Vec<ActivityEntryResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClearActivityResponse {
    pub deleted: u64,
}

impl From<ActivityEntry> for ActivityEntryResponse {
    fn from(value: ActivityEntry) -> Self {
        Self {
            timestamp: value.timestamp,
            description: value.description,
        }
    }
}
