pub mod postgres;

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::Result;

/// Display label for a user referenced by an audit event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRef {
    pub display_name: String,
    /// Sequential numeric label, shown when the name is blank.
    pub user_number: Option<i64>,
}

/// Resolves entity ids referenced by audit events to display names.
/// Unknown ids are simply absent from the returned map, never an error;
/// the activity feed falls back to textual extraction for them.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EntityDirectory: Send + Sync {
    async fn lookup_users(&self, ids: &[String]) -> Result<HashMap<String, UserRef>>;

    /// Sitio ids are keyed as strings; pure numeric and arbitrary
    /// string ids both resolve.
    async fn lookup_sitios(&self, ids: &[String]) -> Result<HashMap<String, String>>;
}
