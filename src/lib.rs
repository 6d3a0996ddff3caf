pub mod config;
pub mod database;
pub mod directory;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;
pub mod utils;

use std::sync::Arc;

use crate::directory::postgres::PgEntityDirectory;
use crate::directory::EntityDirectory;
use crate::services::{
    activity_service::ActivityService, audit_service::AuditService, sitio_service::SitioService,
    user_service::UserService,
};
use crate::store::postgres::PgAuditStore;
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub audit_service: AuditService,
    pub activity_service: ActivityService,
    pub user_service: UserService,
    pub sitio_service: SitioService,
    pub directory: Arc<dyn EntityDirectory>,
}

impl AppState {
    pub fn new(pool: PgPool) -> Self {
        let store = Arc::new(PgAuditStore::new(pool.clone()));
        let audit_service = AuditService::new(store.clone());
        let activity_service = ActivityService::new(store);
        let user_service = UserService::new(pool.clone(), audit_service.clone());
        let sitio_service = SitioService::new(pool.clone(), audit_service.clone());
        let directory: Arc<dyn EntityDirectory> = Arc::new(PgEntityDirectory::new(pool));

        Self {
            audit_service,
            activity_service,
            user_service,
            sitio_service,
            directory,
        }
    }
}
