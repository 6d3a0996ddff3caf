pub mod activity_service;
pub mod audit_service;
pub mod retention_service;
pub mod sitio_service;
pub mod user_service;
