use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    routing::{delete, get, post},
    Router,
};
use registry_backend::services::retention_service::RetentionSweeper;
use registry_backend::store::postgres::PgAuditStore;
use registry_backend::{
    config::{get_config, init_config},
    database::pool::create_pool,
    routes, AppState,
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    init_config()?;
    let config = get_config();

    let pool = create_pool().await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let app_state = AppState::new(pool.clone());

    let shutdown = CancellationToken::new();
    {
        // The sweeper gets its own store handle, separate from the
        // request-handling services.
        let sweeper = RetentionSweeper::new(
            Arc::new(PgAuditStore::new(pool.clone())),
            config.sweep_interval_hours,
            config.retention_days,
        );
        tokio::spawn(sweeper.run(shutdown.clone()));
    }

    let base_routes = Router::new().route("/health", get(routes::health::health));

    let dashboard_api = Router::new()
        .route(
            "/api/admin/dashboard/activity",
            get(routes::activity::get_activity_feed),
        )
        .layer(axum::middleware::from_fn(
            registry_backend::middleware::auth::require_bearer_auth,
        ));

    let admin_api = Router::new()
        .route(
            "/api/admin/users",
            get(routes::users::list_users).post(routes::users::create_user),
        )
        .route(
            "/api/admin/users/:id",
            get(routes::users::get_user)
                .patch(routes::users::update_user)
                .delete(routes::users::delete_user),
        )
        .route(
            "/api/admin/users/:id/activate",
            post(routes::users::activate_user),
        )
        .route(
            "/api/admin/users/:id/deactivate",
            post(routes::users::deactivate_user),
        )
        .route(
            "/api/admin/sitios",
            get(routes::sitios::list_sitios).post(routes::sitios::create_sitio),
        )
        .route(
            "/api/admin/sitios/:id",
            get(routes::sitios::get_sitio)
                .patch(routes::sitios::update_sitio)
                .delete(routes::sitios::delete_sitio),
        )
        .route(
            "/api/admin/activity",
            delete(routes::activity::clear_activity),
        )
        .layer(axum::middleware::from_fn(
            registry_backend::middleware::auth::require_admin,
        ));

    let app = base_routes
        .merge(dashboard_api)
        .merge(admin_api)
        .with_state(app_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    shutdown.cancel();

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = ?e, "failed to listen for shutdown signal");
    }
}
