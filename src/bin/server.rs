use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::get;
use sea_orm::Database;
use shelter_server::{
    api::{self, middleware::JwtVerifier},
    config::AppConfig,
    images::{cloudinary::CloudinaryClient, ImageStore},
    migrator,
};

#[tokio::main]
async fn main() {
    // Load .env if present (dotenvy)
    dotenvy::dotenv().ok();

    shelter_server::telemetry::init_telemetry("shelter-server");

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let (prometheus_layer, metric_handle) = axum_prometheus::PrometheusMetricLayer::pair();

    // Database Connection
    let db = Database::connect(&config.database_url)
        .await
        .expect("Failed to connect to database");

    // Run migrations
    use sea_orm_migration::MigratorTrait;
    migrator::Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    shelter_server::metrics::init_metrics(&db).await;

    let images: Arc<dyn ImageStore> = Arc::new(CloudinaryClient::new(config.cloudinary.clone()));

    let app = api::router(
        db,
        images,
        JwtVerifier::new(&config.jwt_secret),
        config.max_upload_bytes,
    )
    .layer(prometheus_layer)
    .route("/metrics", get(move || render_metrics(metric_handle.clone())));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listener");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    shelter_server::telemetry::shutdown_telemetry();
}

async fn render_metrics(metric_handle: metrics_exporter_prometheus::PrometheusHandle) -> String {
    metric_handle.render()
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutting down server"),
        Err(err) => tracing::error!("Unable to listen for shutdown signal: {}", err),
    }
}
