pub mod animal;
pub mod error;
pub mod form;
pub mod middleware;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Extension, Router,
};
use sea_orm::DatabaseConnection;

use crate::images::ImageStore;
use middleware::JwtVerifier;

async fn health_check() -> &'static str {
    "OK"
}

/// Builds the HTTP surface. Every animal route needs a valid bearer token;
/// `/health` does not.
pub fn router(
    db: DatabaseConnection,
    images: Arc<dyn ImageStore>,
    verifier: JwtVerifier,
    max_upload_bytes: usize,
) -> Router {
    let protected_routes = Router::new()
        .route("/", get(animal::list_animals))
        .route("/animal", post(animal::register_animal))
        .route(
            "/animal/:id",
            get(animal::get_animal)
                .put(animal::update_animal)
                .delete(animal::delete_animal),
        )
        .route_layer(axum::middleware::from_fn(middleware::auth_middleware));

    Router::new()
        .route("/health", get(health_check))
        .merge(protected_routes)
        .layer(Extension(db))
        .layer(Extension(images))
        .layer(Extension(Arc::new(verifier)))
        .layer(
            tower_http::trace::TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<axum::body::Body>| {
                    let matched_path = request
                        .extensions()
                        .get::<axum::extract::MatchedPath>()
                        .map(|matched| matched.as_str());

                    // "METHOD /route", e.g. "PUT /animal/:id"
                    let span_name = match matched_path {
                        Some(path) => format!("{} {}", request.method(), path),
                        None => format!("{} {}", request.method(), request.uri().path()),
                    };

                    let user_ip = request
                        .headers()
                        .get("x-forwarded-for")
                        .or_else(|| request.headers().get("x-real-ip"))
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("unknown");

                    // Handlers fill in the business fields.
                    tracing::info_span!(
                        "request",
                        "otel.name" = span_name,
                        user_ip = user_ip,
                        method = ?request.method(),
                        uri = ?request.uri(),
                        table = tracing::field::Empty,
                        action = tracing::field::Empty,
                        user_id = tracing::field::Empty,
                        animal_id = tracing::field::Empty,
                        business_event = tracing::field::Empty,
                        error = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency = tracing::field::Empty,
                    )
                })
                .on_request(|_request: &axum::http::Request<axum::body::Body>, _span: &tracing::Span| {})
                .on_response(
                    |response: &axum::http::Response<_>, latency: std::time::Duration, span: &tracing::Span| {
                        span.record("status", tracing::field::display(response.status()));
                        span.record("latency", tracing::field::debug(latency));
                        tracing::info!("request completed");
                    },
                ),
        )
        .layer(DefaultBodyLimit::max(max_upload_bytes))
}
