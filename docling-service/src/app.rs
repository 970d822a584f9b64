use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Extension},
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use docling_config::{Config, CorsConfig};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::{handlers, state::AppState};

/// Build the router with default configuration (permissive CORS, 50 MiB uploads).
pub fn build_router(state: Arc<AppState>) -> Router {
    build_router_with_config(state, &Config::default())
}

pub fn build_router_with_config(state: Arc<AppState>, config: &Config) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/convert", post(handlers::convert::convert))
        .route("/status/{document_id}", get(handlers::status::status))
        .route(
            "/jobs",
            get(handlers::jobs::list::list_runs).delete(handlers::jobs::clear::clear_runs),
        )
        .layer(DefaultBodyLimit::max(config.uploads.max_body_bytes))
        .layer(cors_layer(&config.cors))
        .layer(TraceLayer::new_for_http())
        .layer(Extension(state))
}

fn cors_layer(cfg: &CorsConfig) -> CorsLayer {
    if cfg.allow_all_origins || cfg.allowed_origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = cfg
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}
