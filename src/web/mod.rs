//! Console API consumed by the browser dashboard

use axum::{
    Router,
    routing::{delete, get, post, put},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::AppState;

pub mod errors;
pub mod handlers;
pub mod params;
pub mod types;

pub use handlers::*;

pub fn router(app_state: AppState) -> Router {
    Router::new()
        .route("/api/dashboard", get(get_dashboard_handler))
        .route("/api/playground", get(get_playground_handler))
        .route("/api/playground/sql", put(set_sql_handler))
        .route("/api/playground/execute", post(execute_query_handler))
        .route("/api/playground/cache", delete(clear_cache_handler))
        .route("/api/parse", get(parse_query_handler))
        .route("/api/invalidate", post(invalidate_handler))
        .route("/api/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(app_state)
}
