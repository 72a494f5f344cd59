//! Stub QueryCache service served on an ephemeral loopback port

use axum::{
    Json, Router,
    extract::Query,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use serde_json::json;
use std::{collections::HashMap, time::Duration};

/// Port 9 (discard) is closed on loopback, so every request fails to connect.
pub const UNREACHABLE_URL: &str = "http://127.0.0.1:9";

/// Start the stub and return its base URL. Paths under `/broken` answer 500.
pub async fn spawn_stub_service() -> String {
    let app = Router::new()
        .route("/stats", get(stats))
        .route("/query", get(query))
        .route("/cache", delete(clear_cache))
        .route("/parse", get(parse))
        .route("/invalidate", post(invalidate))
        .route("/health", get(health))
        .route("/broken/stats", get(broken))
        .route("/broken/query", get(broken))
        .route("/broken/cache", delete(broken));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{addr}")
}

async fn stats() -> Json<serde_json::Value> {
    Json(json!({
        "total_queries": 42,
        "total_hits": 30,
        "cache_size": "1.2 MB",
        "top_queries": [
            {"query": "SELECT 1", "hits": 5, "cached_at": "2024-01-01T00:00:00Z"}
        ]
    }))
}

async fn query(Query(params): Query<HashMap<String, String>>) -> Response {
    let sql = params.get("sql").cloned().unwrap_or_default();

    match sql.as_str() {
        "SELECT * FROM x" => Json(json!({
            "source": "cache",
            "execution_time_ms": 3,
            "result": [{"id": 1, "name": "a"}]
        }))
        .into_response(),
        "SELECT nothing" => Json(json!({
            "source": "fresh",
            "execution_time_ms": 4,
            "result": []
        }))
        .into_response(),
        "SELECT broken" => (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "syntax error", "source": "fresh"})),
        )
            .into_response(),
        "SELECT crash" => {
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
        }
        "SELECT slow" => {
            tokio::time::sleep(Duration::from_millis(500)).await;
            Json(json!({"source": "fresh", "execution_time_ms": 500, "result": []})).into_response()
        }
        "SELECT garbage" => (StatusCode::OK, "<html>not json</html>").into_response(),
        _ => Json(json!({
            "source": "database",
            "query": sql,
            "result": {"rows": [{"id": 1, "sql": sql}]},
            "cached_at": "2024-05-01T10:00:00"
        }))
        .into_response(),
    }
}

async fn clear_cache(Query(params): Query<HashMap<String, String>>) -> Json<serde_json::Value> {
    let clear_db = params.get("clear_db").is_some_and(|v| v == "true");
    let db_records_deleted = if clear_db { 3 } else { 0 };
    Json(json!({
        "message": "Cache cleared successfully",
        "redis_keys_deleted": 2,
        "db_records_deleted": db_records_deleted
    }))
}

async fn parse(Query(params): Query<HashMap<String, String>>) -> Json<serde_json::Value> {
    let sql = params.get("sql").cloned().unwrap_or_default();
    Json(json!({
        "query": sql,
        "type": sql.split_whitespace().next().unwrap_or_default().to_uppercase(),
        "tables": ["products"]
    }))
}

async fn invalidate(Query(params): Query<HashMap<String, String>>) -> Json<serde_json::Value> {
    let sql = params.get("sql").cloned().unwrap_or_default();
    if sql.to_uppercase().starts_with("SELECT") {
        return Json(json!({
            "message": "Only UPDATE/INSERT/DELETE queries trigger invalidation",
            "query_type": "SELECT"
        }));
    }
    Json(json!({
        "message": "Cache invalidated successfully",
        "query_type": "UPDATE",
        "tables": ["products"],
        "cache_keys_invalidated": 1
    }))
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": "2024-05-01T10:00:00",
        "service": "querycache"
    }))
}

async fn broken() -> (StatusCode, &'static str) {
    (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded")
}
