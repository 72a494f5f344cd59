//! HTTP handlers for the console API

use axum::{
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    response::Json,
};
use std::sync::Arc;
use tracing::warn;

use crate::{
    AppState,
    core::{
        api_client::CacheApi,
        playground::{ClearCacheOutcome, PlaygroundView},
        stats_poller::DashboardView,
        types::{InvalidationReport, ParsedQuery},
    },
    web::{
        errors::ApiError,
        params::{ClearCacheParams, SqlParams},
        types::{ConsoleHealth, SqlBody},
    },
};

#[axum_macros::debug_handler]
pub async fn get_dashboard_handler(State(app_state): State<AppState>) -> Json<DashboardView> {
    Json(app_state.poller.view())
}

#[axum_macros::debug_handler]
pub async fn get_playground_handler(State(app_state): State<AppState>) -> Json<PlaygroundView> {
    Json(app_state.playground.view())
}

#[axum_macros::debug_handler]
pub async fn set_sql_handler(
    State(app_state): State<AppState>,
    body: Result<Json<SqlBody>, JsonRejection>,
) -> Result<Json<PlaygroundView>, ApiError> {
    let Json(body) = body?;
    app_state.playground.set_sql(body.sql);
    Ok(Json(app_state.playground.view()))
}

/// Runs on its own task so a client hanging up does not abandon the request.
#[axum_macros::debug_handler]
pub async fn execute_query_handler(
    State(app_state): State<AppState>,
) -> Result<Json<PlaygroundView>, ApiError> {
    let playground = Arc::clone(&app_state.playground);
    tokio::spawn(async move { playground.execute().await })
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))??;

    Ok(Json(app_state.playground.view()))
}

#[axum_macros::debug_handler]
pub async fn clear_cache_handler(
    State(app_state): State<AppState>,
    params: Result<Query<ClearCacheParams>, QueryRejection>,
) -> Result<Json<ClearCacheOutcome>, ApiError> {
    let Query(params) = params?;
    Ok(Json(app_state.playground.clear_cache(params.clear_db).await))
}

#[axum_macros::debug_handler]
pub async fn parse_query_handler(
    State(app_state): State<AppState>,
    params: Result<Query<SqlParams>, QueryRejection>,
) -> Result<Json<ParsedQuery>, ApiError> {
    let Query(params) = params?;
    match app_state.playground.parse(&params.sql).await {
        Ok(parsed) => Ok(Json(parsed)),
        Err(e) => {
            warn!(error = %e, "parse request failed");
            Err(e.into())
        }
    }
}

#[axum_macros::debug_handler]
pub async fn invalidate_handler(
    State(app_state): State<AppState>,
    params: Result<Query<SqlParams>, QueryRejection>,
) -> Result<Json<InvalidationReport>, ApiError> {
    let Query(params) = params?;
    match app_state.playground.invalidate(&params.sql).await {
        Ok(report) => Ok(Json(report)),
        Err(e) => {
            warn!(error = %e, "invalidate request failed");
            Err(e.into())
        }
    }
}

#[axum_macros::debug_handler]
pub async fn health_handler(State(app_state): State<AppState>) -> Json<ConsoleHealth> {
    let (upstream, upstream_error) = match app_state.api.health().await {
        Ok(health) => (Some(health), None),
        Err(e) => (None, Some(e.to_string())),
    };

    Json(ConsoleHealth {
        console: "running",
        api_url: app_state.api.base_url().to_string(),
        polling: app_state.poller.is_running(),
        upstream,
        upstream_error,
    })
}
