//! Error types and handling for web handlers

use axum::{
    Json as AxumJson,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::IntoResponse,
};
use thiserror::Error;

use crate::core::{api_client::ApiClientError, playground::PlaygroundError};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("QueryCache service request failed: {0}")]
    Upstream(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ApiClientError> for ApiError {
    fn from(e: ApiClientError) -> Self {
        ApiError::Upstream(e.to_string())
    }
}

impl From<PlaygroundError> for ApiError {
    fn from(e: PlaygroundError) -> Self {
        match e {
            PlaygroundError::Busy => ApiError::Conflict(e.to_string()),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::InvalidRequest(rejection.body_text())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        let body = AxumJson(serde_json::json!({
            "status": status.as_u16(),
            "message": self.to_string()
        }));

        (status, body).into_response()
    }
}
