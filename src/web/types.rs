//! Request and response bodies specific to the console API

use serde::{Deserialize, Serialize};

use crate::core::types::ServiceHealth;

/// Body of `PUT /api/playground/sql`.
#[derive(Debug, Deserialize)]
pub struct SqlBody {
    pub sql: String,
}

/// Console liveness plus whatever the QueryCache service says about itself
#[derive(Debug, Serialize)]
pub struct ConsoleHealth {
    pub console: &'static str,
    pub api_url: String,
    pub polling: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upstream: Option<ServiceHealth>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upstream_error: Option<String>,
}
