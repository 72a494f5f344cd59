//! HTTP client for the QueryCache service

use std::future::Future;

use reqwest::{Client, Method, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::core::types::{
    ClearCacheReport, InvalidationReport, ParsedQuery, QueryResult, ServiceHealth, StatsSnapshot,
};

#[derive(Debug, Error)]
pub enum ApiClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Server returned error: {status} - {message}")]
    ServerError { status: u16, message: String },
    #[error("Malformed response body: {0}")]
    Decode(#[from] serde_json::Error),
}

/// The calls the console makes against the QueryCache service.
///
/// Implementations are cheap to clone so a handle can move into every
/// spawned request.
pub trait CacheApi: Clone + Send + Sync + 'static {
    fn fetch_stats(&self) -> impl Future<Output = Result<StatsSnapshot, ApiClientError>> + Send;

    /// Runs `sql` through the service. An `error` payload is a successful
    /// round trip and comes back as `Ok(QueryResult::Failed { .. })`.
    fn execute_query(
        &self,
        sql: &str,
    ) -> impl Future<Output = Result<QueryResult, ApiClientError>> + Send;

    fn clear_cache(
        &self,
        clear_db: bool,
    ) -> impl Future<Output = Result<ClearCacheReport, ApiClientError>> + Send;

    fn parse_query(
        &self,
        sql: &str,
    ) -> impl Future<Output = Result<ParsedQuery, ApiClientError>> + Send;

    fn invalidate(
        &self,
        sql: &str,
    ) -> impl Future<Output = Result<InvalidationReport, ApiClientError>> + Send;

    fn health(&self) -> impl Future<Output = Result<ServiceHealth, ApiClientError>> + Send;
}

#[derive(Clone)]
pub struct HttpCacheApi {
    client: Client,
    base_url: String,
}

impl HttpCacheApi {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.to_string(),
        }
    }

    /// Get the base URL for this client
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn resolve_url(&self, endpoint: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        let endpoint = endpoint.trim_start_matches('/');
        format!("{base}/{endpoint}")
    }

    async fn send(
        &self,
        method: Method,
        endpoint: &str,
        query: &[(&str, &str)],
    ) -> Result<Response, ApiClientError> {
        let mut request = self.client.request(method, self.resolve_url(endpoint));

        if !query.is_empty() {
            request = request.query(query);
        }

        Ok(request.send().await?)
    }

    /// Send a request and decode a JSON body, failing on any non-2xx status
    async fn request<R>(
        &self,
        method: Method,
        endpoint: &str,
        query: &[(&str, &str)],
    ) -> Result<R, ApiClientError>
    where
        R: DeserializeOwned,
    {
        let response = self.send(method, endpoint, query).await?;

        if !response.status().is_success() {
            return Err(server_error(response).await);
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

async fn server_error(response: Response) -> ApiClientError {
    let status = response.status().as_u16();
    let message = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    ApiClientError::ServerError { status, message }
}

impl CacheApi for HttpCacheApi {
    async fn fetch_stats(&self) -> Result<StatsSnapshot, ApiClientError> {
        self.request(Method::GET, "stats", &[]).await
    }

    async fn execute_query(&self, sql: &str) -> Result<QueryResult, ApiClientError> {
        let response = self.send(Method::GET, "query", &[("sql", sql)]).await?;
        let status = response.status();
        let body = response.bytes().await?;

        let value = match serde_json::from_slice::<Value>(&body) {
            Ok(value) => value,
            Err(_) if !status.is_success() => {
                return Err(ApiClientError::ServerError {
                    status: status.as_u16(),
                    message: String::from_utf8_lossy(&body).into_owned(),
                });
            }
            Err(e) => return Err(e.into()),
        };

        // An application-level error is rendered even when the status is not 2xx.
        let has_error = value.get("error").is_some_and(|error| !error.is_null());
        if !status.is_success() && !has_error {
            return Err(ApiClientError::ServerError {
                status: status.as_u16(),
                message: value.to_string(),
            });
        }

        Ok(QueryResult::from_value(value)?)
    }

    async fn clear_cache(&self, clear_db: bool) -> Result<ClearCacheReport, ApiClientError> {
        let query: &[(&str, &str)] = if clear_db { &[("clear_db", "true")] } else { &[] };
        let response = self.send(Method::DELETE, "cache", query).await?;

        if !response.status().is_success() {
            return Err(server_error(response).await);
        }

        // The body carries nothing the console depends on.
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body).unwrap_or_default())
    }

    async fn parse_query(&self, sql: &str) -> Result<ParsedQuery, ApiClientError> {
        self.request(Method::GET, "parse", &[("sql", sql)]).await
    }

    async fn invalidate(&self, sql: &str) -> Result<InvalidationReport, ApiClientError> {
        self.request(Method::POST, "invalidate", &[("sql", sql)])
            .await
    }

    async fn health(&self) -> Result<ServiceHealth, ApiClientError> {
        self.request(Method::GET, "health", &[]).await
    }
}
