//! Scripted in-memory `CacheApi` used by the poller and playground tests

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::core::api_client::{ApiClientError, CacheApi};
use crate::core::types::{
    ClearCacheReport, InvalidationReport, ParsedQuery, QueryResult, ServiceHealth, StatsSnapshot,
    TopQuery,
};

type Scripted<T> = VecDeque<Result<T, String>>;

#[derive(Default)]
struct Script {
    stats: Scripted<StatsSnapshot>,
    queries: Scripted<QueryResult>,
    clears: Scripted<ClearCacheReport>,
    stats_calls: usize,
    executed: Vec<String>,
    clear_flags: Vec<bool>,
}

/// Responses are served in push order; an exhausted queue answers with a 503.
#[derive(Clone, Default)]
pub(crate) struct ScriptedApi {
    script: Arc<Mutex<Script>>,
    delay: Duration,
}

impl ScriptedApi {
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn push_stats(&self, response: Result<StatsSnapshot, String>) {
        self.script.lock().unwrap().stats.push_back(response);
    }

    pub fn push_query(&self, response: Result<QueryResult, String>) {
        self.script.lock().unwrap().queries.push_back(response);
    }

    pub fn push_clear(&self, response: Result<ClearCacheReport, String>) {
        self.script.lock().unwrap().clears.push_back(response);
    }

    pub fn stats_calls(&self) -> usize {
        self.script.lock().unwrap().stats_calls
    }

    pub fn executed(&self) -> Vec<String> {
        self.script.lock().unwrap().executed.clone()
    }

    pub fn clear_flags(&self) -> Vec<bool> {
        self.script.lock().unwrap().clear_flags.clone()
    }

    async fn respond<T>(&self, next: Option<Result<T, String>>) -> Result<T, ApiClientError> {
        tokio::time::sleep(self.delay).await;
        match next {
            Some(Ok(value)) => Ok(value),
            Some(Err(message)) => Err(ApiClientError::ServerError {
                status: 502,
                message,
            }),
            None => Err(ApiClientError::ServerError {
                status: 503,
                message: "no scripted response".to_string(),
            }),
        }
    }
}

impl CacheApi for ScriptedApi {
    async fn fetch_stats(&self) -> Result<StatsSnapshot, ApiClientError> {
        let next = {
            let mut script = self.script.lock().unwrap();
            script.stats_calls += 1;
            script.stats.pop_front()
        };
        self.respond(next).await
    }

    async fn execute_query(&self, sql: &str) -> Result<QueryResult, ApiClientError> {
        let next = {
            let mut script = self.script.lock().unwrap();
            script.executed.push(sql.to_string());
            script.queries.pop_front()
        };
        self.respond(next).await
    }

    async fn clear_cache(&self, clear_db: bool) -> Result<ClearCacheReport, ApiClientError> {
        let next = {
            let mut script = self.script.lock().unwrap();
            script.clear_flags.push(clear_db);
            script.clears.pop_front()
        };
        self.respond(next).await
    }

    async fn parse_query(&self, sql: &str) -> Result<ParsedQuery, ApiClientError> {
        Ok(ParsedQuery {
            query: sql.to_string(),
            query_type: sql
                .split_whitespace()
                .next()
                .unwrap_or_default()
                .to_uppercase(),
            tables: Vec::new(),
        })
    }

    async fn invalidate(&self, _sql: &str) -> Result<InvalidationReport, ApiClientError> {
        self.respond(None).await
    }

    async fn health(&self) -> Result<ServiceHealth, ApiClientError> {
        Ok(ServiceHealth {
            status: "healthy".to_string(),
            timestamp: None,
            service: Some("querycache".to_string()),
        })
    }
}

pub(crate) fn snapshot(total_queries: u64, total_hits: u64) -> StatsSnapshot {
    StatsSnapshot {
        total_queries,
        total_hits,
        cache_size: "1.2 MB".to_string(),
        top_queries: vec![TopQuery {
            query: "SELECT 1".to_string(),
            hits: 5,
            cached_at: "2024-01-01T00:00:00Z".to_string(),
        }],
    }
}
