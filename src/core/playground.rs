//! Ad-hoc query execution and cache management for the operator

use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::core::api_client::{ApiClientError, CacheApi};
use crate::core::config::ConsoleConfig;
use crate::core::render::ResultView;
use crate::core::types::{ClearCacheReport, InvalidationReport, ParsedQuery, QueryResult};

pub const CACHE_CLEARED_MESSAGE: &str = "Cache cleared!";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlaygroundError {
    #[error("a query is already executing")]
    Busy,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlaygroundState {
    pub sql: String,
    /// `None` until a query has been executed, and again after a cache clear
    pub result: Option<QueryResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaygroundView {
    pub sql: String,
    pub executing: bool,
    pub result: ResultView,
}

/// What the operator is told after a cache-clear attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClearCacheOutcome {
    pub cleared: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<ClearCacheReport>,
}

pub struct QueryPlayground<A: CacheApi> {
    api: A,
    state: Mutex<PlaygroundState>,
    in_flight: AtomicBool,
}

/// Releases the in-flight flag however the execution future ends.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<A: CacheApi> QueryPlayground<A> {
    pub fn new(api: A, config: &ConsoleConfig) -> Self {
        Self {
            api,
            state: Mutex::new(PlaygroundState {
                sql: config.default_sql.clone(),
                result: None,
            }),
            in_flight: AtomicBool::new(false),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, PlaygroundState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn sql(&self) -> String {
        self.lock_state().sql.clone()
    }

    pub fn set_sql(&self, sql: impl Into<String>) {
        self.lock_state().sql = sql.into();
    }

    pub fn state(&self) -> PlaygroundState {
        self.lock_state().clone()
    }

    pub fn is_executing(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Execute the current query text.
    ///
    /// Returns `PlaygroundError::Busy` without sending anything if an
    /// execution is already outstanding. Transport failures become a
    /// synthetic error result that replaces whatever was shown before.
    pub async fn execute(&self) -> Result<QueryResult, PlaygroundError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("execute ignored, a query is already in flight");
            return Err(PlaygroundError::Busy);
        }
        let _guard = InFlightGuard(&self.in_flight);

        let sql = self.sql();
        debug!(%sql, "executing query");

        let result = match self.api.execute_query(&sql).await {
            Ok(result) => result,
            Err(e) => {
                error!(error = %e, "query execution failed");
                QueryResult::transport_failure()
            }
        };

        self.lock_state().result = Some(result.clone());
        Ok(result)
    }

    /// Clear the service's cache. On success the displayed result goes back to
    /// "no query executed yet"; on failure it is left alone and the failure is
    /// reported. The query text is never touched.
    pub async fn clear_cache(&self, clear_db: bool) -> ClearCacheOutcome {
        match self.api.clear_cache(clear_db).await {
            Ok(report) => {
                self.lock_state().result = None;
                info!(
                    clear_db,
                    redis_keys_deleted = report.redis_keys_deleted,
                    db_records_deleted = report.db_records_deleted,
                    "cache cleared"
                );
                ClearCacheOutcome {
                    cleared: true,
                    message: CACHE_CLEARED_MESSAGE.to_string(),
                    report: Some(report),
                }
            }
            Err(e) => {
                warn!(error = %e, "cache clear failed");
                ClearCacheOutcome {
                    cleared: false,
                    message: format!("Error: {e}"),
                    report: None,
                }
            }
        }
    }

    pub async fn parse(&self, sql: &str) -> Result<ParsedQuery, ApiClientError> {
        self.api.parse_query(sql).await
    }

    pub async fn invalidate(&self, sql: &str) -> Result<InvalidationReport, ApiClientError> {
        self.api.invalidate(sql).await
    }

    pub fn view(&self) -> PlaygroundView {
        let state = self.lock_state();
        PlaygroundView {
            sql: state.sql.clone(),
            executing: self.is_executing(),
            result: ResultView::from_result(state.result.as_ref()),
        }
    }
}
