//! Wire types exchanged with the QueryCache service

use serde::{Deserialize, Deserializer, Serialize, de::Error as _};
use serde_json::{Map, Value};

/// Message shown in place of a result when the query round trip itself failed.
pub const FAILED_QUERY_MESSAGE: &str = "Failed to execute query";

/// One result row, keyed by column name in server order.
pub type Row = Map<String, Value>;

/// Aggregate statistics as returned by `GET /stats`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub total_queries: u64,
    pub total_hits: u64,
    pub cache_size: String,
    pub top_queries: Vec<TopQuery>,
}

/// A frequently cached query. Ordering comes from the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopQuery {
    pub query: String,
    pub hits: u64,
    pub cached_at: String,
}

/// Where a query result came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CacheSource {
    Cache,
    Fresh,
    Other(String),
}

impl CacheSource {
    pub fn is_hit(&self) -> bool {
        matches!(self, CacheSource::Cache)
    }

    /// Upper-cased badge text
    pub fn label(&self) -> String {
        match self {
            CacheSource::Cache => "CACHE".to_string(),
            CacheSource::Fresh => "FRESH".to_string(),
            CacheSource::Other(raw) => raw.to_uppercase(),
        }
    }
}

impl From<String> for CacheSource {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "cache" => CacheSource::Cache,
            "fresh" | "database" => CacheSource::Fresh,
            _ => CacheSource::Other(raw),
        }
    }
}

impl From<CacheSource> for String {
    fn from(source: CacheSource) -> Self {
        match source {
            CacheSource::Cache => "cache".to_string(),
            CacheSource::Fresh => "fresh".to_string(),
            CacheSource::Other(raw) => raw,
        }
    }
}

/// Successful query payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuerySuccess {
    pub source: CacheSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_time_ms: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_rows")]
    pub result: Vec<Row>,
}

/// Outcome of `GET /query`, discriminated by the presence of `error`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QueryResult {
    Failed { error: String },
    Success(QuerySuccess),
}

impl QueryResult {
    /// Classify a decoded response body.
    ///
    /// A non-null `error` field wins over everything else in the payload; the
    /// success fields are not looked at in that case.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        match value.get("error") {
            Some(Value::Null) | None => serde_json::from_value(value).map(QueryResult::Success),
            Some(Value::String(message)) => Ok(QueryResult::Failed {
                error: message.clone(),
            }),
            Some(other) => Ok(QueryResult::Failed {
                error: other.to_string(),
            }),
        }
    }

    /// Result recorded when the request never produced a usable payload.
    pub fn transport_failure() -> Self {
        QueryResult::Failed {
            error: FAILED_QUERY_MESSAGE.to_string(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, QueryResult::Failed { .. })
    }

    pub fn rows(&self) -> &[Row] {
        match self {
            QueryResult::Success(success) => &success.result,
            QueryResult::Failed { .. } => &[],
        }
    }
}

impl<'de> Deserialize<'de> for QueryResult {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        QueryResult::from_value(value).map_err(D::Error::custom)
    }
}

/// Accepts either a bare row array or the service's `{"rows": [...]}` wrapper.
fn deserialize_rows<'de, D>(deserializer: D) -> Result<Vec<Row>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RowsShape {
        Bare(Vec<Row>),
        Wrapped { rows: Vec<Row> },
    }

    Ok(match Option::<RowsShape>::deserialize(deserializer)? {
        Some(RowsShape::Bare(rows)) | Some(RowsShape::Wrapped { rows }) => rows,
        None => Vec::new(),
    })
}

/// Whatever the service reports back from `DELETE /cache`. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClearCacheReport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redis_keys_deleted: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_records_deleted: Option<u64>,
}

/// Response of `GET /parse`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedQuery {
    pub query: String,
    #[serde(rename = "type")]
    pub query_type: String,
    #[serde(default)]
    pub tables: Vec<String>,
}

/// Response of `POST /invalidate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvalidationReport {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_type: Option<String>,
    #[serde(default)]
    pub tables: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_keys_invalidated: Option<u64>,
}

/// Response of `GET /health`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceHealth {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
}
