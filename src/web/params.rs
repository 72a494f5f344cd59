//! Query-string parameters accepted by the console API

use serde::{Deserialize, Deserializer, de::Error};

/// `?sql=...` for the parse and invalidate pass-throughs.
#[derive(Debug, Deserialize, Clone)]
pub struct SqlParams {
    #[serde(deserialize_with = "non_blank")]
    pub sql: String,
}

/// `?clear_db=...` for the cache-clear action. Absent means `false`.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct ClearCacheParams {
    #[serde(default, deserialize_with = "flag")]
    pub clear_db: bool,
}

/// Reject text that is empty after trimming; anything else is passed on verbatim
fn non_blank<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let sql = String::deserialize(deserializer)?;
    if sql.trim().is_empty() {
        return Err(Error::custom("sql must not be blank"));
    }
    Ok(sql)
}

/// Accept the spellings browsers and shells tend to send for a boolean switch
fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" | "" => Ok(false),
        other => Err(Error::custom(format!("invalid boolean flag: {other}"))),
    }
}
