//! Projection of console state into display-ready views
//!
//! Everything here is pure: a `QueryResult` goes in, strings come out. The
//! browser surface serializes these views as JSON and the terminal
//! subcommands print them through `Display`.

use serde::Serialize;
use serde_json::{Number, Value};
use std::fmt;

use crate::core::stats_poller::DashboardView;
use crate::core::types::{QueryResult, Row, StatsSnapshot};

/// Fraction digits kept when formatting non-integral numbers.
const MAX_FRACTION_DIGITS: usize = 3;

/// How the last playground result should be shown.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ResultView {
    /// No query executed yet
    Idle,
    Error {
        message: String,
    },
    Success {
        source: String,
        cache_hit: bool,
        execution_time: String,
        row_count: usize,
        #[serde(skip_serializing_if = "Option::is_none")]
        table: Option<ResultTable>,
    },
}

impl ResultView {
    pub fn from_result(result: Option<&QueryResult>) -> Self {
        match result {
            None => ResultView::Idle,
            Some(QueryResult::Failed { error }) => ResultView::Error {
                message: error.clone(),
            },
            Some(QueryResult::Success(success)) => ResultView::Success {
                source: success.source.label(),
                cache_hit: success.source.is_hit(),
                execution_time: format_millis(success.execution_time_ms),
                row_count: success.result.len(),
                table: ResultTable::from_rows(&success.result),
            },
        }
    }

    pub fn table(&self) -> Option<&ResultTable> {
        match self {
            ResultView::Success { table, .. } => table.as_ref(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ResultTable {
    /// Builds a table whose header is the key set of the first row.
    ///
    /// Returns `None` for an empty row sequence. Cells are looked up by
    /// column name, so a row missing a key gets an empty cell.
    pub fn from_rows(rows: &[Row]) -> Option<Self> {
        let columns: Vec<String> = rows.first()?.keys().cloned().collect();

        let rows = rows
            .iter()
            .map(|row| {
                columns
                    .iter()
                    .map(|column| format_cell(row.get(column)))
                    .collect()
            })
            .collect();

        Some(Self { columns, rows })
    }
}

/// Render a single scalar the way the playground table shows it.
pub fn format_cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::Number(number)) => format_number(number),
        Some(Value::String(text)) => text.clone(),
        Some(Value::Bool(flag)) => flag.to_string(),
        Some(other) => other.to_string(),
    }
}

/// en-US grouping: `1234567.891` becomes `1,234,567.891`.
pub fn format_number(number: &Number) -> String {
    if let Some(value) = number.as_i64() {
        return with_sign(value < 0, &group_digits(&value.unsigned_abs().to_string()));
    }
    if let Some(value) = number.as_u64() {
        return group_digits(&value.to_string());
    }

    let value = number.as_f64().unwrap_or_default();
    let fixed = format!("{:.*}", MAX_FRACTION_DIGITS, value.abs());
    let (integer, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let fraction = fraction.trim_end_matches('0');
    let grouped = group_digits(integer);

    // A value that rounds to zero keeps no sign, matching "-0.0001" -> "0".
    let is_zero = integer.chars().all(|c| c == '0') && fraction.is_empty();
    let body = if fraction.is_empty() {
        grouped
    } else {
        format!("{grouped}.{fraction}")
    };
    with_sign(value < 0.0 && !is_zero, &body)
}

fn with_sign(negative: bool, body: &str) -> String {
    if negative {
        format!("-{body}")
    } else {
        body.to_string()
    }
}

fn group_digits(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}

/// `Some(3.0)` -> `3ms`, `Some(2.5)` -> `2.5ms`, `None` -> `-`.
pub fn format_millis(millis: Option<f64>) -> String {
    match millis {
        Some(ms) => {
            let fixed = format!("{:.*}", MAX_FRACTION_DIGITS, ms);
            let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
            format!("{trimmed}ms")
        }
        None => "-".to_string(),
    }
}

impl fmt::Display for ResultTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let widths: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, column)| {
                self.rows
                    .iter()
                    .filter_map(|row| row.get(i))
                    .map(|cell| cell.chars().count())
                    .chain(std::iter::once(column.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        write_row(f, &self.columns, &widths)?;
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        write_row(f, &rule, &widths)?;
        for row in &self.rows {
            write_row(f, row, &widths)?;
        }
        Ok(())
    }
}

fn write_row(f: &mut fmt::Formatter<'_>, cells: &[String], widths: &[usize]) -> fmt::Result {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join(" | ");
    writeln!(f, "{}", line.trim_end())
}

impl fmt::Display for ResultView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultView::Idle => writeln!(f, "No query executed yet"),
            ResultView::Error { message } => writeln!(f, "Error: {message}"),
            ResultView::Success {
                source,
                execution_time,
                row_count,
                table,
                ..
            } => {
                writeln!(
                    f,
                    "Source: {source}  Time: {execution_time}  Rows: {row_count}"
                )?;
                match table {
                    Some(table) => write!(f, "\n{table}"),
                    None => Ok(()),
                }
            }
        }
    }
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total Queries: {}", group_digits(&self.total_queries.to_string()))?;
        writeln!(f, "Total Hits:    {}", group_digits(&self.total_hits.to_string()))?;
        writeln!(f, "Cache Size:    {}", self.cache_size)?;

        if self.top_queries.is_empty() {
            return writeln!(f, "\nNo cached queries yet");
        }

        writeln!(f, "\nTop Queries")?;
        for (rank, top) in self.top_queries.iter().enumerate() {
            writeln!(
                f,
                "{:>2}. {}  (Hits: {}, cached at {})",
                rank + 1,
                top.query,
                group_digits(&top.hits.to_string()),
                top.cached_at
            )?;
        }
        Ok(())
    }
}

impl fmt::Display for DashboardView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.snapshot, self.loading) {
            (Some(snapshot), _) => write!(f, "{snapshot}")?,
            (None, true) => writeln!(f, "Loading statistics...")?,
            (None, false) => writeln!(f, "Statistics unavailable")?,
        }

        if self.last_refresh_failed && self.snapshot.is_some() {
            writeln!(f, "\n(last refresh failed, showing previous data)")?;
        }
        writeln!(f, "\nNext refresh in {}s", self.countdown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::TopQuery;
    use serde_json::json;

    fn result(value: Value) -> QueryResult {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_idle_view() {
        assert_eq!(ResultView::from_result(None), ResultView::Idle);
    }

    #[test]
    fn test_cache_hit_view() {
        let result = result(json!({
            "source": "cache",
            "execution_time_ms": 3,
            "result": [{"id": 1, "name": "a"}]
        }));

        let view = ResultView::from_result(Some(&result));
        assert_eq!(
            view,
            ResultView::Success {
                source: "CACHE".to_string(),
                cache_hit: true,
                execution_time: "3ms".to_string(),
                row_count: 1,
                table: Some(ResultTable {
                    columns: vec!["id".to_string(), "name".to_string()],
                    rows: vec![vec!["1".to_string(), "a".to_string()]],
                }),
            }
        );
    }

    #[test]
    fn test_empty_result_has_no_table() {
        let result = result(json!({"source": "fresh", "execution_time_ms": 12.5, "result": []}));

        let view = ResultView::from_result(Some(&result));
        match &view {
            ResultView::Success {
                row_count,
                table,
                cache_hit,
                execution_time,
                ..
            } => {
                assert_eq!(*row_count, 0);
                assert!(table.is_none());
                assert!(!cache_hit);
                assert_eq!(execution_time, "12.5ms");
            }
            other => panic!("unexpected view: {other:?}"),
        }
        assert!(view.table().is_none());
    }

    #[test]
    fn test_error_view_never_has_table() {
        let result = result(json!({
            "error": "syntax error",
            "source": "cache",
            "result": [{"id": 1}]
        }));

        let view = ResultView::from_result(Some(&result));
        assert_eq!(
            view,
            ResultView::Error {
                message: "syntax error".to_string()
            }
        );
        assert!(view.table().is_none());
    }

    #[test]
    fn test_columns_come_from_first_row_only() {
        let rows: Vec<Row> = serde_json::from_value(json!([
            {"id": 1, "name": "a"},
            {"id": 2, "price": 9.5},
        ]))
        .unwrap();

        let table = ResultTable::from_rows(&rows).unwrap();
        assert_eq!(table.columns, vec!["id", "name"]);
        assert_eq!(table.rows[1], vec!["2".to_string(), String::new()]);
    }

    #[test]
    fn test_null_renders_as_empty_cell() {
        assert_eq!(format_cell(Some(&Value::Null)), "");
        assert_eq!(format_cell(None), "");
        assert_eq!(format_cell(Some(&json!("plain"))), "plain");
        assert_eq!(format_cell(Some(&json!(true))), "true");
    }

    #[test]
    fn test_format_number_grouping() {
        let n = |v: Value| match v {
            Value::Number(number) => format_number(&number),
            _ => unreachable!(),
        };

        assert_eq!(n(json!(0)), "0");
        assert_eq!(n(json!(999)), "999");
        assert_eq!(n(json!(1000)), "1,000");
        assert_eq!(n(json!(1234567)), "1,234,567");
        assert_eq!(n(json!(-1234567)), "-1,234,567");
        assert_eq!(n(json!(18446744073709551615u64)), "18,446,744,073,709,551,615");
        assert_eq!(n(json!(1234.5)), "1,234.5");
        assert_eq!(n(json!(1234.56789)), "1,234.568");
        assert_eq!(n(json!(2.0)), "2");
        assert_eq!(n(json!(-0.0001)), "0");
        assert_eq!(n(json!(-1999.9999)), "-2,000");
    }

    #[test]
    fn test_format_millis() {
        assert_eq!(format_millis(Some(3.0)), "3ms");
        assert_eq!(format_millis(Some(0.25)), "0.25ms");
        assert_eq!(format_millis(Some(120.0)), "120ms");
        assert_eq!(format_millis(Some(0.1 + 0.2)), "0.3ms");
        assert_eq!(format_millis(Some(12.34567)), "12.346ms");
        assert_eq!(format_millis(None), "-");
    }

    #[test]
    fn test_result_view_text() {
        let result = result(json!({
            "source": "cache",
            "execution_time_ms": 3,
            "result": [{"id": 1, "name": "alpha"}, {"id": 1000, "name": null}]
        }));

        let text = ResultView::from_result(Some(&result)).to_string();
        assert_eq!(
            text,
            "Source: CACHE  Time: 3ms  Rows: 2\n\
             \n\
             id    | name\n\
             ----- | -----\n\
             1     | alpha\n\
             1,000 |\n"
        );
    }

    #[test]
    fn test_dashboard_text() {
        let view = DashboardView {
            snapshot: Some(StatsSnapshot {
                total_queries: 42,
                total_hits: 30,
                cache_size: "1.2 MB".to_string(),
                top_queries: vec![TopQuery {
                    query: "SELECT 1".to_string(),
                    hits: 5,
                    cached_at: "2024-01-01T00:00:00Z".to_string(),
                }],
            }),
            loading: false,
            countdown: 4,
            last_refresh_failed: false,
        };

        let text = view.to_string();
        assert!(text.contains("Total Queries: 42"));
        assert!(text.contains("Total Hits:    30"));
        assert!(text.contains("Cache Size:    1.2 MB"));
        assert!(text.contains(" 1. SELECT 1  (Hits: 5, cached at 2024-01-01T00:00:00Z)"));
        assert!(text.ends_with("Next refresh in 4s\n"));
    }

    #[test]
    fn test_dashboard_text_while_loading() {
        let view = DashboardView {
            snapshot: None,
            loading: true,
            countdown: 5,
            last_refresh_failed: false,
        };
        assert!(view.to_string().starts_with("Loading statistics..."));
    }
}
