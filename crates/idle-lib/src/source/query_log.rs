//! Query history exports (SYS_QUERY_HISTORY / STL_QUERY rows as JSON)

use super::QueryLogSource;
use crate::models::{AnalysisWindow, QueryEvent, QueryStatus};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};
use std::path::Path;

/// Accepts RFC 3339 or the zone-less `YYYY-MM-DD HH:MM:SS[.ffffff]` Redshift
/// prints; zone-less values are taken as UTC.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw.trim(), fmt).ok())
        .map(|naive| naive.and_utc())
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> std::result::Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("unrecognised timestamp '{}'", raw)))
}

/// One exported query-history row
///
/// Durations may be given in seconds (`execution_seconds`) or in the
/// microseconds the system views use (`execution_time`).
#[derive(Debug, Clone, Deserialize)]
pub struct QueryHistoryRow {
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub start_time: DateTime<Utc>,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub end_time: DateTime<Utc>,
    pub status: String,
    #[serde(default)]
    pub execution_seconds: Option<f64>,
    #[serde(default)]
    pub queue_seconds: Option<f64>,
    #[serde(default)]
    pub execution_time: Option<i64>,
    #[serde(default)]
    pub queue_time: Option<i64>,
}

impl From<QueryHistoryRow> for QueryEvent {
    fn from(row: QueryHistoryRow) -> Self {
        let mut event = QueryEvent::new(row.start_time, row.end_time, QueryStatus::from(row.status));
        if let Some(secs) = row
            .execution_seconds
            .or(row.execution_time.map(|us| us as f64 / 1_000_000.0))
        {
            event.execution_seconds = secs.max(0.0);
        }
        event.queue_seconds = row
            .queue_seconds
            .or(row.queue_time.map(|us| us as f64 / 1_000_000.0))
            .unwrap_or(0.0)
            .max(0.0);
        event
    }
}

/// Query events loaded from a JSON array of history rows
#[derive(Debug, Clone, Default)]
pub struct QueryLogExport {
    events: Vec<QueryEvent>,
}

impl QueryLogExport {
    pub fn new(events: Vec<QueryEvent>) -> Self {
        Self { events }
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let rows: Vec<QueryHistoryRow> =
            serde_json::from_str(raw).context("Invalid query history export")?;
        Ok(Self::new(rows.into_iter().map(QueryEvent::from).collect()))
    }

    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read query log {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("Failed to parse query log {}", path.display()))
    }

    pub fn events(&self) -> &[QueryEvent] {
        &self.events
    }

    pub fn latest_end(&self) -> Option<DateTime<Utc>> {
        self.events.iter().map(|e| e.effective_end()).max()
    }
}

#[async_trait]
impl QueryLogSource for QueryLogExport {
    async fn fetch_queries(&self, window: &AnalysisWindow) -> Result<Vec<QueryEvent>> {
        Ok(self
            .events
            .iter()
            .filter(|e| window.contains(e.start_time))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const ROWS: &str = r#"[
        {"start_time": "2024-06-01 09:16:00.250000", "end_time": "2024-06-01 09:16:05.250000",
         "status": "success", "execution_time": 4800000, "queue_time": 200000},
        {"start_time": "2024-06-01T10:31:00Z", "end_time": "2024-06-01T10:31:02Z",
         "status": "FAILED", "execution_seconds": 2.0},
        {"start_time": "2024-06-02T00:00:00+00:00", "end_time": "2024-06-02T00:00:01+00:00",
         "status": "aborted"}
    ]"#;

    #[test]
    fn test_parse_rows() {
        let log = QueryLogExport::parse(ROWS).unwrap();
        let events = log.events();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].status, QueryStatus::Success);
        assert!((events[0].execution_seconds - 4.8).abs() < 1e-9);
        assert!((events[0].queue_seconds - 0.2).abs() < 1e-9);
        assert_eq!(events[1].status, QueryStatus::Failed);
        assert_eq!(events[2].execution_seconds, 1.0);
    }

    #[test]
    fn test_bad_timestamp_rejected() {
        let raw = r#"[{"start_time": "yesterday", "end_time": "today", "status": "success"}]"#;
        assert!(QueryLogExport::parse(raw).is_err());
    }

    #[tokio::test]
    async fn test_fetch_queries_in_window() {
        let log = QueryLogExport::parse(ROWS).unwrap();
        let start = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let window = AnalysisWindow::trailing(start + chrono::Duration::days(1), 1).unwrap();
        let events = log.fetch_queries(&window).await.unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(
            log.latest_end(),
            Some(Utc.with_ymd_and_hms(2024, 6, 2, 0, 0, 1).unwrap())
        );
    }
}
