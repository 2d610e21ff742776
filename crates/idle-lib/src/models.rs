//! Core data models for the idle analyzer

use crate::error::{AnalysisError, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Metrics that decide whether a minute counts as active
pub const READ_IOPS: &str = "ReadIOPS";
pub const WRITE_IOPS: &str = "WriteIOPS";
pub const DATABASE_CONNECTIONS: &str = "DatabaseConnections";

/// One CloudWatch statistic for one metric at one timestamp
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    pub timestamp: DateTime<Utc>,
    pub metric_name: String,
    pub value: f64,
}

impl MetricSample {
    pub fn new(timestamp: DateTime<Utc>, metric_name: impl Into<String>, value: f64) -> Self {
        Self {
            timestamp,
            metric_name: metric_name.into(),
            value,
        }
    }
}

/// Activity classification of a single sampled minute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityBucket {
    pub timestamp: DateTime<Utc>,
    pub is_active: bool,
    /// Metrics whose value exceeded their threshold in this bucket
    pub contributing_metrics: BTreeSet<String>,
}

/// Final status of a query in the history view
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum QueryStatus {
    Success,
    Failed,
    Aborted,
    Other(String),
}

impl From<&str> for QueryStatus {
    fn from(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "success" => QueryStatus::Success,
            "failed" => QueryStatus::Failed,
            "aborted" => QueryStatus::Aborted,
            _ => QueryStatus::Other(raw.trim().to_string()),
        }
    }
}

impl From<String> for QueryStatus {
    fn from(raw: String) -> Self {
        QueryStatus::from(raw.as_str())
    }
}

impl From<QueryStatus> for String {
    fn from(status: QueryStatus) -> Self {
        status.to_string()
    }
}

impl fmt::Display for QueryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryStatus::Success => write!(f, "success"),
            QueryStatus::Failed => write!(f, "failed"),
            QueryStatus::Aborted => write!(f, "aborted"),
            QueryStatus::Other(s) => write!(f, "{}", s),
        }
    }
}

/// A query taken from the cluster's query history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryEvent {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: QueryStatus,
    #[serde(default)]
    pub execution_seconds: f64,
    #[serde(default)]
    pub queue_seconds: f64,
}

impl QueryEvent {
    pub fn new(start_time: DateTime<Utc>, end_time: DateTime<Utc>, status: QueryStatus) -> Self {
        let execution_seconds = (end_time - start_time).num_milliseconds().max(0) as f64 / 1000.0;
        Self {
            start_time,
            end_time,
            status,
            execution_seconds,
            queue_seconds: 0.0,
        }
    }

    /// End time, clamped so it never precedes the start
    pub fn effective_end(&self) -> DateTime<Utc> {
        self.end_time.max(self.start_time)
    }
}

/// Time range covered by one analysis run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl AnalysisWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if end <= start {
            return Err(AnalysisError::InvalidWindow {
                start: start.to_rfc3339(),
                end: end.to_rfc3339(),
            });
        }
        Ok(Self { start, end })
    }

    /// Window of `days` ending at `end`
    pub fn trailing(end: DateTime<Utc>, days: u32) -> Result<Self> {
        Self::new(end - Duration::days(i64::from(days)), end)
    }

    pub fn total_seconds(&self) -> f64 {
        (self.end - self.start).num_milliseconds() as f64 / 1000.0
    }

    /// Half-open containment: `start <= ts < end`
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.start && ts < self.end
    }
}

/// Cluster configuration as reported by DescribeClusters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterInfo {
    pub cluster_id: String,
    pub node_type: String,
    pub number_of_nodes: u32,
    pub cluster_status: String,
    pub cluster_version: String,
}

impl ClusterInfo {
    pub fn new(cluster_id: impl Into<String>, node_type: impl Into<String>, number_of_nodes: u32) -> Self {
        Self {
            cluster_id: cluster_id.into(),
            node_type: node_type.into(),
            number_of_nodes,
            cluster_status: "unknown".to_string(),
            cluster_version: "unknown".to_string(),
        }
    }
}

/// Where a price figure came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceSource {
    /// Retrieved from the AWS Pricing API
    Api,
    /// Taken from the static fallback table
    Hardcoded,
    /// No table entry matched; generic default used
    Default,
}

impl fmt::Display for PriceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PriceSource::Api => write!(f, "api"),
            PriceSource::Hardcoded => write!(f, "hardcoded"),
            PriceSource::Default => write!(f, "default"),
        }
    }
}

/// A price tagged with its currency and provenance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Priced {
    pub value: f64,
    pub currency: String,
    pub source: PriceSource,
}

impl Priced {
    pub fn new(value: f64, currency: impl Into<String>, source: PriceSource) -> Self {
        Self {
            value,
            currency: currency.into(),
            source,
        }
    }
}
