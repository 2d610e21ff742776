//! Input adapters for metric samples, query history and cluster details
//!
//! The analysis itself never talks to AWS. Collaborators implement the
//! [`MetricSource`] and [`QueryLogSource`] traits; the bundled
//! implementations read the JSON that the AWS CLI prints for
//! `get-metric-statistics`, `describe-clusters` and query-history exports.

mod batch;
mod cloudwatch;
mod cluster;
mod query_log;

pub use batch::{plan_batches, retry_with_backoff, RetryPolicy, MAX_POINTS_PER_REQUEST};
pub use cloudwatch::CloudWatchExport;
pub use cluster::{load_cluster_info, parse_describe_clusters};
pub use query_log::{QueryHistoryRow, QueryLogExport};

use crate::activity::MetricStreams;
use crate::models::{AnalysisWindow, MetricSample, QueryEvent};
use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

/// Source of per-minute metric statistics
#[async_trait]
pub trait MetricSource: Send + Sync {
    /// Samples of `metric` within `window`
    async fn fetch(&self, metric: &str, window: &AnalysisWindow) -> Result<Vec<MetricSample>>;
}

/// Source of query history rows
#[async_trait]
pub trait QueryLogSource: Send + Sync {
    /// Queries that started within `window`
    async fn fetch_queries(&self, window: &AnalysisWindow) -> Result<Vec<QueryEvent>>;
}

/// Fetch every metric over `window`, splitting into per-request batches
///
/// Each batch is retried per `policy`. Samples are merged, ordered by
/// timestamp and de-duplicated.
pub async fn collect_streams(
    source: &dyn MetricSource,
    metrics: &[&str],
    window: &AnalysisWindow,
    period_secs: i64,
    policy: &RetryPolicy,
) -> Result<MetricStreams> {
    let batches = plan_batches(window, period_secs, MAX_POINTS_PER_REQUEST);
    let mut streams = MetricStreams::new();

    for metric in metrics {
        let mut samples = Vec::new();
        for batch in &batches {
            let chunk = retry_with_backoff(policy, metric, || source.fetch(metric, batch)).await?;
            debug!(metric = %metric, batch_start = %batch.start, points = chunk.len(), "Fetched batch");
            samples.extend(chunk);
        }
        samples.sort_by_key(|s| s.timestamp);
        samples.dedup_by_key(|s| s.timestamp);
        streams.insert(metric.to_string(), samples);
    }

    Ok(streams)
}
