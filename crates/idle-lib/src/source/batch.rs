//! Request batching and bounded retries for metric retrieval

use crate::models::AnalysisWindow;
use anyhow::Result;
use chrono::Duration;
use std::future::Future;
use tracing::warn;

/// GetMetricStatistics returns at most this many datapoints per call
pub const MAX_POINTS_PER_REQUEST: usize = 1440;

/// Split `window` into consecutive sub-windows of at most `max_points` samples
pub fn plan_batches(window: &AnalysisWindow, period_secs: i64, max_points: usize) -> Vec<AnalysisWindow> {
    let span = Duration::seconds(period_secs.max(1) * max_points.max(1) as i64);
    let mut batches = Vec::new();
    let mut start = window.start;

    while start < window.end {
        let end = (start + span).min(window.end);
        batches.push(AnalysisWindow { start, end });
        start = end;
    }

    batches
}

/// Bounded exponential backoff
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: std::time::Duration,
    pub max_backoff: std::time::Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: std::time::Duration::from_secs(1),
            max_backoff: std::time::Duration::from_secs(30),
        }
    }
}

/// Run `op` until it succeeds or `policy.max_attempts` is reached
pub async fn retry_with_backoff<T, F, Fut>(policy: &RetryPolicy, what: &str, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let attempts = policy.max_attempts.max(1);
    let mut backoff = policy.initial_backoff;
    let mut attempt = 1;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < attempts => {
                warn!(
                    operation = %what,
                    attempt = attempt,
                    backoff_ms = backoff.as_millis() as u64,
                    error = %e,
                    "Request failed, retrying"
                );
                tokio::time::sleep(backoff).await;
                backoff = std::cmp::min(backoff * 2, policy.max_backoff);
                attempt += 1;
            }
            Err(e) => return Err(e.context(format!("{} failed after {} attempts", what, attempt))),
        }
    }
}
