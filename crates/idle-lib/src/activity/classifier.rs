//! Active/idle classification of sampled minutes
//!
//! A minute is active when at least one configured metric strictly exceeds
//! its threshold. Minutes with no sample from any stream are left out of
//! the idle ratio and only lower the data completeness figure.

use super::MetricStreams;
use crate::error::{percentage, AnalysisError, Result};
use crate::models::{
    ActivityBucket, AnalysisWindow, DATABASE_CONNECTIONS, READ_IOPS, WRITE_IOPS,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Default sampling period, matching Serverless per-minute billing
pub const DEFAULT_PERIOD_SECS: i64 = 60;

/// Activity threshold for a single metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricThreshold {
    pub metric: String,
    /// Values strictly above this count as activity
    pub threshold: f64,
}

/// Ordered metric -> threshold table
///
/// Serialized as a plain list; duplicate metrics collapse on load, last wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<MetricThreshold>", into = "Vec<MetricThreshold>")]
pub struct ThresholdTable {
    entries: Vec<MetricThreshold>,
}

impl From<Vec<MetricThreshold>> for ThresholdTable {
    fn from(entries: Vec<MetricThreshold>) -> Self {
        Self::new(entries)
    }
}

impl From<ThresholdTable> for Vec<MetricThreshold> {
    fn from(table: ThresholdTable) -> Self {
        table.entries
    }
}

impl ThresholdTable {
    pub fn new(entries: Vec<MetricThreshold>) -> Self {
        let mut table = Self { entries: Vec::new() };
        for entry in entries {
            table = table.with_threshold(entry.metric, entry.threshold);
        }
        table
    }

    /// Set or replace the threshold for a metric
    pub fn with_threshold(mut self, metric: impl Into<String>, threshold: f64) -> Self {
        let metric = metric.into();
        match self.entries.iter_mut().find(|e| e.metric == metric) {
            Some(existing) => existing.threshold = threshold,
            None => self.entries.push(MetricThreshold { metric, threshold }),
        }
        self
    }

    pub fn threshold_for(&self, metric: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|e| e.metric == metric)
            .map(|e| e.threshold)
    }

    pub fn metrics(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.metric.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether `value` counts as activity for `metric`
    pub fn is_active(&self, metric: &str, value: f64) -> bool {
        match self.threshold_for(metric) {
            Some(threshold) => value.is_finite() && value > threshold,
            None => false,
        }
    }
}

impl Default for ThresholdTable {
    fn default() -> Self {
        // Network throughput is left out: maintenance and monitoring traffic
        // keep it above zero on otherwise idle clusters.
        Self::new(vec![
            MetricThreshold { metric: READ_IOPS.to_string(), threshold: 0.0 },
            MetricThreshold { metric: WRITE_IOPS.to_string(), threshold: 0.0 },
            MetricThreshold { metric: DATABASE_CONNECTIONS.to_string(), threshold: 0.0 },
        ])
    }
}

/// Per-metric diagnostic breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricActivity {
    pub metric: String,
    /// Buckets in which this metric exceeded its threshold
    pub active_count: usize,
    /// `active_count / total_buckets`
    pub active_ratio: f64,
}

/// Aggregate result of the IO-level method
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivitySummary {
    pub total_buckets: usize,
    pub active_buckets: usize,
    pub idle_buckets: usize,
    pub idle_percentage: f64,
    pub active_percentage: f64,
    /// Buckets present / buckets expected for the window, in `[0, 1]`
    pub data_completeness: f64,
    pub metric_breakdown: Vec<MetricActivity>,
    pub first_bucket: DateTime<Utc>,
    pub last_bucket: DateTime<Utc>,
    pub period_secs: i64,
}

impl ActivitySummary {
    /// Active share of observed time in `[0, 1]`
    pub fn active_fraction(&self) -> f64 {
        self.active_percentage / 100.0
    }
}

/// Classifies aligned metric samples into activity buckets
#[derive(Debug, Clone)]
pub struct ActivityClassifier {
    thresholds: ThresholdTable,
    period_secs: i64,
}

impl ActivityClassifier {
    pub fn new(thresholds: ThresholdTable) -> Self {
        Self {
            thresholds,
            period_secs: DEFAULT_PERIOD_SECS,
        }
    }

    /// Set custom sampling period (non-positive values fall back to the default)
    pub fn with_period(mut self, period_secs: i64) -> Self {
        self.period_secs = if period_secs > 0 { period_secs } else { DEFAULT_PERIOD_SECS };
        self
    }

    pub fn thresholds(&self) -> &ThresholdTable {
        &self.thresholds
    }

    pub fn period_secs(&self) -> i64 {
        self.period_secs
    }

    /// Floor a timestamp onto the sampling grid
    pub fn align(&self, ts: DateTime<Utc>) -> DateTime<Utc> {
        let secs = ts.timestamp();
        let aligned = secs - secs.rem_euclid(self.period_secs);
        DateTime::from_timestamp(aligned, 0).unwrap_or(ts)
    }

    /// Number of buckets a fully populated window would contain
    pub fn expected_buckets(&self, window: &AnalysisWindow) -> usize {
        (window.total_seconds() / self.period_secs as f64).ceil() as usize
    }

    /// Build one bucket per grid timestamp present in any stream
    pub fn classify(&self, streams: &MetricStreams, window: &AnalysisWindow) -> Vec<ActivityBucket> {
        let mut grid: BTreeMap<DateTime<Utc>, ActivityBucket> = BTreeMap::new();

        for (metric, samples) in streams {
            for sample in samples.iter().filter(|s| window.contains(s.timestamp)) {
                let ts = self.align(sample.timestamp);
                let bucket = grid.entry(ts).or_insert_with(|| ActivityBucket {
                    timestamp: ts,
                    is_active: false,
                    contributing_metrics: BTreeSet::new(),
                });

                if self.thresholds.is_active(metric, sample.value) {
                    bucket.is_active = true;
                    bucket.contributing_metrics.insert(metric.clone());
                }
            }
        }

        grid.into_values().collect()
    }

    /// Aggregate classified buckets
    ///
    /// # Returns
    /// * `Err(InsufficientData)` when no bucket is present
    pub fn summarize(
        &self,
        buckets: &[ActivityBucket],
        window: &AnalysisWindow,
    ) -> Result<ActivitySummary> {
        let (first, last) = match (buckets.first(), buckets.last()) {
            (Some(first), Some(last)) => (first.timestamp, last.timestamp),
            _ => {
                return Err(AnalysisError::InsufficientData(
                    "no metric samples inside the analysis window".to_string(),
                ))
            }
        };

        let total = buckets.len();
        let active = buckets.iter().filter(|b| b.is_active).count();
        let idle = total - active;

        let idle_percentage = percentage(idle as f64, total as f64, "idle bucket ratio")?;
        let active_percentage = 100.0 - idle_percentage;

        let metric_breakdown = self
            .thresholds
            .metrics()
            .map(|metric| {
                let active_count = buckets
                    .iter()
                    .filter(|b| b.contributing_metrics.contains(metric))
                    .count();
                MetricActivity {
                    metric: metric.to_string(),
                    active_count,
                    active_ratio: active_count as f64 / total as f64,
                }
            })
            .collect();

        let expected = self.expected_buckets(window);
        let data_completeness = if expected == 0 {
            0.0
        } else {
            (total as f64 / expected as f64).min(1.0)
        };

        Ok(ActivitySummary {
            total_buckets: total,
            active_buckets: active,
            idle_buckets: idle,
            idle_percentage,
            active_percentage,
            data_completeness,
            metric_breakdown,
            first_bucket: first,
            last_bucket: last,
            period_secs: self.period_secs,
        })
    }

    /// Classify and summarize in one pass
    pub fn analyze(&self, streams: &MetricStreams, window: &AnalysisWindow) -> Result<ActivitySummary> {
        let buckets = self.classify(streams, window);
        self.summarize(&buckets, window)
    }
}

impl Default for ActivityClassifier {
    fn default() -> Self {
        Self::new(ThresholdTable::default())
    }
}
