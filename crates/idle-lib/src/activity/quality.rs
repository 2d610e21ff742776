//! Data quality checks for retrieved metric streams

use super::MetricStreams;
use crate::models::AnalysisWindow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

/// Streams with fewer points than this are reported as sparse
pub const SPARSE_METRIC_POINTS: usize = 10;

/// Completeness below this ratio triggers an advisory note
pub const LOW_COMPLETENESS_RATIO: f64 = 0.8;

/// Data quality report over the raw streams
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataQuality {
    pub points_per_metric: BTreeMap<String, usize>,
    pub total_points: usize,
    /// Distinct sampled timestamps inside the window
    pub present_timestamps: usize,
    pub expected_timestamps: usize,
    /// `present_timestamps / expected_timestamps`, in `[0, 1]`
    pub completeness: f64,
    pub missing_metrics: Vec<String>,
    pub sparse_metrics: Vec<String>,
    pub is_sufficient: bool,
}

impl DataQuality {
    /// Assess streams for `expected_metrics` over `window`
    ///
    /// `align` maps raw timestamps onto the sampling grid so that
    /// completeness counts the same buckets the classifier would.
    pub fn assess<F>(
        streams: &MetricStreams,
        expected_metrics: &[&str],
        window: &AnalysisWindow,
        expected_timestamps: usize,
        align: F,
    ) -> Self
    where
        F: Fn(DateTime<Utc>) -> DateTime<Utc>,
    {
        let mut names: BTreeSet<&str> = expected_metrics.iter().copied().collect();
        names.extend(streams.keys().map(String::as_str));

        let mut points_per_metric = BTreeMap::new();
        let mut missing_metrics = Vec::new();
        let mut sparse_metrics = Vec::new();
        let mut timestamps = BTreeSet::new();

        for name in &names {
            let in_window: Vec<_> = streams
                .get(*name)
                .map(|samples| {
                    samples
                        .iter()
                        .filter(|s| window.contains(s.timestamp))
                        .collect()
                })
                .unwrap_or_default();

            let count = in_window.len();
            timestamps.extend(in_window.iter().map(|s| align(s.timestamp)));
            points_per_metric.insert(name.to_string(), count);

            if count == 0 {
                missing_metrics.push(name.to_string());
            } else if count < SPARSE_METRIC_POINTS {
                sparse_metrics.push(name.to_string());
            }
        }

        let total_points = points_per_metric.values().sum();
        let present_timestamps = timestamps.len();
        let completeness = if expected_timestamps == 0 {
            0.0
        } else {
            (present_timestamps as f64 / expected_timestamps as f64).min(1.0)
        };

        let is_sufficient = total_points > 0 && missing_metrics.len() < names.len();

        if !missing_metrics.is_empty() {
            warn!(missing = ?missing_metrics, "Metric streams without any samples");
        }

        Self {
            points_per_metric,
            total_points,
            present_timestamps,
            expected_timestamps,
            completeness,
            missing_metrics,
            sparse_metrics,
            is_sufficient,
        }
    }

    pub fn is_low_completeness(&self) -> bool {
        self.completeness < LOW_COMPLETENESS_RATIO
    }
}
