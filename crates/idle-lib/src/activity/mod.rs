//! IO-level activity classification
//!
//! This module provides:
//! - Per-metric threshold tables (logical OR across metrics)
//! - Bucketing of aligned per-minute samples into active/idle minutes
//! - Idle/active percentages with a per-metric breakdown
//! - Data quality checks (missing and sparse metric streams)

mod classifier;
mod quality;

pub use classifier::{
    ActivityClassifier, ActivitySummary, MetricActivity, MetricThreshold, ThresholdTable,
    DEFAULT_PERIOD_SECS,
};
pub use quality::{DataQuality, LOW_COMPLETENESS_RATIO, SPARSE_METRIC_POINTS};

use crate::models::MetricSample;
use std::collections::BTreeMap;

/// Samples keyed by metric name, each stream ordered by timestamp
pub type MetricStreams = BTreeMap<String, Vec<MetricSample>>;
