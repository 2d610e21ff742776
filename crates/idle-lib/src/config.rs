//! Analyzer configuration

use crate::activity::{ActivityClassifier, ThresholdTable, DEFAULT_PERIOD_SECS};
use crate::cost::{CostEstimator, CostSettings, RpuSizing};
use crate::pricing::FallbackPriceTable;
use crate::source::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Retry settings for metric retrieval, in config-friendly units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrySettings {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_backoff_ms() -> u64 {
    1_000
}

fn default_max_backoff_ms() -> u64 {
    30_000
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

impl RetrySettings {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts.max(1),
            initial_backoff: Duration::from_millis(self.initial_backoff_ms),
            max_backoff: Duration::from_millis(self.max_backoff_ms.max(self.initial_backoff_ms)),
        }
    }
}

/// Every tunable of an analysis run
///
/// All fields default, so a partial config file only overrides what it
/// names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// CloudWatch statistics period in seconds
    #[serde(default = "default_sampling_period")]
    pub sampling_period_secs: i64,

    /// Per-metric activity thresholds
    #[serde(default)]
    pub thresholds: ThresholdTable,

    #[serde(default)]
    pub cost: CostSettings,

    /// Node type to RPU sizing heuristic
    #[serde(default)]
    pub rpu: RpuSizing,

    /// Prices used when no live price is available
    #[serde(default)]
    pub prices: FallbackPriceTable,

    #[serde(default)]
    pub retry: RetrySettings,

    /// Keep per-query gap rows in the report
    #[serde(default)]
    pub include_gap_rows: bool,
}

fn default_sampling_period() -> i64 {
    DEFAULT_PERIOD_SECS
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            sampling_period_secs: default_sampling_period(),
            thresholds: ThresholdTable::default(),
            cost: CostSettings::default(),
            rpu: RpuSizing::default(),
            prices: FallbackPriceTable::default(),
            retry: RetrySettings::default(),
            include_gap_rows: false,
        }
    }
}

impl AnalyzerConfig {
    pub fn classifier(&self) -> ActivityClassifier {
        ActivityClassifier::new(self.thresholds.clone()).with_period(self.sampling_period_secs)
    }

    pub fn estimator(&self) -> CostEstimator {
        CostEstimator::new(self.cost.clone())
    }

    /// Metrics the run should fetch: every metric with a threshold
    pub fn metric_names(&self) -> Vec<&str> {
        self.thresholds.metrics().collect()
    }
}
