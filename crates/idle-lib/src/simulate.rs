//! Deterministic synthetic workloads
//!
//! Generates per-minute metric streams and query schedules with known
//! activity so the analysis can be exercised without a live cluster.

use crate::activity::{MetricStreams, DEFAULT_PERIOD_SECS};
use crate::models::{
    AnalysisWindow, MetricSample, QueryEvent, QueryStatus, DATABASE_CONNECTIONS, READ_IOPS,
    WRITE_IOPS,
};
use chrono::{DateTime, Datelike, Duration, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// Shape of simulated activity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "pattern", rename_all = "snake_case")]
pub enum ActivityPattern {
    /// Active every day between `start_hour` and `end_hour` (UTC)
    BusinessHours {
        start_hour: u32,
        end_hour: u32,
        weekdays_only: bool,
    },
    /// The leading `active_fraction` of the window is active
    Constant { active_fraction: f64 },
    Idle,
    Always,
}

/// Builder for synthetic CloudWatch streams
#[derive(Debug, Clone)]
pub struct SyntheticMetrics {
    pattern: ActivityPattern,
    period_secs: i64,
    /// Drop every n-th grid point from all streams
    missing_every: Option<usize>,
}

impl SyntheticMetrics {
    pub fn new(pattern: ActivityPattern) -> Self {
        Self {
            pattern,
            period_secs: DEFAULT_PERIOD_SECS,
            missing_every: None,
        }
    }

    pub fn with_period(mut self, period_secs: i64) -> Self {
        self.period_secs = period_secs.max(1);
        self
    }

    pub fn with_missing_every(mut self, n: usize) -> Self {
        self.missing_every = if n > 0 { Some(n) } else { None };
        self
    }

    fn is_active(&self, index: usize, total: usize, ts: DateTime<Utc>) -> bool {
        match self.pattern {
            ActivityPattern::BusinessHours {
                start_hour,
                end_hour,
                weekdays_only,
            } => {
                let weekday_ok = !weekdays_only || ts.weekday().num_days_from_monday() < 5;
                weekday_ok && ts.hour() >= start_hour && ts.hour() < end_hour
            }
            ActivityPattern::Constant { active_fraction } => {
                let active_points = (total as f64 * active_fraction.clamp(0.0, 1.0)).floor() as usize;
                index < active_points
            }
            ActivityPattern::Idle => false,
            ActivityPattern::Always => true,
        }
    }

    /// Generate ReadIOPS, WriteIOPS and DatabaseConnections streams
    pub fn generate(&self, window: &AnalysisWindow) -> MetricStreams {
        let step = Duration::seconds(self.period_secs);
        let total = (window.total_seconds() / self.period_secs as f64).ceil() as usize;

        let mut read = Vec::with_capacity(total);
        let mut write = Vec::with_capacity(total);
        let mut conns = Vec::with_capacity(total);

        let mut ts = window.start;
        let mut index = 0usize;
        while ts < window.end {
            let skipped = self.missing_every.map(|n| index % n == n - 1).unwrap_or(false);
            if !skipped {
                let (r, w, c) = if self.is_active(index, total, ts) {
                    (
                        10.0 + (index % 90) as f64,
                        5.0 + (index % 45) as f64,
                        1.0 + (index % 20) as f64,
                    )
                } else {
                    (0.0, 0.0, 0.0)
                };
                read.push(MetricSample::new(ts, READ_IOPS, r));
                write.push(MetricSample::new(ts, WRITE_IOPS, w));
                conns.push(MetricSample::new(ts, DATABASE_CONNECTIONS, c));
            }
            ts += step;
            index += 1;
        }

        let mut streams = MetricStreams::new();
        streams.insert(READ_IOPS.to_string(), read);
        streams.insert(WRITE_IOPS.to_string(), write);
        streams.insert(DATABASE_CONNECTIONS.to_string(), conns);
        streams
    }
}

/// `count` successful queries of `duration`, one every `interval`
pub fn evenly_spaced_queries(
    first_start: DateTime<Utc>,
    interval: Duration,
    duration: Duration,
    count: usize,
) -> Vec<QueryEvent> {
    (0..count)
        .map(|i| {
            let start = first_start + interval * i as i32;
            QueryEvent::new(start, start + duration, QueryStatus::Success)
        })
        .collect()
}
