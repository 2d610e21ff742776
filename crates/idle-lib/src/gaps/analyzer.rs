//! Gap and span idle computation over ordered query events

use crate::error::{percentage, Result};
use crate::models::{AnalysisWindow, QueryEvent, QueryStatus};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

fn seconds(d: Duration) -> f64 {
    d.num_milliseconds() as f64 / 1000.0
}

/// Which definition of idle time a figure uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdleMethod {
    GapBased,
    SpanBased,
}

impl fmt::Display for IdleMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdleMethod::GapBased => write!(f, "gap-based"),
            IdleMethod::SpanBased => write!(f, "span-based (conservative)"),
        }
    }
}

/// Idle time under one labelled method
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdleEstimate {
    pub method: IdleMethod,
    pub idle_seconds: f64,
    pub window_seconds: f64,
    /// Clamped to `[0, 100]`
    pub idle_percentage: f64,
}

impl IdleEstimate {
    fn new(method: IdleMethod, idle_seconds: f64, window_seconds: f64) -> Result<Self> {
        let idle_seconds = idle_seconds.clamp(0.0, window_seconds);
        let idle_percentage = percentage(idle_seconds, window_seconds, "query window length")?
            .clamp(0.0, 100.0);
        Ok(Self {
            method,
            idle_seconds,
            window_seconds,
            idle_percentage,
        })
    }

    pub fn active_fraction(&self) -> f64 {
        1.0 - self.idle_percentage / 100.0
    }
}

/// Status tallies over the queries inside the window
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryCounts {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub aborted: usize,
    pub other: usize,
}

impl QueryCounts {
    pub fn tally<'a>(events: impl IntoIterator<Item = &'a QueryEvent>) -> Self {
        let mut counts = Self::default();
        for event in events {
            counts.total += 1;
            match event.status {
                QueryStatus::Success => counts.successful += 1,
                QueryStatus::Failed => counts.failed += 1,
                QueryStatus::Aborted => counts.aborted += 1,
                QueryStatus::Other(_) => counts.other += 1,
            }
        }
        counts
    }
}

/// One query with the idle gap that follows it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryGap {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// `max(0, next.start - busy_until)`, where `busy_until` is the latest end
    /// of this or any earlier query; 0 for the last query
    pub gap_to_next_seconds: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sufficiency {
    Sufficient,
    /// No query started inside the window; idle defaults to 100%
    NoEvents,
}

/// Result of the query-level method
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryGapReport {
    pub window: AnalysisWindow,
    pub counts: QueryCounts,
    pub sufficiency: Sufficiency,
    pub gap_based: IdleEstimate,
    pub span_based: IdleEstimate,
    pub time_before_first_seconds: f64,
    pub time_after_last_seconds: f64,
    pub sum_of_gaps_seconds: f64,
    /// Sum of individual query durations (overlaps counted twice)
    pub busy_seconds: f64,
    pub total_queue_seconds: f64,
    pub gaps: Vec<QueryGap>,
}

/// Computes idle time from discrete query events
#[derive(Debug, Clone, Default)]
pub struct QueryGapAnalyzer {
    /// Keep per-query gap rows in the report
    keep_gaps: bool,
}

impl QueryGapAnalyzer {
    pub fn new() -> Self {
        Self { keep_gaps: false }
    }

    pub fn with_gap_rows(mut self, keep: bool) -> Self {
        self.keep_gaps = keep;
        self
    }

    /// Restrict to queries starting inside the window, ordered by start time
    fn in_window(events: &[QueryEvent], window: &AnalysisWindow) -> Vec<QueryEvent> {
        let mut selected: Vec<QueryEvent> = events
            .iter()
            .filter(|e| window.contains(e.start_time))
            .cloned()
            .collect();
        // stable: ties keep arrival order
        selected.sort_by_key(|e| e.start_time);
        selected
    }

    pub fn analyze(&self, events: &[QueryEvent], window: &AnalysisWindow) -> Result<QueryGapReport> {
        let events = Self::in_window(events, window);
        let window_seconds = window.total_seconds();
        let counts = QueryCounts::tally(&events);
        let total_queue_seconds = events.iter().map(|e| e.queue_seconds.max(0.0)).sum();

        let first = match events.first() {
            Some(first) => first,
            None => {
                return Ok(QueryGapReport {
                    window: *window,
                    counts,
                    sufficiency: Sufficiency::NoEvents,
                    gap_based: IdleEstimate::new(IdleMethod::GapBased, window_seconds, window_seconds)?,
                    span_based: IdleEstimate::new(IdleMethod::SpanBased, window_seconds, window_seconds)?,
                    time_before_first_seconds: 0.0,
                    time_after_last_seconds: window_seconds,
                    sum_of_gaps_seconds: 0.0,
                    busy_seconds: 0.0,
                    total_queue_seconds,
                    gaps: Vec::new(),
                })
            }
        };

        // Nested queries keep the cluster busy until the latest end seen so far
        let mut gaps = Vec::with_capacity(events.len());
        let mut sum_of_gaps_seconds = 0.0;
        let mut busy_until = first.effective_end();
        for (i, event) in events.iter().enumerate() {
            busy_until = busy_until.max(event.effective_end());
            let gap = events
                .get(i + 1)
                .map(|next| seconds(next.start_time - busy_until).max(0.0))
                .unwrap_or(0.0);
            sum_of_gaps_seconds += gap;
            if self.keep_gaps {
                gaps.push(QueryGap {
                    start_time: event.start_time,
                    end_time: event.effective_end(),
                    gap_to_next_seconds: gap,
                });
            }
        }

        let time_before_first_seconds = seconds(first.start_time - window.start).max(0.0);
        let time_after_last_seconds = seconds(window.end - busy_until).max(0.0);
        let busy_seconds = events
            .iter()
            .map(|e| seconds(e.effective_end() - e.start_time))
            .sum();

        let gap_idle = sum_of_gaps_seconds + time_before_first_seconds + time_after_last_seconds;
        let gap_based = IdleEstimate::new(IdleMethod::GapBased, gap_idle, window_seconds)?;

        let span = seconds(busy_until - first.start_time).max(0.0);
        let span_based = IdleEstimate::new(IdleMethod::SpanBased, window_seconds - span, window_seconds)?;

        Ok(QueryGapReport {
            window: *window,
            counts,
            sufficiency: Sufficiency::Sufficient,
            gap_based,
            span_based,
            time_before_first_seconds,
            time_after_last_seconds,
            sum_of_gaps_seconds,
            busy_seconds,
            total_queue_seconds,
            gaps,
        })
    }
}
