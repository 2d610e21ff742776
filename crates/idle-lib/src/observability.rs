//! Structured logging for analysis runs
//!
//! Events carry a stable `event` field so JSON log output can be filtered
//! per stage of the pipeline.

use crate::activity::ActivitySummary;
use crate::cost::CostBreakdown;
use crate::gaps::QueryGapReport;
use crate::models::{AnalysisWindow, Priced};
use crate::pricing::pricing_endpoint_region;
use tracing::{info, warn};

/// Structured logger for analysis events
#[derive(Debug, Clone)]
pub struct AnalysisLogger {
    cluster_id: String,
}

impl AnalysisLogger {
    pub fn new(cluster_id: impl Into<String>) -> Self {
        Self {
            cluster_id: cluster_id.into(),
        }
    }

    pub fn cluster_id(&self) -> &str {
        &self.cluster_id
    }

    pub fn log_analysis_start(&self, window: &AnalysisWindow, metric_streams: usize, query_events: usize) {
        info!(
            event = "analysis_started",
            cluster = %self.cluster_id,
            window_start = %window.start,
            window_end = %window.end,
            metric_streams = metric_streams,
            query_events = query_events,
            "Starting idle analysis"
        );
    }

    pub fn log_activity_summary(&self, summary: &ActivitySummary) {
        info!(
            event = "activity_classified",
            cluster = %self.cluster_id,
            total_buckets = summary.total_buckets,
            active_buckets = summary.active_buckets,
            idle_percentage = summary.idle_percentage,
            data_completeness = summary.data_completeness,
            "Classified metric buckets"
        );
    }

    pub fn log_insufficient_data(&self, stage: &str, reason: &str) {
        warn!(
            event = "insufficient_data",
            cluster = %self.cluster_id,
            stage = %stage,
            reason = %reason,
            "Idle percentage cannot be computed"
        );
    }

    pub fn log_query_gaps(&self, report: &QueryGapReport) {
        info!(
            event = "query_gaps_computed",
            cluster = %self.cluster_id,
            total_queries = report.counts.total,
            gap_idle_percentage = report.gap_based.idle_percentage,
            span_idle_percentage = report.span_based.idle_percentage,
            "Computed query gap idle time"
        );
    }

    pub fn log_cost_estimate(&self, cost: &CostBreakdown) {
        info!(
            event = "cost_estimated",
            cluster = %self.cluster_id,
            current_monthly_cost = cost.current_monthly_cost,
            serverless_monthly_cost = cost.serverless_monthly_cost,
            savings_percentage = ?cost.savings_percentage,
            required_rpu = cost.rpu_count,
            node_price_source = %cost.node_hourly_rate.source,
            rpu_price_source = %cost.rpu_hourly_rate.source,
            "Estimated Serverless cost"
        );
    }

    pub fn log_price_fallback(
        &self,
        kind: &str,
        region: &str,
        node_type: Option<&str>,
        fallback: &Priced,
        reason: &str,
    ) {
        warn!(
            event = "price_fallback",
            cluster = %self.cluster_id,
            kind = %kind,
            region = %region,
            pricing_endpoint = %pricing_endpoint_region(region),
            node_type = ?node_type,
            price = fallback.value,
            currency = %fallback.currency,
            source = %fallback.source,
            reason = %reason,
            "Live price unavailable, using fallback table"
        );
    }
}
