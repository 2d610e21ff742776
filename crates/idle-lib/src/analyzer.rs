//! Report assembly for a single cluster
//!
//! [`ClusterAnalyzer`] runs the activity classifier, the query-gap analyzer
//! and the cost model over one set of inputs and collects the results, with
//! their provenance and any advisory notes, into an [`AnalysisReport`].

use crate::activity::{ActivitySummary, DataQuality, MetricStreams};
use crate::config::AnalyzerConfig;
use crate::cost::{CostBreakdown, CostInputs};
use crate::error::{AnalysisError, Result};
use crate::gaps::{QueryGapAnalyzer, QueryGapReport, Sufficiency};
use crate::models::{AnalysisWindow, ClusterInfo, PriceSource, QueryEvent};
use crate::observability::AnalysisLogger;
use crate::pricing::{PriceProvider, PriceResolver, REFERENCE_NODE_TYPE};
use crate::source::{collect_streams, MetricSource, QueryLogSource};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A figure that is either computed or explicitly unavailable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Estimate<T> {
    Computed(T),
    InsufficientData { reason: String },
}

impl<T> Estimate<T> {
    /// Turn `InsufficientData` errors into the explicit state; other errors propagate
    pub fn from_result(result: Result<T>) -> Result<Self> {
        match result {
            Ok(value) => Ok(Estimate::Computed(value)),
            Err(AnalysisError::InsufficientData(reason)) => Ok(Estimate::InsufficientData { reason }),
            Err(e) => Err(e),
        }
    }

    pub fn computed(&self) -> Option<&T> {
        match self {
            Estimate::Computed(value) => Some(value),
            Estimate::InsufficientData { .. } => None,
        }
    }

    pub fn is_computed(&self) -> bool {
        matches!(self, Estimate::Computed(_))
    }
}

/// Which activity figure fed the cost model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityBasis {
    IoMetrics,
    QueryGaps,
    /// No usable activity figure; no cost estimate was made
    None,
}

impl fmt::Display for ActivityBasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActivityBasis::IoMetrics => write!(f, "io metrics"),
            ActivityBasis::QueryGaps => write!(f, "query gaps"),
            ActivityBasis::None => write!(f, "none"),
        }
    }
}

/// Everything one analysis run consumes
#[derive(Debug, Clone)]
pub struct AnalysisInputs {
    pub cluster: ClusterInfo,
    pub region: String,
    pub window: AnalysisWindow,
    pub streams: MetricStreams,
    /// Query history, when it was retrieved
    pub queries: Option<Vec<QueryEvent>>,
}

/// Final analysis result for one cluster
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub cluster: ClusterInfo,
    pub region: String,
    pub window: AnalysisWindow,
    pub data_quality: DataQuality,
    pub activity: Estimate<ActivitySummary>,
    pub queries: Option<QueryGapReport>,
    pub cost: Option<CostBreakdown>,
    pub activity_basis: ActivityBasis,
    pub notes: Vec<String>,
    pub generated_at: DateTime<Utc>,
}

/// Runs the full analysis pipeline
#[derive(Debug, Clone, Default)]
pub struct ClusterAnalyzer {
    config: AnalyzerConfig,
}

impl ClusterAnalyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Pull metric streams (and optionally query history) from collaborators
    pub async fn gather(
        &self,
        cluster: ClusterInfo,
        region: impl Into<String>,
        window: AnalysisWindow,
        metrics: &dyn MetricSource,
        queries: Option<&dyn QueryLogSource>,
    ) -> anyhow::Result<AnalysisInputs> {
        let names = self.config.metric_names();
        let streams = collect_streams(
            metrics,
            &names,
            &window,
            self.config.sampling_period_secs,
            &self.config.retry.policy(),
        )
        .await?;

        let queries = match queries {
            Some(source) => Some(source.fetch_queries(&window).await?),
            None => None,
        };

        Ok(AnalysisInputs {
            cluster,
            region: region.into(),
            window,
            streams,
            queries,
        })
    }

    pub async fn run(&self, inputs: AnalysisInputs, provider: &dyn PriceProvider) -> Result<AnalysisReport> {
        let AnalysisInputs {
            cluster,
            region,
            window,
            streams,
            queries,
        } = inputs;

        let logger = AnalysisLogger::new(cluster.cluster_id.clone());
        logger.log_analysis_start(&window, streams.len(), queries.as_ref().map_or(0, Vec::len));

        let mut notes = Vec::new();
        let classifier = self.config.classifier();
        let metric_names = self.config.metric_names();

        let data_quality = DataQuality::assess(
            &streams,
            &metric_names,
            &window,
            classifier.expected_buckets(&window),
            |ts| classifier.align(ts),
        );
        if !data_quality.missing_metrics.is_empty() {
            notes.push(format!(
                "No samples for: {}",
                data_quality.missing_metrics.join(", ")
            ));
        }
        if !data_quality.sparse_metrics.is_empty() {
            notes.push(format!(
                "Sparse metrics (fewer than 10 samples): {}",
                data_quality.sparse_metrics.join(", ")
            ));
        }

        let activity = Estimate::from_result(classifier.analyze(&streams, &window))?;
        match &activity {
            Estimate::Computed(summary) => {
                logger.log_activity_summary(summary);
                if data_quality.is_low_completeness() {
                    notes.push(format!(
                        "Data completeness is {:.1}%; idle figures may be skewed",
                        data_quality.completeness * 100.0
                    ));
                }
            }
            Estimate::InsufficientData { reason } => {
                logger.log_insufficient_data("activity", reason);
                notes.push(format!("Idle percentage unavailable: {}", reason));
            }
        }

        let query_report = match queries {
            Some(events) => {
                let report = QueryGapAnalyzer::new()
                    .with_gap_rows(self.config.include_gap_rows)
                    .analyze(&events, &window)?;
                logger.log_query_gaps(&report);
                if report.sufficiency == Sufficiency::NoEvents {
                    notes.push("Query history has no queries in the window".to_string());
                }
                Some(report)
            }
            None => None,
        };

        let (activity_basis, active_fraction) = match (&activity, &query_report) {
            (Estimate::Computed(summary), _) => (ActivityBasis::IoMetrics, Some(summary.active_fraction())),
            (_, Some(report)) if report.sufficiency == Sufficiency::Sufficient => {
                notes.push("Cost estimate uses query-gap activity".to_string());
                (ActivityBasis::QueryGaps, Some(report.gap_based.active_fraction()))
            }
            _ => (ActivityBasis::None, None),
        };

        let cost = match active_fraction {
            Some(fraction) => {
                let breakdown = self
                    .estimate_cost(&cluster, &region, fraction, provider, &logger, &mut notes)
                    .await;
                logger.log_cost_estimate(&breakdown);
                Some(breakdown)
            }
            None => {
                notes.push("No cost estimate: no usable activity data".to_string());
                None
            }
        };

        Ok(AnalysisReport {
            cluster,
            region,
            window,
            data_quality,
            activity,
            queries: query_report,
            cost,
            activity_basis,
            notes,
            generated_at: Utc::now(),
        })
    }

    async fn estimate_cost(
        &self,
        cluster: &ClusterInfo,
        region: &str,
        active_fraction: f64,
        provider: &dyn PriceProvider,
        logger: &AnalysisLogger,
        notes: &mut Vec<String>,
    ) -> CostBreakdown {
        let resolver = PriceResolver::new(self.config.prices.clone(), logger.clone());
        let node_hourly_rate = resolver.node_price(provider, &cluster.node_type, region).await;
        let rpu_hourly_rate = resolver.rpu_price(provider, region).await;

        if self.config.rpu.equivalent_for(&cluster.node_type).is_none() {
            notes.push(format!(
                "Unknown node type {}; RPU sizing assumes {} ra3.xlplus equivalent per node",
                cluster.node_type, self.config.rpu.unknown_equivalent
            ));
        }
        let priced_by_table = self.config.prices.knows_node_type(&cluster.node_type, region);
        if node_hourly_rate.source != PriceSource::Api && !priced_by_table {
            notes.push(format!(
                "No fallback price for {} in {}; priced as {}",
                cluster.node_type, region, REFERENCE_NODE_TYPE
            ));
        }
        for (kind, price) in [("Node", &node_hourly_rate), ("RPU", &rpu_hourly_rate)] {
            if price.source != PriceSource::Api {
                notes.push(format!(
                    "{} price {} {} is {} (not from the Pricing API)",
                    kind, price.value, price.currency, price.source
                ));
            }
        }

        let inputs = CostInputs {
            node_count: cluster.number_of_nodes,
            rpu_count: self
                .config
                .rpu
                .required_rpu(&cluster.node_type, cluster.number_of_nodes),
            node_hourly_rate,
            rpu_hourly_rate,
        };
        let breakdown = self.config.estimator().estimate(active_fraction, &inputs);
        if breakdown.has_currency_mismatch() {
            notes.push(format!(
                "Node price is in {} but RPU price is in {}; savings are not comparable",
                breakdown.node_hourly_rate.currency, breakdown.rpu_hourly_rate.currency
            ));
        }
        breakdown
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost::Recommendation;
    use crate::pricing::NoLivePricing;
    use crate::simulate::{evenly_spaced_queries, ActivityPattern, SyntheticMetrics};
    use crate::source::{CloudWatchExport, QueryLogExport};
    use chrono::{Duration, TimeZone};

    fn week() -> AnalysisWindow {
        AnalysisWindow::trailing(Utc.with_ymd_and_hms(2024, 3, 11, 0, 0, 0).unwrap(), 7).unwrap()
    }

    fn inputs(streams: MetricStreams, queries: Option<Vec<QueryEvent>>) -> AnalysisInputs {
        AnalysisInputs {
            cluster: ClusterInfo::new("analytics", "ra3.xlplus", 2),
            region: "us-east-1".to_string(),
            window: week(),
            streams,
            queries,
        }
    }

    #[tokio::test]
    async fn test_business_hours_report() {
        let streams = SyntheticMetrics::new(ActivityPattern::BusinessHours {
            start_hour: 9,
            end_hour: 17,
            weekdays_only: false,
        })
        .generate(&week());

        let report = ClusterAnalyzer::default()
            .run(inputs(streams, None), &NoLivePricing)
            .await
            .unwrap();

        assert_eq!(report.activity_basis, ActivityBasis::IoMetrics);
        let summary = report.activity.computed().unwrap();
        assert!((summary.idle_percentage - 200.0 / 3.0).abs() < 1e-6);

        let cost = report.cost.unwrap();
        assert_eq!(cost.rpu_count, 8);
        assert!((cost.current_monthly_cost - 1.086 * 2.0 * 730.0).abs() < 1e-6);
        assert!((cost.serverless_monthly_cost - 730.0 / 3.0 * 0.375 * 8.0).abs() < 1e-6);
        assert_eq!(cost.recommendation, Recommendation::StronglyRecommend);
        assert!(report.notes.iter().any(|n| n.contains("hardcoded")));
        assert!(report.data_quality.is_sufficient);
    }

    #[tokio::test]
    async fn test_falls_back_to_query_gaps() {
        let window = week();
        let queries = evenly_spaced_queries(window.start, Duration::hours(1), Duration::minutes(6), 168);

        let report = ClusterAnalyzer::default()
            .run(inputs(MetricStreams::new(), Some(queries)), &NoLivePricing)
            .await
            .unwrap();

        assert!(!report.activity.is_computed());
        assert_eq!(report.activity_basis, ActivityBasis::QueryGaps);
        let gaps = report.queries.as_ref().unwrap();
        assert!((gaps.gap_based.idle_percentage - 90.0).abs() < 1e-6);
        let cost = report.cost.unwrap();
        assert!((cost.active_fraction - 0.1).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_no_usable_data() {
        let report = ClusterAnalyzer::default()
            .run(inputs(MetricStreams::new(), Some(Vec::new())), &NoLivePricing)
            .await
            .unwrap();

        assert!(matches!(report.activity, Estimate::InsufficientData { .. }));
        assert_eq!(report.activity_basis, ActivityBasis::None);
        assert!(report.cost.is_none());
        assert_eq!(report.queries.unwrap().sufficiency, Sufficiency::NoEvents);
        assert!(!report.data_quality.is_sufficient);
    }

    #[tokio::test]
    async fn test_china_region_and_unknown_node() {
        let streams = SyntheticMetrics::new(ActivityPattern::Constant { active_fraction: 0.5 }).generate(&week());
        let mut inputs = inputs(streams, None);
        inputs.region = "cn-north-1".to_string();
        inputs.cluster = ClusterInfo::new("legacy", "ds2.xlarge", 4);

        let report = ClusterAnalyzer::default().run(inputs, &NoLivePricing).await.unwrap();
        let cost = report.cost.unwrap();
        assert_eq!(cost.node_hourly_rate.source, PriceSource::Default);
        assert_eq!(cost.currency, "CNY");
        assert_eq!(cost.rpu_count, 8);
        assert!(report.notes.iter().any(|n| n.contains("Unknown node type ds2.xlarge")));
        assert!(report
            .notes
            .iter()
            .any(|n| n.contains("No fallback price for ds2.xlarge in cn-north-1; priced as ra3.xlplus")));
    }

    #[tokio::test]
    async fn test_known_node_type_has_no_price_note() {
        let streams = SyntheticMetrics::new(ActivityPattern::Constant { active_fraction: 0.5 }).generate(&week());
        let report = ClusterAnalyzer::default()
            .run(inputs(streams, None), &NoLivePricing)
            .await
            .unwrap();
        assert!(report.cost.is_some());
        assert!(!report.notes.iter().any(|n| n.contains("No fallback price")));
    }

    #[tokio::test]
    async fn test_low_completeness_note() {
        let streams = SyntheticMetrics::new(ActivityPattern::Always)
            .with_missing_every(2)
            .generate(&week());
        let report = ClusterAnalyzer::default()
            .run(inputs(streams, None), &NoLivePricing)
            .await
            .unwrap();
        assert!(report.notes.iter().any(|n| n.contains("Data completeness is 50.0%")));
    }

    #[tokio::test]
    async fn test_gather_from_exports() {
        let window = week();
        let generated = SyntheticMetrics::new(ActivityPattern::Idle).generate(&window);
        let mut export = CloudWatchExport::default();
        for (name, samples) in generated {
            export.insert(name, samples);
        }
        let log = QueryLogExport::new(evenly_spaced_queries(
            window.start,
            Duration::hours(12),
            Duration::seconds(30),
            14,
        ));

        let analyzer = ClusterAnalyzer::default();
        let gathered = analyzer
            .gather(ClusterInfo::new("c", "dc2.large", 1), "eu-west-1", window, &export, Some(&log))
            .await
            .unwrap();
        assert_eq!(gathered.streams.len(), 3);
        assert_eq!(gathered.queries.as_ref().map(Vec::len), Some(14));

        let report = analyzer.run(gathered, &NoLivePricing).await.unwrap();
        assert_eq!(report.activity.computed().unwrap().idle_percentage, 100.0);
        assert_eq!(report.cost.unwrap().recommendation, Recommendation::StronglyRecommend);
    }

    #[test]
    fn test_estimate_serializes_with_status() {
        let estimate: Estimate<ActivitySummary> = Estimate::InsufficientData {
            reason: "no buckets".to_string(),
        };
        let json = serde_json::to_value(&estimate).unwrap();
        assert_eq!(json["status"], "insufficient_data");
        assert_eq!(json["reason"], "no buckets");
    }
}
