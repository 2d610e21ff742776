//! Analysis over synthetic metrics

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use clap::ValueEnum;
use idle_lib::pricing::NoLivePricing;
use idle_lib::simulate::{evenly_spaced_queries, ActivityPattern, SyntheticMetrics};
use idle_lib::validation::{validate_inputs, validate_node_count};
use idle_lib::{AnalysisInputs, AnalysisWindow, AnalyzerConfig, ClusterAnalyzer, ClusterInfo};

use super::analyze::print_report;
use super::window_end_after;
use crate::output::OutputFormat;

/// Cluster id reported for simulated runs
const SIMULATED_CLUSTER: &str = "simulated";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PatternKind {
    /// Active between --start-hour and --end-hour every day
    BusinessHours,
    /// The leading --active-fraction of the window is active
    Constant,
    Idle,
    Always,
}

/// Arguments of `rsidle simulate`
pub struct SimulateRequest {
    pub pattern: PatternKind,
    pub days: u32,
    pub start_hour: u32,
    pub end_hour: u32,
    pub weekdays_only: bool,
    pub active_fraction: f64,
    pub missing_every: usize,
    /// Emit one short query every this many minutes
    pub query_every_mins: Option<u32>,
    pub node_type: String,
    pub nodes: u32,
    pub region: String,
    pub end: Option<DateTime<Utc>>,
}

impl SimulateRequest {
    fn pattern(&self) -> ActivityPattern {
        match self.pattern {
            PatternKind::BusinessHours => ActivityPattern::BusinessHours {
                start_hour: self.start_hour,
                end_hour: self.end_hour,
                weekdays_only: self.weekdays_only,
            },
            PatternKind::Constant => ActivityPattern::Constant {
                active_fraction: self.active_fraction,
            },
            PatternKind::Idle => ActivityPattern::Idle,
            PatternKind::Always => ActivityPattern::Always,
        }
    }
}

pub async fn run_simulation(config: AnalyzerConfig, request: SimulateRequest, format: OutputFormat) -> Result<()> {
    validate_inputs(SIMULATED_CLUSTER, &request.region, request.days)?;
    validate_node_count(request.nodes)?;

    let period = config.sampling_period_secs;
    let end = request
        .end
        .unwrap_or_else(|| window_end_after(Utc::now(), period) - Duration::seconds(period));
    let window = AnalysisWindow::trailing(end, request.days).context("Invalid analysis window")?;

    let streams = SyntheticMetrics::new(request.pattern())
        .with_period(period)
        .with_missing_every(request.missing_every)
        .generate(&window);

    let queries = request.query_every_mins.filter(|m| *m > 0).map(|every| {
        let interval = Duration::minutes(i64::from(every));
        let count = (window.total_seconds() / interval.num_seconds() as f64).ceil() as usize;
        evenly_spaced_queries(window.start, interval, Duration::seconds(5), count)
    });

    let inputs = AnalysisInputs {
        cluster: ClusterInfo::new(SIMULATED_CLUSTER, request.node_type, request.nodes),
        region: request.region,
        window,
        streams,
        queries,
    };

    let report = ClusterAnalyzer::new(config).run(inputs, &NoLivePricing).await?;
    print_report(&report, format)
}
