//! Full cluster analysis from exported AWS data

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use colored::Colorize;
use idle_lib::source::{load_cluster_info, CloudWatchExport, QueryLogExport, QueryLogSource};
use idle_lib::validation::{validate_inputs, validate_node_count};
use idle_lib::{AnalysisReport, AnalysisWindow, AnalyzerConfig, ClusterAnalyzer, ClusterInfo, Estimate};
use std::path::PathBuf;
use tabled::Tabled;
use tracing::info;

use super::cost::print_cost_breakdown;
use super::queries::print_query_gaps;
use super::{price_provider, window_end_after};
use crate::output::{
    color_idle, format_percentage, print_heading, print_info, print_json, print_subheading, print_table,
    print_warning, OutputFormat,
};

/// Node type assumed when neither a cluster description nor `--node-type` is given
const DEFAULT_NODE_TYPE: &str = "ra3.xlplus";

/// Arguments of `rsidle analyze`
pub struct AnalyzeRequest {
    pub cluster_id: String,
    pub region: String,
    pub days: u32,
    pub metrics: Vec<PathBuf>,
    pub queries: Option<PathBuf>,
    pub cluster_file: Option<PathBuf>,
    pub node_type: Option<String>,
    pub nodes: Option<u32>,
    pub price_lists: Vec<PathBuf>,
    pub end: Option<DateTime<Utc>>,
}

#[derive(Tabled)]
struct MetricRow {
    #[tabled(rename = "Metric")]
    metric: String,
    #[tabled(rename = "Samples")]
    samples: usize,
    #[tabled(rename = "Active buckets")]
    active: usize,
    #[tabled(rename = "Active ratio")]
    ratio: String,
}

pub async fn analyze_cluster(config: AnalyzerConfig, request: AnalyzeRequest, format: OutputFormat) -> Result<()> {
    validate_inputs(&request.cluster_id, &request.region, request.days)?;
    let cluster_id = request.cluster_id.trim().to_string();

    let mut cluster = match &request.cluster_file {
        Some(path) => load_cluster_info(path, Some(&cluster_id)).await?,
        None => ClusterInfo::new(
            cluster_id.clone(),
            request.node_type.clone().unwrap_or_else(|| DEFAULT_NODE_TYPE.to_string()),
            request.nodes.unwrap_or(1),
        ),
    };
    if let Some(node_type) = request.node_type {
        cluster.node_type = node_type;
    }
    if let Some(nodes) = request.nodes {
        cluster.number_of_nodes = nodes;
    }
    validate_node_count(cluster.number_of_nodes)?;

    let metrics = CloudWatchExport::from_files(&request.metrics).await?;
    let queries = match &request.queries {
        Some(path) => Some(QueryLogExport::from_file(path).await?),
        None => None,
    };

    let end = request
        .end
        .or_else(|| {
            metrics
                .latest_timestamp()
                .map(|ts| window_end_after(ts, config.sampling_period_secs))
        })
        .unwrap_or_else(Utc::now);
    let window = AnalysisWindow::trailing(end, request.days).context("Invalid analysis window")?;
    info!(cluster = %cluster.cluster_id, start = %window.start, end = %window.end, "Analysis window");

    let analyzer = ClusterAnalyzer::new(config);
    let inputs = analyzer
        .gather(
            cluster,
            request.region,
            window,
            &metrics,
            queries.as_ref().map(|q| q as &dyn QueryLogSource),
        )
        .await?;

    let provider = price_provider(&request.price_lists).await?;
    let report = analyzer.run(inputs, provider.as_ref()).await?;

    print_report(&report, format)
}

/// Render a full analysis report
pub fn print_report(report: &AnalysisReport, format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json(report);
    }

    print_heading("Redshift Idle Analysis");
    println!("Cluster:                {}", report.cluster.cluster_id.cyan());
    println!(
        "Nodes:                  {} x {}",
        report.cluster.node_type, report.cluster.number_of_nodes
    );
    println!("Region:                 {}", report.region);
    println!(
        "Window:                 {} .. {}",
        report.window.start.format("%Y-%m-%d %H:%M"),
        report.window.end.format("%Y-%m-%d %H:%M")
    );
    println!();

    print_subheading("IO Activity");
    match &report.activity {
        Estimate::Computed(summary) => {
            println!(
                "{} {} ({} of {} buckets idle)",
                "Idle:".bold(),
                color_idle(summary.idle_percentage),
                summary.idle_buckets,
                summary.total_buckets
            );
            println!(
                "Data completeness:      {}",
                format_percentage(report.data_quality.completeness * 100.0)
            );
            let rows = summary
                .metric_breakdown
                .iter()
                .map(|m| MetricRow {
                    metric: m.metric.clone(),
                    samples: report
                        .data_quality
                        .points_per_metric
                        .get(&m.metric)
                        .copied()
                        .unwrap_or(0),
                    active: m.active_count,
                    ratio: format_percentage(m.active_ratio * 100.0),
                })
                .collect();
            print_table(rows);
        }
        Estimate::InsufficientData { reason } => {
            print_warning(&format!("Insufficient data: {}", reason));
        }
    }
    println!();

    if let Some(queries) = &report.queries {
        print_query_gaps(queries);
        println!();
    }

    if let Some(cost) = &report.cost {
        println!("Activity basis:         {}", report.activity_basis);
        print_cost_breakdown(cost);
    }

    if !report.notes.is_empty() {
        println!();
        print_subheading("Notes");
        for note in &report.notes {
            print_info(note);
        }
    }

    Ok(())
}
