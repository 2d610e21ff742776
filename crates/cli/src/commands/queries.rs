//! Query-history idle time

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use colored::Colorize;
use idle_lib::gaps::{QueryGapAnalyzer, QueryGapReport, Sufficiency};
use idle_lib::source::QueryLogExport;
use idle_lib::validation::validate_days;
use idle_lib::{AnalysisWindow, AnalyzerConfig};
use std::path::Path;
use tabled::Tabled;

use super::window_end_after;
use crate::output::{
    color_idle, format_duration, print_heading, print_json, print_subheading, print_table, print_warning,
    OutputFormat,
};

#[derive(Tabled)]
struct GapRow {
    #[tabled(rename = "Start")]
    start: String,
    #[tabled(rename = "End")]
    end: String,
    #[tabled(rename = "Gap to next")]
    gap: String,
}

/// Compute gap-based and span-based idle time from a query history export
pub async fn show_query_idle(
    config: &AnalyzerConfig,
    file: &Path,
    days: u32,
    end: Option<DateTime<Utc>>,
    gap_rows: bool,
    format: OutputFormat,
) -> Result<()> {
    validate_days(days)?;
    let log = QueryLogExport::from_file(file).await?;

    let end = end
        .or_else(|| {
            log.latest_end()
                .map(|ts| window_end_after(ts, config.sampling_period_secs))
        })
        .unwrap_or_else(Utc::now);
    let window = AnalysisWindow::trailing(end, days).context("Invalid analysis window")?;

    let report = QueryGapAnalyzer::new()
        .with_gap_rows(gap_rows || config.include_gap_rows)
        .analyze(log.events(), &window)?;

    match format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Table => {
            print_heading("Query Gap Analysis");
            println!(
                "Window:                 {} .. {}",
                window.start.format("%Y-%m-%d %H:%M"),
                window.end.format("%Y-%m-%d %H:%M")
            );
            println!();
            print_query_gaps(&report);
        }
    }

    Ok(())
}

/// Render a query-gap report
pub fn print_query_gaps(report: &QueryGapReport) {
    let counts = &report.counts;
    print_subheading("Queries");
    println!(
        "Total:                  {} ({} ok, {} failed, {} aborted, {} other)",
        counts.total, counts.successful, counts.failed, counts.aborted, counts.other
    );
    if report.sufficiency == Sufficiency::NoEvents {
        print_warning("No queries started inside the window");
    }
    println!("Busy time:              {}", format_duration(report.busy_seconds));
    println!("Queue time:             {}", format_duration(report.total_queue_seconds));
    println!();

    print_subheading("Idle Time");
    println!(
        "{} {} ({})",
        "Gap-based:".bold(),
        color_idle(report.gap_based.idle_percentage),
        format_duration(report.gap_based.idle_seconds)
    );
    println!("  before first query:   {}", format_duration(report.time_before_first_seconds));
    println!("  between queries:      {}", format_duration(report.sum_of_gaps_seconds));
    println!("  after last query:     {}", format_duration(report.time_after_last_seconds));
    println!(
        "{} {} ({}, ignores gaps between queries)",
        "Span-based:".bold(),
        color_idle(report.span_based.idle_percentage),
        format_duration(report.span_based.idle_seconds)
    );

    if !report.gaps.is_empty() {
        println!();
        print_subheading("Gaps");
        print_table(
            report
                .gaps
                .iter()
                .map(|g| GapRow {
                    start: g.start_time.format("%Y-%m-%d %H:%M:%S").to_string(),
                    end: g.end_time.format("%Y-%m-%d %H:%M:%S").to_string(),
                    gap: format_duration(g.gap_to_next_seconds),
                })
                .collect(),
        );
    }
}
