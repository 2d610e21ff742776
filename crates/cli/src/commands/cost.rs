//! Cost-related CLI commands

use anyhow::{bail, Result};
use colored::Colorize;
use idle_lib::cost::{CostBreakdown, CostInputs};
use idle_lib::pricing::PriceResolver;
use idle_lib::validation::{validate_node_count, validate_region};
use idle_lib::{AnalysisLogger, AnalyzerConfig};
use std::path::PathBuf;
use tabled::Tabled;

use super::price_provider;
use crate::output::{
    color_recommendation, color_source, format_currency, format_percentage, format_rate, print_heading,
    print_json, print_subheading, print_table, print_warning, OutputFormat,
};

/// Arguments of `rsidle cost`
pub struct CostRequest {
    pub node_type: String,
    pub nodes: u32,
    pub region: String,
    pub active_pct: f64,
    pub price_lists: Vec<PathBuf>,
}

#[derive(Tabled)]
struct RateRow {
    #[tabled(rename = "Rate")]
    kind: String,
    #[tabled(rename = "Units")]
    units: String,
    #[tabled(rename = "Hourly")]
    hourly: String,
    #[tabled(rename = "Source")]
    source: String,
}

/// Estimate monthly costs for a given activity level
pub async fn estimate_cost(config: &AnalyzerConfig, request: CostRequest, format: OutputFormat) -> Result<()> {
    validate_region(&request.region)?;
    if !request.active_pct.is_finite() || !(0.0..=100.0).contains(&request.active_pct) {
        bail!("--active-pct must be between 0 and 100, got {}", request.active_pct);
    }
    validate_node_count(request.nodes)?;

    let provider = price_provider(&request.price_lists).await?;
    let resolver = PriceResolver::new(config.prices.clone(), AnalysisLogger::new("cost-estimate"));

    let inputs = CostInputs {
        node_count: request.nodes,
        node_hourly_rate: resolver
            .node_price(provider.as_ref(), &request.node_type, &request.region)
            .await,
        rpu_hourly_rate: resolver.rpu_price(provider.as_ref(), &request.region).await,
        rpu_count: config.rpu.required_rpu(&request.node_type, request.nodes),
    };
    let breakdown = config.estimator().estimate(request.active_pct / 100.0, &inputs);

    match format {
        OutputFormat::Json => print_json(&breakdown)?,
        OutputFormat::Table => {
            print_heading("Serverless Cost Estimate");
            println!("Node type:              {} x {}", request.node_type.cyan(), request.nodes);
            println!("Region:                 {}", request.region);
            println!();
            print_cost_breakdown(&breakdown);
        }
    }

    Ok(())
}

/// Render a cost breakdown as tables
pub fn print_cost_breakdown(cost: &CostBreakdown) {
    print_subheading("Rates");
    print_table(vec![
        RateRow {
            kind: "Node-hour".to_string(),
            units: cost.node_count.to_string(),
            hourly: format_rate(cost.node_hourly_rate.value, &cost.node_hourly_rate.currency),
            source: color_source(cost.node_hourly_rate.source),
        },
        RateRow {
            kind: "RPU-hour".to_string(),
            units: cost.rpu_count.to_string(),
            hourly: format_rate(cost.rpu_hourly_rate.value, &cost.rpu_hourly_rate.currency),
            source: color_source(cost.rpu_hourly_rate.source),
        },
    ]);
    println!();

    print_subheading("Monthly Costs");
    println!(
        "Active hours:           {:.1} of {:.0} ({})",
        cost.active_hours_per_month,
        cost.hours_per_month,
        format_percentage(cost.active_fraction * 100.0)
    );
    if (cost.premium_factor - 1.0).abs() > f64::EPSILON {
        println!("Premium factor:         {:.2}", cost.premium_factor);
    }
    println!(
        "Provisioned:            {}",
        format_currency(cost.current_monthly_cost, &cost.node_hourly_rate.currency)
    );
    println!(
        "Serverless:             {}",
        format_currency(cost.serverless_monthly_cost, &cost.rpu_hourly_rate.currency).green()
    );

    let savings = format_currency(cost.savings, &cost.currency);
    match cost.savings_percentage {
        Some(pct) => println!(
            "{} {} ({})",
            "Savings:".bold(),
            if cost.savings >= 0.0 { savings.green().bold() } else { savings.red().bold() },
            format_percentage(pct)
        ),
        None => println!("{} {} (n/a)", "Savings:".bold(), savings),
    }
    match cost.break_even_usage_percentage() {
        Some(pct) if pct > 100.0 => {
            println!("Break-even usage:       {} (Serverless cheaper at any usage)", format_percentage(pct))
        }
        Some(pct) => println!("Break-even usage:       {}", format_percentage(pct)),
        None => println!("Break-even usage:       n/a"),
    }
    println!();
    println!("Recommendation:         {}", color_recommendation(cost.recommendation));

    if cost.has_currency_mismatch() {
        print_warning("Node and RPU prices use different currencies; savings are not comparable");
    }
}
