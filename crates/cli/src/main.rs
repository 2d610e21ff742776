//! Redshift Idle Analyzer CLI
//!
//! A command-line tool for estimating how much of the time a provisioned
//! Redshift cluster sits idle, and what the same workload would cost on
//! Redshift Serverless.

mod commands;
mod config;
mod output;

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use commands::analyze::{self, AnalyzeRequest};
use commands::cost::{self, CostRequest};
use commands::simulate::{self, PatternKind, SimulateRequest};
use commands::queries;
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Redshift Idle Analyzer CLI
#[derive(Parser)]
#[command(name = "rsidle")]
#[command(author, version, about = "Redshift idle time and Serverless savings analyzer", long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(long, short, default_value = "table", global = true)]
    pub format: output::OutputFormat,

    /// Enable verbose (debug) logging
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Configuration file (defaults to ~/.config/rsidle/config.toml)
    #[arg(long, env = "RSIDLE_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze a cluster from exported CloudWatch and query history data
    Analyze {
        /// Cluster identifier
        #[arg(long, short = 'c')]
        cluster_id: String,

        /// AWS region of the cluster
        #[arg(long, short, env = "AWS_REGION", default_value = "us-east-1")]
        region: String,

        /// Days of history to analyze (1-30)
        #[arg(long, short, default_value_t = 7)]
        days: u32,

        /// `get-metric-statistics` output file (repeat for each metric or batch)
        #[arg(long = "metrics", short = 'm', required = true)]
        metrics: Vec<PathBuf>,

        /// Query history export (JSON array of rows)
        #[arg(long)]
        queries: Option<PathBuf>,

        /// `describe-clusters` output file
        #[arg(long)]
        cluster_file: Option<PathBuf>,

        /// Node type (overrides the cluster description)
        #[arg(long)]
        node_type: Option<String>,

        /// Number of nodes (overrides the cluster description)
        #[arg(long)]
        nodes: Option<u32>,

        /// `pricing get-products` output file (repeatable)
        #[arg(long = "price-list")]
        price_lists: Vec<PathBuf>,

        /// End of the analysis window, RFC 3339 (defaults to the latest sample)
        #[arg(long)]
        end: Option<DateTime<Utc>>,

        /// Multiplier applied to Serverless cost
        #[arg(long)]
        premium_factor: Option<f64>,

        /// Include per-query gap rows in the report
        #[arg(long)]
        gap_rows: bool,
    },

    /// Compute gap-based and span-based idle time from query history
    Queries {
        /// Query history export (JSON array of rows)
        file: PathBuf,

        /// Days of history to analyze (1-30)
        #[arg(long, short, default_value_t = 1)]
        days: u32,

        /// End of the analysis window, RFC 3339 (defaults to the last query)
        #[arg(long)]
        end: Option<DateTime<Utc>>,

        /// Show every query and the gap after it
        #[arg(long)]
        gap_rows: bool,
    },

    /// Estimate provisioned vs. Serverless monthly cost for an activity level
    Cost {
        /// Node type
        #[arg(long, default_value = "ra3.xlplus")]
        node_type: String,

        /// Number of nodes
        #[arg(long, default_value_t = 1)]
        nodes: u32,

        /// AWS region
        #[arg(long, short, env = "AWS_REGION", default_value = "us-east-1")]
        region: String,

        /// Share of the month the cluster is active, in percent
        #[arg(long)]
        active_pct: f64,

        /// Multiplier applied to Serverless cost
        #[arg(long)]
        premium_factor: Option<f64>,

        /// `pricing get-products` output file (repeatable)
        #[arg(long = "price-list")]
        price_lists: Vec<PathBuf>,
    },

    /// Run the analysis over synthetic metrics
    Simulate {
        /// Activity pattern to generate
        #[arg(long, value_enum, default_value = "business-hours")]
        pattern: PatternKind,

        /// Days of synthetic history (1-30)
        #[arg(long, short, default_value_t = 7)]
        days: u32,

        /// First active hour (UTC) for business-hours
        #[arg(long, default_value_t = 9)]
        start_hour: u32,

        /// First idle hour (UTC) for business-hours
        #[arg(long, default_value_t = 17)]
        end_hour: u32,

        /// Weekends are idle for business-hours
        #[arg(long)]
        weekdays_only: bool,

        /// Active share of the window for constant
        #[arg(long, default_value_t = 0.25)]
        active_fraction: f64,

        /// Drop every n-th sample to simulate gaps in the data
        #[arg(long, default_value_t = 0)]
        missing_every: usize,

        /// Also generate one short query every N minutes
        #[arg(long)]
        query_every_mins: Option<u32>,

        /// Node type
        #[arg(long, default_value = "ra3.xlplus")]
        node_type: String,

        /// Number of nodes
        #[arg(long, default_value_t = 2)]
        nodes: u32,

        /// AWS region
        #[arg(long, short, default_value = "us-east-1")]
        region: String,

        /// End of the simulated window, RFC 3339 (defaults to now)
        #[arg(long)]
        end: Option<DateTime<Utc>>,
    },
}

/// Logs go to stderr so JSON reports on stdout stay parseable
fn init_tracing(verbose: bool, json: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry.with(fmt::layer().json().with_writer(std::io::stderr)).init();
    } else {
        registry.with(fmt::layer().with_writer(std::io::stderr)).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    let mut settings = config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Analyze {
            cluster_id,
            region,
            days,
            metrics,
            queries,
            cluster_file,
            node_type,
            nodes,
            price_lists,
            end,
            premium_factor,
            gap_rows,
        } => {
            if let Some(factor) = premium_factor {
                settings.cost.premium_factor = factor;
            }
            settings.include_gap_rows |= gap_rows;
            let request = AnalyzeRequest {
                cluster_id,
                region,
                days,
                metrics,
                queries,
                cluster_file,
                node_type,
                nodes,
                price_lists,
                end,
            };
            analyze::analyze_cluster(settings, request, cli.format).await?;
        }
        Commands::Queries {
            file,
            days,
            end,
            gap_rows,
        } => {
            queries::show_query_idle(&settings, &file, days, end, gap_rows, cli.format).await?;
        }
        Commands::Cost {
            node_type,
            nodes,
            region,
            active_pct,
            premium_factor,
            price_lists,
        } => {
            if let Some(factor) = premium_factor {
                settings.cost.premium_factor = factor;
            }
            let request = CostRequest {
                node_type,
                nodes,
                region,
                active_pct,
                price_lists,
            };
            cost::estimate_cost(&settings, request, cli.format).await?;
        }
        Commands::Simulate {
            pattern,
            days,
            start_hour,
            end_hour,
            weekdays_only,
            active_fraction,
            missing_every,
            query_every_mins,
            node_type,
            nodes,
            region,
            end,
        } => {
            let request = SimulateRequest {
                pattern,
                days,
                start_hour,
                end_hour,
                weekdays_only,
                active_fraction,
                missing_every,
                query_every_mins,
                node_type,
                nodes,
                region,
                end,
            };
            simulate::run_simulation(settings, request, cli.format).await?;
        }
    }

    Ok(())
}
