//! Output formatting utilities

use anyhow::Result;
use clap::ValueEnum;
use colored::Colorize;
use idle_lib::cost::Recommendation;
use idle_lib::PriceSource;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Print any report as pretty JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

/// Print rows as a rounded table
pub fn print_table<T: Tabled>(rows: Vec<T>) {
    if rows.is_empty() {
        println!("{}", "No rows".yellow());
        return;
    }
    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);
}

/// Print a bold section heading
pub fn print_heading(title: &str) {
    println!("{}", title.bold());
    println!("{}", "=".repeat(50));
}

pub fn print_subheading(title: &str) {
    println!("{}", title.bold());
    println!("{}", "-".repeat(50));
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Format currency
pub fn format_currency(amount: f64, currency: &str) -> String {
    match currency {
        "USD" => format!("${:.2}", amount),
        "CNY" => format!("¥{:.2}", amount),
        _ => format!("{:.2} {}", amount, currency),
    }
}

/// Hourly rates need more precision than monthly totals
pub fn format_rate(amount: f64, currency: &str) -> String {
    match currency {
        "USD" => format!("${:.4}", amount),
        "CNY" => format!("¥{:.4}", amount),
        _ => format!("{:.4} {}", amount, currency),
    }
}

pub fn format_percentage(pct: f64) -> String {
    format!("{:.2}%", pct)
}

/// Format seconds as `1d 2h 3m 4s`, dropping leading zero units
pub fn format_duration(seconds: f64) -> String {
    let total = seconds.max(0.0).round() as u64;
    let (days, rem) = (total / 86_400, total % 86_400);
    let (hours, rem) = (rem / 3_600, rem % 3_600);
    let (minutes, secs) = (rem / 60, rem % 60);

    if days > 0 {
        format!("{}d {}h {}m {}s", days, hours, minutes, secs)
    } else if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, secs)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}

/// Color idle percentage: mostly idle clusters are Serverless candidates
pub fn color_idle(pct: f64) -> String {
    let formatted = format_percentage(pct);
    if pct >= 70.0 {
        formatted.green().to_string()
    } else if pct >= 30.0 {
        formatted.yellow().to_string()
    } else {
        formatted.red().to_string()
    }
}

pub fn color_recommendation(recommendation: Recommendation) -> String {
    let text = recommendation.to_string();
    match recommendation {
        Recommendation::StronglyRecommend => text.green().bold().to_string(),
        Recommendation::Consider => text.yellow().to_string(),
        Recommendation::KeepProvisioned => text.red().to_string(),
        Recommendation::Undetermined => text.dimmed().to_string(),
    }
}

pub fn color_source(source: PriceSource) -> String {
    let text = source.to_string();
    match source {
        PriceSource::Api => text.green().to_string(),
        PriceSource::Hardcoded => text.yellow().to_string(),
        PriceSource::Default => text.red().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(1585.56, "USD"), "$1585.56");
        assert_eq!(format_currency(2.5, "CNY"), "¥2.50");
        assert_eq!(format_currency(3.0, "EUR"), "3.00 EUR");
        assert_eq!(format_rate(0.375, "USD"), "$0.3750");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0.0), "0s");
        assert_eq!(format_duration(75.0), "1m 15s");
        assert_eq!(format_duration(86_340.0), "23h 59m 0s");
        assert_eq!(format_duration(90_061.0), "1d 1h 1m 1s");
        assert_eq!(format_duration(-5.0), "0s");
    }

    #[test]
    fn test_format_percentage() {
        assert_eq!(format_percentage(99.930_555), "99.93%");
    }
}
