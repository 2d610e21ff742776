//! Idle-time and Serverless savings analysis for Redshift clusters
//!
//! This crate provides the core functionality for:
//! - Classifying per-minute CloudWatch samples as active or idle
//! - Gap-based and span-based idle time over query history
//! - Provisioned vs. Serverless monthly cost comparison
//! - Loading exported AWS data and assembling the final report

pub mod activity;
pub mod analyzer;
pub mod config;
pub mod cost;
pub mod error;
pub mod gaps;
pub mod models;
pub mod observability;
pub mod pricing;
pub mod simulate;
pub mod source;
pub mod validation;

pub use analyzer::{ActivityBasis, AnalysisInputs, AnalysisReport, ClusterAnalyzer, Estimate};
pub use config::AnalyzerConfig;
pub use error::{percentage, AnalysisError, Result};
pub use models::*;
pub use observability::AnalysisLogger;
