//! Input validation for analysis requests

use crate::error::{AnalysisError, Result};
use tracing::warn;

/// CloudWatch keeps one-minute statistics for this many days
pub const MAX_LOOKBACK_DAYS: u32 = 30;

pub const MAX_CLUSTER_ID_LEN: usize = 63;

/// Largest node count a provisioned Redshift cluster can have
pub const MAX_NODES: u32 = 128;

const KNOWN_REGIONS: &[&str] = &[
    "us-east-1", "us-east-2", "us-west-1", "us-west-2",
    "eu-west-1", "eu-west-2", "eu-west-3", "eu-central-1",
    "ap-southeast-1", "ap-southeast-2", "ap-northeast-1", "ap-northeast-2",
    "cn-north-1", "cn-northwest-1",
    "ca-central-1", "sa-east-1",
];

/// Region codes look like `<partition>-<area>-<n>`
fn looks_like_region(region: &str) -> bool {
    let parts: Vec<&str> = region.split('-').collect();
    parts.len() >= 3
        && parts[..parts.len() - 1]
            .iter()
            .all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_lowercase()))
        && parts[parts.len() - 1].chars().all(|c| c.is_ascii_digit())
        && !parts[parts.len() - 1].is_empty()
}

pub fn validate_cluster_id(cluster_id: &str) -> Result<()> {
    let id = cluster_id.trim();
    if id.is_empty() {
        return Err(AnalysisError::Validation("cluster id must not be empty".to_string()));
    }
    if id.len() > MAX_CLUSTER_ID_LEN {
        return Err(AnalysisError::Validation(format!(
            "cluster id must be 1-{} characters",
            MAX_CLUSTER_ID_LEN
        )));
    }
    Ok(())
}

/// Rejects empty regions; unfamiliar ones are only warned about
pub fn validate_region(region: &str) -> Result<()> {
    let region = region.trim();
    if region.is_empty() {
        return Err(AnalysisError::Validation("region must not be empty".to_string()));
    }
    if !KNOWN_REGIONS.contains(&region) && !looks_like_region(region) {
        warn!(region = %region, "Region may not be a valid AWS region");
    }
    Ok(())
}

pub fn validate_days(days: u32) -> Result<()> {
    if days == 0 {
        return Err(AnalysisError::Validation("days must be greater than 0".to_string()));
    }
    if days > MAX_LOOKBACK_DAYS {
        return Err(AnalysisError::Validation(format!(
            "days must not exceed {} (CloudWatch one-minute retention)",
            MAX_LOOKBACK_DAYS
        )));
    }
    Ok(())
}

pub fn validate_node_count(nodes: u32) -> Result<()> {
    if nodes == 0 || nodes > MAX_NODES {
        return Err(AnalysisError::Validation(format!(
            "node count must be 1-{}, got {}",
            MAX_NODES, nodes
        )));
    }
    Ok(())
}

pub fn validate_inputs(cluster_id: &str, region: &str, days: u32) -> Result<()> {
    validate_cluster_id(cluster_id)?;
    validate_region(region)?;
    validate_days(days)
}
