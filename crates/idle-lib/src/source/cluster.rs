//! Redshift `describe-clusters` exports

use crate::models::ClusterInfo;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeClustersOutput {
    #[serde(default)]
    clusters: Vec<ClusterRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ClusterRecord {
    cluster_identifier: String,
    #[serde(default)]
    node_type: Option<String>,
    #[serde(default)]
    number_of_nodes: Option<u32>,
    #[serde(default)]
    cluster_status: Option<String>,
    #[serde(default)]
    cluster_version: Option<String>,
}

/// Pick `cluster_id` (or the only cluster) out of describe-clusters output
pub fn parse_describe_clusters(raw: &str, cluster_id: Option<&str>) -> Result<ClusterInfo> {
    let output: DescribeClustersOutput =
        serde_json::from_str(raw).context("Invalid describe-clusters output")?;

    let record = match cluster_id {
        Some(id) => output
            .clusters
            .into_iter()
            .find(|c| c.cluster_identifier == id)
            .with_context(|| format!("Cluster not found: {}", id))?,
        None => output
            .clusters
            .into_iter()
            .next()
            .context("describe-clusters output lists no clusters")?,
    };

    Ok(ClusterInfo {
        cluster_id: record.cluster_identifier,
        node_type: record.node_type.unwrap_or_else(|| "unknown".to_string()),
        number_of_nodes: record.number_of_nodes.unwrap_or(1),
        cluster_status: record.cluster_status.unwrap_or_else(|| "unknown".to_string()),
        cluster_version: record.cluster_version.unwrap_or_else(|| "unknown".to_string()),
    })
}

pub async fn load_cluster_info(path: impl AsRef<Path>, cluster_id: Option<&str>) -> Result<ClusterInfo> {
    let path = path.as_ref();
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read cluster description {}", path.display()))?;
    parse_describe_clusters(&raw, cluster_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    const OUTPUT: &str = r#"{
        "Clusters": [
            {"ClusterIdentifier": "etl", "NodeType": "ra3.4xlarge", "NumberOfNodes": 2,
             "ClusterStatus": "available", "ClusterVersion": "1.0"},
            {"ClusterIdentifier": "bi", "NodeType": "dc2.large"}
        ]
    }"#;

    #[test]
    fn test_select_by_id() {
        let info = parse_describe_clusters(OUTPUT, Some("etl")).unwrap();
        assert_eq!(info.node_type, "ra3.4xlarge");
        assert_eq!(info.number_of_nodes, 2);
        assert_eq!(info.cluster_status, "available");
    }

    #[test]
    fn test_missing_fields_defaulted() {
        let info = parse_describe_clusters(OUTPUT, Some("bi")).unwrap();
        assert_eq!(info.number_of_nodes, 1);
        assert_eq!(info.cluster_status, "unknown");
    }

    #[test]
    fn test_first_cluster_when_unspecified() {
        assert_eq!(parse_describe_clusters(OUTPUT, None).unwrap().cluster_id, "etl");
    }

    #[test]
    fn test_unknown_cluster() {
        assert!(parse_describe_clusters(OUTPUT, Some("nope")).is_err());
        assert!(parse_describe_clusters(r#"{"Clusters": []}"#, None).is_err());
    }
}
