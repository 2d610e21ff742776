//! Serverless RPU sizing

use serde::{Deserialize, Serialize};

/// Smallest Serverless base capacity
pub const MIN_RPU: u32 = 8;

/// Base capacity is configured in steps of this many RPUs
pub const RPU_STEP: u32 = 8;

/// 8 RPU correspond to 4 x ra3.xlplus
pub const RPU_PER_XLPLUS: f64 = 2.0;

/// Capacity of one node type in ra3.xlplus units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeEquivalent {
    pub node_type: String,
    pub xlplus_equivalent: f64,
}

fn equivalent(node_type: &str, xlplus_equivalent: f64) -> NodeEquivalent {
    NodeEquivalent {
        node_type: node_type.to_string(),
        xlplus_equivalent,
    }
}

fn default_equivalents() -> Vec<NodeEquivalent> {
    vec![
        equivalent("dc2.large", 0.25),
        equivalent("dc2.8xlarge", 4.0),
        equivalent("ra3.large", 0.5),
        equivalent("ra3.xlplus", 1.0),
        equivalent("ra3.4xlarge", 4.0),
        equivalent("ra3.16xlarge", 16.0),
    ]
}

fn default_rpu_per_equivalent() -> f64 {
    RPU_PER_XLPLUS
}

fn default_min_rpu() -> u32 {
    MIN_RPU
}

fn default_rpu_step() -> u32 {
    RPU_STEP
}

fn default_unknown_equivalent() -> f64 {
    1.0
}

/// Table-driven mapping from node configuration to Serverless RPUs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpuSizing {
    #[serde(default = "default_equivalents")]
    pub equivalents: Vec<NodeEquivalent>,

    #[serde(default = "default_rpu_per_equivalent")]
    pub rpu_per_equivalent: f64,

    #[serde(default = "default_min_rpu")]
    pub min_rpu: u32,

    #[serde(default = "default_rpu_step")]
    pub rpu_step: u32,

    /// Equivalent used for node types missing from the table
    #[serde(default = "default_unknown_equivalent")]
    pub unknown_equivalent: f64,
}

impl Default for RpuSizing {
    fn default() -> Self {
        Self {
            equivalents: default_equivalents(),
            rpu_per_equivalent: default_rpu_per_equivalent(),
            min_rpu: default_min_rpu(),
            rpu_step: default_rpu_step(),
            unknown_equivalent: default_unknown_equivalent(),
        }
    }
}

impl RpuSizing {
    pub fn equivalent_for(&self, node_type: &str) -> Option<f64> {
        self.equivalents
            .iter()
            .find(|e| e.node_type == node_type)
            .map(|e| e.xlplus_equivalent)
    }

    /// RPUs needed to match `node_count` x `node_type`
    ///
    /// Rounded up to the step size and never below the floor. Saturates at
    /// the largest multiple of the step that fits in a `u32`.
    pub fn required_rpu(&self, node_type: &str, node_count: u32) -> u32 {
        let per_node = self.equivalent_for(node_type).unwrap_or(self.unknown_equivalent);
        let raw = per_node * f64::from(node_count) * self.rpu_per_equivalent;
        let step = self.rpu_step.max(1);
        let max_steps = u32::MAX / step;
        let steps = (raw.max(0.0) / f64::from(step)).ceil().min(f64::from(max_steps)) as u32;
        steps.saturating_mul(step).max(self.min_rpu)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_floor_applies_to_small_clusters() {
        let sizing = RpuSizing::default();
        assert_eq!(sizing.required_rpu("dc2.large", 1), 8);
        assert_eq!(sizing.required_rpu("ra3.xlplus", 2), 8);
        assert_eq!(sizing.required_rpu("ra3.xlplus", 0), 8);
    }

    #[test]
    fn test_rounds_up_to_step() {
        let sizing = RpuSizing::default();
        // 5 xlplus -> 10 RPU -> 16
        assert_eq!(sizing.required_rpu("ra3.xlplus", 5), 16);
        // 2 x 4xlarge -> 8 equivalents -> 16 RPU
        assert_eq!(sizing.required_rpu("ra3.4xlarge", 2), 16);
        assert_eq!(sizing.required_rpu("ra3.16xlarge", 4), 128);
    }

    #[test]
    fn test_unknown_node_type() {
        let sizing = RpuSizing::default();
        assert_eq!(sizing.equivalent_for("ra9.huge"), None);
        assert_eq!(sizing.required_rpu("ra9.huge", 8), 16);
    }

    #[test]
    fn test_extreme_node_count_saturates() {
        let sizing = RpuSizing::default();
        let rpu = sizing.required_rpu("ra3.16xlarge", u32::MAX);
        assert_eq!(rpu, (u32::MAX / 8) * 8);
        assert_eq!(rpu % 8, 0);

        let odd_step = RpuSizing {
            rpu_step: 3,
            ..RpuSizing::default()
        };
        assert_eq!(odd_step.required_rpu("ra3.16xlarge", u32::MAX) % 3, 0);
    }

    #[test]
    fn test_configured_floor() {
        let sizing = RpuSizing {
            min_rpu: 32,
            ..RpuSizing::default()
        };
        assert_eq!(sizing.required_rpu("ra3.4xlarge", 2), 32);
    }
}
