//! Static fallback prices

use super::price_list::is_china_region;
use crate::models::{PriceSource, Priced};
use serde::{Deserialize, Serialize};

/// Node type whose price stands in for unknown node types
pub const REFERENCE_NODE_TYPE: &str = "ra3.xlplus";

/// Serverless RPU-hour price for one region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionPrice {
    pub region: String,
    pub price: f64,
    pub currency: String,
}

/// Provisioned node-hour price for one node type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodePrice {
    pub node_type: String,
    pub price: f64,
}

fn region(region: &str, price: f64, currency: &str) -> RegionPrice {
    RegionPrice {
        region: region.to_string(),
        price,
        currency: currency.to_string(),
    }
}

fn node(node_type: &str, price: f64) -> NodePrice {
    NodePrice {
        node_type: node_type.to_string(),
        price,
    }
}

fn default_rpu_prices() -> Vec<RegionPrice> {
    vec![
        region("cn-north-1", 2.692, "CNY"),
        region("cn-northwest-1", 2.093, "CNY"),
        region("us-east-1", 0.375, "USD"),
        region("us-west-2", 0.375, "USD"),
        region("eu-west-1", 0.375, "USD"),
        region("ap-southeast-1", 0.45, "USD"),
    ]
}

fn default_china_node_prices() -> Vec<NodePrice> {
    vec![
        node("dc2.large", 2.145),
        node("dc2.8xlarge", 41.60),
        node("ra3.large", 3.475),
        node("ra3.xlplus", 6.950),
        node("ra3.4xlarge", 20.864),
        node("ra3.16xlarge", 83.456),
    ]
}

fn default_global_node_prices() -> Vec<NodePrice> {
    vec![
        node("dc2.large", 0.25),
        node("dc2.8xlarge", 4.80),
        node("ra3.large", 0.48),
        node("ra3.xlplus", 1.086),
        node("ra3.4xlarge", 3.26),
        node("ra3.16xlarge", 13.04),
    ]
}

fn default_rpu_price() -> f64 {
    0.375
}

fn default_currency() -> String {
    "USD".to_string()
}

/// Fallback price table used when live pricing is unavailable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallbackPriceTable {
    #[serde(default = "default_rpu_prices")]
    pub rpu_prices: Vec<RegionPrice>,

    /// RPU price for regions missing from `rpu_prices`
    #[serde(default = "default_rpu_price")]
    pub default_rpu_price: f64,

    #[serde(default = "default_currency")]
    pub default_currency: String,

    /// Hourly node prices in CNY for China regions
    #[serde(default = "default_china_node_prices")]
    pub china_node_prices: Vec<NodePrice>,

    /// Hourly node prices in USD for all other regions
    #[serde(default = "default_global_node_prices")]
    pub global_node_prices: Vec<NodePrice>,
}

impl Default for FallbackPriceTable {
    fn default() -> Self {
        Self {
            rpu_prices: default_rpu_prices(),
            default_rpu_price: default_rpu_price(),
            default_currency: default_currency(),
            china_node_prices: default_china_node_prices(),
            global_node_prices: default_global_node_prices(),
        }
    }
}

impl FallbackPriceTable {
    /// RPU-hour price, `Hardcoded` when the region is listed
    pub fn rpu_price(&self, region: &str) -> Priced {
        match self.rpu_prices.iter().find(|p| p.region == region) {
            Some(p) => Priced::new(p.price, p.currency.clone(), PriceSource::Hardcoded),
            None => Priced::new(
                self.default_rpu_price,
                self.default_currency.clone(),
                PriceSource::Default,
            ),
        }
    }

    /// Node-hour price for `node_type` in `region`'s partition
    ///
    /// Unknown node types are priced as [`REFERENCE_NODE_TYPE`] and tagged
    /// `Default`.
    pub fn node_price(&self, node_type: &str, region: &str) -> Priced {
        let (prices, currency) = if is_china_region(region) {
            (&self.china_node_prices, "CNY")
        } else {
            (&self.global_node_prices, "USD")
        };

        if let Some(p) = prices.iter().find(|p| p.node_type == node_type) {
            return Priced::new(p.price, currency, PriceSource::Hardcoded);
        }

        let reference = prices
            .iter()
            .find(|p| p.node_type == REFERENCE_NODE_TYPE)
            .map(|p| p.price)
            .unwrap_or(if is_china_region(region) { 6.950 } else { 1.086 });
        Priced::new(reference, currency, PriceSource::Default)
    }

    /// Whether `region`'s partition has its own price for `node_type`
    pub fn knows_node_type(&self, node_type: &str, region: &str) -> bool {
        let prices = if is_china_region(region) {
            &self.china_node_prices
        } else {
            &self.global_node_prices
        };
        prices.iter().any(|p| p.node_type == node_type)
    }
}
