//! Parsing of AWS Pricing API `GetProducts` output

use crate::error::Result;
use crate::models::{PriceSource, Priced};
use serde::Deserialize;
use std::collections::BTreeMap;

/// Redshift product families the analyzer prices
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductFamily {
    /// Redshift Serverless, billed per RPU-hour
    Serverless,
    /// Provisioned nodes, billed per node-hour
    ComputeInstance,
}

impl ProductFamily {
    pub fn unit(&self) -> &'static str {
        match self {
            ProductFamily::Serverless => "RPU-Hr",
            ProductFamily::ComputeInstance => "Hrs",
        }
    }

    pub fn filter_value(&self) -> &'static str {
        match self {
            ProductFamily::Serverless => "Serverless",
            ProductFamily::ComputeInstance => "Compute Instance",
        }
    }
}

pub fn is_china_region(region: &str) -> bool {
    region.starts_with("cn-")
}

/// Region hosting the Pricing API endpoint for `region`'s partition
pub fn pricing_endpoint_region(region: &str) -> &'static str {
    if is_china_region(region) {
        "cn-northwest-1"
    } else {
        "us-east-1"
    }
}

/// Pricing API location name for a region code
pub fn location_name(region: &str) -> &str {
    match region {
        "us-east-1" => "US East (N. Virginia)",
        "us-east-2" => "US East (Ohio)",
        "us-west-1" => "US West (N. California)",
        "us-west-2" => "US West (Oregon)",
        "eu-west-1" => "Europe (Ireland)",
        "eu-central-1" => "Europe (Frankfurt)",
        "ap-southeast-1" => "Asia Pacific (Singapore)",
        "ap-northeast-1" => "Asia Pacific (Tokyo)",
        "cn-north-1" => "China (Beijing)",
        "cn-northwest-1" => "China (Ningxia)",
        other => other,
    }
}

#[derive(Debug, Default, Deserialize)]
struct Product {
    #[serde(default)]
    product: ProductInfo,
    #[serde(default)]
    terms: Terms,
}

#[derive(Debug, Default, Deserialize)]
struct ProductInfo {
    #[serde(rename = "productFamily", default)]
    product_family: String,
    #[serde(default)]
    attributes: BTreeMap<String, String>,
}

#[derive(Debug, Default, Deserialize)]
struct Terms {
    #[serde(rename = "OnDemand", default)]
    on_demand: BTreeMap<String, Term>,
}

#[derive(Debug, Default, Deserialize)]
struct Term {
    #[serde(rename = "priceDimensions", default)]
    price_dimensions: BTreeMap<String, PriceDimension>,
}

#[derive(Debug, Default, Deserialize)]
struct PriceDimension {
    #[serde(default)]
    unit: String,
    #[serde(default)]
    description: String,
    #[serde(rename = "pricePerUnit", default)]
    price_per_unit: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct GetProductsOutput {
    #[serde(rename = "PriceList", default)]
    price_list: Vec<serde_json::Value>,
}

/// Split `GetProducts` output into product documents
///
/// Accepts the raw CLI output (`{"PriceList": [...]}`) where each entry is
/// either a JSON-encoded string or an inline object.
pub fn parse_get_products(raw: &str) -> Result<Vec<serde_json::Value>> {
    let output: GetProductsOutput = serde_json::from_str(raw)?;
    output
        .price_list
        .into_iter()
        .map(|entry| -> Result<serde_json::Value> {
            match entry {
                serde_json::Value::String(s) => Ok(serde_json::from_str(&s)?),
                other => Ok(other),
            }
        })
        .collect()
}

fn is_on_demand(payment_option: &str, description: &str) -> bool {
    let description = description.to_lowercase();
    payment_option.is_empty()
        || payment_option == "On Demand"
        || (description.contains("serverless usage") && !description.contains("reservations"))
}

/// First positive on-demand price matching `family` in `documents`
///
/// `location` filters on the product's `location` attribute and
/// `node_type` on `instanceType` (compute instances only).
pub fn select_price(
    documents: &[serde_json::Value],
    family: ProductFamily,
    location: Option<&str>,
    node_type: Option<&str>,
) -> Option<Priced> {
    for doc in documents {
        let product: Product = match serde_json::from_value(doc.clone()) {
            Ok(p) => p,
            Err(e) => {
                tracing::debug!(error = %e, "Skipping malformed price list entry");
                continue;
            }
        };

        let attrs = &product.product.attributes;
        if !product.product.product_family.is_empty()
            && product.product.product_family != family.filter_value()
        {
            continue;
        }
        if let Some(loc) = location {
            if attrs.get("location").map(String::as_str) != Some(loc) {
                continue;
            }
        }
        if let (ProductFamily::ComputeInstance, Some(nt)) = (family, node_type) {
            if attrs.get("instanceType").map(String::as_str) != Some(nt) {
                continue;
            }
        }
        let payment_option = attrs.get("paymentOption").map(String::as_str).unwrap_or("");

        for term in product.terms.on_demand.values() {
            for dim in term.price_dimensions.values() {
                if dim.unit != family.unit() {
                    continue;
                }
                if family == ProductFamily::Serverless && !is_on_demand(payment_option, &dim.description) {
                    continue;
                }
                let Some((currency, raw)) = dim.price_per_unit.iter().next() else {
                    continue;
                };
                match raw.parse::<f64>() {
                    Ok(price) if price > 0.0 && price.is_finite() => {
                        return Some(Priced::new(price, currency.clone(), PriceSource::Api));
                    }
                    _ => continue,
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn serverless_doc(location: &str, price: &str, description: &str) -> serde_json::Value {
        json!({
            "product": {
                "productFamily": "Serverless",
                "attributes": { "location": location }
            },
            "terms": {
                "OnDemand": {
                    "T1": {
                        "priceDimensions": {
                            "D1": {
                                "unit": "RPU-Hr",
                                "description": description,
                                "pricePerUnit": { "USD": price }
                            }
                        }
                    }
                }
            }
        })
    }

    fn instance_doc(location: &str, node_type: &str, price: &str) -> serde_json::Value {
        json!({
            "product": {
                "productFamily": "Compute Instance",
                "attributes": { "location": location, "instanceType": node_type }
            },
            "terms": {
                "OnDemand": {
                    "T1": {
                        "priceDimensions": {
                            "D1": {
                                "unit": "Hrs",
                                "description": "per node hour",
                                "pricePerUnit": { "USD": price }
                            }
                        }
                    }
                }
            }
        })
    }

    #[test]
    fn test_endpoint_and_location() {
        assert_eq!(pricing_endpoint_region("cn-north-1"), "cn-northwest-1");
        assert_eq!(pricing_endpoint_region("eu-west-1"), "us-east-1");
        assert_eq!(location_name("us-west-2"), "US West (Oregon)");
        assert_eq!(location_name("xx-test-9"), "xx-test-9");
    }

    #[test]
    fn test_select_serverless_price() {
        let docs = vec![
            serverless_doc("US West (Oregon)", "0.36", "Serverless usage"),
            serverless_doc("US East (N. Virginia)", "0.375", "Serverless usage"),
        ];
        let price = select_price(&docs, ProductFamily::Serverless, Some("US East (N. Virginia)"), None)
            .unwrap();
        assert_eq!(price.value, 0.375);
        assert_eq!(price.source, PriceSource::Api);
    }

    #[test]
    fn test_skip_zero_priced_dimension() {
        let docs = vec![
            serverless_doc("US East (N. Virginia)", "0.0000000000", "Serverless usage"),
            serverless_doc("US East (N. Virginia)", "0.375", "Serverless usage"),
        ];
        let price = select_price(&docs, ProductFamily::Serverless, None, None).unwrap();
        assert_eq!(price.value, 0.375);
    }

    #[test]
    fn test_select_instance_price_by_node_type() {
        let docs = vec![
            instance_doc("US East (N. Virginia)", "ra3.4xlarge", "3.26"),
            instance_doc("US East (N. Virginia)", "ra3.xlplus", "1.086"),
        ];
        let price = select_price(
            &docs,
            ProductFamily::ComputeInstance,
            Some("US East (N. Virginia)"),
            Some("ra3.xlplus"),
        )
        .unwrap();
        assert_eq!(price.value, 1.086);
        assert!(select_price(&docs, ProductFamily::Serverless, None, None).is_none());
    }

    #[test]
    fn test_parse_get_products_string_entries() {
        let inner = serverless_doc("China (Beijing)", "2.692", "Serverless usage").to_string();
        let raw = json!({ "FormatVersion": "aws_v1", "PriceList": [inner] }).to_string();
        let docs = parse_get_products(&raw).unwrap();
        assert_eq!(docs.len(), 1);
        assert!(select_price(&docs, ProductFamily::Serverless, Some("China (Beijing)"), None).is_some());
    }

    #[test]
    fn test_parse_get_products_rejects_garbage() {
        assert!(parse_get_products("not json").is_err());
    }
}
