//! Live price providers and fallback resolution

use super::price_list::{location_name, parse_get_products, select_price, ProductFamily};
use super::table::FallbackPriceTable;
use crate::models::Priced;
use crate::observability::AnalysisLogger;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::Path;

/// Source of live (API-derived) prices
#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Serverless RPU-hour price, `None` if the provider has no figure
    async fn rpu_price(&self, region: &str) -> Result<Option<Priced>>;

    /// Provisioned node-hour price, `None` if the provider has no figure
    async fn node_price(&self, node_type: &str, region: &str) -> Result<Option<Priced>>;
}

/// Provider that never has live prices
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLivePricing;

#[async_trait]
impl PriceProvider for NoLivePricing {
    async fn rpu_price(&self, _region: &str) -> Result<Option<Priced>> {
        Ok(None)
    }

    async fn node_price(&self, _node_type: &str, _region: &str) -> Result<Option<Priced>> {
        Ok(None)
    }
}

/// Provider backed by exported `GetProducts` documents
#[derive(Debug, Clone, Default)]
pub struct PriceListProvider {
    documents: Vec<serde_json::Value>,
}

impl PriceListProvider {
    pub fn new(documents: Vec<serde_json::Value>) -> Self {
        Self { documents }
    }

    /// Load and merge one or more `aws pricing get-products` output files
    pub async fn from_files<P: AsRef<Path>>(paths: &[P]) -> Result<Self> {
        let mut documents = Vec::new();
        for path in paths {
            let path = path.as_ref();
            let raw = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read price list {}", path.display()))?;
            let docs = parse_get_products(&raw)
                .with_context(|| format!("Failed to parse price list {}", path.display()))?;
            documents.extend(docs);
        }
        Ok(Self { documents })
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[async_trait]
impl PriceProvider for PriceListProvider {
    async fn rpu_price(&self, region: &str) -> Result<Option<Priced>> {
        Ok(select_price(
            &self.documents,
            ProductFamily::Serverless,
            Some(location_name(region)),
            None,
        ))
    }

    async fn node_price(&self, node_type: &str, region: &str) -> Result<Option<Priced>> {
        Ok(select_price(
            &self.documents,
            ProductFamily::ComputeInstance,
            Some(location_name(region)),
            Some(node_type),
        ))
    }
}

/// Resolves prices from a live provider, falling back to the static table
pub struct PriceResolver {
    table: FallbackPriceTable,
    logger: AnalysisLogger,
}

impl PriceResolver {
    pub fn new(table: FallbackPriceTable, logger: AnalysisLogger) -> Self {
        Self { table, logger }
    }

    pub fn table(&self) -> &FallbackPriceTable {
        &self.table
    }

    /// RPU-hour price; never fails, provider errors fall back to the table
    pub async fn rpu_price(&self, provider: &dyn PriceProvider, region: &str) -> Priced {
        match provider.rpu_price(region).await {
            Ok(Some(price)) => price,
            Ok(None) => {
                let fallback = self.table.rpu_price(region);
                self.logger
                    .log_price_fallback("rpu", region, None, &fallback, "no live price found");
                fallback
            }
            Err(e) => {
                let fallback = self.table.rpu_price(region);
                self.logger
                    .log_price_fallback("rpu", region, None, &fallback, &e.to_string());
                fallback
            }
        }
    }

    /// Node-hour price; never fails, provider errors fall back to the table
    pub async fn node_price(
        &self,
        provider: &dyn PriceProvider,
        node_type: &str,
        region: &str,
    ) -> Priced {
        let reason = match provider.node_price(node_type, region).await {
            Ok(Some(price)) => return price,
            Ok(None) => "no live price found".to_string(),
            Err(e) => e.to_string(),
        };
        let fallback = self.table.node_price(node_type, region);
        self.logger
            .log_price_fallback("node", region, Some(node_type), &fallback, &reason);
        fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PriceSource;
    use serde_json::json;
    use std::io::Write;

    struct FailingProvider;

    #[async_trait]
    impl PriceProvider for FailingProvider {
        async fn rpu_price(&self, _region: &str) -> Result<Option<Priced>> {
            anyhow::bail!("pricing endpoint unreachable")
        }

        async fn node_price(&self, _node_type: &str, _region: &str) -> Result<Option<Priced>> {
            anyhow::bail!("pricing endpoint unreachable")
        }
    }

    fn resolver() -> PriceResolver {
        PriceResolver::new(FallbackPriceTable::default(), AnalysisLogger::new("test-cluster"))
    }

    #[tokio::test]
    async fn test_fallback_when_no_live_price() {
        let price = resolver().rpu_price(&NoLivePricing, "us-east-1").await;
        assert_eq!(price.value, 0.375);
        assert_eq!(price.source, PriceSource::Hardcoded);
    }

    #[tokio::test]
    async fn test_fallback_when_provider_fails() {
        let resolver = resolver();
        let rpu = resolver.rpu_price(&FailingProvider, "cn-north-1").await;
        assert_eq!(rpu.source, PriceSource::Hardcoded);
        assert_eq!(rpu.currency, "CNY");

        let node = resolver.node_price(&FailingProvider, "ra3.xlplus", "cn-north-1").await;
        assert_eq!(node.value, 6.950);
        assert_eq!(node.source, PriceSource::Hardcoded);
    }

    #[tokio::test]
    async fn test_price_list_provider_from_file() {
        let doc = json!({
            "product": {
                "productFamily": "Compute Instance",
                "attributes": { "location": "Europe (Ireland)", "instanceType": "ra3.4xlarge" }
            },
            "terms": { "OnDemand": { "T": { "priceDimensions": { "D": {
                "unit": "Hrs", "description": "", "pricePerUnit": { "USD": "3.606" }
            }}}}}
        });
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", json!({ "PriceList": [doc.to_string()] })).unwrap();

        let provider = PriceListProvider::from_files(&[file.path()]).await.unwrap();
        assert_eq!(provider.len(), 1);

        let price = resolver().node_price(&provider, "ra3.4xlarge", "eu-west-1").await;
        assert_eq!(price.value, 3.606);
        assert_eq!(price.source, PriceSource::Api);

        // no serverless entry in the file: RPU falls back
        let rpu = resolver().rpu_price(&provider, "eu-west-1").await;
        assert_eq!(rpu.source, PriceSource::Hardcoded);
    }

    #[tokio::test]
    async fn test_price_list_provider_missing_file() {
        let result = PriceListProvider::from_files(&["/nonexistent/prices.json"]).await;
        assert!(result.is_err());
    }
}
