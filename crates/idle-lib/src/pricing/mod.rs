//! Price lookup with provenance
//!
//! Live prices come from AWS Pricing API `GetProducts` documents. When none
//! can be found the static fallback table is used instead. Every figure is
//! returned as a [`Priced`](crate::models::Priced) tagged with its source.

mod price_list;
mod provider;
mod table;

pub use price_list::{
    is_china_region, location_name, parse_get_products, pricing_endpoint_region, select_price,
    ProductFamily,
};
pub use provider::{NoLivePricing, PriceListProvider, PriceProvider, PriceResolver};
pub use table::{FallbackPriceTable, NodePrice, RegionPrice, REFERENCE_NODE_TYPE};
