//! Subcommand implementations

pub mod analyze;
pub mod cost;
pub mod queries;
pub mod simulate;

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use idle_lib::pricing::{NoLivePricing, PriceListProvider, PriceProvider};
use std::path::PathBuf;
use tracing::debug;

/// Live prices from exported `get-products` files, or none at all
pub async fn price_provider(price_lists: &[PathBuf]) -> Result<Box<dyn PriceProvider>> {
    if price_lists.is_empty() {
        return Ok(Box::new(NoLivePricing));
    }
    let provider = PriceListProvider::from_files(price_lists).await?;
    debug!(documents = provider.len(), "Loaded price list documents");
    Ok(Box::new(provider))
}

/// First period boundary after `ts`, so the sample at `ts` falls inside a
/// half-open window ending there
pub fn window_end_after(ts: DateTime<Utc>, period_secs: i64) -> DateTime<Utc> {
    let period = period_secs.max(1);
    let floored = ts.timestamp().div_euclid(period) * period;
    DateTime::<Utc>::from_timestamp(floored, 0).unwrap_or(ts) + Duration::seconds(period)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_window_end_after() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 4, 10, 15, 42).unwrap();
        assert_eq!(
            window_end_after(ts, 60),
            Utc.with_ymd_and_hms(2024, 3, 4, 10, 16, 0).unwrap()
        );
        let aligned = Utc.with_ymd_and_hms(2024, 3, 4, 10, 15, 0).unwrap();
        assert_eq!(
            window_end_after(aligned, 60),
            Utc.with_ymd_and_hms(2024, 3, 4, 10, 16, 0).unwrap()
        );
    }
}
