//! CloudWatch `get-metric-statistics` exports

use super::MetricSource;
use crate::activity::MetricStreams;
use crate::models::{AnalysisWindow, MetricSample};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct StatisticsOutput {
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    datapoints: Vec<Datapoint>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Datapoint {
    timestamp: DateTime<Utc>,
    average: Option<f64>,
    maximum: Option<f64>,
    sum: Option<f64>,
    minimum: Option<f64>,
}

impl Datapoint {
    /// Average is requested; other statistics are accepted if it is absent
    fn value(&self) -> Option<f64> {
        self.average.or(self.maximum).or(self.sum).or(self.minimum)
    }
}

/// Metric samples loaded from exported statistics files
#[derive(Debug, Clone, Default)]
pub struct CloudWatchExport {
    streams: MetricStreams,
}

impl CloudWatchExport {
    /// Parse one export; the metric name comes from `Label` or `fallback_name`
    pub fn parse(raw: &str, fallback_name: Option<&str>) -> Result<(String, Vec<MetricSample>)> {
        let output: StatisticsOutput =
            serde_json::from_str(raw).context("Invalid get-metric-statistics output")?;
        let name = output
            .label
            .filter(|l| !l.is_empty())
            .or_else(|| fallback_name.map(str::to_string))
            .context("Export has no Label and no metric name was given")?;

        let mut skipped = 0usize;
        let samples = output
            .datapoints
            .into_iter()
            .filter_map(|dp| match dp.value() {
                Some(v) => Some(MetricSample::new(dp.timestamp, name.clone(), v)),
                None => {
                    skipped += 1;
                    None
                }
            })
            .collect();

        if skipped > 0 {
            warn!(metric = %name, skipped = skipped, "Datapoints without a statistic were skipped");
        }
        Ok((name, samples))
    }

    /// Merge samples into the export, keeping each stream sorted and unique
    pub fn insert(&mut self, metric: String, samples: Vec<MetricSample>) {
        let stream = self.streams.entry(metric).or_default();
        stream.extend(samples);
        stream.sort_by_key(|s| s.timestamp);
        stream.dedup_by_key(|s| s.timestamp);
    }

    /// Load one or more export files (batches of the same metric are merged)
    pub async fn from_files<P: AsRef<Path>>(paths: &[P]) -> Result<Self> {
        let mut export = Self::default();
        for path in paths {
            let path = path.as_ref();
            let raw = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read metrics file {}", path.display()))?;
            let stem = path.file_stem().and_then(|s| s.to_str());
            let (name, samples) = Self::parse(&raw, stem)
                .with_context(|| format!("Failed to parse metrics file {}", path.display()))?;
            debug!(metric = %name, points = samples.len(), file = %path.display(), "Loaded metric export");
            export.insert(name, samples);
        }
        Ok(export)
    }

    pub fn streams(&self) -> &MetricStreams {
        &self.streams
    }

    pub fn into_streams(self) -> MetricStreams {
        self.streams
    }

    /// Latest sample timestamp across all streams
    pub fn latest_timestamp(&self) -> Option<DateTime<Utc>> {
        self.streams
            .values()
            .filter_map(|s| s.last().map(|p| p.timestamp))
            .max()
    }
}

#[async_trait]
impl MetricSource for CloudWatchExport {
    async fn fetch(&self, metric: &str, window: &AnalysisWindow) -> Result<Vec<MetricSample>> {
        Ok(self
            .streams
            .get(metric)
            .map(|samples| {
                samples
                    .iter()
                    .filter(|s| window.contains(s.timestamp))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::io::Write;

    const EXPORT: &str = r#"{
        "Label": "ReadIOPS",
        "Datapoints": [
            {"Timestamp": "2024-03-04T00:02:00+00:00", "Average": 0.0, "Unit": "Count/Second"},
            {"Timestamp": "2024-03-04T00:00:00+00:00", "Average": 12.5, "Unit": "Count/Second"},
            {"Timestamp": "2024-03-04T00:01:00Z", "Maximum": 3.0, "Unit": "Count/Second"},
            {"Timestamp": "2024-03-04T00:03:00Z", "Unit": "Count/Second"}
        ]
    }"#;

    #[test]
    fn test_parse_export() {
        let (name, samples) = CloudWatchExport::parse(EXPORT, None).unwrap();
        assert_eq!(name, "ReadIOPS");
        assert_eq!(samples.len(), 3);
        assert!(samples.iter().any(|s| s.value == 3.0));
    }

    #[test]
    fn test_parse_without_label_uses_fallback() {
        let raw = r#"{"Datapoints": [{"Timestamp": "2024-03-04T00:00:00Z", "Average": 1.0}]}"#;
        let (name, _) = CloudWatchExport::parse(raw, Some("WriteIOPS")).unwrap();
        assert_eq!(name, "WriteIOPS");
        assert!(CloudWatchExport::parse(raw, None).is_err());
    }

    #[test]
    fn test_insert_sorts_and_dedupes() {
        let mut export = CloudWatchExport::default();
        let (name, samples) = CloudWatchExport::parse(EXPORT, None).unwrap();
        export.insert(name.clone(), samples.clone());
        export.insert(name, samples);

        let stream = &export.streams()["ReadIOPS"];
        assert_eq!(stream.len(), 3);
        assert!(stream.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
        assert_eq!(
            export.latest_timestamp(),
            Some(Utc.with_ymd_and_hms(2024, 3, 4, 0, 2, 0).unwrap())
        );
    }

    #[tokio::test]
    async fn test_fetch_filters_window() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", EXPORT).unwrap();
        let export = CloudWatchExport::from_files(&[file.path()]).await.unwrap();

        let start = Utc.with_ymd_and_hms(2024, 3, 4, 0, 1, 0).unwrap();
        let window = AnalysisWindow::new(start, start + chrono::Duration::minutes(5)).unwrap();
        let samples = export.fetch("ReadIOPS", &window).await.unwrap();
        assert_eq!(samples.len(), 2);
        assert!(export.fetch("WriteIOPS", &window).await.unwrap().is_empty());
    }
}
