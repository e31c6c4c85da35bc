use anyhow::{Context, Result};
use serde::Deserialize;

use crate::record::{NormalizeOptions, TimestampUnit, TripField};
use crate::stats::Statistic;

/// Report defaults, stored as a JSON object on disk:
/// ```json
/// {
///   "source": "data/taxi.json",
///   "timestamp_unit": "auto",
///   "hour_start": 6,
///   "zero_fill": true,
///   "fields": ["trip_distance", "fare_amount", "tip_amount"],
///   "statistics": ["mean", "median", "std_dev"]
/// }
/// ```
/// Every key is optional; command-line flags take precedence.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportConfig {
    pub source: Option<String>,
    pub timestamp_unit: TimestampUnit,
    /// First hour in hour-grouped output; `None` keeps 0..23.
    pub hour_start: Option<u32>,
    pub zero_fill: bool,
    pub fields: Vec<TripField>,
    pub statistics: Vec<Statistic>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            source: None,
            timestamp_unit: TimestampUnit::Auto,
            hour_start: None,
            zero_fill: false,
            fields: TripField::HEADLINE.to_vec(),
            statistics: vec![
                Statistic::Mean,
                Statistic::Median,
                Statistic::StdDev,
                Statistic::Range,
                Statistic::CoefficientOfVariation,
            ],
        }
    }
}

impl ReportConfig {
    /// Loads the config from a JSON file at `path`.
    pub fn load(path: &str) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).with_context(|| format!("failed to read config {path}"))?;
        Self::from_json(&content).with_context(|| format!("invalid config {path}"))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn normalize_options(&self) -> NormalizeOptions {
        NormalizeOptions {
            timestamp_unit: self.timestamp_unit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_uses_defaults() {
        let config = ReportConfig::from_json("{}").unwrap();
        assert_eq!(config, ReportConfig::default());
    }

    #[test]
    fn test_full_config() {
        let config = ReportConfig::from_json(
            r#"{
                "source": "https://example.com/taxi.json.gz",
                "timestamp_unit": "seconds",
                "hour_start": 6,
                "zero_fill": true,
                "fields": ["tip_amount"],
                "statistics": ["count", "coefficient_of_variation"]
            }"#,
        )
        .unwrap();

        assert_eq!(config.source.as_deref(), Some("https://example.com/taxi.json.gz"));
        assert_eq!(config.normalize_options().timestamp_unit, TimestampUnit::Seconds);
        assert_eq!(config.hour_start, Some(6));
        assert!(config.zero_fill);
        assert_eq!(config.fields, vec![TripField::TipAmount]);
        assert_eq!(
            config.statistics,
            vec![Statistic::Count, Statistic::CoefficientOfVariation]
        );
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(ReportConfig::from_json(r#"{"colour": "green"}"#).is_err());
    }

    #[test]
    fn test_missing_file() {
        assert!(ReportConfig::load("/nonexistent/report.json").is_err());
    }
}
