use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;

use crate::analysis::filter::MatchMode;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub monitoring: MonitoringConfig,
    #[serde(default)]
    pub sections: Vec<SectionConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_domain")]
    pub domain: String,
    #[serde(default = "default_dataset_id")]
    pub dataset_id: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_row_limit")]
    pub row_limit: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub match_mode: MatchMode,
    #[serde(default = "default_skip_malformed")]
    pub skip_malformed: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitoringConfig {
    #[serde(default)]
    pub csv_logging: bool,
    #[serde(default = "default_csv_log_path")]
    pub csv_log_path: String,
    #[serde(default)]
    pub json_output_path: Option<String>,
}

/// A named dashboard section, e.g. "Forex", listing the instruments it shows.
#[derive(Debug, Clone, Deserialize)]
pub struct SectionConfig {
    pub name: String,
    #[serde(default)]
    pub assets: Vec<AssetConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssetConfig {
    pub source_id: String,
    #[serde(default)]
    pub label: Option<String>,
}

impl AssetConfig {
    /// Short label shown on the dashboard. Falls back to the part of the
    /// identifier before the exchange name ("GOLD - COMMODITY EXCHANGE INC." -> "GOLD").
    pub fn display_label(&self) -> &str {
        match &self.label {
            Some(label) => label.as_str(),
            None => self
                .source_id
                .split(" -")
                .next()
                .unwrap_or(&self.source_id),
        }
    }
}

fn default_domain() -> String { "publicreporting.cftc.gov".to_string() }
fn default_dataset_id() -> String { "6dca-aqww".to_string() }
fn default_timeout_secs() -> u64 { 30 }
fn default_row_limit() -> usize { 5000 }
fn default_skip_malformed() -> bool { true }
fn default_csv_log_path() -> String { "cot_changes.csv".to_string() }

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            domain: default_domain(),
            dataset_id: default_dataset_id(),
            timeout_secs: default_timeout_secs(),
            row_limit: default_row_limit(),
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            match_mode: MatchMode::default(),
            skip_malformed: default_skip_malformed(),
        }
    }
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            csv_logging: false,
            csv_log_path: default_csv_log_path(),
            json_output_path: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EnvConfig {
    pub app_token: Option<String>,
    pub source_domain: Option<String>,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        Self::parse(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path))
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        Ok(config)
    }
}

impl EnvConfig {
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();

        Ok(Self {
            app_token: std::env::var("SODAPY_TOKEN")
                .ok()
                .filter(|token| !token.trim().is_empty()),
            source_domain: std::env::var("COT_SOURCE_DOMAIN").ok(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config = Config::parse(
            r#"
            [source]
            domain = "example.org"
            dataset_id = "abcd-1234"
            timeout_secs = 5

            [analysis]
            match_mode = "substring"
            skip_malformed = false

            [monitoring]
            csv_logging = true
            csv_log_path = "out.csv"

            [[sections]]
            name = "Commodities"

            [[sections.assets]]
            source_id = "GOLD - COMMODITY EXCHANGE INC."

            [[sections.assets]]
            source_id = "WTI FINANCIAL CRUDE OIL - NEW YORK MERCANTILE EXCHANGE"
            label = "WTI"
            "#,
        )
        .unwrap();

        assert_eq!(config.source.domain, "example.org");
        assert_eq!(config.source.timeout_secs, 5);
        assert_eq!(config.source.row_limit, 5000);
        assert_eq!(config.analysis.match_mode, MatchMode::Substring);
        assert!(!config.analysis.skip_malformed);
        assert!(config.monitoring.csv_logging);
        assert!(config.monitoring.json_output_path.is_none());

        let assets = &config.sections[0].assets;
        assert_eq!(config.sections[0].name, "Commodities");
        assert_eq!(assets[0].display_label(), "GOLD");
        assert_eq!(assets[1].display_label(), "WTI");
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::parse("").unwrap();

        assert_eq!(config.source.domain, "publicreporting.cftc.gov");
        assert_eq!(config.source.dataset_id, "6dca-aqww");
        assert_eq!(config.analysis.match_mode, MatchMode::Exact);
        assert!(config.analysis.skip_malformed);
        assert!(config.sections.is_empty());
        assert_eq!(config.monitoring.csv_log_path, "cot_changes.csv");
    }

    #[test]
    fn test_display_label_without_exchange() {
        let asset = AssetConfig {
            source_id: "GOLD".to_string(),
            label: None,
        };
        assert_eq!(asset.display_label(), "GOLD");
    }
}
