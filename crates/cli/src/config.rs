use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use stockanalyser_core::Portfolio;
use stockanalyser_data::{yahoo::DEFAULT_BASE_URL, YahooConfig};
use stockanalyser_engine::{AnalysisConfig, IndicatorConfig};

/// Application settings loaded from an optional TOML file.
///
/// Every section and field falls back to its default, so an empty file
/// (or no file at all) analyses the DIAMOND portfolio over two days.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Named portfolios; the first one is used unless another is selected.
    pub portfolios: Vec<Portfolio>,
    pub analysis: AnalysisConfig,
    pub indicators: IndicatorConfig,
    pub provider: ProviderSettings,
}

/// HTTP settings for the Yahoo chart provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub base_url: String,
    pub timeout_secs: u64,
    pub user_agent: Option<String>,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 10,
            user_agent: None,
        }
    }
}

impl ProviderSettings {
    pub fn yahoo_config(&self) -> YahooConfig {
        let defaults = YahooConfig::default();
        YahooConfig {
            base_url: self.base_url.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
            user_agent: self.user_agent.clone().unwrap_or(defaults.user_agent),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            portfolios: vec![Portfolio::diamond()],
            analysis: AnalysisConfig::default(),
            indicators: IndicatorConfig::default(),
            provider: ProviderSettings::default(),
        }
    }
}

impl AppConfig {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml(&raw).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        if config.portfolios.is_empty() {
            anyhow::bail!("No portfolios configured");
        }
        for portfolio in &config.portfolios {
            if portfolio.is_empty() {
                anyhow::bail!("Portfolio '{}' has no holdings", portfolio.name);
            }
        }
        Ok(config)
    }

    /// The portfolio named `name` (case-insensitive), or the first one.
    pub fn portfolio(&self, name: Option<&str>) -> Result<&Portfolio> {
        let Some(name) = name else {
            return self
                .portfolios
                .first()
                .context("No portfolios configured");
        };
        self.portfolios
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
            .with_context(|| {
                let known: Vec<&str> = self.portfolios.iter().map(|p| p.name.as_str()).collect();
                format!("Unknown portfolio '{}' (configured: {})", name, known.join(", "))
            })
    }
}
