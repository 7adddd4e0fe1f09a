use crate::core::engine::{RatingPolicy, ScoringPolicy};
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

/// A named list of ticker symbols to screen as a batch.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Universe {
    pub name: String,
    pub symbols: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct YahooProviderConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProvidersConfig {
    pub yahoo: Option<YahooProviderConfig>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            yahoo: Some(YahooProviderConfig {
                base_url: "https://query1.finance.yahoo.com".to_string(),
            }),
        }
    }
}

/// Valuation assumptions, overridable per install. Defaults match the
/// screener's shipped constants.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PolicyConfig {
    #[serde(default = "default_growth_rate")]
    pub expected_growth_rate: f64,
    #[serde(default = "default_bond_yield")]
    pub corporate_bond_yield: f64,
    #[serde(default = "default_tax_rate")]
    pub default_tax_rate: f64,
    #[serde(default)]
    pub rating: RatingPolicy,
}

fn default_growth_rate() -> f64 {
    8.0
}

fn default_bond_yield() -> f64 {
    4.6
}

fn default_tax_rate() -> f64 {
    0.21
}

impl Default for PolicyConfig {
    fn default() -> Self {
        PolicyConfig {
            expected_growth_rate: default_growth_rate(),
            corporate_bond_yield: default_bond_yield(),
            default_tax_rate: default_tax_rate(),
            rating: RatingPolicy::default(),
        }
    }
}

impl PolicyConfig {
    pub fn scoring_policy(&self) -> ScoringPolicy {
        ScoringPolicy {
            expected_growth_rate: self.expected_growth_rate,
            corporate_bond_yield: self.corporate_bond_yield,
            default_tax_rate: self.default_tax_rate,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    pub universes: Vec<Universe>,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub policy: PolicyConfig,
    pub data_path: Option<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("in", "codito", "ival")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn default_data_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = ProjectDirs::from("in", "codito", "ival")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    /// Finds a universe by name, case-insensitively.
    pub fn universe(&self, name: &str) -> Option<&Universe> {
        self.universes
            .iter()
            .find(|u| u.name.eq_ignore_ascii_case(name))
    }
}
