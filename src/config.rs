use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use retrosniffer::platform::{is_valid_threshold, DEFAULT_THRESHOLD};

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub datasets: DatasetsConfig,
    #[serde(default)]
    pub matching: MatchingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct DatasetsConfig {
    /// Directory holding the catalog files.
    #[serde(default)]
    pub dir: Option<PathBuf>,
    /// Alias table; the embedded table is used when unset.
    #[serde(default)]
    pub aliases: Option<PathBuf>,
    /// Platform label -> catalog file, relative to `dir`.
    #[serde(default)]
    pub catalogs: BTreeMap<String, PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MatchingConfig {
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            limit: default_limit(),
        }
    }
}

fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}

fn default_limit() -> usize {
    1
}

impl Config {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("retrosniffer").join("config.toml"))
    }

    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;

        Self::parse(&content).with_context(|| format!("Invalid config: {}", path.display()))
    }

    fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse config.toml")?;
        if !is_valid_threshold(config.matching.threshold) {
            anyhow::bail!(
                "matching.threshold must be between 0 and 100, got {}",
                config.matching.threshold
            );
        }
        Ok(config)
    }

    /// Configured datasets directory, else `<data dir>/retrosniffer/datasets`.
    pub fn datasets_dir(&self) -> PathBuf {
        self.datasets
            .dir
            .clone()
            .or_else(|| dirs::data_dir().map(|p| p.join("retrosniffer").join("datasets")))
            .unwrap_or_else(|| PathBuf::from("datasets"))
    }
}
