//! Configuration management for the price predictor

use anyhow::{Context, Result};
use config::{Config, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default configuration file location
pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub artifacts: ArtifactsConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Locations of the pre-trained artifacts
#[derive(Debug, Clone, Deserialize)]
pub struct ArtifactsConfig {
    /// Directory relative artifact paths are resolved against
    pub models_dir: String,
    /// Linear regression model file
    pub linear_model: String,
    /// Decision tree model file
    pub tree_model: String,
    /// Ordered training column list
    pub columns: String,
    /// Number of intra-op threads for ONNX sessions
    #[serde(default = "default_onnx_threads")]
    pub onnx_threads: usize,
}

fn default_onnx_threads() -> usize {
    1
}

impl ArtifactsConfig {
    /// Resolve an artifact file name against `models_dir`
    pub fn resolve(&self, file: &str) -> PathBuf {
        let path = Path::new(file);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            Path::new(&self.models_dir).join(path)
        }
    }

    pub fn linear_model_path(&self) -> PathBuf {
        self.resolve(&self.linear_model)
    }

    pub fn tree_model_path(&self) -> PathBuf {
        self.resolve(&self.tree_model)
    }

    pub fn columns_path(&self) -> PathBuf {
        self.resolve(&self.columns)
    }
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            models_dir: "models".to_string(),
            linear_model: "linear_regression_model.json".to_string(),
            tree_model: "decision_tree_model.json".to_string(),
            columns: "xtrain_columns.json".to_string(),
            onnx_threads: 1,
        }
    }
}

/// Output formatting
#[derive(Debug, Clone, Deserialize)]
pub struct DisplayConfig {
    /// Symbol prefixed to predicted prices
    pub currency_symbol: String,
    /// Decimal places in displayed prices
    pub decimals: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            currency_symbol: "₹".to_string(),
            decimals: 2,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default file, falling back to built-in
    /// defaults when it does not exist
    pub fn load() -> Result<Self> {
        if Path::new(DEFAULT_CONFIG_PATH).exists() {
            Self::load_from_path(DEFAULT_CONFIG_PATH)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}
