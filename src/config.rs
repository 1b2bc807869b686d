//! Configuration management for DMChain

use crate::codec::DEFAULT_PREFIX;
use crate::engine::MAX_BLOCK_RATE;
use crate::error::ChainError;
use serde::Deserialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub node: NodeConfig,
    #[serde(default)]
    pub instrumentation: InstrumentationConfig,
    #[serde(default)]
    pub ingestor: IngestorConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NodeConfig {
    #[serde(default = "default_store_dir")]
    pub store_dir: PathBuf,
    /// Blocks per second.
    #[serde(default = "default_block_rate")]
    pub block_rate: u32,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            store_dir: default_store_dir(),
            block_rate: default_block_rate(),
            log_level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct InstrumentationConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_prefix")]
    pub prefix: String,
}

impl Default for InstrumentationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            prefix: default_prefix(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct IngestorConfig {
    #[serde(default = "default_prefix")]
    pub prefix: String,
    /// Read every matching file here instead of stdin.
    #[serde(default)]
    pub logs_dir: Option<PathBuf>,
    #[serde(default = "default_logs_pattern")]
    pub logs_pattern: String,
    #[serde(default = "default_line_buffer")]
    pub line_buffer: usize,
}

impl Default for IngestorConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            logs_dir: None,
            logs_pattern: default_logs_pattern(),
            line_buffer: default_line_buffer(),
        }
    }
}

fn default_store_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_block_rate() -> u32 {
    1
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_prefix() -> String {
    DEFAULT_PREFIX.to_string()
}

fn default_logs_pattern() -> String {
    ".log".to_string()
}

fn default_line_buffer() -> usize {
    1
}

/// Loads `path`, falling back to defaults when the file does not exist.
pub fn load_config(path: impl AsRef<Path>) -> Result<Config, ChainError> {
    let config: Config = match fs::read_to_string(path.as_ref()) {
        Ok(config_str) => toml::from_str(&config_str)?,
        Err(e) if e.kind() == ErrorKind::NotFound => Config::default(),
        Err(e) => return Err(e.into()),
    };

    config.validate()?;
    Ok(config)
}

impl Config {
    pub fn validate(&self) -> Result<(), ChainError> {
        if self.node.block_rate == 0 || self.node.block_rate > MAX_BLOCK_RATE {
            return Err(ChainError::ConfigError(format!(
                "node.block_rate must be between 1 and {}, got {}",
                MAX_BLOCK_RATE, self.node.block_rate
            )));
        }

        if self.node.store_dir.as_os_str().is_empty() {
            return Err(ChainError::ConfigError(
                "node.store_dir must be set".to_string(),
            ));
        }

        validate_prefix("instrumentation.prefix", &self.instrumentation.prefix)?;
        validate_prefix("ingestor.prefix", &self.ingestor.prefix)?;

        if self.ingestor.line_buffer == 0 {
            return Err(ChainError::ConfigError(
                "ingestor.line_buffer must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

fn validate_prefix(field: &str, prefix: &str) -> Result<(), ChainError> {
    if prefix.is_empty() || prefix.contains(char::is_whitespace) {
        return Err(ChainError::ConfigError(format!(
            "{} must be a single non-empty token, got {:?}",
            field, prefix
        )));
    }
    Ok(())
}
