//! Configuration loading and parsing

use anyhow::{Context, Result};
use hires_log_engine::ReferenceData;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Built-in reference tables (Indiana hi-res event codes)
pub const DEFAULT_REFERENCE: &str = include_str!("../reference/default.toml");

/// Main application configuration (loaded from config.toml)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub reference: ReferenceConfig,
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct InputConfig {
    /// Explicit log files; takes precedence over directory discovery
    #[serde(default)]
    pub files: Vec<PathBuf>,
    /// Root directory holding one sub-directory per site
    pub dir: Option<PathBuf>,
    pub site: Option<String>,
    /// Date of the first file, `YYYY-MM-DD` or `YYYY/MM/DD`
    pub date: Option<String>,
    /// Start hour as `HHMM` (default `0000`)
    pub time: Option<String>,
    /// Number of hourly files to read (default: all remaining)
    pub hours: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ReferenceConfig {
    /// Reference tables file; the built-in table is used when absent
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct WindowConfig {
    pub start: Option<chrono::NaiveDateTime>,
    pub end: Option<chrono::NaiveDateTime>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
    /// Output file (default: stdout)
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Full engine output: intervals, flash periods, annotated records
    #[default]
    Json,
    /// Interval table, one row per interval or single event
    Csv,
    /// Human readable summary
    Txt,
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    Ok(config)
}

/// Load reference tables from a TOML file, or the built-in table
pub fn load_reference(path: Option<&Path>) -> Result<ReferenceData> {
    let reference: ReferenceData = match path {
        Some(path) => {
            log::info!("Loading reference tables: {:?}", path);
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read reference file: {:?}", path))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse reference file: {:?}", path))?
        }
        None => {
            log::debug!("Using built-in reference tables");
            toml::from_str(DEFAULT_REFERENCE).context("Failed to parse built-in reference tables")?
        }
    };

    reference.validate().context("Invalid reference tables")?;
    Ok(reference)
}
