//! Configuration loading and resolution
//!
//! Config file resolution follows this priority order:
//! 1. Command-line argument (highest priority)
//! 2. `CUTKIT_CONFIG` environment variable
//! 3. Platform config directory (`<config_dir>/cutkit/config.toml`)
//! 4. Compiled defaults (fallback)
//!
//! A missing config file is never fatal: resolution logs a warning and
//! continues with defaults. A file that exists but fails to parse is an error.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "CUTKIT_CONFIG";

/// Default template for per-segment output names
pub const DEFAULT_OUT_SEG_TEMPLATE: &str = "${FILENAME}-${CUT_FROM}-${CUT_TO}${SEG_SUFFIX}${EXT}";

/// Default template for merged output names
pub const DEFAULT_MERGED_FILE_TEMPLATE: &str = "${FILENAME}-merged-${EPOCH_MS}${EXT}";

/// Top-level TOML configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Output naming preferences (optional)
    #[serde(default)]
    pub export: ExportConfig,

    /// Retry policy for file mutations (optional)
    #[serde(default)]
    pub retry: RetryConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Output naming preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Template for per-segment output names
    #[serde(default = "default_out_seg_template")]
    pub out_seg_template: String,

    /// Template for merged output names
    #[serde(default = "default_merged_file_template")]
    pub merged_file_template: String,

    /// Replace unsafe characters in generated names
    #[serde(default = "default_true")]
    pub safe_output_file_name: bool,

    /// Minimum width of zero-padded segment numbers
    #[serde(default = "default_min_zero_padding")]
    pub min_zero_padding: usize,

    /// Apply Windows-only name checks on every platform
    #[serde(default)]
    pub dev_mode: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            out_seg_template: default_out_seg_template(),
            merged_file_template: default_merged_file_template(),
            safe_output_file_name: true,
            min_zero_padding: default_min_zero_padding(),
            dev_mode: false,
        }
    }
}

/// Retry policy for file mutations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of retries after the first attempt
    #[serde(default = "default_retries")]
    pub retries: u32,

    /// First backoff delay
    #[serde(default = "default_min_delay_ms")]
    pub min_delay_ms: u64,

    /// Backoff ceiling
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            retries: default_retries(),
            min_delay_ms: default_min_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_out_seg_template() -> String {
    DEFAULT_OUT_SEG_TEMPLATE.to_string()
}

fn default_merged_file_template() -> String {
    DEFAULT_MERGED_FILE_TEMPLATE.to_string()
}

fn default_true() -> bool {
    true
}

fn default_min_zero_padding() -> usize {
    1
}

fn default_retries() -> u32 {
    10
}

fn default_min_delay_ms() -> u64 {
    100
}

fn default_max_delay_ms() -> u64 {
    2000
}

impl TomlConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TomlConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Reject values that can never produce a working export
    pub fn validate(&self) -> Result<()> {
        if self.export.out_seg_template.trim().is_empty() {
            return Err(Error::Config("export.out_seg_template must not be empty".to_string()));
        }
        if self.export.merged_file_template.trim().is_empty() {
            return Err(Error::Config(
                "export.merged_file_template must not be empty".to_string(),
            ));
        }
        if self.retry.min_delay_ms > self.retry.max_delay_ms {
            return Err(Error::Config(format!(
                "retry.min_delay_ms ({}) exceeds retry.max_delay_ms ({})",
                self.retry.min_delay_ms, self.retry.max_delay_ms
            )));
        }
        Ok(())
    }
}

/// Resolves which config file to load
pub struct ConfigResolver {
    cli_path: Option<PathBuf>,
}

impl ConfigResolver {
    /// Create resolver with an optional command-line override
    pub fn new(cli_path: Option<PathBuf>) -> Self {
        Self { cli_path }
    }

    /// Locate the config file to use, if any
    pub fn locate(&self) -> Option<PathBuf> {
        // Priority 1: Command-line argument
        if let Some(path) = &self.cli_path {
            return Some(path.clone());
        }

        // Priority 2: Environment variable
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            if !path.trim().is_empty() {
                return Some(PathBuf::from(path));
            }
        }

        // Priority 3: Platform config directory
        default_config_path().filter(|p| p.exists())
    }

    /// Resolve configuration, falling back to compiled defaults
    pub fn resolve(&self) -> Result<TomlConfig> {
        let Some(path) = self.locate() else {
            info!("No config file found, using compiled defaults");
            return Ok(TomlConfig::default());
        };

        if !path.exists() {
            warn!(path = %path.display(), "Config file not found, using compiled defaults");
            return Ok(TomlConfig::default());
        }

        info!(path = %path.display(), "Loading config file");
        TomlConfig::load(&path)
    }
}

/// Platform config file path (`~/.config/cutkit/config.toml` on Linux)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("cutkit").join("config.toml"))
}
