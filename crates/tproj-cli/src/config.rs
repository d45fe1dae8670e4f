//! `tproj.toml` settings.
//!
//! ```toml
//! [xml]
//! indent_width = 2
//! declaration = true
//!
//! [logging]
//! level = "info"
//! format = "compact"
//! file = "tproj.log"
//! timestamps = true
//! target = false
//! ```
//!
//! Every key is optional. Command line flags win over the file.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tproj_xml::{DEFAULT_INDENT, WriteOptions};
use tracing::level_filters::LevelFilter;

use crate::logging::{LogConfig, LogFormat};

/// Looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "tproj.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    pub xml: XmlConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct XmlConfig {
    pub indent_width: usize,
    pub declaration: bool,
}

impl Default for XmlConfig {
    fn default() -> Self {
        Self {
            indent_width: DEFAULT_INDENT,
            declaration: true,
        }
    }
}

impl XmlConfig {
    pub fn write_options(&self) -> WriteOptions {
        WriteOptions {
            indent_width: self.indent_width,
            declaration: self.declaration,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub level: Option<LogLevel>,
    pub format: Option<LogFormat>,
    pub file: Option<PathBuf>,
    pub timestamps: bool,
    /// Print module paths with each event.
    pub target: bool,
}

impl LoggingConfig {
    /// Logging setup described by the file alone.
    ///
    /// Without a `level`, `RUST_LOG` still decides.
    pub fn to_log_config(&self) -> LogConfig {
        let log_config = LogConfig::default()
            .with_format(self.format.unwrap_or_default())
            .with_log_file(self.file.clone())
            .with_timestamps(self.timestamps)
            .with_target(self.target);
        match self.level {
            Some(level) => log_config.with_level(level.into()),
            None => log_config,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::OFF,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

impl CliConfig {
    /// Load settings.
    ///
    /// An explicit path must exist. Without one, `tproj.toml` in the working
    /// directory is used when present and defaults otherwise.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    Self::from_file(path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        Self::parse(&contents).with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }
}
