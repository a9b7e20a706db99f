//! Configuration for cellwire
//!
//! Centralized client configuration with sensible defaults.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::diagnostics::LogLevel;
use crate::error::{CellwireError, Result};
use crate::protocol::MAX_ARGS;

/// Default function server port
pub const DEFAULT_PORT: u16 = 5000;

/// Default receive timeout (seconds); long enough for slow functions,
/// short enough that the calculation thread is never stuck for good
pub const DEFAULT_TIMEOUT_SECS: u64 = 500;

/// Default per-call argument ceiling
pub const DEFAULT_MAX_ARGS: usize = 30;

/// Main configuration for a protocol client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    // -------------------------------------------------------------------------
    // Endpoint
    // -------------------------------------------------------------------------
    /// Function server host name or numeric address
    pub host: String,

    /// Function server TCP port
    pub port: u16,

    /// Receive timeout; also bounds each dial attempt
    pub timeout: Duration,

    // -------------------------------------------------------------------------
    // Calls
    // -------------------------------------------------------------------------
    /// Maximum arguments per call (at most `MAX_ARGS`)
    pub max_args: usize,

    // -------------------------------------------------------------------------
    // Diagnostics
    // -------------------------------------------------------------------------
    pub log_level: LogLevel,

    /// Write log lines here instead of stderr
    pub log_file: Option<PathBuf>,

    /// Truncate `log_file` on open rather than appending
    pub log_overwrite: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_args: DEFAULT_MAX_ARGS,
            log_level: LogLevel::Info,
            log_file: None,
            log_overwrite: false,
        }
    }
}

/// On-disk settings; every key is optional
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    host: Option<String>,
    port: Option<u16>,
    timeout_secs: Option<u64>,
    log_level: Option<String>,
    max_args: Option<usize>,
    log_file: Option<PathBuf>,
    log_overwrite: Option<bool>,
}

impl ClientConfig {
    /// Create a new config builder
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Parse settings from TOML text, filling gaps with defaults
    pub fn from_toml(input: &str) -> Result<Self> {
        let file: ConfigFile =
            toml::from_str(input).map_err(|e| CellwireError::Config(e.to_string()))?;

        let mut builder = Self::builder();
        if let Some(host) = file.host {
            builder = builder.host(host);
        }
        if let Some(port) = file.port {
            builder = builder.port(port);
        }
        if let Some(secs) = file.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        if let Some(level) = file.log_level {
            builder = builder.log_level(LogLevel::parse_lenient(&level));
        }
        if let Some(max) = file.max_args {
            builder = builder.max_args(max);
        }
        if let Some(path) = file.log_file {
            builder = builder.log_file(path);
        }
        if let Some(overwrite) = file.log_overwrite {
            builder = builder.log_overwrite(overwrite);
        }

        let config = builder.build();
        config.validate()?;
        Ok(config)
    }

    /// Load settings from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            CellwireError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(CellwireError::Config("host must not be empty".into()));
        }
        if self.port == 0 {
            return Err(CellwireError::Config("port must be non-zero".into()));
        }
        if self.timeout.is_zero() {
            return Err(CellwireError::Config("timeout must be non-zero".into()));
        }
        if self.max_args > MAX_ARGS {
            return Err(CellwireError::Config(format!(
                "max_args {} exceeds the frame limit of {}",
                self.max_args, MAX_ARGS
            )));
        }
        Ok(())
    }

    /// Open the configured log file, or `None` when logging to stderr
    pub fn open_log_file(&self) -> Result<Option<File>> {
        let Some(path) = self.log_file.as_ref() else {
            return Ok(None);
        };

        let mut options = OpenOptions::new();
        options.create(true);
        if self.log_overwrite {
            options.write(true).truncate(true);
        } else {
            options.append(true);
        }

        options.open(path).map(Some).map_err(|e| {
            CellwireError::Config(format!("cannot open log file {}: {}", path.display(), e))
        })
    }

    /// `host:port` for log lines
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Builder for ClientConfig
#[derive(Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Set the receive timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the per-call argument ceiling
    pub fn max_args(mut self, max: usize) -> Self {
        self.config.max_args = max;
        self
    }

    pub fn log_level(mut self, level: LogLevel) -> Self {
        self.config.log_level = level;
        self
    }

    pub fn log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.log_file = Some(path.into());
        self
    }

    pub fn log_overwrite(mut self, overwrite: bool) -> Self {
        self.config.log_overwrite = overwrite;
        self
    }

    pub fn build(self) -> ClientConfig {
        self.config
    }
}
