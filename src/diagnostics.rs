//! Diagnostics
//!
//! Leveled log lines plus a "last error" slot the host can query after a
//! failed call. The protocol client only reports here, it never branches
//! on anything stored here.

use std::fmt;
use std::str::FromStr;

use parking_lot::Mutex;

use crate::error::CellwireError;

/// Log severity, ordered `Info < Warning < Error < None`
///
/// `None` as a threshold disables everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum LogLevel {
    #[default]
    Info,
    Warning,
    Error,
    None,
}

impl LogLevel {
    /// Parse a level name, falling back to `Info` for anything unknown
    pub fn parse_lenient(s: &str) -> Self {
        s.parse().unwrap_or_else(|_| {
            tracing::warn!("log level {:?} unrecognized, using info", s);
            LogLevel::Info
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Info => "info",
            LogLevel::Warning => "warning",
            LogLevel::Error => "error",
            LogLevel::None => "none",
        }
    }
}

impl FromStr for LogLevel {
    type Err = CellwireError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "info" => Ok(LogLevel::Info),
            "warning" | "warn" => Ok(LogLevel::Warning),
            "error" | "err" => Ok(LogLevel::Error),
            "none" => Ok(LogLevel::None),
            _ => Err(CellwireError::Config(format!("unknown log level: {}", s))),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sink for human-readable failure reports
pub trait Diagnostics: Send + Sync {
    fn log(&self, level: LogLevel, message: &str);

    /// Record `message` as the most recent error (and log it)
    fn set_last_error(&self, message: &str);

    fn last_error(&self) -> Option<String>;
}

/// [`Diagnostics`] backed by `tracing`, gated by a threshold
#[derive(Debug, Default)]
pub struct TracingDiagnostics {
    threshold: LogLevel,
    last_error: Mutex<Option<String>>,
}

impl TracingDiagnostics {
    pub fn new(threshold: LogLevel) -> Self {
        Self {
            threshold,
            last_error: Mutex::new(None),
        }
    }

    pub fn threshold(&self) -> LogLevel {
        self.threshold
    }

    /// Whether a message at `level` passes the threshold
    pub fn enabled(&self, level: LogLevel) -> bool {
        level != LogLevel::None && level >= self.threshold
    }

    pub fn clear_last_error(&self) {
        *self.last_error.lock() = None;
    }
}

impl Diagnostics for TracingDiagnostics {
    fn log(&self, level: LogLevel, message: &str) {
        if !self.enabled(level) {
            return;
        }
        match level {
            LogLevel::Info => tracing::info!("{}", message),
            LogLevel::Warning => tracing::warn!("{}", message),
            LogLevel::Error => tracing::error!("{}", message),
            LogLevel::None => {}
        }
    }

    fn set_last_error(&self, message: &str) {
        self.log(LogLevel::Error, message);
        *self.last_error.lock() = Some(message.to_string());
    }

    fn last_error(&self) -> Option<String> {
        self.last_error.lock().clone()
    }
}
