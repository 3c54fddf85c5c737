//! Configuration management for suitewalk runs.
//!
//! `RunOptions` is what the engine consumes; `Config` loads the ambient
//! settings (default timeout, reporter, colors, log level) from the
//! environment, including an optional `.env` file.

use crate::error::{ConfigError, ConfigResult};
use crate::events::EventEmitter;
use std::env;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// Timeout used when neither the block, its ancestors nor the run declare one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(3000);

/// Options read once at the start of a run.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Global default for blocks that declare no timeout of their own.
    pub timeout: Option<Duration>,

    /// Emitter to report through; a fresh one is created when absent.
    pub emitter: Option<Arc<EventEmitter>>,
}

impl RunOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_emitter(mut self, emitter: Arc<EventEmitter>) -> Self {
        self.emitter = Some(emitter);
        self
    }

    /// Merge a block's declared timeout with the run default and the fallback.
    pub fn resolve_timeout(&self, declared: Option<Duration>) -> Duration {
        declared.or(self.timeout).unwrap_or(DEFAULT_TIMEOUT)
    }
}

/// Output format for run events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReporterKind {
    Console,
    Json,
}

impl FromStr for ReporterKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "console" => Ok(Self::Console),
            "json" => Ok(Self::Json),
            other => Err(format!("Must be \"console\" or \"json\", got: {}", other)),
        }
    }
}

/// Configuration for a suitewalk process.
#[derive(Debug, Clone)]
pub struct Config {
    /// Global default block timeout in milliseconds (default: 3000)
    pub default_timeout_ms: u64,

    /// Reporter used by the runner binary (default: console)
    pub reporter: ReporterKind,

    /// Colorize console output (default: true)
    pub color: bool,

    /// Log level (default: "warn")
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Optional environment variables:
    /// - `SUITEWALK_TIMEOUT_MS`: Default block timeout in milliseconds (default: 3000)
    /// - `SUITEWALK_REPORTER`: `console` or `json` (default: console)
    /// - `SUITEWALK_COLOR`: `true` or `false` (default: true; `NO_COLOR` forces false)
    /// - `LOG_LEVEL`: Logging level (default: "warn")
    pub fn from_env() -> ConfigResult<Self> {
        // Try to load .env file if it exists (but don't fail if it doesn't)
        let _ = dotenvy::dotenv();

        let default_timeout_ms =
            Self::parse_env_u64("SUITEWALK_TIMEOUT_MS", DEFAULT_TIMEOUT.as_millis() as u64)?;
        if default_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                var: "SUITEWALK_TIMEOUT_MS".to_string(),
                reason: "Must be greater than zero".to_string(),
            });
        }

        let reporter = match env::var("SUITEWALK_REPORTER") {
            Ok(val) => val.parse().map_err(|reason| ConfigError::InvalidValue {
                var: "SUITEWALK_REPORTER".to_string(),
                reason,
            })?,
            Err(_) => ReporterKind::Console,
        };

        let color = Self::parse_env_bool("SUITEWALK_COLOR", true)? && env::var_os("NO_COLOR").is_none();

        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "warn".to_string());

        Ok(Config {
            default_timeout_ms,
            reporter,
            color,
            log_level,
        })
    }

    /// Run options carrying the configured default timeout.
    pub fn run_options(&self) -> RunOptions {
        RunOptions::new().with_timeout(Duration::from_millis(self.default_timeout_ms))
    }

    /// Parse an environment variable as u64 with a default value.
    fn parse_env_u64(var_name: &str, default: u64) -> ConfigResult<u64> {
        match env::var(var_name) {
            Ok(val) => val.parse::<u64>().map_err(|_| ConfigError::InvalidValue {
                var: var_name.to_string(),
                reason: format!("Must be a positive number, got: {}", val),
            }),
            Err(_) => Ok(default),
        }
    }

    /// Parse an environment variable as bool with a default value.
    fn parse_env_bool(var_name: &str, default: bool) -> ConfigResult<bool> {
        match env::var(var_name) {
            Ok(val) => match val.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => Ok(true),
                "0" | "false" | "no" => Ok(false),
                _ => Err(ConfigError::InvalidValue {
                    var: var_name.to_string(),
                    reason: format!("Must be true or false, got: {}", val),
                }),
            },
            Err(_) => Ok(default),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            default_timeout_ms: DEFAULT_TIMEOUT.as_millis() as u64,
            reporter: ReporterKind::Console,
            color: true,
            log_level: "warn".to_string(),
        }
    }
}
