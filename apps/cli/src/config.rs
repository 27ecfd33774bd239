//! Process-level configuration for the `enbu-flow` binary. Distinct from a
//! flow's own `env:` document and dotenv precedence chain — this is
//! configuration for the CLI process itself: log level, default timeouts,
//! and where to find the browser CLI binary.

use std::env;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct Config {
    /// Overrides the browser CLI binary name/path the adapter invokes.
    pub browser_cli: String,
    /// Default per-command timeout, used unless overridden on the CLI.
    pub default_command_timeout: Duration,
    /// Default auto-wait timeout, used unless overridden on the CLI.
    pub default_auto_wait_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Config {
            browser_cli: env::var("ENBU_BROWSER_CLI").unwrap_or_else(|_| "agent-browser".to_string()),
            default_command_timeout: Duration::from_millis(
                env::var("ENBU_COMMAND_TIMEOUT_MS")
                    .unwrap_or_else(|_| "30000".to_string())
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue("ENBU_COMMAND_TIMEOUT_MS".to_string()))?,
            ),
            default_auto_wait_timeout: Duration::from_millis(
                env::var("ENBU_AUTO_WAIT_TIMEOUT_MS")
                    .unwrap_or_else(|_| "5000".to_string())
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue("ENBU_AUTO_WAIT_TIMEOUT_MS".to_string()))?,
            ),
        })
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidValue(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidValue(var) => write!(f, "invalid value for: {}", var),
        }
    }
}

impl std::error::Error for ConfigError {}
