//! Server configuration management
//!
//! Handles loading configuration from environment variables, TOML files, and CLI arguments.

use prng_core::Limits;
use serde::Deserialize;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// Environment variable names, shared by `from_env` and `build_config`.
pub const ENV_HOST: &str = "PRNG_SERVER_HOST";
pub const ENV_PORT: &str = "PRNG_SERVER_PORT";
pub const ENV_LOG_LEVEL: &str = "PRNG_LOG_LEVEL";
pub const ENV_ENVIRONMENT: &str = "PRNG_ENV";
pub const ENV_MAX_COUNT: &str = "PRNG_MAX_COUNT";
pub const ENV_MAX_ITERATIONS: &str = "PRNG_MAX_ITERATIONS";
pub const ENV_MAX_PAIRS: &str = "PRNG_MAX_PAIRS";
pub const ENV_SHUTDOWN_TIMEOUT_SECS: &str = "PRNG_SHUTDOWN_TIMEOUT_SECS";

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid port number: {0}. Must be between 1 and 65535")]
    InvalidPort(u16),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid environment: {0}. Must be one of: development, staging, production")]
    InvalidEnvironment(String),

    #[error("Invalid limit {name}: must be positive")]
    InvalidLimit { name: &'static str },

    #[error("Configuration file error: {0}")]
    FileError(String),

    #[error("Environment variable error: {0}")]
    EnvError(String),
}

/// Log levels supported by the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl std::str::FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(ConfigError::InvalidLogLevel(s.to_string())),
        }
    }
}

impl LogLevel {
    /// Convert log level to tracing filter string
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_filter_str())
    }
}

/// Environment types for configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl std::str::FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "staging" | "stage" => Ok(Environment::Staging),
            "production" | "prod" => Ok(Environment::Production),
            _ => Err(ConfigError::InvalidEnvironment(s.to_string())),
        }
    }
}

impl Environment {
    /// Production logs are emitted as JSON lines
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Staging => write!(f, "staging"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Server configuration structure
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Log level
    #[serde(deserialize_with = "deserialize_log_level")]
    pub log_level: LogLevel,
    /// Seconds in-flight requests are given to finish after Ctrl-C
    pub shutdown_timeout_secs: u64,
    /// Environment (development, staging, production)
    #[serde(deserialize_with = "deserialize_environment")]
    pub environment: Environment,
    /// Per-request computation bounds (`[limits]` table in TOML)
    pub limits: Limits,
}

fn deserialize_log_level<'de, D>(deserializer: D) -> Result<LogLevel, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    LogLevel::from_str(&s).map_err(serde::de::Error::custom)
}

fn deserialize_environment<'de, D>(deserializer: D) -> Result<Environment, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    Environment::from_str(&s).map_err(serde::de::Error::custom)
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            log_level: LogLevel::Info,
            shutdown_timeout_secs: 30,
            environment: Environment::Development,
            limits: Limits::default(),
        }
    }
}

fn parse_env<T: FromStr>(name: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::EnvError(format!("{name}={value} is not a valid number")))
}

impl ServerConfig {
    /// Override fields whose environment variable is set
    fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Ok(host) = std::env::var(ENV_HOST) {
            self.host = host;
        }

        if let Ok(port) = std::env::var(ENV_PORT) {
            self.port = port.parse().map_err(|_| ConfigError::InvalidPort(0))?;
        }

        if let Ok(log_level) = std::env::var(ENV_LOG_LEVEL) {
            self.log_level = LogLevel::from_str(&log_level)?;
        }

        if let Ok(env) = std::env::var(ENV_ENVIRONMENT) {
            self.environment = Environment::from_str(&env)?;
        }

        if let Ok(timeout) = std::env::var(ENV_SHUTDOWN_TIMEOUT_SECS) {
            self.shutdown_timeout_secs = parse_env(ENV_SHUTDOWN_TIMEOUT_SECS, &timeout)?;
        }

        // Limits
        if let Ok(value) = std::env::var(ENV_MAX_COUNT) {
            self.limits.max_count = parse_env(ENV_MAX_COUNT, &value)?;
        }
        if let Ok(value) = std::env::var(ENV_MAX_ITERATIONS) {
            self.limits.max_iterations = parse_env(ENV_MAX_ITERATIONS, &value)?;
        }
        if let Ok(value) = std::env::var(ENV_MAX_PAIRS) {
            self.limits.max_pairs = parse_env(ENV_MAX_PAIRS, &value)?;
        }

        Ok(())
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &PathBuf) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileError(format!("Failed to read config file: {}", e)))?;

        let config: ServerConfig = toml::from_str(&content)
            .map_err(|e| ConfigError::FileError(format!("Failed to parse TOML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::InvalidPort(self.port));
        }

        let limits = [
            ("max_count", self.limits.max_count),
            ("max_iterations", self.limits.max_iterations),
            ("max_pairs", self.limits.max_pairs),
        ];
        if let Some((name, _)) = limits.into_iter().find(|(_, value)| *value == 0) {
            return Err(ConfigError::InvalidLimit { name });
        }

        Ok(())
    }

    /// Get the socket address string
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Merge with CLI arguments (CLI takes precedence)
    pub fn merge_with_cli(&mut self, cli: &CliArgs) -> Result<(), ConfigError> {
        if let Some(host) = &cli.host {
            self.host = host.clone();
        }
        if let Some(port) = cli.port {
            self.port = port;
        }
        if let Some(log_level) = &cli.log_level {
            self.log_level = LogLevel::from_str(log_level)?;
        }
        if let Some(max_count) = cli.max_count {
            self.limits.max_count = max_count;
        }
        if let Some(max_iterations) = cli.max_iterations {
            self.limits.max_iterations = max_iterations;
        }
        if let Some(max_pairs) = cli.max_pairs {
            self.limits.max_pairs = max_pairs;
        }

        Ok(())
    }
}

/// CLI arguments structure
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    /// Config file path
    pub config_file: Option<PathBuf>,
    /// Host address override
    pub host: Option<String>,
    /// Port override
    pub port: Option<u16>,
    /// Log level override
    pub log_level: Option<String>,
    /// Limit overrides
    pub max_count: Option<u64>,
    pub max_iterations: Option<u64>,
    pub max_pairs: Option<u64>,
}

/// Build configuration from all sources
///
/// Priority (highest to lowest):
/// 1. CLI arguments
/// 2. Environment variables
/// 3. Config file
/// 4. Default values
pub fn build_config(cli: &CliArgs) -> Result<ServerConfig, ConfigError> {
    let mut config = if let Some(config_path) = &cli.config_file {
        ServerConfig::from_file(config_path)?
    } else {
        ServerConfig::default()
    };

    // Only variables that are set override the file
    config.apply_env()?;

    config.merge_with_cli(cli)?;

    config.validate()?;

    Ok(config)
}
