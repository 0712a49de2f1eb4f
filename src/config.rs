//! Configuration module for the packet-reactor server.
//!
//! Supports both command-line arguments and TOML configuration file.
//! CLI arguments take precedence over config file values.

use crate::runtime::{ReactorConfig, DEFAULT_MAX_PAYLOAD_SIZE};
use clap::{Parser, ValueEnum};
use serde::Deserialize;
use std::path::PathBuf;

/// Command-line arguments for the echo server
#[derive(Parser, Debug)]
#[command(name = "packet-reactor")]
#[command(author = "packet-reactor authors")]
#[command(version = "0.1.0")]
#[command(about = "A length-prefixed packet echo server", long_about = None)]
pub struct CliArgs {
    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Host to bind to (empty or 0.0.0.0 for all interfaces)
    #[arg(short = 'H', long)]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Maximum number of concurrent connections
    #[arg(long)]
    pub max_connections: Option<usize>,

    /// Largest accepted payload in bytes
    #[arg(long)]
    pub max_payload_size: Option<usize>,

    /// When queued replies are flushed
    #[arg(long, value_enum)]
    pub write_mode: Option<WriteMode>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

/// How a connection flushes queued packets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum WriteMode {
    /// Register for writability while output is pending.
    #[default]
    Auto,
    /// Flush only after handling inbound packets.
    Opportunistic,
}

/// TOML configuration file structure
#[derive(Debug, Deserialize, Default)]
pub struct TomlConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub connection: ConnectionConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server-related configuration
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Listen backlog
    #[serde(default = "default_backlog")]
    pub backlog: i32,
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
    /// Events returned by a single poll
    #[serde(default = "default_events_capacity")]
    pub events_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            backlog: default_backlog(),
            max_connections: default_max_connections(),
            events_capacity: default_events_capacity(),
        }
    }
}

/// Per-connection configuration
#[derive(Debug, Deserialize)]
pub struct ConnectionConfig {
    #[serde(default = "default_max_payload_size")]
    pub max_payload_size: usize,
    #[serde(default)]
    pub write_mode: WriteMode,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            max_payload_size: default_max_payload_size(),
            write_mode: WriteMode::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level
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

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8888
}

fn default_backlog() -> i32 {
    libc::SOMAXCONN
}

fn default_max_connections() -> usize {
    10_000
}

fn default_events_capacity() -> usize {
    1024
}

fn default_max_payload_size() -> usize {
    DEFAULT_MAX_PAYLOAD_SIZE
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Final resolved configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub backlog: i32,
    pub max_connections: usize,
    pub events_capacity: usize,
    pub max_payload_size: usize,
    pub write_mode: WriteMode,
    pub log_level: String,
}

impl Config {
    /// Load configuration from CLI args and optional TOML file.
    /// CLI arguments take precedence over TOML file values.
    pub fn load() -> Result<Self, ConfigError> {
        let cli = CliArgs::parse();

        // Load TOML config if specified
        let toml_config = if let Some(ref config_path) = cli.config {
            let contents = std::fs::read_to_string(config_path)
                .map_err(|e| ConfigError::FileRead(config_path.clone(), e))?;
            toml::from_str(&contents)
                .map_err(|e| ConfigError::TomlParse(config_path.clone(), e))?
        } else {
            TomlConfig::default()
        };

        Ok(Self::merge(cli, toml_config))
    }

    /// Merge CLI args with TOML config (CLI takes precedence).
    pub fn merge(cli: CliArgs, toml_config: TomlConfig) -> Self {
        Config {
            host: cli.host.unwrap_or(toml_config.server.host),
            port: cli.port.unwrap_or(toml_config.server.port),
            backlog: toml_config.server.backlog,
            max_connections: cli
                .max_connections
                .unwrap_or(toml_config.server.max_connections),
            events_capacity: toml_config.server.events_capacity,
            max_payload_size: cli
                .max_payload_size
                .unwrap_or(toml_config.connection.max_payload_size),
            write_mode: cli
                .write_mode
                .unwrap_or(toml_config.connection.write_mode),
            log_level: if cli.log_level != "info" {
                cli.log_level
            } else {
                toml_config.logging.level
            },
        }
    }

    /// Reactor sizing derived from this configuration.
    pub fn reactor_config(&self) -> ReactorConfig {
        ReactorConfig {
            backlog: self.backlog,
            events_capacity: self.events_capacity.max(1),
            max_connections: self.max_connections,
        }
    }
}

/// Configuration loading errors
#[derive(Debug)]
pub enum ConfigError {
    FileRead(PathBuf, std::io::Error),
    TomlParse(PathBuf, toml::de::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::FileRead(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::TomlParse(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
