//! Server configuration.
//!
//! Defaults mirror a plain remote deployment (`0.0.0.0:8000`, endpoint
//! `/mcp`). Every value can be overridden from the environment:
//!
//! - `MCP_SERVER_NAME`: name reported in `initialize` (default: "MyRemoteMathServer")
//! - `MCP_TRANSPORT`: "http" or "stdio" (default: "http")
//! - `MCP_HOST`: bind address for HTTP mode (default: "0.0.0.0")
//! - `MCP_PORT`: port for HTTP mode (default: 8000)
//! - `MCP_PATH`: JSON-RPC endpoint path (default: "/mcp")
//! - `MCP_WORKERS`: HTTP worker threads (default: CPU count, capped at 16)
//! - `MCP_LOG_LEVEL`: log level when `RUST_LOG` is unset (default: "info")

use std::str::FromStr;

use tracing::level_filters::LevelFilter;

use super::error::{Error, Result};

/// Identity reported to clients in the `initialize` response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

impl Default for ServerInfo {
    fn default() -> Self {
        Self {
            name: "MyRemoteMathServer".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Which transport the process serves on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportMode {
    #[default]
    Http,
    Stdio,
}

impl FromStr for TransportMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "http" | "streamable-http" => Ok(TransportMode::Http),
            "stdio" => Ok(TransportMode::Stdio),
            other => Err(Error::config(format!(
                "invalid transport mode '{other}': must be 'http' or 'stdio'"
            ))),
        }
    }
}

/// HTTP transport settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpConfig {
    pub host: String,
    pub port: u16,
    /// Path of the JSON-RPC endpoint.
    pub rpc_path: String,
    /// Worker thread count; `None` picks one per CPU, capped at 16.
    pub workers: Option<usize>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            rpc_path: "/mcp".to_string(),
            workers: None,
        }
    }
}

impl HttpConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(|| num_cpus::get().clamp(1, 16))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Complete process configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub server: ServerInfo,
    pub transport: TransportMode,
    pub http: HttpConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// Unset keys keep their defaults; set but unparsable keys are an error.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(name) = lookup("MCP_SERVER_NAME") {
            config.server.name = name;
        }
        if let Some(mode) = lookup("MCP_TRANSPORT") {
            config.transport = mode.parse()?;
        }
        if let Some(host) = lookup("MCP_HOST") {
            config.http.host = host;
        }
        if let Some(port) = lookup("MCP_PORT") {
            config.http.port = parse_value("MCP_PORT", &port)?;
        }
        if let Some(path) = lookup("MCP_PATH") {
            if !path.starts_with('/') {
                return Err(Error::config(format!("MCP_PATH must start with '/', got '{path}'")));
            }
            config.http.rpc_path = path;
        }
        if let Some(workers) = lookup("MCP_WORKERS") {
            let workers: usize = parse_value("MCP_WORKERS", &workers)?;
            if workers == 0 {
                return Err(Error::config("MCP_WORKERS must be at least 1"));
            }
            config.http.workers = Some(workers);
        }
        if let Some(level) = lookup("MCP_LOG_LEVEL") {
            let filter: LevelFilter = parse_value("MCP_LOG_LEVEL", &level)?;
            config.logging.level = filter.to_string().to_ascii_lowercase();
        }

        Ok(config)
    }
}

fn parse_value<T: FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| Error::config(format!("{key} has invalid value '{raw}'")))
}
