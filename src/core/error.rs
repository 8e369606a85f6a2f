//! Crate-level error type.
//!
//! Domain errors (`RegistryError`, `DispatchError`) live next to the code
//! that produces them; this enum covers the failures that can abort startup.

use thiserror::Error;

use super::registry::RegistryError;

/// A specialized Result type for server setup and lifecycle operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can stop the server from starting or running.
#[derive(Debug, Error)]
pub enum Error {
    /// An environment variable held a value that could not be used.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A tool could not be registered.
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Binding, accepting or stdio failures.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The global tracing subscriber could not be installed.
    #[error("Logging setup failed: {0}")]
    Logging(String),
}

impl Error {
    /// Create a new configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
