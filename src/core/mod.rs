//! Core Server Framework Module
//!
//! - registry.rs: tool definitions and the name → tool registry
//! - dispatcher.rs: argument validation and tool invocation
//! - protocol.rs: JSON-RPC 2.0 / MCP method routing
//! - server.rs: server lifecycle with HTTP and STDIO transports
//! - config.rs, logging.rs, error.rs: configuration, tracing setup, errors

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod logging;
pub mod protocol;
pub mod registry;
pub mod server;

pub use config::{Config, HttpConfig, ServerInfo, TransportMode};
pub use dispatcher::{DispatchError, Dispatcher, ErrorKind, InvocationRequest, InvocationResult, ToolArguments};
pub use error::{Error, Result};
pub use registry::{ParamType, RegistryError, ToolDefinition, ToolRegistry};
pub use server::{HttpTransport, McpServer};
