//! Minimal MCP server exposing an `add` tool.
//!
//! - **core**: registry, dispatcher, JSON-RPC protocol, transports, config
//! - **tools**: the tools this server registers at startup
//!
//! # Example
//!
//! ```rust,no_run
//! use math_mcp_server::core::{Config, McpServer};
//!
//! #[actix_web::main]
//! async fn main() -> math_mcp_server::Result<()> {
//!     let config = Config::from_env()?;
//!     let mut server = McpServer::new(config.server.clone());
//!     math_mcp_server::tools::register_all(&mut server)?;
//!     server.bind_http(&config.http)?.run().await?;
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod tools;

pub use crate::core::{Config, Error, McpServer, Result};
