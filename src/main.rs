//! MCP Server Entry Point
//!
//! Loads configuration from the environment (see `core::config`), installs
//! logging, registers the tools and serves on the configured transport.
//! Ctrl-C / SIGTERM trigger a graceful shutdown of the HTTP server.

use math_mcp_server::core::{Config, McpServer, TransportMode, logging};
use math_mcp_server::{Result, tools};

#[actix_web::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    logging::init(&config.logging.level)?;

    let mut server = McpServer::new(config.server.clone());
    tools::register_all(&mut server)?;

    // Banners go to stderr so they never interleave with STDIO JSON-RPC
    eprintln!("Starting MCP server for remote access...");
    eprintln!("  Name: {}", config.server.name);
    eprintln!("  Version: {}", config.server.version);

    match config.transport {
        TransportMode::Http => {
            eprintln!("  Transport: streamable HTTP");
            eprintln!("  Bind Address: {}", config.http.bind_address());
            eprintln!("  Endpoint: {}", config.http.rpc_path);
            server.bind_http(&config.http)?.run().await?;
        }
        TransportMode::Stdio => {
            eprintln!("  Transport: STDIO");
            server.run_stdio().await?;
        }
    }

    eprintln!("MCP server stopped.");
    Ok(())
}
