//! MCP Server Implementation
//!
//! This module contains the server object and its transports:
//! - `McpServer`: owns the tool registry; lifecycle is create, register, run, stop
//! - streamable HTTP transport with Actix Web (`POST` JSON-RPC endpoint)
//! - STDIO transport for line-based communication

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use actix_web::{
    App, HttpRequest, HttpResponse, HttpServer,
    dev::{Server, ServerHandle},
    http::header,
    middleware::{Compress, DefaultHeaders, Logger},
    web,
};
use bytes::Bytes;
use futures_util::stream;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};
use tracing::{error, info};

use super::config::{HttpConfig, ServerInfo};
use super::dispatcher::Dispatcher;
use super::protocol::{self, JsonRpcResponse};
use super::registry::{RegistryError, ToolDefinition, ToolRegistry};

/// The server object.
///
/// Tools are registered while the server is owned mutably; once a transport
/// starts, the server (and its registry) is shared read-only between workers.
#[derive(Debug)]
pub struct McpServer {
    info: ServerInfo,
    registry: ToolRegistry,
}

impl McpServer {
    pub fn new(info: ServerInfo) -> Self {
        Self {
            info,
            registry: ToolRegistry::new(),
        }
    }

    /// Register a tool. Fails if the name is already taken.
    pub fn register(&mut self, tool: ToolDefinition) -> Result<(), RegistryError> {
        info!("Registering tool: {}", tool.name());
        self.registry.register(tool)
    }

    pub fn info(&self) -> &ServerInfo {
        &self.info
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn dispatcher(&self) -> Dispatcher<'_> {
        Dispatcher::new(&self.registry)
    }

    /// Bind the streamable HTTP transport.
    ///
    /// The returned transport is bound but not yet serving; await
    /// [`HttpTransport::run`] to serve until shutdown.
    ///
    /// # Configuration
    /// - Worker threads: from config, default CPU count (max 16)
    /// - Max connections: 10,000 concurrent connections
    /// - Keep-alive: 30 seconds
    /// - Request timeout: 30 seconds
    /// - Shutdown timeout: 10 seconds
    pub fn bind_http(self, config: &HttpConfig) -> io::Result<HttpTransport> {
        let state = web::Data::new(self);
        let rpc_path = config.rpc_path.clone();
        let workers = config.worker_count();

        let server = HttpServer::new(move || {
            let rpc_path = rpc_path.clone();
            App::new()
                .app_data(state.clone())
                .wrap(Compress::default())
                .wrap(
                    DefaultHeaders::new()
                        .add(("X-Content-Type-Options", "nosniff"))
                        .add(("X-Frame-Options", "DENY")),
                )
                // %r = request line, %s = status, %D = duration in ms
                .wrap(Logger::new("%r %s %Dms"))
                .configure(move |cfg| routes(cfg, &rpc_path))
        })
        .workers(workers)
        .max_connections(10_000)
        .keep_alive(Duration::from_secs(30))
        .client_request_timeout(Duration::from_secs(30))
        .client_disconnect_timeout(Duration::from_secs(2))
        .shutdown_timeout(10)
        .bind((config.host.as_str(), config.port))?;

        let addrs = server.addrs();
        for addr in &addrs {
            info!("Listening on {} (JSON-RPC over streamable HTTP, {} workers)", addr, workers);
        }
        info!("  → JSON-RPC: POST {}", config.rpc_path);
        info!("  → Health:   GET /health");

        Ok(HttpTransport {
            server: server.run(),
            addrs,
        })
    }

    /// Serve JSON-RPC over stdin/stdout until stdin closes.
    ///
    /// One message per line in, one response per line out. Notifications
    /// produce no output. Logs go to stderr.
    pub async fn run_stdio(self) -> io::Result<()> {
        info!("Serving JSON-RPC over STDIO");

        let reader = BufReader::with_capacity(8192, tokio::io::stdin());
        let writer = BufWriter::with_capacity(8192, tokio::io::stdout());
        self.serve_lines(reader, writer).await?;

        info!("STDIO closed");
        Ok(())
    }

    /// Line-delimited JSON-RPC loop; returns when `reader` hits EOF.
    async fn serve_lines<R, W>(&self, reader: R, mut writer: W) -> io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }

            let Some(response) = protocol::handle_message(self, line.as_bytes()) else {
                continue;
            };

            let response_json = match serde_json::to_string(&response) {
                Ok(json) => json,
                Err(e) => {
                    error!("Error serializing response: {}", e);
                    continue;
                }
            };

            writer.write_all(response_json.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;
        }

        Ok(())
    }
}

/// A bound, not yet awaited HTTP server.
pub struct HttpTransport {
    server: Server,
    addrs: Vec<SocketAddr>,
}

impl HttpTransport {
    /// Addresses the listener actually bound (useful with port 0).
    pub fn local_addrs(&self) -> &[SocketAddr] {
        &self.addrs
    }

    /// Handle for stopping the server from another task.
    pub fn handle(&self) -> ServerHandle {
        self.server.handle()
    }

    /// Serve until the server is stopped or a shutdown signal arrives.
    pub async fn run(self) -> io::Result<()> {
        self.server.await
    }
}

/// Register the HTTP routes on an app.
///
/// `rpc_path` accepts `POST` JSON-RPC messages only; other methods get 405
/// since the server opens no server-initiated streams and keeps no sessions.
pub fn routes(cfg: &mut web::ServiceConfig, rpc_path: &str) {
    cfg.route("/health", web::get().to(health))
        .route("/", web::get().to(health))
        .service(
            web::resource(rpc_path)
                .route(web::post().to(rpc_post))
                .default_service(web::to(method_not_allowed)),
        );
}

/// Health check endpoint handler.
async fn health(server: web::Data<McpServer>) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "service": server.info().name
    }))
}

async fn method_not_allowed() -> HttpResponse {
    HttpResponse::MethodNotAllowed()
        .insert_header((header::ALLOW, "POST"))
        .finish()
}

/// JSON-RPC endpoint.
///
/// Requests are answered with `application/json` unless the client only
/// accepts `text/event-stream`, in which case the response is sent as a
/// single SSE `message` event. Notifications get `202 Accepted`.
async fn rpc_post(server: web::Data<McpServer>, req: HttpRequest, body: web::Bytes) -> HttpResponse {
    let Some(response) = protocol::handle_message(&server, &body) else {
        return HttpResponse::Accepted().finish();
    };

    if wants_event_stream(&req) {
        sse_response(&response)
    } else {
        HttpResponse::Ok().json(response)
    }
}

fn wants_event_stream(req: &HttpRequest) -> bool {
    let accept = req
        .headers()
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    accept.contains("text/event-stream") && !accept.contains("application/json")
}

fn sse_response(response: &JsonRpcResponse) -> HttpResponse {
    let payload = match serde_json::to_string(response) {
        Ok(json) => json,
        Err(e) => {
            error!("Error serializing response: {}", e);
            return HttpResponse::InternalServerError().finish();
        }
    };
    let frame = Bytes::from(format!("event: message\ndata: {payload}\n\n"));

    HttpResponse::Ok()
        .content_type("text/event-stream")
        .insert_header(header::CacheControl(vec![header::CacheDirective::NoCache]))
        // Disable nginx buffering for streamed responses
        .insert_header(("x-accel-buffering", "no"))
        .streaming(stream::once(async move { Ok::<_, std::convert::Infallible>(frame) }))
}
