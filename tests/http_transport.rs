use actix_web::{App, http::StatusCode, http::header, test, web};
use serde_json::{Value, json};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use math_mcp_server::core::server::routes;
use math_mcp_server::core::{HttpConfig, McpServer, ServerInfo};
use math_mcp_server::tools;

fn server() -> McpServer {
    let mut server = McpServer::new(ServerInfo {
        name: "math-test".to_string(),
        version: "0.0.0".to_string(),
    });
    tools::register_all(&mut server).unwrap();
    server
}

fn add_request(id: i64, arguments: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": "tools/call",
        "params": { "name": "add", "arguments": arguments }
    })
}

macro_rules! app {
    () => {
        test::init_service(
            App::new()
                .app_data(web::Data::new(server()))
                .configure(|cfg| routes(cfg, "/mcp")),
        )
        .await
    };
}

#[actix_web::test]
async fn test_tools_call_without_handshake() {
    let app = app!();

    let req = test::TestRequest::post()
        .uri("/mcp")
        .set_json(add_request(1, json!({"a": 2, "b": 3})))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["id"], 1);
    assert_eq!(body["result"]["structuredContent"]["result"], 5);
    assert_eq!(body["result"]["isError"], false);
}

#[actix_web::test]
async fn test_error_scenarios() {
    let app = app!();

    let req = test::TestRequest::post()
        .uri("/mcp")
        .set_json(json!({
            "jsonrpc": "2.0",
            "id": 2,
            "method": "tools/call",
            "params": { "name": "subtract", "arguments": {"a": 1, "b": 2} }
        }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["error"]["code"], -32601);
    assert_eq!(body["error"]["data"]["kind"], "NotFoundError");

    let req = test::TestRequest::post()
        .uri("/mcp")
        .set_json(add_request(3, json!({"a": 2})))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["error"]["code"], -32602);
    assert_eq!(body["error"]["data"]["kind"], "ValidationError");
    assert_eq!(body["error"]["data"]["fields"][0]["field"], "b");
}

#[actix_web::test]
async fn test_malformed_body_is_parse_error() {
    let app = app!();

    let req = test::TestRequest::post()
        .uri("/mcp")
        .insert_header(header::ContentType::json())
        .set_payload("{\"jsonrpc\": ")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["code"], -32700);
    assert_eq!(body["id"], Value::Null);
}

#[actix_web::test]
async fn test_notification_is_accepted() {
    let app = app!();

    let req = test::TestRequest::post()
        .uri("/mcp")
        .set_json(json!({"jsonrpc": "2.0", "method": "notifications/initialized"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::ACCEPTED);
    assert!(test::read_body(resp).await.is_empty());
}

#[actix_web::test]
async fn test_event_stream_response() {
    let app = app!();

    let req = test::TestRequest::post()
        .uri("/mcp")
        .insert_header((header::ACCEPT, "text/event-stream"))
        .set_json(add_request(4, json!({"a": -10, "b": 10})))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get(header::CONTENT_TYPE).unwrap(),
        "text/event-stream"
    );

    let body = test::read_body(resp).await;
    let text = std::str::from_utf8(&body).unwrap();
    let data = text
        .strip_prefix("event: message\ndata: ")
        .and_then(|rest| rest.strip_suffix("\n\n"))
        .expect("single SSE message frame");
    let message: Value = serde_json::from_str(data).unwrap();
    assert_eq!(message["result"]["structuredContent"]["result"], 0);
}

#[actix_web::test]
async fn test_json_preferred_when_both_accepted() {
    let app = app!();

    let req = test::TestRequest::post()
        .uri("/mcp")
        .insert_header((header::ACCEPT, "application/json, text/event-stream"))
        .set_json(json!({"jsonrpc": "2.0", "id": 5, "method": "tools/list"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(
        resp.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/json"
    );

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["result"]["tools"][0]["name"], "add");
}

#[actix_web::test]
async fn test_unsupported_methods_on_endpoint() {
    let app = app!();

    for req in [
        test::TestRequest::get().uri("/mcp").to_request(),
        test::TestRequest::delete().uri("/mcp").to_request(),
    ] {
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}

#[actix_web::test]
async fn test_health() {
    let app = app!();

    let req = test::TestRequest::get().uri("/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body, json!({"status": "ok", "service": "math-test"}));
}

#[actix_web::test]
async fn test_bound_server_serves_requests() {
    let config = HttpConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        workers: Some(1),
        ..HttpConfig::default()
    };
    let transport = server().bind_http(&config).unwrap();
    let addr = transport.local_addrs()[0];
    let handle = transport.handle();
    actix_web::rt::spawn(transport.run());

    let body = add_request(1, json!({"a": 2, "b": 3})).to_string();
    let request = format!(
        "POST /mcp HTTP/1.1\r\nHost: {addr}\r\nContent-Type: application/json\r\n\
         Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request.as_bytes()).await.unwrap();
    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();

    assert!(response.starts_with("HTTP/1.1 200 OK"), "{response}");
    assert!(response.contains("\"structuredContent\":{\"result\":5}"), "{response}");
    assert!(response.to_ascii_lowercase().contains("x-frame-options: deny"), "{response}");

    handle.stop(true).await;
}
