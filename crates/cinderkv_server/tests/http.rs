//! End-to-end HTTP tests over a live listener.

use cinderkv_core::{LogStore, StoreOptions};
use cinderkv_server::{AppState, ServerOptions};
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

const TOKEN: &str = "integration-test-token";

struct TestServer {
    addr: SocketAddr,
    _data_dir: TempDir,
}

fn start_server() -> TestServer {
    start_server_with(|_| {})
}

fn start_server_with(tweak: impl FnOnce(&mut ServerOptions)) -> TestServer {
    let data_dir = TempDir::new().unwrap();

    let mut options = ServerOptions::default();
    options.auth = TOKEN.to_string();
    options.path = data_dir.path().to_string_lossy().into_owned();
    options.region.enable = false;
    tweak(&mut options);

    let store = Arc::new(
        LogStore::open(data_dir.path(), StoreOptions::new().rotation_threshold(1 << 20)).unwrap(),
    );
    let state = AppState::new(store, Arc::new(options));

    let (addr_tx, addr_rx) = mpsc::channel();
    thread::spawn(move || {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        runtime.block_on(async move {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            addr_tx.send(listener.local_addr().unwrap()).unwrap();
            cinderkv_server::serve(listener, state, std::future::pending())
                .await
                .unwrap();
        });
    });

    TestServer {
        addr: addr_rx.recv().unwrap(),
        _data_dir: data_dir,
    }
}

/// Sends one request and returns (status, body). `Connection: close` makes
/// the server end the stream after the response.
fn request(addr: SocketAddr, method: &str, path: &str, auth: Option<&str>, body: Option<&str>) -> (u16, String) {
    let mut message = format!("{method} {path} HTTP/1.1\r\nHost: cinderkv-test\r\n");
    if let Some(token) = auth {
        message.push_str(&format!("Authorization: {token}\r\n"));
    }
    if let Some(body) = body {
        message.push_str("Content-Type: application/json\r\n");
        message.push_str(&format!("Content-Length: {}\r\n", body.len()));
    }
    message.push_str("Connection: close\r\n\r\n");
    if let Some(body) = body {
        message.push_str(body);
    }

    let mut stream = TcpStream::connect(addr).unwrap();
    stream.write_all(message.as_bytes()).unwrap();

    let mut response = String::new();
    stream.read_to_string(&mut response).unwrap();

    let status: u16 = response
        .split_whitespace()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .expect("status line");
    let body = response
        .split_once("\r\n\r\n")
        .map(|(_, b)| b.to_string())
        .unwrap_or_default();
    (status, body)
}

fn json_body(body: &str) -> serde_json::Value {
    serde_json::from_str(body.trim()).unwrap_or(serde_json::Value::Null)
}

#[test]
fn health_requires_auth() {
    let server = start_server();

    let (status, _) = request(server.addr, "GET", "/health", None, None);
    assert_eq!(status, 401);

    let (status, _) = request(server.addr, "GET", "/health", Some("wrong token"), None);
    assert_eq!(status, 401);

    let (status, body) = request(server.addr, "GET", "/health", Some(TOKEN), None);
    assert_eq!(status, 200);
    let health = json_body(&body);
    assert_eq!(health["compaction_state"], "idle");
    assert_eq!(health["key_count"], 0);
}

#[test]
fn bearer_prefix_is_accepted() {
    let server = start_server();
    let bearer = format!("Bearer {TOKEN}");
    let (status, _) = request(server.addr, "GET", "/health", Some(&bearer), None);
    assert_eq!(status, 200);
}

#[test]
fn text_lifecycle() {
    let server = start_server();

    let (status, _) = request(
        server.addr,
        "PUT",
        "/text/hello",
        Some(TOKEN),
        Some(r#"{"content":"world","ttl":0}"#),
    );
    assert_eq!(status, 201);

    let (status, body) = request(server.addr, "GET", "/text/hello", Some(TOKEN), None);
    assert_eq!(status, 200);
    assert_eq!(json_body(&body), serde_json::json!({"text": "world"}));

    let (status, body) = request(server.addr, "GET", "/query/hello", Some(TOKEN), None);
    assert_eq!(status, 200);
    let query = json_body(&body);
    assert_eq!(query["type"], "text");
    assert_eq!(query["key"], "hello");
    assert_eq!(query["ttl"], -1);
    assert_eq!(query["mvcc"], 1);

    let (status, _) = request(server.addr, "DELETE", "/text/hello", Some(TOKEN), None);
    assert_eq!(status, 204);

    let (status, body) = request(server.addr, "GET", "/text/hello", Some(TOKEN), None);
    assert_eq!(status, 404);
    assert_eq!(json_body(&body)["message"], "key data not found.");
}

#[test]
fn mvcc_counts_overwrites() {
    let server = start_server();

    for number in [7, 8] {
        let body = format!(r#"{{"number":{number}}}"#);
        let (status, _) = request(server.addr, "PUT", "/number/n", Some(TOKEN), Some(&body));
        assert_eq!(status, 201);
    }

    let (status, body) = request(server.addr, "GET", "/query/n", Some(TOKEN), None);
    assert_eq!(status, 200);
    let query = json_body(&body);
    assert_eq!(query["mvcc"], 2);

    let (status, body) = request(server.addr, "GET", "/number/n", Some(TOKEN), None);
    assert_eq!(status, 200);
    assert_eq!(json_body(&body)["number"], 8);
}

#[test]
fn wrong_kind_read_is_internal_error() {
    let server = start_server();

    let (status, _) = request(
        server.addr,
        "PUT",
        "/text/mixed",
        Some(TOKEN),
        Some(r#"{"content":"not a number"}"#),
    );
    assert_eq!(status, 201);

    let (status, _) = request(server.addr, "GET", "/number/mixed", Some(TOKEN), None);
    assert_eq!(status, 500);
}

#[test]
fn malformed_body_is_bad_request() {
    let server = start_server();

    let (status, _) = request(
        server.addr,
        "PUT",
        "/text/broken",
        Some(TOKEN),
        Some(r#"{"content":"#),
    );
    assert_eq!(status, 400);

    // Valid JSON but missing the required field.
    let (status, _) = request(
        server.addr,
        "PUT",
        "/text/broken",
        Some(TOKEN),
        Some(r#"{"ttl":3}"#),
    );
    assert_eq!(status, 400);
}

#[test]
fn set_and_table_round_trip() {
    let server = start_server();

    let (status, _) = request(
        server.addr,
        "PUT",
        "/set/s",
        Some(TOKEN),
        Some(r#"{"set":{"a":true,"b":true}}"#),
    );
    assert_eq!(status, 201);
    let (status, body) = request(server.addr, "GET", "/set/s", Some(TOKEN), None);
    assert_eq!(status, 200);
    assert_eq!(json_body(&body)["set"]["a"], true);

    let (status, _) = request(
        server.addr,
        "PUT",
        "/table/t",
        Some(TOKEN),
        Some(r#"{"table":{"name":"dinner","count":2}}"#),
    );
    assert_eq!(status, 201);
    let (status, body) = request(server.addr, "GET", "/table/t", Some(TOKEN), None);
    assert_eq!(status, 200);
    assert_eq!(json_body(&body)["table"]["count"], 2);
}

#[test]
fn unknown_routes_are_404() {
    let server = start_server();

    let (status, body) = request(server.addr, "GET", "/blob/key", Some(TOKEN), None);
    assert_eq!(status, 404);
    assert_eq!(json_body(&body)["message"], "Oops! 404 Not Found!");

    let (status, _) = request(server.addr, "GET", "/nowhere", Some(TOKEN), None);
    assert_eq!(status, 404);
}

#[test]
fn whitelist_blocks_unlisted_ips() {
    let server = start_server_with(|options| {
        options.allow_ip = Some(vec!["10.9.9.9".to_string()]);
    });

    let (status, body) = request(server.addr, "GET", "/health", Some(TOKEN), None);
    assert_eq!(status, 403);
    assert_eq!(json_body(&body)["message"], "ip address not allowed.");
}

#[test]
fn whitelist_admits_listed_ips() {
    let server = start_server_with(|options| {
        options.allow_ip = Some(vec!["127.0.0.1".to_string()]);
    });

    let (status, _) = request(server.addr, "GET", "/health", Some(TOKEN), None);
    assert_eq!(status, 200);
}
