//! Dashboard server tests over a real TCP socket.
//!
//! Each test binds `127.0.0.1:0`, serves one `DashboardServer`, and speaks
//! raw HTTP/1.1 so the wire format (status line, Content-Length, Connection)
//! is checked as a browser would see it.

use std::net::SocketAddr;
use std::path::PathBuf;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_util::sync::CancellationToken;

use live_match_linker::server::dashboard_server::DashboardServer;
use live_match_linker::state::dashboard_state::{DashboardState, ALREADY_LINKED_MESSAGE};
use live_match_linker::state::mapping_store::{load_aliases, AliasMap, MappingStore};
use live_match_linker::ui::assets::DashboardAssets;
use live_match_linker::ui::snapshot::Snapshot;

// =============================================================================
// Helpers
// =============================================================================

fn temp_alias_path() -> PathBuf {
    std::env::temp_dir()
        .join(format!("dashboard_server_it_{}", uuid::Uuid::new_v4()))
        .join("team_name_mappings.json")
}

async fn start_server(alias_path: PathBuf) -> (SocketAddr, CancellationToken) {
    let snapshot = Snapshot {
        html: "<html><body data-view-mode='__VIEW_MODE__'>dashboard</body></html>".to_string(),
        ..Snapshot::default()
    };
    let state = DashboardState::new(MappingStore::new(alias_path, AliasMap::new()), "a_source", snapshot);
    let assets = DashboardAssets {
        template: String::new(),
        css: "body { color: red; }".to_string(),
        js: "console.log('ok');".to_string(),
    };

    let listener = DashboardServer::bind("127.0.0.1", 0).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = CancellationToken::new();
    tokio::spawn(DashboardServer::new(state, assets).serve(listener, shutdown.clone()));
    (addr, shutdown)
}

struct RawResponse {
    status: u16,
    headers: Vec<(String, String)>,
    body: String,
}

impl RawResponse {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

async fn send(addr: SocketAddr, raw: &str) -> RawResponse {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(raw.as_bytes()).await.unwrap();
    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).await.unwrap();
    let text = String::from_utf8(buf).unwrap();

    let (head, body) = text.split_once("\r\n\r\n").unwrap();
    let mut lines = head.split("\r\n");
    let status = lines.next().unwrap().split(' ').nth(1).unwrap().parse().unwrap();
    let headers = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect();
    RawResponse {
        status,
        headers,
        body: body.to_string(),
    }
}

fn post_json(path: &str, body: &str) -> String {
    format!(
        "POST {path} HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{body}",
        body.len()
    )
}

const LINK_BODY: &str = r#"{"a_match":{"home_team":"PSG","away_team":"OM"},"b_match":{"home_team":"Paris SG","away_team":"Olympique Marseille"}}"#;

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn test_get_root_has_exact_length_and_closes() {
    let (addr, shutdown) = start_server(temp_alias_path()).await;

    let resp = send(addr, "GET / HTTP/1.1\r\nHost: localhost\r\n\r\n").await;
    assert_eq!(resp.status, 200);
    assert_eq!(resp.header("Connection"), Some("close"));
    assert_eq!(resp.header("Content-Type"), Some("text/html; charset=utf-8"));
    let length: usize = resp.header("Content-Length").unwrap().parse().unwrap();
    assert_eq!(length, resp.body.len());
    assert!(resp.body.contains("data-view-mode='all'"));

    shutdown.cancel();
}

#[tokio::test]
async fn test_view_mode_routes_ignore_query_and_trailing_slash() {
    let (addr, shutdown) = start_server(temp_alias_path()).await;

    let resp = send(addr, "GET /linked/?x=1 HTTP/1.1\r\n\r\n").await;
    assert_eq!(resp.status, 200);
    assert!(resp.body.contains("data-view-mode='linked'"));

    let resp = send(addr, "GET /linker HTTP/1.1\r\n\r\n").await;
    assert!(resp.body.contains("data-view-mode='linker'"));

    shutdown.cancel();
}

#[tokio::test]
async fn test_assets_served_with_content_types() {
    let (addr, shutdown) = start_server(temp_alias_path()).await;

    let css = send(addr, "GET /assets/dashboard.css HTTP/1.1\r\n\r\n").await;
    assert_eq!(css.status, 200);
    assert_eq!(css.header("Content-Type"), Some("text/css; charset=utf-8"));
    assert_eq!(css.body, "body { color: red; }");

    let js = send(addr, "GET /assets/dashboard.js HTTP/1.1\r\n\r\n").await;
    assert_eq!(js.header("Content-Type"), Some("application/javascript; charset=utf-8"));

    shutdown.cancel();
}

#[tokio::test]
async fn test_unknown_route_is_json_404() {
    let (addr, shutdown) = start_server(temp_alias_path()).await;

    let resp = send(addr, "GET /missing HTTP/1.1\r\n\r\n").await;
    assert_eq!(resp.status, 404);
    assert_eq!(resp.body, r#"{"message":"Route not found"}"#);

    shutdown.cancel();
}

#[tokio::test]
async fn test_link_saves_then_reports_duplicate() {
    let alias_path = temp_alias_path();
    let (addr, shutdown) = start_server(alias_path.clone()).await;

    let resp = send(addr, &post_json("/api/link", LINK_BODY)).await;
    assert_eq!(resp.status, 200);
    let reply: serde_json::Value = serde_json::from_str(&resp.body).unwrap();
    assert_eq!(reply["ok"], true);
    assert_eq!(reply["message"], "Link saved to team_name_mappings.json");

    let aliases = load_aliases(&alias_path);
    assert_eq!(aliases["a_source"]["PSG"], "Paris SG");
    assert_eq!(aliases["a_source"]["OM"], "Olympique Marseille");

    let text = std::fs::read_to_string(&alias_path).unwrap();
    assert!(text.ends_with('\n'));

    let resp = send(addr, &post_json("/api/link", LINK_BODY)).await;
    assert_eq!(resp.status, 200);
    let reply: serde_json::Value = serde_json::from_str(&resp.body).unwrap();
    assert_eq!(reply["ok"], false);
    assert_eq!(reply["message"], ALREADY_LINKED_MESSAGE);

    shutdown.cancel();
}

#[tokio::test]
async fn test_link_rejects_non_json_content_type() {
    let alias_path = temp_alias_path();
    let (addr, shutdown) = start_server(alias_path.clone()).await;

    let raw = format!(
        "POST /api/link HTTP/1.1\r\nContent-Type: text/plain\r\nContent-Length: {}\r\n\r\n{LINK_BODY}",
        LINK_BODY.len()
    );
    let resp = send(addr, &raw).await;
    assert_eq!(resp.status, 400);
    assert_eq!(
        resp.body,
        r#"{"message":"Invalid payload: expected JSON (Content-Type: application/json)"}"#
    );
    assert!(!alias_path.exists());

    shutdown.cancel();
}

#[tokio::test]
async fn test_link_rejects_blank_team_names() {
    let (addr, shutdown) = start_server(temp_alias_path()).await;

    let body = r#"{"a_match":{"home_team":" ","away_team":"OM"},"b_match":{"home_team":"Paris SG","away_team":"Olympique Marseille"}}"#;
    let resp = send(addr, &post_json("/api/link", body)).await;
    assert_eq!(resp.status, 400);
    assert_eq!(resp.body, r#"{"message":"Invalid payload"}"#);

    shutdown.cancel();
}

#[tokio::test]
async fn test_server_stops_accepting_after_shutdown() {
    let (addr, shutdown) = start_server(temp_alias_path()).await;
    shutdown.cancel();
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;

    let refused = TcpStream::connect(addr).await;
    assert!(refused.is_err());
}
