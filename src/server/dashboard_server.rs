//! Local dashboard HTTP server.
//!
//! One tokio task per accepted connection, one response per connection.
//! Routing is an exact match on (method, normalized path).

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::data::models::LinkRequest;
use crate::state::dashboard_state::{DashboardError, DashboardState};
use crate::ui::assets::DashboardAssets;
use crate::ui::renderer::VIEW_MODE_MARKER;

use super::http::{
    read_request, Request, Response, CSS_CONTENT_TYPE, HTML_CONTENT_TYPE, JS_CONTENT_TYPE,
};

pub const STYLESHEET_PATH: &str = "/assets/dashboard.css";
pub const SCRIPT_PATH: &str = "/assets/dashboard.js";

const REQUEST_READ_TIMEOUT: Duration = Duration::from_secs(10);

const NOT_FOUND_MESSAGE: &str = "Route not found";
const INVALID_PAYLOAD_MESSAGE: &str = "Invalid payload";
const NOT_JSON_MESSAGE: &str = "Invalid payload: expected JSON (Content-Type: application/json)";
const SAVE_FAILED_MESSAGE: &str = "Could not save link";

/// Which panels the served page shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    All,
    Linked,
    Linker,
}

impl ViewMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Linked => "linked",
            Self::Linker => "linker",
        }
    }
}

/// Shared per-connection context.
#[derive(Debug, Clone)]
pub struct DashboardServer {
    state: DashboardState,
    assets: Arc<DashboardAssets>,
}

impl DashboardServer {
    pub fn new(state: DashboardState, assets: DashboardAssets) -> Self {
        Self {
            state,
            assets: Arc::new(assets),
        }
    }

    pub async fn bind(host: &str, port: u16) -> io::Result<TcpListener> {
        TcpListener::bind((host, port)).await
    }

    /// Accept until `shutdown` is cancelled. Accept errors are logged and the
    /// loop keeps going.
    pub async fn serve(self, listener: TcpListener, shutdown: CancellationToken) {
        if let Ok(addr) = listener.local_addr() {
            info!(url = %format!("http://{addr}/"), "Dashboard HTTP server listening");
        }

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Dashboard server received shutdown signal");
                    break;
                }
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        let server = self.clone();
                        tokio::spawn(async move {
                            server.handle_connection(stream, peer).await;
                        });
                    }
                    Err(e) => warn!(error = %e, "Dashboard accept failed"),
                },
            }
        }
    }

    async fn handle_connection(&self, mut stream: TcpStream, peer: SocketAddr) {
        let response = match tokio::time::timeout(REQUEST_READ_TIMEOUT, read_request(&mut stream)).await {
            Ok(Ok(request)) => {
                debug!(%peer, method = %request.method, path = %request.path, "Dashboard request");
                Some(self.route(&request).await)
            }
            Ok(Err(e)) => {
                debug!(%peer, error = %e, "Unreadable request");
                e.response()
            }
            Err(_) => {
                debug!(%peer, "Request read timed out");
                None
            }
        };

        if let Some(response) = response {
            if let Err(e) = stream.write_all(&response.to_bytes()).await {
                debug!(%peer, error = %e, "Failed to write response");
            }
        }
        let _ = stream.shutdown().await;
    }

    /// Dispatch one parsed request.
    pub async fn route(&self, request: &Request) -> Response {
        match (request.method.as_str(), request.path.as_str()) {
            ("GET", "/") | ("GET", "/index.html") => self.page(ViewMode::All).await,
            ("GET", "/linked") => self.page(ViewMode::Linked).await,
            ("GET", "/linker") => self.page(ViewMode::Linker).await,
            ("GET", STYLESHEET_PATH) => {
                Response::new(200, CSS_CONTENT_TYPE, self.assets.css.as_bytes())
            }
            ("GET", SCRIPT_PATH) => Response::new(200, JS_CONTENT_TYPE, self.assets.js.as_bytes()),
            ("GET", "/api/snapshot") => self.snapshot_json().await,
            ("POST", "/api/link") => self.link(request).await,
            _ => Response::json_message(404, NOT_FOUND_MESSAGE),
        }
    }

    async fn page(&self, mode: ViewMode) -> Response {
        let snapshot = self.state.get().await;
        let html = snapshot.html.replace(VIEW_MODE_MARKER, mode.as_str());
        Response::new(200, HTML_CONTENT_TYPE, html)
    }

    async fn snapshot_json(&self) -> Response {
        let snapshot = self.state.get().await;
        match serde_json::to_vec(snapshot.as_ref()) {
            Ok(body) => Response::json(200, body),
            Err(e) => {
                error!(error = %e, "Failed to serialize snapshot");
                Response::json_message(500, "Could not serialize snapshot")
            }
        }
    }

    async fn link(&self, request: &Request) -> Response {
        let media_type = request.media_type();
        if !media_type.is_empty() && media_type != "application/json" {
            return Response::json_message(400, NOT_JSON_MESSAGE);
        }

        let payload: LinkRequest = match serde_json::from_slice(&request.body) {
            Ok(payload) => payload,
            Err(e) => {
                debug!(error = %e, "Rejected link payload");
                return Response::json_message(400, INVALID_PAYLOAD_MESSAGE);
            }
        };

        let reply = match self.state.link(&payload).await {
            Ok(reply) => reply,
            Err(DashboardError::InvalidPayload(reason)) => {
                debug!(reason = %reason, "Rejected link payload");
                return Response::json_message(400, INVALID_PAYLOAD_MESSAGE);
            }
            Err(e) => {
                error!(error = %e, "Error saving manual link");
                return Response::json_message(500, SAVE_FAILED_MESSAGE);
            }
        };

        match serde_json::to_vec(&reply) {
            Ok(body) => Response::json(200, body),
            Err(e) => {
                error!(error = %e, "Failed to serialize link reply");
                Response::json_message(500, SAVE_FAILED_MESSAGE)
            }
        }
    }
}
