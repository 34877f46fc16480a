//! Minimal HTTP/1.1 dashboard server.

pub mod dashboard_server;
pub mod http;
