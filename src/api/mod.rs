//! HTTP client for upstream match feeds.

pub mod client;
pub mod errors;
