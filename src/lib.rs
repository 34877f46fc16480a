//! Library entrypoint for live-match-linker.
//!
//! Exposes all modules so integration tests can import them.

pub mod api;
pub mod config;
pub mod console;
pub mod data;
pub mod engine;
pub mod monitor;
pub mod server;
pub mod state;
pub mod ui;
