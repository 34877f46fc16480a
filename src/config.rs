//! Configuration management.
//!
//! Loads settings from environment variables and .env file.

use std::path::PathBuf;
use std::time::Duration;

use crate::api::client::FeedClientConfig;

/// Application configuration loaded from environment.
#[derive(Debug, Clone)]
pub struct Settings {
    // Dashboard server
    pub dashboard_host: String,
    pub dashboard_port: u16,
    pub refresh_seconds: u64,

    // Monitor
    pub poll_interval_seconds: f64,

    // Files
    pub alias_file_path: PathBuf,
    pub assets_dir: PathBuf,

    // Sources
    pub source_a_id: String,
    pub source_b_id: String,
    pub source_a_url: String,
    pub source_b_url: String,
    pub use_mock_feeds: bool,

    // Feed client tuning
    pub feed_timeout_seconds: f64,
    pub feed_max_retries: u32,
    pub feed_rate_limit_per_sec: u32,

    // Console
    pub enable_console: bool,

    // Logging
    pub log_level: String,
    pub log_json: bool,
}

impl Settings {
    /// Load settings from environment variables (and .env file).
    pub fn from_env() -> Self {
        // Try to load .env file (ignore if not found).
        let _ = dotenvy::dotenv();

        let source_a_url = env_str("SOURCE_A_URL", "");
        let source_b_url = env_str("SOURCE_B_URL", "");
        let urls_missing = source_a_url.is_empty() || source_b_url.is_empty();

        Self {
            dashboard_host: env_str("DASHBOARD_HOST", "127.0.0.1"),
            dashboard_port: env_u16("DASHBOARD_PORT", 8765),
            refresh_seconds: env_u64("REFRESH_SECONDS", 5),

            poll_interval_seconds: env_f64("POLL_INTERVAL_SECONDS", 1.0),

            alias_file_path: PathBuf::from(env_str(
                "ALIAS_FILE_PATH",
                "data/team_name_mappings.json",
            )),
            assets_dir: PathBuf::from(env_str("ASSETS_DIR", "assets")),

            source_a_id: env_str("SOURCE_A_ID", "a_source").to_lowercase(),
            source_b_id: env_str("SOURCE_B_ID", "b_source").to_lowercase(),
            source_a_url,
            source_b_url,
            use_mock_feeds: env_bool("USE_MOCK_FEEDS", urls_missing),

            feed_timeout_seconds: env_f64("FEED_TIMEOUT_SECONDS", 10.0),
            feed_max_retries: env_u32("FEED_MAX_RETRIES", 2),
            feed_rate_limit_per_sec: env_u32("FEED_RATE_LIMIT_PER_SEC", 5),

            enable_console: env_bool("ENABLE_CONSOLE", false),

            log_level: env_str("LOG_LEVEL", "info"),
            log_json: env_bool("LOG_JSON", false),
        }
    }

    /// Validate configuration for critical requirements.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.dashboard_port == 0 {
            errors.push("DASHBOARD_PORT must be non-zero".to_string());
        }

        if !is_valid_interval(self.poll_interval_seconds) {
            errors.push("POLL_INTERVAL_SECONDS must be > 0 and representable as a duration".to_string());
        }

        if !is_valid_interval(self.feed_timeout_seconds) {
            errors.push("FEED_TIMEOUT_SECONDS must be > 0 and representable as a duration".to_string());
        }

        if self.source_a_id.trim().is_empty() || self.source_b_id.trim().is_empty() {
            errors.push("SOURCE_A_ID and SOURCE_B_ID must be non-empty".to_string());
        } else if self.source_a_id == self.source_b_id {
            errors.push("SOURCE_A_ID and SOURCE_B_ID must differ".to_string());
        }

        if !self.use_mock_feeds {
            if self.source_a_url.is_empty() {
                errors.push("SOURCE_A_URL is required unless USE_MOCK_FEEDS=true".to_string());
            }
            if self.source_b_url.is_empty() {
                errors.push("SOURCE_B_URL is required unless USE_MOCK_FEEDS=true".to_string());
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Poll interval; falls back to 1s when the value fails `validate`.
    pub fn poll_interval(&self) -> Duration {
        Duration::try_from_secs_f64(self.poll_interval_seconds).unwrap_or(Duration::from_secs(1))
    }

    /// Feed client tuning; timeout falls back to 10s when it fails `validate`.
    pub fn feed_client_config(&self) -> FeedClientConfig {
        FeedClientConfig {
            timeout: Duration::try_from_secs_f64(self.feed_timeout_seconds)
                .unwrap_or(Duration::from_secs(10)),
            max_retries: self.feed_max_retries,
            rate_limit_per_sec: self.feed_rate_limit_per_sec,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            dashboard_host: "127.0.0.1".to_string(),
            dashboard_port: 8765,
            refresh_seconds: 5,
            poll_interval_seconds: 1.0,
            alias_file_path: PathBuf::from("data/team_name_mappings.json"),
            assets_dir: PathBuf::from("assets"),
            source_a_id: "a_source".to_string(),
            source_b_id: "b_source".to_string(),
            source_a_url: String::new(),
            source_b_url: String::new(),
            use_mock_feeds: true,
            feed_timeout_seconds: 10.0,
            feed_max_retries: 2,
            feed_rate_limit_per_sec: 5,
            enable_console: false,
            log_level: "info".to_string(),
            log_json: false,
        }
    }
}

fn is_valid_interval(seconds: f64) -> bool {
    seconds > 0.0 && Duration::try_from_secs_f64(seconds).is_ok()
}

// =============================================================================
// Environment helpers
// =============================================================================

fn env_str(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(default)
}

fn env_f64(key: &str, default: f64) -> f64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_u16(key: &str, default: u16) -> u16 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_u32(key: &str, default: u32) -> u32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
