//! Async REST client for JSON match feeds.
//!
//! Features:
//! - Rate limiting (configurable, default 5 req/sec)
//! - Automatic retries with exponential backoff
//! - Accepts either a bare `[MatchEntity]` array or `{"matches": [...]}`

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::Client;
use serde::Deserialize;
use std::num::NonZeroU32;
use std::time::Duration;
use tracing::{debug, warn};

use crate::data::models::MatchEntity;

use super::errors::FeedError;

/// Client tuning.
#[derive(Debug, Clone)]
pub struct FeedClientConfig {
    pub timeout: Duration,
    pub max_retries: u32,
    pub rate_limit_per_sec: u32,
}

impl Default for FeedClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            max_retries: 2,
            rate_limit_per_sec: 5,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FeedBody {
    List(Vec<MatchEntity>),
    Wrapped {
        #[serde(default)]
        matches: Vec<MatchEntity>,
    },
}

impl FeedBody {
    fn into_matches(self) -> Vec<MatchEntity> {
        match self {
            Self::List(matches) | Self::Wrapped { matches } => matches,
        }
    }
}

/// Parse a feed response body.
pub fn parse_feed_body(text: &str) -> Result<Vec<MatchEntity>, FeedError> {
    serde_json::from_str::<FeedBody>(text)
        .map(FeedBody::into_matches)
        .map_err(|e| FeedError::Deserialization(e.to_string()))
}

const BASE_BACKOFF_MS: u64 = 250;
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Exponential backoff for the given zero-based attempt, capped.
fn backoff_delay(attempt: u32) -> Duration {
    let ms = BASE_BACKOFF_MS.saturating_mul(2u64.saturating_pow(attempt));
    Duration::from_millis(ms).min(MAX_BACKOFF)
}

/// Rate-limited, retrying GET client for one feed URL.
pub struct FeedClient {
    url: String,
    client: Client,
    rate_limiter: DefaultDirectRateLimiter,
    max_retries: u32,
}

impl FeedClient {
    pub fn new(url: &str, config: &FeedClientConfig) -> Result<Self, FeedError> {
        let url = url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(FeedError::InvalidUrl(url.to_string()));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .tcp_keepalive(Duration::from_secs(30))
            .build()
            .map_err(|e| FeedError::Network(e.to_string()))?;

        let per_sec = NonZeroU32::new(config.rate_limit_per_sec).unwrap_or(NonZeroU32::MIN);
        let rate_limiter = RateLimiter::direct(Quota::per_second(per_sec));

        Ok(Self {
            url: url.to_string(),
            client,
            rate_limiter,
            max_retries: config.max_retries.max(1),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch and decode the current match list.
    pub async fn fetch_matches(&self) -> Result<Vec<MatchEntity>, FeedError> {
        let mut last_error: Option<FeedError> = None;

        for attempt in 0..self.max_retries {
            self.rate_limiter.until_ready().await;

            debug!(url = %self.url, attempt = attempt + 1, "Feed request");

            let error = match self.client.get(&self.url).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        let text = response
                            .text()
                            .await
                            .map_err(|e| FeedError::Network(e.to_string()))?;
                        return parse_feed_body(&text);
                    }

                    if status.as_u16() == 429 {
                        let retry_after = response
                            .headers()
                            .get("Retry-After")
                            .and_then(|v| v.to_str().ok())
                            .and_then(|v| v.parse::<u64>().ok())
                            .unwrap_or(1);
                        FeedError::RateLimited { retry_after }
                    } else {
                        let body_text = response.text().await.unwrap_or_default();
                        FeedError::from_response(status.as_u16(), &body_text)
                    }
                }
                Err(e) if e.is_timeout() => FeedError::Timeout(e.to_string()),
                Err(e) => FeedError::Network(e.to_string()),
            };

            if !error.is_retryable() {
                return Err(error);
            }

            let delay = match &error {
                FeedError::RateLimited { retry_after } => Duration::from_secs(*retry_after),
                _ => backoff_delay(attempt),
            };
            warn!(
                url = %self.url,
                error = %error,
                delay_ms = delay.as_millis() as u64,
                attempt = attempt + 1,
                "Feed request failed, retrying"
            );
            last_error = Some(error);
            if attempt + 1 < self.max_retries {
                tokio::time::sleep(delay).await;
            }
        }

        Err(FeedError::MaxRetriesExceeded {
            attempts: self.max_retries,
            last_error: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "unknown".to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_list() {
        let matches =
            parse_feed_body(r#"[{"home_team":"PSG","away_team":"OM","score_home":1}]"#).unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].score_home, 1);
    }

    #[test]
    fn test_parse_wrapped_list() {
        let matches = parse_feed_body(
            r#"{"matches":[{"home_team":"A","away_team":"B","minute":33}],"generated":"now"}"#,
        )
        .unwrap();
        assert_eq!(matches[0].minute, Some(33));
    }

    #[test]
    fn test_parse_garbage_fails() {
        assert!(matches!(
            parse_feed_body("<html>"),
            Err(FeedError::Deserialization(_))
        ));
    }

    #[test]
    fn test_backoff_doubles_then_caps() {
        assert_eq!(backoff_delay(0), Duration::from_millis(250));
        assert_eq!(backoff_delay(2), Duration::from_millis(1000));
        assert_eq!(backoff_delay(10), MAX_BACKOFF);
        assert_eq!(backoff_delay(64), MAX_BACKOFF);
        assert_eq!(backoff_delay(u32::MAX), MAX_BACKOFF);
    }

    #[test]
    fn test_rejects_non_http_url() {
        let err = FeedClient::new("ftp://feed", &FeedClientConfig::default()).err();
        assert!(matches!(err, Some(FeedError::InvalidUrl(_))));
    }
}
