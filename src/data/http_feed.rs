//! Live matches from a JSON feed over HTTP.
//!
//! Wraps `FeedClient` in the `MatchSource` contract: every failure is logged
//! and masked as an empty list.

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::api::client::{FeedClient, FeedClientConfig};
use crate::api::errors::FeedError;

use super::models::MatchEntity;
use super::source::MatchSource;

pub struct HttpFeedSource {
    id: String,
    client: FeedClient,
}

impl HttpFeedSource {
    pub fn new(id: &str, url: &str, config: &FeedClientConfig) -> Result<Self, FeedError> {
        Ok(Self {
            id: id.to_lowercase(),
            client: FeedClient::new(url, config)?,
        })
    }
}

#[async_trait]
impl MatchSource for HttpFeedSource {
    fn id(&self) -> &str {
        &self.id
    }

    async fn poll(&self) -> Vec<MatchEntity> {
        match self.client.fetch_matches().await {
            Ok(matches) => {
                debug!(source = %self.id, count = matches.len(), "Feed poll done");
                matches
            }
            Err(e) => {
                warn!(source = %self.id, url = %self.client.url(), error = %e, "Feed poll failed");
                Vec::new()
            }
        }
    }
}
