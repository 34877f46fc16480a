//! The capability every live-match source provides: `poll()`.
//!
//! A source must never fail for ordinary "no live data" conditions. Any
//! source-level error is logged by the source and reported as an empty list,
//! so the monitor cannot tell "errored" from "nothing live".

use async_trait::async_trait;
use std::sync::{Arc, RwLock};

use super::models::MatchEntity;

#[async_trait]
pub trait MatchSource: Send + Sync {
    /// Lowercase source identifier, also the top-level key in the alias file.
    fn id(&self) -> &str;

    /// Current live matches. Possibly empty, never an error.
    async fn poll(&self) -> Vec<MatchEntity>;
}

/// A source returning a fixed list that can be swapped at runtime.
///
/// Used by mock mode and by tests that drive whole monitor cycles.
#[derive(Debug, Clone)]
pub struct StaticSource {
    id: String,
    matches: Arc<RwLock<Vec<MatchEntity>>>,
}

impl StaticSource {
    pub fn new(id: &str, matches: Vec<MatchEntity>) -> Self {
        Self {
            id: id.to_lowercase(),
            matches: Arc::new(RwLock::new(matches)),
        }
    }

    /// Replace the list returned by subsequent polls.
    pub fn set_matches(&self, matches: Vec<MatchEntity>) {
        match self.matches.write() {
            Ok(mut guard) => *guard = matches,
            Err(poisoned) => *poisoned.into_inner() = matches,
        }
    }
}

#[async_trait]
impl MatchSource for StaticSource {
    fn id(&self) -> &str {
        &self.id
    }

    async fn poll(&self) -> Vec<MatchEntity> {
        match self.matches.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

/// Demo fixtures for mock mode: the same fixtures spelled two ways, plus one
/// match only the reference source reports.
pub fn mock_fixtures() -> (Vec<MatchEntity>, Vec<MatchEntity>) {
    let a = vec![
        MatchEntity::new("PSG", "OM").with_score(1, 0).with_minute(12),
        MatchEntity::new("Man Utd", "Spurs").with_score(2, 2).with_minute(67),
        MatchEntity::new("Real Madrid", "Barcelona").with_minute(3),
    ];
    let b = vec![
        MatchEntity::new("Paris SG", "Olympique Marseille")
            .with_score(1, 0)
            .with_minute(12),
        MatchEntity::new("Manchester United", "Tottenham")
            .with_score(2, 2)
            .with_minute(67),
        MatchEntity::new("Real Madrid", "Barcelona").with_minute(3),
        MatchEntity::new("Ajax", "PSV").with_score(0, 1).with_minute(81),
    ];
    (a, b)
}
