//! Core data models shared by the sources, the linker and the dashboard.
//!
//! A `MatchEntity` is rebuilt from scratch on every poll; nothing here has a
//! stable identity across cycles.

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Match entity
// =============================================================================

/// One live fixture as reported by one source at one poll moment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchEntity {
    pub home_team: String,
    pub away_team: String,
    #[serde(default)]
    pub score_home: u32,
    #[serde(default)]
    pub score_away: u32,
    #[serde(default)]
    pub minute: Option<u32>,
    #[serde(default)]
    pub competition: Option<String>,
    #[serde(default, alias = "match_url")]
    pub source_url: Option<String>,
}

impl MatchEntity {
    pub fn new(home_team: &str, away_team: &str) -> Self {
        Self {
            home_team: home_team.to_string(),
            away_team: away_team.to_string(),
            score_home: 0,
            score_away: 0,
            minute: None,
            competition: None,
            source_url: None,
        }
    }

    pub fn with_score(mut self, score_home: u32, score_away: u32) -> Self {
        self.score_home = score_home;
        self.score_away = score_away;
        self
    }

    pub fn with_minute(mut self, minute: u32) -> Self {
        self.minute = Some(minute);
        self
    }

    /// Identity key used for linking: lowercase, trimmed team names.
    pub fn key(&self) -> MatchKey {
        MatchKey::new(&self.home_team, &self.away_team)
    }
}

impl fmt::Display for MatchEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}-{} {}",
            self.home_team, self.score_home, self.score_away, self.away_team
        )
    }
}

/// `(home, away)` after lowercasing and trimming.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MatchKey {
    pub home: String,
    pub away: String,
}

impl MatchKey {
    pub fn new(home_team: &str, away_team: &str) -> Self {
        Self {
            home: home_team.trim().to_lowercase(),
            away: away_team.trim().to_lowercase(),
        }
    }
}

// =============================================================================
// Linking
// =============================================================================

/// One A entity (normalized) and one B entity believed to be the same fixture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkedPair {
    pub a: MatchEntity,
    pub b: MatchEntity,
}

impl LinkedPair {
    /// Minute shown for the pair: A's when known, otherwise B's.
    pub fn reference_minute(&self) -> Option<u32> {
        self.a.minute.or(self.b.minute)
    }
}

// =============================================================================
// Link request payload (POST /api/link)
// =============================================================================

/// Team names of one match as selected by the operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkMatch {
    pub home_team: String,
    pub away_team: String,
}

/// Operator request pairing a source-A match with a source-B match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRequest {
    pub a_match: LinkMatch,
    pub b_match: LinkMatch,
}

impl LinkRequest {
    /// True when every team name is non-blank.
    pub fn is_complete(&self) -> bool {
        [
            &self.a_match.home_team,
            &self.a_match.away_team,
            &self.b_match.home_team,
            &self.b_match.away_team,
        ]
        .iter()
        .all(|name| !name.trim().is_empty())
    }
}

/// Response body of `POST /api/link`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkReply {
    pub ok: bool,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_is_trimmed_and_lowercase() {
        let m = MatchEntity::new("  Paris SG ", "OLYMPIQUE Marseille");
        assert_eq!(m.key(), MatchKey::new("paris sg", "olympique marseille"));
    }

    #[test]
    fn test_deserialize_defaults_and_alias() {
        let m: MatchEntity = serde_json::from_str(
            r#"{"home_team":"PSG","away_team":"OM","match_url":"https://x/1"}"#,
        )
        .unwrap();
        assert_eq!(m.score_home, 0);
        assert_eq!(m.minute, None);
        assert_eq!(m.source_url.as_deref(), Some("https://x/1"));
    }

    #[test]
    fn test_link_request_completeness() {
        let mut req = LinkRequest {
            a_match: LinkMatch {
                home_team: "PSG".into(),
                away_team: "OM".into(),
            },
            b_match: LinkMatch {
                home_team: "Paris SG".into(),
                away_team: "Olympique Marseille".into(),
            },
        };
        assert!(req.is_complete());
        req.b_match.away_team = "   ".into();
        assert!(!req.is_complete());
    }

    #[test]
    fn test_display() {
        let m = MatchEntity::new("PSG", "OM").with_score(1, 0);
        assert_eq!(m.to_string(), "PSG 1-0 OM");
    }
}
