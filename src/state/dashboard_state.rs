//! Shared state between the monitor loop and the dashboard server.
//!
//! Two independently locked resources:
//! - the latest published `Snapshot`
//! - the alias `MappingStore`; an upsert and its persistence run under one
//!   lock acquisition so file writes never interleave

use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::data::models::{LinkReply, LinkRequest};
use crate::ui::snapshot::Snapshot;

use super::mapping_store::{persist, AliasMap, MappingError, MappingStore};

pub const ALREADY_LINKED_MESSAGE: &str = "Link was already saved.";

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("invalid link payload: {0}")]
    InvalidPayload(String),

    #[error("failed to persist aliases: {0}")]
    Persist(#[from] MappingError),

    #[error("persistence worker failed: {0}")]
    Worker(String),
}

/// Cheaply clonable handle; all clones share the same state.
#[derive(Debug, Clone)]
pub struct DashboardState {
    snapshot: Arc<Mutex<Arc<Snapshot>>>,
    store: Arc<Mutex<MappingStore>>,
    /// Source whose names get rewritten (the non-canonical side).
    source_id: String,
}

impl DashboardState {
    pub fn new(store: MappingStore, source_id: &str, initial: Snapshot) -> Self {
        Self {
            snapshot: Arc::new(Mutex::new(Arc::new(initial))),
            store: Arc::new(Mutex::new(store)),
            source_id: source_id.to_lowercase(),
        }
    }

    // =========================================================================
    // Snapshot
    // =========================================================================

    /// Current snapshot. Never mutates.
    pub async fn get(&self) -> Arc<Snapshot> {
        self.snapshot.lock().await.clone()
    }

    /// Replace the held snapshot; last writer wins.
    pub async fn publish(&self, snapshot: Snapshot) {
        *self.snapshot.lock().await = Arc::new(snapshot);
    }

    // =========================================================================
    // Aliases
    // =========================================================================

    /// Copy of the whole alias table, for the next normalization pass.
    pub async fn mappings(&self) -> AliasMap {
        self.store.lock().await.aliases().clone()
    }

    /// Copy of one source's `native -> canonical` table; empty when unknown.
    pub async fn mappings_for(&self, source: &str) -> BTreeMap<String, String> {
        self.store
            .lock()
            .await
            .aliases()
            .get(&source.to_lowercase())
            .cloned()
            .unwrap_or_default()
    }

    /// Record an operator correction: source-A names map to source-B names.
    ///
    /// `Ok(ok = false)` means the link was already stored and nothing was
    /// pending a flush. A failed write keeps the in-memory update and marks
    /// the store dirty, so the next call retries the flush.
    pub async fn link(&self, request: &LinkRequest) -> Result<LinkReply, DashboardError> {
        if !request.is_complete() {
            return Err(DashboardError::InvalidPayload(
                "team names must be non-empty".to_string(),
            ));
        }

        let mut store = self.store.lock().await;
        let changed = store.upsert(
            &self.source_id,
            &request.a_match.home_team,
            &request.a_match.away_team,
            &request.b_match.home_team,
            &request.b_match.away_team,
        );

        if !changed && !store.is_dirty() {
            return Ok(LinkReply {
                ok: false,
                message: ALREADY_LINKED_MESSAGE.to_string(),
            });
        }

        let path = store.path().to_path_buf();
        let aliases = store.aliases().clone();
        let written = tokio::task::spawn_blocking(move || persist(&path, &aliases))
            .await
            .map_err(|e| DashboardError::Worker(e.to_string()))?;

        if let Err(e) = written {
            warn!(path = %store.path().display(), error = %e, "Alias persistence failed, change kept in memory");
            return Err(DashboardError::Persist(e));
        }
        store.mark_clean();

        let file_name = store
            .path()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| store.path().display().to_string());
        drop(store);

        info!(
            source = %self.source_id,
            a_home = %request.a_match.home_team,
            a_away = %request.a_match.away_team,
            b_home = %request.b_match.home_team,
            b_away = %request.b_match.away_team,
            "Manual link saved"
        );

        Ok(LinkReply {
            ok: true,
            message: format!("Link saved to {file_name}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::models::LinkMatch;
    use std::path::PathBuf;

    fn request() -> LinkRequest {
        LinkRequest {
            a_match: LinkMatch {
                home_team: "PSG".into(),
                away_team: "OM".into(),
            },
            b_match: LinkMatch {
                home_team: "Paris SG".into(),
                away_team: "Olympique Marseille".into(),
            },
        }
    }

    fn temp_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("dashboard_state_{}_{}", name, std::process::id()))
    }

    #[tokio::test]
    async fn test_publish_replaces_snapshot() {
        let state = DashboardState::new(
            MappingStore::new(temp_dir("publish").join("a.json"), AliasMap::new()),
            "a",
            Snapshot::default(),
        );
        let mut next = Snapshot::default();
        next.last_update = "later".into();
        state.publish(next).await;
        assert_eq!(state.get().await.last_update, "later");
    }

    #[tokio::test]
    async fn test_link_then_duplicate() {
        let dir = temp_dir("dup");
        let path = dir.join("aliases.json");
        let state = DashboardState::new(MappingStore::new(&path, AliasMap::new()), "A_Source", Snapshot::default());

        let first = state.link(&request()).await.unwrap();
        assert!(first.ok);
        assert!(first.message.contains("aliases.json"));

        let second = state.link(&request()).await.unwrap();
        assert!(!second.ok);
        assert_eq!(second.message, ALREADY_LINKED_MESSAGE);

        let aliases = state.mappings().await;
        assert_eq!(aliases["a_source"]["PSG"], "Paris SG");

        let table = state.mappings_for("A_SOURCE").await;
        assert_eq!(table.len(), 2);
        assert_eq!(table["OM"], "Olympique Marseille");
        assert!(state.mappings_for("b_source").await.is_empty());
        assert!(std::fs::read_to_string(&path).unwrap().ends_with("}\n"));
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn test_blank_names_rejected() {
        let state = DashboardState::new(
            MappingStore::new(temp_dir("blank").join("a.json"), AliasMap::new()),
            "a",
            Snapshot::default(),
        );
        let mut req = request();
        req.a_match.home_team = " ".into();
        assert!(matches!(state.link(&req).await, Err(DashboardError::InvalidPayload(_))));
        assert!(state.mappings().await.is_empty());
    }

    #[tokio::test]
    async fn test_failed_persist_keeps_change_and_flushes_later() {
        let dir = temp_dir("blocked");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        // A regular file where the parent directory should be blocks the write.
        let blocker = dir.join("blocker");
        std::fs::write(&blocker, b"x").unwrap();
        let path = blocker.join("aliases.json");

        let state = DashboardState::new(MappingStore::new(&path, AliasMap::new()), "a", Snapshot::default());
        assert!(matches!(state.link(&request()).await, Err(DashboardError::Persist(_))));
        assert_eq!(state.mappings().await["a"]["OM"], "Olympique Marseille");

        // Unblock and resubmit the same link: the dirty store is flushed.
        std::fs::remove_file(&blocker).unwrap();
        let reply = state.link(&request()).await.unwrap();
        assert!(reply.ok);
        assert!(path.exists());
        let _ = std::fs::remove_dir_all(dir);
    }
}
