//! Periodic reconciliation loop.
//!
//! Each cycle: poll both sources concurrently -> normalize A -> link ->
//! render -> publish, then wait for the poll interval. Cancellation is
//! checked before every cycle and preempts the wait immediately.

use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use futures::future::join;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::data::source::MatchSource;
use crate::engine::linker::link;
use crate::engine::normalizer::normalize;
use crate::state::dashboard_state::DashboardState;
use crate::ui::renderer::DashboardRenderer;
use crate::ui::snapshot::SnapshotCounts;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub struct MonitorLoop {
    /// Non-canonical source; its names are normalized.
    source_a: Arc<dyn MatchSource>,
    /// Canonical reference source.
    source_b: Arc<dyn MatchSource>,
    state: DashboardState,
    renderer: DashboardRenderer,
    interval: Duration,
}

impl MonitorLoop {
    pub fn new(
        source_a: Arc<dyn MatchSource>,
        source_b: Arc<dyn MatchSource>,
        state: DashboardState,
        renderer: DashboardRenderer,
        interval: Duration,
    ) -> Self {
        Self {
            source_a,
            source_b,
            state,
            renderer,
            interval,
        }
    }

    pub fn spawn(self, shutdown: CancellationToken) -> tokio::task::JoinHandle<u64> {
        tokio::spawn(self.run(shutdown))
    }

    /// Cycle until cancelled. Returns the number of completed cycles.
    pub async fn run(self, shutdown: CancellationToken) -> u64 {
        info!(
            interval_ms = self.interval.as_millis() as u64,
            source_a = %self.source_a.id(),
            source_b = %self.source_b.id(),
            "Monitor loop starting"
        );

        let mut cycles: u64 = 0;
        while !shutdown.is_cancelled() {
            self.run_cycle().await;
            cycles += 1;

            if tokio::time::timeout(self.interval, shutdown.cancelled())
                .await
                .is_ok()
            {
                break;
            }
        }

        info!(cycles, "Monitor loop stopped");
        cycles
    }

    /// One POLL -> NORMALIZE -> LINK -> RENDER -> PUBLISH pass.
    pub async fn run_cycle(&self) -> SnapshotCounts {
        let (a_raw, b) = join(self.source_a.poll(), self.source_b.poll()).await;

        let aliases = self.state.mappings().await;
        let a_normalized = normalize(self.source_a.id(), a_raw.clone(), &aliases);

        let outcome = link(&a_raw, &a_normalized, &b);
        debug!(
            linked = outcome.linked.len(),
            pending_a = outcome.pending_a.len(),
            pending_b = outcome.pending_b.len(),
            "Linking pass done"
        );

        let last_update = Local::now().format(TIMESTAMP_FORMAT).to_string();
        let snapshot = self
            .renderer
            .render(&outcome, a_normalized.len(), b.len(), &last_update);
        let counts = snapshot.counts;
        self.state.publish(snapshot).await;

        info!(
            a_total = counts.a_total,
            b_total = counts.b_total,
            linked = counts.linked_total,
            pending = counts.pending_total,
            "Dashboard updated"
        );
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::models::MatchEntity;
    use crate::data::source::StaticSource;
    use crate::state::mapping_store::{AliasMap, MappingStore};
    use crate::ui::snapshot::Snapshot;
    use std::time::Instant;

    fn monitor(interval: Duration) -> (MonitorLoop, DashboardState) {
        let path = std::env::temp_dir()
            .join(format!("monitor_loop_{}", std::process::id()))
            .join("aliases.json");
        let state = DashboardState::new(MappingStore::new(path, AliasMap::new()), "a", Snapshot::default());
        let a = Arc::new(StaticSource::new("a", vec![MatchEntity::new("X", "Y")]));
        let b = Arc::new(StaticSource::new("b", vec![MatchEntity::new("x", "y"), MatchEntity::new("P", "Q")]));
        let renderer = DashboardRenderer::new("{{linked_total}}", 1, "A", "B");
        (MonitorLoop::new(a, b, state.clone(), renderer, interval), state)
    }

    #[tokio::test]
    async fn test_cycle_publishes_snapshot() {
        let (monitor, state) = monitor(Duration::from_secs(1));
        let counts = monitor.run_cycle().await;
        assert_eq!(counts.linked_total, 1);
        assert_eq!(counts.pending_total, 1);
        assert_eq!(state.get().await.html, "1");
    }

    #[tokio::test]
    async fn test_cancel_preempts_wait() {
        let (monitor, _state) = monitor(Duration::from_secs(3600));
        let shutdown = CancellationToken::new();
        let handle = monitor.spawn(shutdown.clone());

        tokio::time::sleep(Duration::from_millis(50)).await;
        let started = Instant::now();
        shutdown.cancel();
        let cycles = handle.await.unwrap();

        assert_eq!(cycles, 1);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_cancelled_before_start_runs_nothing() {
        let (monitor, state) = monitor(Duration::from_millis(10));
        let shutdown = CancellationToken::new();
        shutdown.cancel();
        assert_eq!(monitor.run(shutdown).await, 0);
        assert_eq!(state.get().await.html, "");
    }
}
