//! Live match linker
//!
//! Polls two live-match feeds, links the matches they share, and serves a
//! local dashboard where an operator can pair the leftovers by hand.
//!
//! Architecture:
//! - Tokio async runtime for concurrent I/O
//! - Monitor loop: poll -> normalize -> link -> render -> publish
//! - Hand-rolled HTTP/1.1 dashboard server on a local port
//! - Alias table persisted as JSON; operator links feed the next cycle
//! - Optional stdin console (help / status / open / exit)

use std::sync::Arc;

use live_match_linker::config::Settings;
use live_match_linker::console::{dashboard_urls, Console};
use live_match_linker::data::http_feed::HttpFeedSource;
use live_match_linker::data::source::{mock_fixtures, MatchSource, StaticSource};
use live_match_linker::monitor::monitor_loop::MonitorLoop;
use live_match_linker::server::dashboard_server::DashboardServer;
use live_match_linker::state::dashboard_state::DashboardState;
use live_match_linker::state::mapping_store::MappingStore;
use live_match_linker::ui::assets::DashboardAssets;
use live_match_linker::ui::renderer::DashboardRenderer;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration.
    let settings = Settings::from_env();

    // Initialize logging.
    init_logging(&settings);

    info!("=== Live Match Linker ===");
    info!(
        source_a = %settings.source_a_id,
        source_b = %settings.source_b_id,
        mock_feeds = settings.use_mock_feeds,
        alias_file = %settings.alias_file_path.display(),
        "Configuration loaded"
    );

    // Validate settings.
    if let Err(errors) = settings.validate() {
        for e in &errors {
            error!(error = %e, "Configuration error");
        }
        anyhow::bail!("Configuration validation failed");
    }

    let assets = DashboardAssets::load(&settings.assets_dir)?;
    let store = MappingStore::open(&settings.alias_file_path);

    let (source_a, source_b) = build_sources(&settings)?;

    let renderer = DashboardRenderer::new(
        &assets.template,
        settings.refresh_seconds,
        &settings.source_a_id,
        &settings.source_b_id,
    );
    let state = DashboardState::new(store, &settings.source_a_id, renderer.initial());

    // =========================================================================
    // Start dashboard server and monitor
    // =========================================================================
    let shutdown = CancellationToken::new();

    let listener = DashboardServer::bind(&settings.dashboard_host, settings.dashboard_port).await?;
    let server = DashboardServer::new(state.clone(), assets);
    let server_handle = tokio::spawn(server.serve(listener, shutdown.clone()));

    for url in dashboard_urls(&settings.dashboard_host, settings.dashboard_port) {
        info!(url = %url, "Dashboard available");
    }

    let monitor = MonitorLoop::new(
        source_a,
        source_b,
        state.clone(),
        renderer,
        settings.poll_interval(),
    );
    let monitor_handle = monitor.spawn(shutdown.clone());

    let console_handle = if settings.enable_console {
        let console = Console::new(state.clone(), &settings.dashboard_host, settings.dashboard_port);
        Some(console.spawn(shutdown.clone()))
    } else {
        None
    };

    // Shutdown signal.
    let shutdown_clone = shutdown.clone();
    tokio::spawn(async move {
        tokio::select! {
            result = signal::ctrl_c() => {
                if let Err(e) = result {
                    warn!(error = %e, "Failed to listen for ctrl+c");
                    return;
                }
                info!("Shutdown signal received");
                shutdown_clone.cancel();
            }
            _ = shutdown_clone.cancelled() => {}
        }
    });

    // Graceful shutdown.
    match monitor_handle.await {
        Ok(cycles) => info!(cycles, "Monitor finished"),
        Err(e) => error!(error = %e, "Monitor task failed"),
    }
    shutdown.cancel();

    if let Err(e) = server_handle.await {
        error!(error = %e, "Dashboard server task failed");
    }
    info!("Shutdown complete.");

    if let Some(handle) = console_handle {
        // A pending stdin read holds a blocking thread that runtime teardown
        // would wait on.
        handle.abort();
        std::process::exit(0);
    }
    Ok(())
}

/// Mock fixtures when no feed URLs are configured, HTTP JSON feeds otherwise.
fn build_sources(
    settings: &Settings,
) -> anyhow::Result<(Arc<dyn MatchSource>, Arc<dyn MatchSource>)> {
    if settings.use_mock_feeds {
        info!("Using built-in mock feeds");
        let (a_matches, b_matches) = mock_fixtures();
        return Ok((
            Arc::new(StaticSource::new(&settings.source_a_id, a_matches)),
            Arc::new(StaticSource::new(&settings.source_b_id, b_matches)),
        ));
    }

    let client_config = settings.feed_client_config();
    let source_a = HttpFeedSource::new(&settings.source_a_id, &settings.source_a_url, &client_config)?;
    let source_b = HttpFeedSource::new(&settings.source_b_id, &settings.source_b_url, &client_config)?;
    Ok((Arc::new(source_a), Arc::new(source_b)))
}

fn init_logging(settings: &Settings) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_level));

    if settings.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }
}
