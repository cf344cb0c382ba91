//! Policy Cache - demo server
//!
//! Serves a JSON-valued cache over HTTP with background expiry sweeps.

use std::net::SocketAddr;

use anyhow::Context;
use tokio::signal;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use policy_cache::api::{create_router, AppState};
use policy_cache::{spawn_cleanup_task, CacheEvent, Config, EventKind};

/// Main entry point for the cache server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create the cache and subscribe the event logger
/// 4. Start background expiry sweeper
/// 5. Create Axum router with all endpoints
/// 6. Start HTTP server on configured port
/// 7. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "policy_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Policy Cache Server");

    let config = Config::from_env().context("Failed to load configuration")?;
    info!(
        "Configuration loaded: max_size={}, max_memory={}B, default_ttl={}ms, cleanup_interval={}ms, policy={}, port={}",
        config.cache.max_size,
        config.cache.max_memory,
        config.cache.default_ttl_ms,
        config.cache.cleanup_interval_ms,
        config.cache.policy,
        config.server_port
    );

    let state = AppState::from_config(&config).context("Failed to create cache")?;
    state
        .cache
        .on_event(EventKind::Eviction, |event| {
            if let CacheEvent::Eviction {
                key,
                size_bytes,
                reason,
            } = event
            {
                debug!("Evicted '{}' ({} bytes, {:?})", key, size_bytes, reason);
            }
        })
        .await;
    state
        .cache
        .on_event(EventKind::Cleanup, |event| {
            if let CacheEvent::Cleanup { expired, evicted } = event {
                debug!("Sweep finished: {} expired, {} evicted", expired, evicted);
            }
        })
        .await;
    state
        .cache
        .on_event(EventKind::ConfigUpdate, |event| {
            if let CacheEvent::ConfigUpdate { config } = event {
                info!("Cache reconfigured: {:?}", config);
            }
        })
        .await;
    info!("Cache initialized");

    let cleanup_handle = spawn_cleanup_task(state.cache.clone());
    info!("Background sweeper started");

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cleanup_handle))
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown signal, aborts the sweeper and allows graceful shutdown.
async fn shutdown_signal(cleanup_handle: tokio::task::JoinHandle<()>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    cleanup_handle.abort();
    warn!("Sweeper aborted");
}
