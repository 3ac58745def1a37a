use std::sync::Arc;

use tracing::{info, warn};

use clipshare_api::config::{ApiConfig, StoreBackend};
use clipshare_api::{build_router, telemetry, AppState};
use clipshare_core::KvStore;
use clipshare_store::{ClipStore, MemoryStore, RedisStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = ApiConfig::from_env()?;
    let _file_guard = telemetry::init_tracing(&config.log);

    info!(
        log_format = ?config.log.format,
        log_file = config
            .log
            .file
            .as_deref()
            .and_then(|p| p.to_str())
            .unwrap_or("(stdout)"),
        "Logging initialized"
    );

    let store: Arc<dyn KvStore> = match config.store_backend {
        StoreBackend::Redis => Arc::new(RedisStore::connect(&config.redis_url).await?),
        StoreBackend::Memory => {
            warn!("Using in-memory store; collections are lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    let clips = ClipStore::new(store, config.base_url.clone())
        .with_collection_ttl(config.collection_ttl_secs);
    let state = AppState::new(clips).with_rate_limit(&config.rate_limit)?;

    if config.rate_limit.enabled {
        info!(
            requests = config.rate_limit.requests,
            period_secs = config.rate_limit.period_secs,
            "Rate limiting enabled"
        );
    } else {
        info!("Rate limiting disabled");
    }

    let app = build_router(state, &config);

    let addr = config.bind_addr()?;
    info!(
        base_url = %config.base_url,
        collection_ttl_secs = config.collection_ttl_secs,
        "Starting server on {}",
        addr
    );
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
