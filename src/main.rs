use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use cherry_quota_server::{
    config::Config,
    create_app,
    handlers::AppState,
    services::{counter_store::CounterStore, LocalCounters, QuotaService, RedisService},
};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing()?;

    let config = Config::from_env().context("failed to load configuration")?;
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("HOST/PORT do not form a socket address")?;

    let redis = RedisService::new(&config.redis_url).context("REDIS_URL is not a valid redis url")?;
    let store: Arc<dyn CounterStore> = Arc::new(redis);

    // A failed first connection is fine; quota checks fall back until redis is back.
    let _ = tokio::time::timeout(config.store_timeout(), store.connect()).await;

    let quota = QuotaService::new(Arc::clone(&store), Arc::new(LocalCounters::new()))
        .with_store_timeout(config.store_timeout());

    info!(
        %addr,
        store_timeout_ms = config.store_timeout_ms,
        "starting cherry quota server"
    );

    let state = AppState::new(config, store, quota)?;
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("cherry quota server shutting down");
    Ok(())
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|err| anyhow::anyhow!(err))?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
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
}
