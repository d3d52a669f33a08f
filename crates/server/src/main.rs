use std::{net::SocketAddr, sync::Arc};

use server::{config::Config, router, telemetry, AppState};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum MainError {
    #[error("TracingInit: {source}")]
    TracingInit {
        #[source]
        source: telemetry::TracingInitError,
    },
    #[error("Config: {source}")]
    Config {
        #[source]
        source: server::config::ConfigError,
    },
    #[error("TcpListenerBind: {source}")]
    TcpListenerBind {
        #[source]
        source: std::io::Error,
    },
    #[error("Serve: {source}")]
    Serve {
        #[source]
        source: std::io::Error,
    },
}

async fn shutdown_signal(shutdown: CancellationToken) {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to listen for Ctrl-C, running until killed");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
    shutdown.cancel();
}

#[tokio::main]
async fn main() -> Result<(), MainError> {
    dotenv::dotenv().ok();

    telemetry::init("info").map_err(|source| MainError::TracingInit { source })?;

    let config = Config::from_env().map_err(|source| MainError::Config { source })?;
    let shutdown = CancellationToken::new();

    let state = AppState::from_config(&config, shutdown.clone())
        .map_err(|source| MainError::Config { source })?;
    let app = router(Arc::new(state));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| MainError::TcpListenerBind { source })?;

    info!("👉 Server running on http://localhost:{}", config.port);
    info!("👉 Test sync: http://localhost:{}/test/sync", config.port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await
        .map_err(|source| MainError::Serve { source })?;

    Ok(())
}
