//! Storefront Payments - gateway reconciliation service

use std::sync::Arc;

use anyhow::Result;
use storefront_payments::{build_app, AppState, Config, EventPublisher, GatewayClient, PgOrderStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;
    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.log_level))?;
    tracing_subscriber::registry().with(env_filter).with(tracing_subscriber::fmt::layer()).init();
    tracing::debug!(?config, "configuration loaded");

    let store = PgOrderStore::connect(&config.database_url, config.db_max_connections).await?;
    let gateway = GatewayClient::from_config(&config.gateway)?;
    if gateway.is_none() {
        tracing::warn!("GATEWAY_ACCESS_TOKEN not set, payment routes will answer 500");
    }
    let events = EventPublisher::connect(config.nats_url.as_deref()).await;

    let state = AppState::new(Arc::new(store), gateway, events, config.gateway.webhook_secret.clone());
    let app = build_app(state);

    tracing::info!("Storefront payments listening on {}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => { signal.recv().await; }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
