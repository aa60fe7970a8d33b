//! SessionVault Server
//!
//! HTTP front for the token lifecycle engine: sign-up, sign-in, refresh
//! rotation, revocation and a bearer-gated protected endpoint.

use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;

use sessionvault_server::accounts::{InMemoryAccountStore, PasswordHasher};
use sessionvault_server::auth::{ledger_sweeper, AuthService, InMemoryLedger, TokenSigner};
use sessionvault_server::config::Config;
use sessionvault_server::routes::create_router;
use sessionvault_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!(environment = config.environment.as_str(), "Configuration loaded");
    if config.signing_secret_generated {
        tracing::warn!(
            "SIGNING_SECRET not set, using a random per-process secret; tokens will not survive a restart"
        );
    }

    let hasher = tokio::task::spawn_blocking({
        let cost = config.bcrypt_cost;
        move || PasswordHasher::new(cost)
    })
    .await
    .context("Password hasher setup panicked")?
    .context("Failed to initialize password hasher")?;

    let ledger = Arc::new(InMemoryLedger::new());
    let auth_service = Arc::new(AuthService::new(
        TokenSigner::new(config.signing_secret.as_bytes()),
        ledger.clone(),
        Arc::new(InMemoryAccountStore::new()),
        hasher,
        config.access_token_ttl_seconds,
        config.refresh_token_ttl_seconds,
    ));

    // Start ledger sweeper in background
    let sweeper = tokio::spawn(ledger_sweeper(
        ledger,
        Duration::from_secs(config.ledger_sweep_interval_seconds),
    ));

    let app = create_router(
        AppState::new(auth_service),
        config.cors_allowed_origins.as_deref(),
    );

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", config.host, config.port))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    sweeper.abort();
    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
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
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
