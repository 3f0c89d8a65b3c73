use std::sync::Arc;

use cobrador_accounting::AccountingClient;
use cobrador_api::{logging, router, ApiConfig, AppState};
use cobrador_banking::BankingClient;
use cobrador_core::CobradorResult;
use cobrador_db::PgStore;
use cobrador_extract::{DocumentCodeExtractor, InvoiceScraper};
use cobrador_reconcile::ReconciliationEngine;
use secrecy::ExposeSecret;

#[tokio::main]
async fn main() {
    // Load .env if present
    let _ = dotenvy::dotenv();

    logging::init_logging(logging::DEFAULT_FILTER);

    let config = ApiConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Configuration error: {e}");
        std::process::exit(1);
    });

    tracing::info!(
        listen_addr = %config.listen_addr,
        accounting = %config.cobrador.accounting.app_url,
        bank = %config.cobrador.banking.api_url,
        timeout_secs = config.cobrador.http_timeout.as_secs(),
        "starting cobrador-api"
    );

    let state = build_state(&config).await.unwrap_or_else(|e| {
        eprintln!("Startup error: {e}");
        std::process::exit(1);
    });

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .unwrap_or_else(|e| {
            eprintln!("Bind error: {e}");
            std::process::exit(1);
        });

    tracing::info!(listen_addr = %config.listen_addr, "cobrador-api listening");

    if let Err(e) = axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        eprintln!("Server error: {e}");
        std::process::exit(1);
    }
}

/// Connects the store, runs migrations and wires the engine.
async fn build_state(config: &ApiConfig) -> CobradorResult<AppState> {
    let store = PgStore::connect(config.database_url.expose_secret()).await?;
    store.run_migrations().await?;

    let timeout = config.cobrador.http_timeout;
    let extractor = DocumentCodeExtractor::new(config.cobrador.extractor.clone(), timeout)?;
    let accounting = AccountingClient::new(config.cobrador.accounting.clone(), extractor, timeout)?;
    let scraper = InvoiceScraper::new(timeout)?;
    let banking = BankingClient::new(config.cobrador.banking.clone(), timeout);

    let engine = ReconciliationEngine::new(accounting, scraper, banking, Arc::new(store));
    Ok(AppState::new(Arc::new(engine), config.cron_secret.clone()))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
