use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;

use zapp_adapter::api::{self, AppState};
use zapp_adapter::auth::EnvTokenProvider;
use zapp_adapter::cache::PaymentCache;
use zapp_adapter::callback::http::HttpCallbackClient;
use zapp_adapter::config::AppConfig;
use zapp_adapter::logging::init_tracing;
use zapp_adapter::provider::http::HttpProviderClient;
use zapp_adapter::services::{InitiationService, ReconciliationEngine};
use zapp_adapter::storage::{
    self, PgAdviceAuditStore, PgAgreementStore, PgMerchantStore, PgPaymentPayloadStore,
    PgPaymentRecordStore,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("failed to load configuration")?;
    config.validate().context("configuration is invalid")?;

    init_tracing(&config.logging);
    info!(
        host = %config.server.host,
        port = config.server.port,
        "Starting payment adapter"
    );

    let pool = storage::init_pool(&config.database)
        .await
        .context("failed to initialize database pool")?;

    let records = Arc::new(PgPaymentRecordStore::new(pool.clone()));
    let payloads = Arc::new(PgPaymentPayloadStore::new(pool.clone()));
    let audits = Arc::new(PgAdviceAuditStore::new(pool.clone()));
    let merchants = Arc::new(PgMerchantStore::new(pool.clone()));
    let agreements = Arc::new(PgAgreementStore::new(pool.clone()));

    let provider = Arc::new(
        HttpProviderClient::new(&config.provider).context("failed to build provider client")?,
    );
    let callback = Arc::new(
        HttpCallbackClient::new(&config.callback).context("failed to build callback client")?,
    );
    let tokens = Arc::new(EnvTokenProvider::from_env().context("failed to load credentials")?);
    let cache = Arc::new(PaymentCache::new(&config.cache));

    let initiation = Arc::new(InitiationService::new(
        records.clone(),
        payloads.clone(),
        merchants.clone(),
        agreements,
        provider.clone(),
        tokens.clone(),
        cache.clone(),
        config.adapter.clone(),
    ));
    let reconciliation = Arc::new(ReconciliationEngine::new(
        records,
        payloads,
        audits,
        merchants,
        provider,
        callback,
        tokens,
        cache,
        config.adapter.clone(),
    ));

    let state = Arc::new(AppState {
        initiation,
        reconciliation,
    });
    let app = api::router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(addr = %addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl-C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
