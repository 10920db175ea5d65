//! Durable storage for payment records, payloads, confirmation-advice audits,
//! merchants and agreements, backed by Postgres.
//!
//! Each store is a trait so the reconciliation and initiation services can be
//! exercised against in-memory fakes.

pub mod advice_audit_store;
pub mod agreement_store;
pub mod error;
pub mod merchant_store;
pub mod payment_payload_store;
pub mod payment_record_store;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use tracing::{error as log_error, info};

pub use advice_audit_store::{AdviceAuditStore, PgAdviceAuditStore};
pub use agreement_store::{AgreementStore, PgAgreementStore};
pub use error::{StorageError, StorageErrorKind};
pub use merchant_store::{MerchantStore, PgMerchantStore};
pub use payment_payload_store::{PaymentPayloadStore, PgPaymentPayloadStore};
pub use payment_record_store::{ConflictPolicy, PaymentRecordStore, PgPaymentRecordStore};

use crate::config::DatabaseConfig;

/// Initialize the database connection pool
pub async fn init_pool(config: &DatabaseConfig) -> Result<PgPool, StorageError> {
    info!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        "Initializing database pool"
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connection_timeout))
        .connect(&config.url)
        .await
        .map_err(|e| {
            log_error!("Failed to initialize database pool: {}", e);
            StorageError::from_sqlx(e)
        })?;

    // Test the connection
    pool.acquire().await.map_err(|e| {
        log_error!("Failed to acquire test connection: {}", e);
        StorageError::from_sqlx(e)
    })?;

    info!("Database pool initialized successfully");
    Ok(pool)
}
