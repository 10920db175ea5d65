//! Payment payload store: the original request content, written once during
//! initiation and read many times during reconciliation.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::model::PaymentPayload;
use crate::storage::error::StorageError;

#[async_trait]
pub trait PaymentPayloadStore: Send + Sync {
    async fn create(&self, payload: &PaymentPayload) -> Result<(), StorageError>;

    /// Fails with not-found when absent; the payload is required for every
    /// reconciliation attempt.
    async fn get(&self, lifecycle_id: &str) -> Result<PaymentPayload, StorageError>;
}

pub struct PgPaymentPayloadStore {
    pool: PgPool,
}

impl PgPaymentPayloadStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PaymentPayloadStore for PgPaymentPayloadStore {
    async fn create(&self, payload: &PaymentPayload) -> Result<(), StorageError> {
        let body = serde_json::to_value(payload)
            .map_err(|e| StorageError::other(format!("payload serialization: {e}"), false))?;

        sqlx::query("INSERT INTO payment_payloads (lifecycle_id, payload) VALUES ($1, $2)")
            .bind(payload.lifecycle_id())
            .bind(body)
            .execute(&self.pool)
            .await
            .map_err(StorageError::from_sqlx)?;

        Ok(())
    }

    async fn get(&self, lifecycle_id: &str) -> Result<PaymentPayload, StorageError> {
        let row: Option<(serde_json::Value,)> =
            sqlx::query_as("SELECT payload FROM payment_payloads WHERE lifecycle_id = $1")
                .bind(lifecycle_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(StorageError::from_sqlx)?;

        let (body,) = row
            .ok_or_else(|| StorageError::not_found(format!("payment payload {lifecycle_id}")))?;

        serde_json::from_value(body)
            .map_err(|e| StorageError::other(format!("payload deserialization: {e}"), false))
    }
}
