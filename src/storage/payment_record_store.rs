//! Payment record store: one row per payment-request lifecycle, with a
//! secondary lookup by provider-assigned payment id.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::model::PaymentRecord;
use crate::storage::error::StorageError;

/// Conflict policy for record updates.
///
/// The adapter only ever uses last-writer-wins: concurrent updates to the
/// same record can silently lose fields, so callers serialize updates per
/// lifecycle id where correctness matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictPolicy {
    LastWriterWins,
}

#[async_trait]
pub trait PaymentRecordStore: Send + Sync {
    /// Creates a fresh record. A unique violation on the lifecycle id is
    /// reported as a conflict, distinct from any other failure.
    async fn create(&self, record: &PaymentRecord) -> Result<PaymentRecord, StorageError>;

    async fn get(&self, lifecycle_id: &str) -> Result<PaymentRecord, StorageError>;

    async fn update(
        &self,
        record: &PaymentRecord,
        policy: ConflictPolicy,
    ) -> Result<PaymentRecord, StorageError>;

    /// Secondary-index lookup by provider payment id.
    async fn find_by_provider_payment_id(
        &self,
        provider_payment_id: &str,
    ) -> Result<PaymentRecord, StorageError>;
}

pub struct PgPaymentRecordStore {
    pool: PgPool,
}

impl PgPaymentRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const RECORD_COLUMNS: &str = "lifecycle_id, distributor_id, merchant_id, destination_id, \
     provider_payment_id, provider_payment_url, merchant_return_url, \
     advice_sent, advice_sent_at, created_at";

#[async_trait]
impl PaymentRecordStore for PgPaymentRecordStore {
    async fn create(&self, record: &PaymentRecord) -> Result<PaymentRecord, StorageError> {
        sqlx::query_as::<_, PaymentRecord>(
            "INSERT INTO payment_records \
             (lifecycle_id, distributor_id, merchant_id, destination_id, \
              provider_payment_id, provider_payment_url, merchant_return_url, \
              advice_sent, advice_sent_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING lifecycle_id, distributor_id, merchant_id, destination_id, \
                       provider_payment_id, provider_payment_url, merchant_return_url, \
                       advice_sent, advice_sent_at, created_at",
        )
        .bind(&record.lifecycle_id)
        .bind(&record.distributor_id)
        .bind(&record.merchant_id)
        .bind(&record.destination_id)
        .bind(&record.provider_payment_id)
        .bind(&record.provider_payment_url)
        .bind(&record.merchant_return_url)
        .bind(record.advice_sent)
        .bind(record.advice_sent_at)
        .fetch_one(&self.pool)
        .await
        .map_err(StorageError::from_sqlx)
    }

    async fn get(&self, lifecycle_id: &str) -> Result<PaymentRecord, StorageError> {
        sqlx::query_as::<_, PaymentRecord>(&format!(
            "SELECT {RECORD_COLUMNS} FROM payment_records WHERE lifecycle_id = $1"
        ))
        .bind(lifecycle_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(StorageError::from_sqlx)?
        .ok_or_else(|| StorageError::not_found(format!("payment record {lifecycle_id}")))
    }

    async fn update(
        &self,
        record: &PaymentRecord,
        policy: ConflictPolicy,
    ) -> Result<PaymentRecord, StorageError> {
        // Only one policy today; the match keeps additions explicit.
        match policy {
            ConflictPolicy::LastWriterWins => {}
        }

        sqlx::query_as::<_, PaymentRecord>(
            "UPDATE payment_records SET \
               provider_payment_id = $2, provider_payment_url = $3, \
               advice_sent = $4, advice_sent_at = $5 \
             WHERE lifecycle_id = $1 \
             RETURNING lifecycle_id, distributor_id, merchant_id, destination_id, \
                       provider_payment_id, provider_payment_url, merchant_return_url, \
                       advice_sent, advice_sent_at, created_at",
        )
        .bind(&record.lifecycle_id)
        .bind(&record.provider_payment_id)
        .bind(&record.provider_payment_url)
        .bind(record.advice_sent)
        .bind(record.advice_sent_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(StorageError::from_sqlx)?
        .ok_or_else(|| StorageError::not_found(format!("payment record {}", record.lifecycle_id)))
    }

    async fn find_by_provider_payment_id(
        &self,
        provider_payment_id: &str,
    ) -> Result<PaymentRecord, StorageError> {
        sqlx::query_as::<_, PaymentRecord>(&format!(
            "SELECT {RECORD_COLUMNS} FROM payment_records WHERE provider_payment_id = $1"
        ))
        .bind(provider_payment_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(StorageError::from_sqlx)?
        .ok_or_else(|| {
            StorageError::not_found(format!(
                "payment record for provider payment id {provider_payment_id}"
            ))
        })
    }
}
