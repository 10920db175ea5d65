//! Stored agreement lookup for the mandate-based payment path.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::model::Agreement;
use crate::storage::error::StorageError;

#[async_trait]
pub trait AgreementStore: Send + Sync {
    async fn get_by_id(&self, agreement_id: &str) -> Result<Agreement, StorageError>;
}

pub struct PgAgreementStore {
    pool: PgPool,
}

impl PgAgreementStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AgreementStore for PgAgreementStore {
    async fn get_by_id(&self, agreement_id: &str) -> Result<Agreement, StorageError> {
        sqlx::query_as::<_, Agreement>(
            "SELECT agreement_id, provider_mandate_id FROM agreements WHERE agreement_id = $1",
        )
        .bind(agreement_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(StorageError::from_sqlx)?
        .ok_or_else(|| StorageError::not_found(format!("agreement {agreement_id}")))
    }
}
