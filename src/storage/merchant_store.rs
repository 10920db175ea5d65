//! Merchant metadata lookup, keyed by creditor service-provider id.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::model::Merchant;
use crate::storage::error::StorageError;

#[async_trait]
pub trait MerchantStore: Send + Sync {
    async fn get_by_distributor_id(&self, distributor_id: &str)
        -> Result<Merchant, StorageError>;
}

pub struct PgMerchantStore {
    pool: PgPool,
}

impl PgMerchantStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MerchantStore for PgMerchantStore {
    async fn get_by_distributor_id(
        &self,
        distributor_id: &str,
    ) -> Result<Merchant, StorageError> {
        sqlx::query_as::<_, Merchant>(
            "SELECT creditor_service_provider_id, creditor_id, destination_id, \
                    participant_id, tenant_id \
             FROM merchants WHERE creditor_service_provider_id = $1",
        )
        .bind(distributor_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(StorageError::from_sqlx)?
        .ok_or_else(|| StorageError::not_found(format!("merchant {distributor_id}")))
    }
}
