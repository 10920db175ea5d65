//! Confirmation-advice audit store: one row per lifecycle id recording the
//! exact advice request sent and the response received. Row existence is the
//! idempotency guard for re-delivery.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::model::ConfirmationAdviceAudit;
use crate::storage::error::StorageError;

#[async_trait]
pub trait AdviceAuditStore: Send + Sync {
    async fn create(&self, audit: &ConfirmationAdviceAudit) -> Result<(), StorageError>;

    async fn get(&self, lifecycle_id: &str) -> Result<ConfirmationAdviceAudit, StorageError>;
}

pub struct PgAdviceAuditStore {
    pool: PgPool,
}

impl PgAdviceAuditStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AdviceAuditStore for PgAdviceAuditStore {
    async fn create(&self, audit: &ConfirmationAdviceAudit) -> Result<(), StorageError> {
        let request = serde_json::to_value(&audit.request)
            .map_err(|e| StorageError::other(format!("audit serialization: {e}"), false))?;
        let headers = serde_json::to_value(&audit.request_headers)
            .map_err(|e| StorageError::other(format!("audit serialization: {e}"), false))?;

        sqlx::query(
            "INSERT INTO advice_audits \
             (lifecycle_id, request, request_headers, success_response, error_response) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&audit.lifecycle_id)
        .bind(request)
        .bind(headers)
        .bind(&audit.success_response)
        .bind(&audit.error_response)
        .execute(&self.pool)
        .await
        .map_err(StorageError::from_sqlx)?;

        Ok(())
    }

    async fn get(&self, lifecycle_id: &str) -> Result<ConfirmationAdviceAudit, StorageError> {
        let row: Option<(
            serde_json::Value,
            serde_json::Value,
            Option<serde_json::Value>,
            Option<serde_json::Value>,
            chrono::DateTime<chrono::Utc>,
        )> = sqlx::query_as(
            "SELECT request, request_headers, success_response, error_response, created_at \
             FROM advice_audits WHERE lifecycle_id = $1",
        )
        .bind(lifecycle_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(StorageError::from_sqlx)?;

        let (request, headers, success_response, error_response, created_at) =
            row.ok_or_else(|| StorageError::not_found(format!("advice audit {lifecycle_id}")))?;

        Ok(ConfirmationAdviceAudit {
            lifecycle_id: lifecycle_id.to_string(),
            request: serde_json::from_value(request)
                .map_err(|e| StorageError::other(format!("audit deserialization: {e}"), false))?,
            request_headers: serde_json::from_value(headers)
                .map_err(|e| StorageError::other(format!("audit deserialization: {e}"), false))?,
            success_response,
            error_response,
            created_at,
        })
    }
}
