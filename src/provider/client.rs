//! Provider client trait and error type.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::model::AcceptPaymentOutput;
use crate::provider::{CreateAcceptPaymentInput, CreateMandatePaymentInput, PaymentStatusOutput};

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    /// Provider responded with a non-success HTTP status.
    #[error("provider returned status {status}: {message}")]
    Status { status: u16, message: String },

    /// Connection-level failure; no response was received.
    #[error("provider transport error: {0}")]
    Transport(String),

    /// Response arrived but could not be decoded.
    #[error("provider response decode error: {0}")]
    Decode(String),
}

impl ProviderError {
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ProviderError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status_code() == Some(401)
    }

    pub fn is_bad_request(&self) -> bool {
        self.status_code() == Some(400)
    }
}

impl From<ProviderError> for crate::error::AdapterError {
    fn from(err: ProviderError) -> Self {
        use crate::error::{AdapterError, AdapterErrorKind};

        AdapterError::new(AdapterErrorKind::Provider {
            status_code: err.status_code(),
            message: err.to_string(),
        })
    }
}

#[async_trait]
pub trait ProviderClient: Send + Sync {
    /// Queries the current status of an accepted payment.
    async fn get_accept_payment(
        &self,
        token: &str,
        payment_id: Uuid,
    ) -> Result<PaymentStatusOutput, ProviderError>;

    /// Creates a direct-acceptance payment; returns the provider payment id
    /// and the authorization flow URL.
    async fn create_accept_payment(
        &self,
        token: &str,
        input: &CreateAcceptPaymentInput,
    ) -> Result<AcceptPaymentOutput, ProviderError>;

    /// Creates a payment against an existing mandate. Some banks acknowledge
    /// without a payment id, hence the Option.
    async fn create_mandate_payment(
        &self,
        token: &str,
        mandate_id: Uuid,
        input: &CreateMandatePaymentInput,
    ) -> Result<Option<Uuid>, ProviderError>;
}
