//! Confirmation-advice delivery back to the original caller's webhook
//! endpoint.

pub mod http;

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use thiserror::Error;

use crate::model::{ConfirmationAdvice, RequestHeader};

/// Structured result of a delivery attempt: either the success payload or the
/// caller's structured error payload, plus the HTTP-like status.
#[derive(Debug, Clone)]
pub struct CallbackOutcome {
    pub status_code: u16,
    pub body: JsonValue,
}

impl CallbackOutcome {
    pub fn is_success(&self) -> bool {
        self.status_code == 200
    }
}

/// Transport-level delivery failure. Structured non-200 responses are NOT
/// errors; they come back as a [`CallbackOutcome`].
#[derive(Debug, Clone, Error)]
#[error("callback transport failure: {0}")]
pub struct CallbackTransportError(pub String);

impl From<CallbackTransportError> for crate::error::AdapterError {
    fn from(err: CallbackTransportError) -> Self {
        use crate::error::{AdapterError, AdapterErrorKind};

        AdapterError::new(AdapterErrorKind::CallbackTransport { message: err.0 })
    }
}

#[async_trait]
pub trait CallbackClient: Send + Sync {
    async fn deliver(
        &self,
        lifecycle_id: &str,
        advice: &ConfirmationAdvice,
        header: &RequestHeader,
    ) -> Result<CallbackOutcome, CallbackTransportError>;
}
