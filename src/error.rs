//! Unified error handling for the adapter.
//!
//! Errors carry a machine-readable code and an HTTP-equivalent status so the
//! boundary can translate them without inspecting message strings.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Error codes for programmatic client handling.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum ErrorCode {
    // Input errors (4xx)
    #[serde(rename = "PAYMENT_NOT_FOUND")]
    PaymentNotFound,
    #[serde(rename = "MERCHANT_NOT_FOUND")]
    MerchantNotFound,
    #[serde(rename = "AGREEMENT_NOT_FOUND")]
    AgreementNotFound,
    #[serde(rename = "BAD_INPUT")]
    BadInput,
    #[serde(rename = "DUPLICATE_LIFECYCLE_ID")]
    DuplicateLifecycleId,

    // Infrastructure errors (5xx)
    #[serde(rename = "STORAGE_ERROR")]
    StorageError,
    #[serde(rename = "CONFIGURATION_ERROR")]
    ConfigurationError,

    // External errors (502/504)
    #[serde(rename = "PROVIDER_ERROR")]
    ProviderError,
    #[serde(rename = "CALLBACK_ERROR")]
    CallbackError,

    #[serde(rename = "INTERNAL_ERROR")]
    InternalError,
}

#[derive(Debug, Clone)]
pub enum AdapterErrorKind {
    /// Bad lifecycle id, malformed trigger — recovered at the boundary,
    /// never retried.
    BadInput { message: String },
    /// Payment record missing for the given lifecycle or provider payment id.
    PaymentNotFound { id: String },
    /// Merchant metadata missing for a distributor.
    MerchantNotFound { distributor_id: String },
    /// Stored agreement missing.
    AgreementNotFound { agreement_id: String },
    /// Create-conflict on a lifecycle id that should have been fresh.
    DuplicateLifecycleId { lifecycle_id: String },
    /// Storage read/write failure other than not-found/conflict.
    Storage { message: String, is_retryable: bool },
    /// Missing or invalid configuration.
    Configuration { message: String },
    /// Downstream provider failure that was not absorbed into a REJECTED
    /// advice (unexpected status codes, transport failures).
    Provider {
        status_code: Option<u16>,
        message: String,
    },
    /// Confirmation-advice delivery transport failure.
    CallbackTransport { message: String },
}

/// Adapter-wide error type.
#[derive(Debug, Clone)]
pub struct AdapterError {
    pub kind: AdapterErrorKind,
    pub context: Option<String>,
}

impl AdapterError {
    pub fn new(kind: AdapterErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    pub fn bad_input(message: impl Into<String>) -> Self {
        Self::new(AdapterErrorKind::BadInput {
            message: message.into(),
        })
    }

    pub fn payment_not_found(id: impl Into<String>) -> Self {
        Self::new(AdapterErrorKind::PaymentNotFound { id: id.into() })
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// HTTP-equivalent status for the boundary.
    pub fn status_code(&self) -> u16 {
        match &self.kind {
            AdapterErrorKind::BadInput { .. } => 400,
            AdapterErrorKind::PaymentNotFound { .. } => 400,
            AdapterErrorKind::MerchantNotFound { .. } => 400,
            AdapterErrorKind::AgreementNotFound { .. } => 400,
            AdapterErrorKind::DuplicateLifecycleId { .. } => 409,
            AdapterErrorKind::Storage { .. } => 500,
            AdapterErrorKind::Configuration { .. } => 500,
            AdapterErrorKind::Provider { .. } => 502,
            AdapterErrorKind::CallbackTransport { .. } => 502,
        }
    }

    pub fn error_code(&self) -> ErrorCode {
        match &self.kind {
            AdapterErrorKind::BadInput { .. } => ErrorCode::BadInput,
            AdapterErrorKind::PaymentNotFound { .. } => ErrorCode::PaymentNotFound,
            AdapterErrorKind::MerchantNotFound { .. } => ErrorCode::MerchantNotFound,
            AdapterErrorKind::AgreementNotFound { .. } => ErrorCode::AgreementNotFound,
            AdapterErrorKind::DuplicateLifecycleId { .. } => ErrorCode::DuplicateLifecycleId,
            AdapterErrorKind::Storage { .. } => ErrorCode::StorageError,
            AdapterErrorKind::Configuration { .. } => ErrorCode::ConfigurationError,
            AdapterErrorKind::Provider { .. } => ErrorCode::ProviderError,
            AdapterErrorKind::CallbackTransport { .. } => ErrorCode::CallbackError,
        }
    }

    pub fn is_retryable(&self) -> bool {
        match &self.kind {
            AdapterErrorKind::BadInput { .. }
            | AdapterErrorKind::PaymentNotFound { .. }
            | AdapterErrorKind::MerchantNotFound { .. }
            | AdapterErrorKind::AgreementNotFound { .. }
            | AdapterErrorKind::DuplicateLifecycleId { .. }
            | AdapterErrorKind::Configuration { .. } => false,
            AdapterErrorKind::Storage { is_retryable, .. } => *is_retryable,
            AdapterErrorKind::Provider { .. } => true,
            AdapterErrorKind::CallbackTransport { .. } => true,
        }
    }

    pub fn message(&self) -> String {
        match &self.kind {
            AdapterErrorKind::BadInput { message } => message.clone(),
            AdapterErrorKind::PaymentNotFound { id } => {
                format!("Payment not found for id: {}", id)
            }
            AdapterErrorKind::MerchantNotFound { distributor_id } => {
                format!("Merchant not found for distributor: {}", distributor_id)
            }
            AdapterErrorKind::AgreementNotFound { agreement_id } => {
                format!("Agreement '{}' not found", agreement_id)
            }
            AdapterErrorKind::DuplicateLifecycleId { lifecycle_id } => {
                format!("Lifecycle id '{}' already exists", lifecycle_id)
            }
            AdapterErrorKind::Storage { message, .. } => {
                format!("Storage error: {}", message)
            }
            AdapterErrorKind::Configuration { message } => {
                format!("Configuration error: {}", message)
            }
            AdapterErrorKind::Provider {
                status_code,
                message,
            } => match status_code {
                Some(code) => format!("Provider error ({}): {}", code, message),
                None => format!("Provider error: {}", message),
            },
            AdapterErrorKind::CallbackTransport { message } => {
                format!("Callback delivery failed: {}", message)
            }
        }
    }
}

impl fmt::Display for AdapterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for AdapterError {}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: ErrorCode,
    message: String,
}

impl IntoResponse for AdapterError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ErrorBody {
            code: self.error_code(),
            message: self.message(),
        };
        (status, Json(body)).into_response()
    }
}

/// Result type for adapter operations.
pub type AdapterResult<T> = Result<T, AdapterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_not_found_maps_to_400() {
        let error = AdapterError::payment_not_found("L-missing");
        assert_eq!(error.status_code(), 400);
        assert_eq!(error.error_code(), ErrorCode::PaymentNotFound);
        assert!(!error.is_retryable());
        assert!(error.message().contains("L-missing"));
    }

    #[test]
    fn duplicate_lifecycle_id_is_conflict() {
        let error = AdapterError::new(AdapterErrorKind::DuplicateLifecycleId {
            lifecycle_id: "L1".to_string(),
        });
        assert_eq!(error.status_code(), 409);
        assert_eq!(error.error_code(), ErrorCode::DuplicateLifecycleId);
    }

    #[test]
    fn provider_error_is_retryable_bad_gateway() {
        let error = AdapterError::new(AdapterErrorKind::Provider {
            status_code: Some(503),
            message: "upstream down".to_string(),
        });
        assert_eq!(error.status_code(), 502);
        assert!(error.is_retryable());
    }

    #[test]
    fn storage_retryability_follows_flag() {
        let transient = AdapterError::new(AdapterErrorKind::Storage {
            message: "connection reset".to_string(),
            is_retryable: true,
        });
        assert!(transient.is_retryable());

        let permanent = AdapterError::new(AdapterErrorKind::Storage {
            message: "constraint violation".to_string(),
            is_retryable: false,
        });
        assert!(!permanent.is_retryable());
    }
}
