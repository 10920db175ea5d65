//! Domain types shared across the adapter: payment records, stored payloads,
//! confirmation advices and webhook triggers.
//!
//! Wire-facing structs keep the PascalCase field names of the Zapp scheme
//! messages; internal records use snake_case and map to storage columns.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generates a fresh opaque message id (dashless uuid, per scheme convention).
pub fn new_message_id() -> String {
    Uuid::new_v4().simple().to_string()
}

// ============================================================================
// Payment record & payload
// ============================================================================

/// One payment-request lifecycle as persisted in `payment_records`.
///
/// `provider_payment_id` stays empty until the downstream provider accepts the
/// payment; `advice_sent` transitions at most once from false to true.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PaymentRecord {
    pub lifecycle_id: String,
    pub distributor_id: String,
    pub merchant_id: String,
    pub destination_id: String,
    pub provider_payment_id: String,
    pub provider_payment_url: String,
    pub merchant_return_url: String,
    pub advice_sent: bool,
    pub advice_sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl PaymentRecord {
    /// Parses the provider payment id, treating empty/garbage as the nil uuid.
    pub fn provider_payment_uuid(&self) -> Uuid {
        Uuid::parse_str(&self.provider_payment_id).unwrap_or(Uuid::nil())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct Amount {
    pub currency: String,
    pub value: BigDecimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PayloadDebtor {
    pub debtor_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PayloadCreditor {
    pub creditor_id: String,
    pub creditor_service_provider_id: String,
    /// Merchant return URL the debtor is redirected to after the flow.
    pub creditor_return_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PayloadTransaction {
    pub payment_request_lifecycle_id: String,
    pub instructed_amount: Amount,
    pub agreement_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_purpose: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_to_end_id: Option<String>,
}

/// Payment-initiation request body as received from the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NewPaymentRequest {
    pub message_id: String,
    pub business_type: String,
    pub debtor: PayloadDebtor,
    pub creditor: PayloadCreditor,
    pub transaction: PayloadTransaction,
}

/// The original request content, persisted once at initiation and read many
/// times during reconciliation. Immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentPayload {
    #[serde(flatten)]
    pub request: NewPaymentRequest,
    pub headers: RequestHeader,
}

impl PaymentPayload {
    pub fn lifecycle_id(&self) -> &str {
        &self.request.transaction.payment_request_lifecycle_id
    }
}

// ============================================================================
// Headers & acknowledgements
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RequestHeader {
    pub request_id: String,
    pub participant_id: String,
    pub product_id: String,
    pub idempotency_key: String,
}

/// Acknowledgement returned by the initiation and status-retrieval operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Ack {
    pub message_id: String,
    pub original_message_id: String,
    pub initiating_party_id: String,
    pub creation_date_time: DateTime<Utc>,
}

/// Caller-initiated "where is my payment" poll.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StatusRetrievalRequest {
    pub message_id: String,
    pub payment_request_status_retrieval_lifecycle_id: String,
}

// ============================================================================
// Webhook trigger
// ============================================================================

/// Provider-side webhook payload. Unknown tags fail deserialization and are
/// rejected at the HTTP boundary with a typed 400.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "Type", content = "Data")]
pub enum WebhookEvent {
    #[serde(rename_all = "PascalCase")]
    AcceptPaymentStatusUpdated {
        payment_id: Uuid,
        execution_time: DateTime<Utc>,
    },
    #[serde(rename_all = "PascalCase")]
    MandateStatusUpdated {
        mandate_id: Uuid,
        execution_time: DateTime<Utc>,
    },
}

/// Transient reconciliation trigger; never persisted.
///
/// `status_retrieval_lifecycle_id` is set when the trigger was synthesized
/// from a caller poll rather than a genuine provider push.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookTrigger {
    #[serde(flatten)]
    pub event: WebhookEvent,
    #[serde(rename = "RetryCount", default)]
    pub retry_count: u32,
    #[serde(
        rename = "PaymentRequestStatusRetrievalLifecycleId",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub status_retrieval_lifecycle_id: Option<String>,
}

impl WebhookTrigger {
    pub fn is_status_retrieval(&self) -> bool {
        self.status_retrieval_lifecycle_id
            .as_deref()
            .is_some_and(|id| !id.is_empty())
    }

    /// Provider payment id carried by the trigger, nil for mandate updates.
    pub fn payment_id(&self) -> Uuid {
        match self.event {
            WebhookEvent::AcceptPaymentStatusUpdated { payment_id, .. } => payment_id,
            WebhookEvent::MandateStatusUpdated { .. } => Uuid::nil(),
        }
    }
}

// ============================================================================
// Confirmation advice
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TransactionStatus {
    #[serde(rename = "APPR")]
    Approved,
    #[serde(rename = "RJCT")]
    Rejected,
}

/// Reason codes carried by a rejected advice.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ReasonCode {
    /// System missing: the payment never reached the provider.
    #[serde(rename = "SYSM")]
    Sysm,
    /// System processing failure on the provider side.
    #[serde(rename = "SYSP")]
    Sysp,
    /// Issuer authorization flow did not complete.
    #[serde(rename = "ISST")]
    Isst,
    /// Rejected outright.
    #[serde(rename = "RJCT")]
    Rjct,
}

impl ReasonCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReasonCode::Sysm => "SYSM",
            ReasonCode::Sysp => "SYSP",
            ReasonCode::Isst => "ISST",
            ReasonCode::Rjct => "RJCT",
        }
    }
}

impl std::fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Status block of a confirmation advice. One-shot within a reconcile pass:
/// rejected always carries exactly one reason, approved never does.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct AdviceStatus {
    pub transaction_status: TransactionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_status_reason: Option<ReasonCode>,
}

impl AdviceStatus {
    pub fn approved() -> Self {
        Self {
            transaction_status: TransactionStatus::Approved,
            transaction_status_reason: None,
        }
    }

    pub fn rejected(reason: ReasonCode) -> Self {
        Self {
            transaction_status: TransactionStatus::Rejected,
            transaction_status_reason: Some(reason),
        }
    }
}

/// Settlement detail attached to an approved advice.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct SettlementDetail {
    pub payment_reference: String,
    pub clearing_system: String,
    pub payment_date_time: DateTime<Utc>,
    pub payment_amount: Amount,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AdviceDebtor {
    pub debtor_id: String,
    pub debtor_service_provider_id: String,
}

/// The canonical status message delivered back to the original caller once a
/// definite outcome is known.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ConfirmationAdvice {
    pub initiating_party_id: String,
    pub message_id: String,
    pub creation_date_time: DateTime<Utc>,
    pub business_type: String,
    pub payment_request_lifecycle_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_request_status_retrieval_lifecycle_id: Option<String>,
    pub acceptance_date_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<AdviceStatus>,
    pub debtor: AdviceDebtor,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment: Option<SettlementDetail>,
}

/// Audit row capturing the exact advice request sent and the response received.
/// Presence of a row for a lifecycle id is the idempotency guard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmationAdviceAudit {
    pub lifecycle_id: String,
    pub request: ConfirmationAdvice,
    pub request_headers: RequestHeader,
    pub success_response: Option<serde_json::Value>,
    pub error_response: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Merchant & agreement
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Merchant {
    pub creditor_service_provider_id: String,
    pub creditor_id: String,
    pub destination_id: String,
    pub participant_id: String,
    pub tenant_id: String,
}

/// Pre-authorized recurring-payment agreement. `provider_mandate_id` is empty
/// until the provider registers the mandate.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Agreement {
    pub agreement_id: String,
    pub provider_mandate_id: Option<String>,
}

/// Output of the direct-acceptance / mandate payment-creation paths.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct AcceptPaymentOutput {
    pub payment_id: Uuid,
    pub flow_url: String,
}
