//! Downstream payment-processing provider: status output types, the client
//! trait and its HTTP implementation.

pub mod client;
pub mod http;

pub use client::{ProviderClient, ProviderError};

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Provider-side payment status codes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum PaymentStatusCode {
    PaymentExecutedDebited,
    PaymentExecutedCredited,
    Cancelled,
    AuthorizationFlowIncomplete,
    Failed,
    #[serde(other)]
    Unknown,
}

/// Named lifecycle event reported by the provider alongside a status.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StatusEvent {
    pub event: String,
    pub timestamp: DateTime<Utc>,
}

/// Output of a provider payment-status query.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PaymentStatusOutput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<PaymentStatusCode>,
    #[serde(default)]
    pub events: Vec<StatusEvent>,
    /// Provider's own settlement reference, absent for some banks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_payment_reference: Option<String>,
    pub amount: BigDecimal,
    pub currency: String,
}

impl PaymentStatusOutput {
    /// First matching event timestamp in the given priority order.
    pub fn first_event_timestamp(&self, priority: &[&str]) -> Option<DateTime<Utc>> {
        priority.iter().find_map(|name| {
            self.events
                .iter()
                .find(|e| e.event == *name)
                .map(|e| e.timestamp)
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "PascalCase")]
pub struct PaymentContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EndUser {
    pub id: String,
}

/// Input for direct-acceptance payment creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateAcceptPaymentInput {
    pub amount: BigDecimal,
    pub destination_id: Uuid,
    pub redirect_url: String,
    pub provider_id: String,
    pub currency: String,
    pub scheme_id: String,
    pub context: PaymentContext,
    pub end_user: EndUser,
}

/// Input for payment creation against an existing mandate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateMandatePaymentInput {
    pub amount: BigDecimal,
    pub currency: String,
}

/// Scheme identifier for direct-acceptance payments. Fixed for this adapter.
pub const SCHEME_UK_FASTER_PAYMENTS: &str = "UkFasterPayments";

/// Maps the scheme's category-purpose code onto the provider's context code.
/// Unmapped codes yield `None` and the context code is omitted entirely.
pub fn map_category_purpose_to_context_code(category_purpose: Option<&str>) -> Option<&'static str> {
    match category_purpose? {
        "BILL" => Some("BillPayment"),
        "ECOM" => Some("Ecommerce"),
        "TRAD" => Some("Trade"),
        "SUBS" => Some("Subscription"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn event(name: &str, secs: i64) -> StatusEvent {
        StatusEvent {
            event: name.to_string(),
            timestamp: Utc.timestamp_opt(secs, 0).unwrap(),
        }
    }

    #[test]
    fn first_event_timestamp_respects_priority_order() {
        let output = PaymentStatusOutput {
            status_code: Some(PaymentStatusCode::PaymentExecutedDebited),
            events: vec![event("PREPARING", 200), event("PENDING", 100)],
            provider_payment_reference: None,
            amount: BigDecimal::from(10),
            currency: "GBP".to_string(),
        };

        // PENDING outranks PREPARING even though PREPARING appears first.
        let ts = output
            .first_event_timestamp(&["PENDING", "PAYMENT_EXECUTED_DEBITED", "PREPARING"])
            .unwrap();
        assert_eq!(ts, Utc.timestamp_opt(100, 0).unwrap());
    }

    #[test]
    fn first_event_timestamp_none_when_no_match() {
        let output = PaymentStatusOutput {
            status_code: None,
            events: vec![event("SOMETHING_ELSE", 1)],
            provider_payment_reference: None,
            amount: BigDecimal::from(1),
            currency: "GBP".to_string(),
        };
        assert!(output.first_event_timestamp(&["PENDING"]).is_none());
    }

    #[test]
    fn unknown_status_code_deserializes_to_unknown() {
        let code: PaymentStatusCode = serde_json::from_str("\"SomeFutureStatus\"").unwrap();
        assert_eq!(code, PaymentStatusCode::Unknown);
    }

    #[test]
    fn category_purpose_mapping_is_partial() {
        assert_eq!(
            map_category_purpose_to_context_code(Some("BILL")),
            Some("BillPayment")
        );
        assert_eq!(map_category_purpose_to_context_code(Some("XXXX")), None);
        assert_eq!(map_category_purpose_to_context_code(None), None);
    }
}
