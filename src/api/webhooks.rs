use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde_json::{json, Value as JsonValue};
use tracing::info;

use crate::api::AppState;
use crate::error::{AdapterError, AdapterResult};
use crate::model::WebhookTrigger;

/// POST /webhook
///
/// Unknown event types fail deserialization and come back as a typed 400 so
/// the provider stops retrying them.
pub async fn handle_webhook(
    State(state): State<Arc<AppState>>,
    Json(body): Json<JsonValue>,
) -> AdapterResult<Json<JsonValue>> {
    let trigger: WebhookTrigger = serde_json::from_value(body)
        .map_err(|e| AdapterError::bad_input(format!("unrecognized webhook payload: {e}")))?;

    info!(
        payment_id = %trigger.payment_id(),
        retry_count = trigger.retry_count,
        "Received webhook"
    );

    let payment_id = state.reconciliation.reconcile(trigger, None).await?;
    Ok(Json(json!({ "PaymentId": payment_id })))
}
