//! reqwest-backed callback client.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::callback::{CallbackClient, CallbackOutcome, CallbackTransportError};
use crate::config::CallbackConfig;
use crate::model::{ConfirmationAdvice, RequestHeader};

pub struct HttpCallbackClient {
    base_url: String,
    client: reqwest::Client,
}

impl HttpCallbackClient {
    pub fn new(config: &CallbackConfig) -> Result<Self, CallbackTransportError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CallbackTransportError(e.to_string()))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[async_trait]
impl CallbackClient for HttpCallbackClient {
    async fn deliver(
        &self,
        lifecycle_id: &str,
        advice: &ConfirmationAdvice,
        header: &RequestHeader,
    ) -> Result<CallbackOutcome, CallbackTransportError> {
        let url = format!(
            "{}/payment-requests/{}/confirmation-advices",
            self.base_url, lifecycle_id
        );

        let response = self
            .client
            .post(&url)
            .header("x-request-id", &header.request_id)
            .header("x-participant-id", &header.participant_id)
            .header("x-product-id", &header.product_id)
            .header("x-idempotency-key", &header.idempotency_key)
            .json(advice)
            .send()
            .await
            .map_err(|e| CallbackTransportError(e.to_string()))?;

        let status_code = response.status().as_u16();
        let body = response
            .json::<JsonValue>()
            .await
            .unwrap_or(JsonValue::Null);

        debug!(lifecycle_id = %lifecycle_id, status = status_code, "Delivered confirmation advice");
        Ok(CallbackOutcome { status_code, body })
    }
}
