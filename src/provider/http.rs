//! reqwest-backed provider client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::config::ProviderConfig;
use crate::model::AcceptPaymentOutput;
use crate::provider::client::{ProviderClient, ProviderError};
use crate::provider::{CreateAcceptPaymentInput, CreateMandatePaymentInput, PaymentStatusOutput};

pub struct HttpProviderClient {
    base_url: String,
    client: reqwest::Client,
}

impl HttpProviderClient {
    pub fn new(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn request_json<T: DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        token: &str,
        body: Option<&impl Serialize>,
    ) -> Result<T, ProviderError> {
        let mut request = self.client.request(method, url).bearer_auth(token);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                message,
            });
        }

        debug!(url = %url, status = %status, "Provider call succeeded");
        response
            .json::<T>()
            .await
            .map_err(|e| ProviderError::Decode(e.to_string()))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct MandatePaymentEnvelope {
    payment_id: Option<Uuid>,
}

#[async_trait]
impl ProviderClient for HttpProviderClient {
    async fn get_accept_payment(
        &self,
        token: &str,
        payment_id: Uuid,
    ) -> Result<PaymentStatusOutput, ProviderError> {
        self.request_json(
            Method::GET,
            &self.endpoint(&format!("/payments/{payment_id}")),
            token,
            None::<&()>,
        )
        .await
    }

    async fn create_accept_payment(
        &self,
        token: &str,
        input: &CreateAcceptPaymentInput,
    ) -> Result<AcceptPaymentOutput, ProviderError> {
        self.request_json(Method::POST, &self.endpoint("/payments"), token, Some(input))
            .await
    }

    async fn create_mandate_payment(
        &self,
        token: &str,
        mandate_id: Uuid,
        input: &CreateMandatePaymentInput,
    ) -> Result<Option<Uuid>, ProviderError> {
        let envelope: MandatePaymentEnvelope = self
            .request_json(
                Method::POST,
                &self.endpoint(&format!("/mandates/{mandate_id}/payments")),
                token,
                Some(input),
            )
            .await?;

        Ok(envelope.payment_id)
    }
}
