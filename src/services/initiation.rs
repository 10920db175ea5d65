//! Payment initiation: accepts the scheme request, persists it, and drives
//! provider payment creation on the direct and mandate paths.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::TokenProvider;
use crate::cache::PaymentCache;
use crate::config::AdapterConfig;
use crate::error::{AdapterError, AdapterErrorKind, AdapterResult};
use crate::model::{
    new_message_id, AcceptPaymentOutput, Ack, NewPaymentRequest, PaymentPayload, PaymentRecord,
    RequestHeader,
};
use crate::provider::{
    map_category_purpose_to_context_code, CreateAcceptPaymentInput, CreateMandatePaymentInput,
    EndUser, PaymentContext, ProviderClient, SCHEME_UK_FASTER_PAYMENTS,
};
use crate::services::retry::RetryPolicy;
use crate::storage::{
    AgreementStore, ConflictPolicy, MerchantStore, PaymentPayloadStore, PaymentRecordStore,
};

pub struct InitiationService {
    records: Arc<dyn PaymentRecordStore>,
    payloads: Arc<dyn PaymentPayloadStore>,
    merchants: Arc<dyn MerchantStore>,
    agreements: Arc<dyn AgreementStore>,
    provider: Arc<dyn ProviderClient>,
    tokens: Arc<dyn TokenProvider>,
    cache: Arc<PaymentCache>,
    config: AdapterConfig,
}

impl InitiationService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        records: Arc<dyn PaymentRecordStore>,
        payloads: Arc<dyn PaymentPayloadStore>,
        merchants: Arc<dyn MerchantStore>,
        agreements: Arc<dyn AgreementStore>,
        provider: Arc<dyn ProviderClient>,
        tokens: Arc<dyn TokenProvider>,
        cache: Arc<PaymentCache>,
        config: AdapterConfig,
    ) -> Self {
        Self {
            records,
            payloads,
            merchants,
            agreements,
            provider,
            tokens,
            cache,
            config,
        }
    }

    /// Accepts a new payment request: persists the payload and a fresh record,
    /// then acknowledges. Provider interaction happens later, when the flow
    /// front end asks for payment creation.
    pub async fn initiate(
        &self,
        request: NewPaymentRequest,
        headers: RequestHeader,
    ) -> AdapterResult<Ack> {
        let lifecycle_id = request.transaction.payment_request_lifecycle_id.clone();
        let distributor_id = request.creditor.creditor_service_provider_id.clone();

        let merchant = self
            .merchants
            .get_by_distributor_id(&distributor_id)
            .await
            .map_err(|e| {
                if e.is_not_found() {
                    AdapterError::new(AdapterErrorKind::MerchantNotFound { distributor_id })
                } else {
                    e.into()
                }
            })?;

        let original_message_id = request.message_id.clone();
        let merchant_return_url = request.creditor.creditor_return_url.clone();
        let payload = PaymentPayload { request, headers };
        self.payloads.create(&payload).await.map_err(|e| {
            if e.is_conflict() {
                AdapterError::new(AdapterErrorKind::DuplicateLifecycleId {
                    lifecycle_id: lifecycle_id.clone(),
                })
            } else {
                e.into()
            }
        })?;

        let record = PaymentRecord {
            lifecycle_id: lifecycle_id.clone(),
            distributor_id: merchant.creditor_service_provider_id.clone(),
            merchant_id: merchant.tenant_id.clone(),
            destination_id: merchant.destination_id.clone(),
            provider_payment_id: String::new(),
            provider_payment_url: String::new(),
            merchant_return_url,
            advice_sent: false,
            advice_sent_at: None,
            created_at: Utc::now(),
        };
        self.records.create(&record).await.map_err(|e| {
            if e.is_conflict() {
                AdapterError::new(AdapterErrorKind::DuplicateLifecycleId {
                    lifecycle_id: lifecycle_id.clone(),
                })
            } else {
                e.into()
            }
        })?;

        info!(lifecycle_id = %lifecycle_id, "Payment request accepted");

        Ok(Ack {
            message_id: new_message_id(),
            original_message_id,
            initiating_party_id: self.config.initiating_party_id.clone(),
            creation_date_time: Utc::now(),
        })
    }

    /// Creates the provider-side payment for an initiated request.
    ///
    /// Initiation and creation race when the flow front end redirects faster
    /// than the record commit lands, so the record lookup polls on a fixed
    /// interval within a bounded budget before giving up.
    pub async fn create_payment(
        &self,
        lifecycle_id: &str,
        provider_id: &str,
    ) -> AdapterResult<AcceptPaymentOutput> {
        let policy = RetryPolicy::new(
            self.config.record_poll_timeout,
            self.config.record_poll_interval,
        );
        let record = policy
            .run(|| {
                let records = Arc::clone(&self.records);
                let id = lifecycle_id.to_string();
                async move { records.get(&id).await.ok() }
            })
            .await
            .ok_or_else(|| {
                warn!(lifecycle_id = %lifecycle_id, "Record never became visible within budget");
                AdapterError::payment_not_found(lifecycle_id)
                    .with_context("record not visible within the polling budget")
            })?;

        let payload = self.payloads.get(lifecycle_id).await.map_err(|e| {
            if e.is_not_found() {
                AdapterError::payment_not_found(lifecycle_id)
                    .with_context("stored payload missing for lifecycle id")
            } else {
                e.into()
            }
        })?;

        let merchant = self
            .merchants
            .get_by_distributor_id(&record.distributor_id)
            .await
            .map_err(|e| {
                if e.is_not_found() {
                    AdapterError::new(AdapterErrorKind::MerchantNotFound {
                        distributor_id: record.distributor_id.clone(),
                    })
                } else {
                    e.into()
                }
            })?;

        let token = self.tokens.token_for_tenant(&merchant.tenant_id).await?;
        let transaction = &payload.request.transaction;

        if transaction.agreement_id == self.config.direct_agreement_id {
            return self
                .create_direct_payment(record, &payload, &merchant, &token, provider_id)
                .await;
        }

        let agreement = self
            .agreements
            .get_by_id(&transaction.agreement_id)
            .await
            .map_err(|e| {
                if e.is_not_found() {
                    AdapterError::new(AdapterErrorKind::AgreementNotFound {
                        agreement_id: transaction.agreement_id.clone(),
                    })
                } else {
                    e.into()
                }
            })?;

        let flow_url = payload.request.creditor.creditor_return_url.clone();

        let mandate_id = agreement
            .provider_mandate_id
            .as_deref()
            .filter(|id| !id.is_empty());
        let Some(mandate_id) = mandate_id else {
            // Agreement exists but the provider has not registered the mandate
            // yet. The caller is sent back to the merchant without a payment.
            warn!(
                lifecycle_id = %lifecycle_id,
                agreement_id = %agreement.agreement_id,
                "Agreement has no provider mandate, skipping payment creation"
            );
            return Ok(AcceptPaymentOutput {
                payment_id: Uuid::nil(),
                flow_url,
            });
        };

        let mandate_uuid = Uuid::parse_str(mandate_id).map_err(|_| {
            AdapterError::new(AdapterErrorKind::Configuration {
                message: format!(
                    "agreement {} carries a malformed provider mandate id",
                    agreement.agreement_id
                ),
            })
        })?;

        let input = CreateMandatePaymentInput {
            amount: transaction.instructed_amount.value.clone(),
            currency: transaction.instructed_amount.currency.clone(),
        };
        let payment_id = self
            .provider
            .create_mandate_payment(&token, mandate_uuid, &input)
            .await?;

        info!(
            lifecycle_id = %lifecycle_id,
            mandate_id = %mandate_uuid,
            "Mandate payment created"
        );

        Ok(AcceptPaymentOutput {
            payment_id: payment_id.unwrap_or_else(Uuid::nil),
            flow_url,
        })
    }

    async fn create_direct_payment(
        &self,
        record: PaymentRecord,
        payload: &PaymentPayload,
        merchant: &crate::model::Merchant,
        token: &str,
        provider_id: &str,
    ) -> AdapterResult<AcceptPaymentOutput> {
        let transaction = &payload.request.transaction;

        let destination_id = Uuid::parse_str(&merchant.destination_id).map_err(|_| {
            AdapterError::new(AdapterErrorKind::Configuration {
                message: format!(
                    "merchant {} has a malformed destination id",
                    merchant.creditor_service_provider_id
                ),
            })
        })?;

        let provider_id = if provider_id.is_empty() {
            self.config.default_bank_id.clone()
        } else {
            provider_id.to_string()
        };

        let input = CreateAcceptPaymentInput {
            amount: transaction.instructed_amount.value.clone(),
            destination_id,
            redirect_url: payload.request.creditor.creditor_return_url.clone(),
            provider_id,
            currency: transaction.instructed_amount.currency.clone(),
            scheme_id: SCHEME_UK_FASTER_PAYMENTS.to_string(),
            context: PaymentContext {
                purpose_code: transaction.purpose.clone(),
                context_code: map_category_purpose_to_context_code(
                    transaction.category_purpose.as_deref(),
                )
                .map(str::to_string),
            },
            end_user: EndUser {
                id: payload.request.creditor.creditor_id.clone(),
            },
        };

        let output = self.provider.create_accept_payment(token, &input).await?;

        let mut updated = record;
        updated.provider_payment_id = output.payment_id.to_string();
        updated.provider_payment_url = output.flow_url.clone();
        self.records
            .update(&updated, ConflictPolicy::LastWriterWins)
            .await?;
        self.cache.invalidate(&updated.lifecycle_id).await;

        info!(
            lifecycle_id = %updated.lifecycle_id,
            payment_id = %output.payment_id,
            "Direct-acceptance payment created"
        );

        Ok(output)
    }
}
