//! Status reconciliation: turns webhook pushes and caller status polls into
//! exactly one confirmation advice per payment lifecycle.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::auth::TokenProvider;
use crate::cache::PaymentCache;
use crate::callback::CallbackClient;
use crate::config::AdapterConfig;
use crate::error::{AdapterError, AdapterErrorKind, AdapterResult};
use crate::model::{
    new_message_id, Ack, AdviceDebtor, AdviceStatus, Amount, ConfirmationAdvice,
    ConfirmationAdviceAudit, PaymentRecord, ReasonCode, RequestHeader, SettlementDetail,
    StatusRetrievalRequest, WebhookEvent, WebhookTrigger,
};
use crate::provider::{PaymentStatusCode, ProviderClient};
use crate::storage::{
    AdviceAuditStore, ConflictPolicy, MerchantStore, PaymentPayloadStore, PaymentRecordStore,
};

/// Clearing system stamped on every approved settlement block.
const CLEARING_SYSTEM: &str = "FPS";

/// Event names that can carry the settlement timestamp, highest priority first.
const PAYMENT_EVENT_PRIORITY: [&str; 3] = ["PENDING", "PAYMENT_EXECUTED_DEBITED", "PREPARING"];

/// Event names that can carry the acceptance timestamp, highest priority first.
const ACCEPTANCE_EVENT_PRIORITY: [&str; 3] = ["PROVIDER_PROCESSING", "PENDING", "READY_FOR_AUTHORIZE"];

/// Serializes reconciliation per lifecycle id so concurrent webhook retries
/// cannot race past the idempotency check.
#[derive(Default)]
struct LifecycleLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl LifecycleLocks {
    async fn acquire(&self, lifecycle_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            // A strong count of 1 means the map holds the only reference:
            // no guard is held and nobody is waiting, so the entry is stale.
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks
                .entry(lifecycle_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}

pub struct ReconciliationEngine {
    records: Arc<dyn PaymentRecordStore>,
    payloads: Arc<dyn PaymentPayloadStore>,
    audits: Arc<dyn AdviceAuditStore>,
    merchants: Arc<dyn MerchantStore>,
    provider: Arc<dyn ProviderClient>,
    callback: Arc<dyn CallbackClient>,
    tokens: Arc<dyn TokenProvider>,
    cache: Arc<PaymentCache>,
    config: AdapterConfig,
    lifecycle_locks: LifecycleLocks,
}

impl ReconciliationEngine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        records: Arc<dyn PaymentRecordStore>,
        payloads: Arc<dyn PaymentPayloadStore>,
        audits: Arc<dyn AdviceAuditStore>,
        merchants: Arc<dyn MerchantStore>,
        provider: Arc<dyn ProviderClient>,
        callback: Arc<dyn CallbackClient>,
        tokens: Arc<dyn TokenProvider>,
        cache: Arc<PaymentCache>,
        config: AdapterConfig,
    ) -> Self {
        Self {
            records,
            payloads,
            audits,
            merchants,
            provider,
            callback,
            tokens,
            cache,
            config,
            lifecycle_locks: LifecycleLocks::default(),
        }
    }

    /// Read-through lookup of a payment record by lifecycle id. Populates the
    /// cache on a miss; absence is not an error.
    pub async fn payment_from_cache(
        &self,
        lifecycle_id: &str,
    ) -> AdapterResult<Option<PaymentRecord>> {
        if let Some(record) = self.cache.get(lifecycle_id).await {
            return Ok(Some(record));
        }
        match self.records.get(lifecycle_id).await {
            Ok(record) => {
                self.cache.put(record.clone()).await;
                Ok(Some(record))
            }
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Acknowledges a caller status poll and reconciles in the background.
    /// The ack goes out before the provider is consulted.
    pub async fn get_payment_status(
        self: Arc<Self>,
        lifecycle_id: &str,
        request: StatusRetrievalRequest,
    ) -> AdapterResult<Ack> {
        let record = self
            .payment_from_cache(lifecycle_id)
            .await?
            .ok_or_else(|| AdapterError::payment_not_found(lifecycle_id))?;

        let trigger = WebhookTrigger {
            event: WebhookEvent::AcceptPaymentStatusUpdated {
                payment_id: record.provider_payment_uuid(),
                execution_time: Utc::now(),
            },
            retry_count: 0,
            status_retrieval_lifecycle_id: Some(
                request.payment_request_status_retrieval_lifecycle_id.clone(),
            ),
        };

        let ack = Ack {
            message_id: new_message_id(),
            original_message_id: request.message_id.clone(),
            initiating_party_id: self.config.initiating_party_id.clone(),
            creation_date_time: Utc::now(),
        };

        let engine = Arc::clone(&self);
        let lifecycle = lifecycle_id.to_string();
        tokio::spawn(async move {
            if let Err(e) = engine.reconcile(trigger, Some(record)).await {
                error!(
                    lifecycle_id = %lifecycle,
                    error = %e,
                    "Background status reconciliation failed"
                );
            }
        });

        Ok(ack)
    }

    /// Full reconciliation pass for one trigger. Returns the provider payment
    /// id the trigger resolved to.
    ///
    /// At most one advice is ever delivered per lifecycle id; replays are
    /// detected through the audit row and acknowledged without side effects.
    pub async fn reconcile(
        &self,
        trigger: WebhookTrigger,
        known_record: Option<PaymentRecord>,
    ) -> AdapterResult<Uuid> {
        let payment_id = match &trigger.event {
            WebhookEvent::AcceptPaymentStatusUpdated { payment_id, .. } => *payment_id,
            WebhookEvent::MandateStatusUpdated { mandate_id, .. } => {
                // Mandate lifecycle changes carry no payment to reconcile.
                info!(mandate_id = %mandate_id, "Acknowledged mandate status update");
                return Ok(Uuid::nil());
            }
        };
        let is_status_retrieval = trigger.is_status_retrieval();

        let record = match known_record {
            Some(record) => record,
            None => self
                .records
                .find_by_provider_payment_id(&payment_id.to_string())
                .await
                .map_err(|e| {
                    if e.is_not_found() {
                        AdapterError::payment_not_found(payment_id.to_string())
                            .with_context("no record for webhook payment id")
                    } else {
                        e.into()
                    }
                })?,
        };
        let lifecycle_id = record.lifecycle_id.clone();

        // Everything from the idempotency check through delivery runs under
        // the per-lifecycle lock.
        let _guard = self.lifecycle_locks.acquire(&lifecycle_id).await;

        match self.audits.get(&lifecycle_id).await {
            Ok(_) => {
                info!(
                    lifecycle_id = %lifecycle_id,
                    retry_count = trigger.retry_count,
                    "Advice already audited, acknowledging duplicate trigger"
                );
                return Ok(payment_id);
            }
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e.into()),
        }

        let payload = self.payloads.get(&lifecycle_id).await.map_err(|e| {
            if e.is_not_found() {
                AdapterError::payment_not_found(&lifecycle_id)
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

        let header = RequestHeader {
            request_id: Uuid::new_v4().to_string(),
            participant_id: self.config.initiating_party_id.clone(),
            product_id: self.config.product_id.clone(),
            idempotency_key: Uuid::new_v4().to_string(),
        };

        let now = Utc::now();
        let mut advice = ConfirmationAdvice {
            initiating_party_id: self.config.initiating_party_id.clone(),
            message_id: payload.request.message_id.clone(),
            creation_date_time: now,
            business_type: payload.request.business_type.clone(),
            payment_request_lifecycle_id: lifecycle_id.clone(),
            payment_request_status_retrieval_lifecycle_id: trigger
                .status_retrieval_lifecycle_id
                .clone()
                .filter(|id| !id.is_empty()),
            acceptance_date_time: now,
            status: None,
            debtor: AdviceDebtor {
                debtor_id: payload.request.debtor.debtor_id.clone(),
                debtor_service_provider_id: self.config.debtor_service_provider_id.clone(),
            },
            payment: None,
        };

        // A poll for a payment that never reached the provider is conclusive
        // on its own: reject without a provider round trip.
        if is_status_retrieval && payment_id.is_nil() {
            advice.status = Some(AdviceStatus::rejected(ReasonCode::Sysm));
            self.deliver(record, &advice, &header).await?;
            return Ok(payment_id);
        }

        let token = self.tokens.token_for_tenant(&merchant.tenant_id).await?;

        match self.provider.get_accept_payment(&token, payment_id).await {
            Ok(status) => match status.status_code {
                Some(
                    PaymentStatusCode::PaymentExecutedDebited
                    | PaymentStatusCode::PaymentExecutedCredited,
                ) => {
                    advice.acceptance_date_time = status
                        .first_event_timestamp(&ACCEPTANCE_EVENT_PRIORITY)
                        .unwrap_or(now);
                    advice.status = Some(AdviceStatus::approved());
                    advice.payment = Some(SettlementDetail {
                        payment_reference: status
                            .provider_payment_reference
                            .clone()
                            .unwrap_or_else(|| Uuid::new_v4().to_string()),
                        clearing_system: CLEARING_SYSTEM.to_string(),
                        payment_date_time: status
                            .first_event_timestamp(&PAYMENT_EVENT_PRIORITY)
                            .unwrap_or(now),
                        payment_amount: Amount {
                            currency: status.currency.clone(),
                            value: status.amount.clone(),
                        },
                    });
                }
                Some(PaymentStatusCode::Cancelled) => {
                    advice.status = Some(AdviceStatus::rejected(ReasonCode::Rjct));
                }
                Some(PaymentStatusCode::AuthorizationFlowIncomplete) => {
                    advice.status = Some(AdviceStatus::rejected(ReasonCode::Isst));
                }
                Some(PaymentStatusCode::Failed) => {
                    advice.status = Some(AdviceStatus::rejected(ReasonCode::Sysp));
                }
                // Unknown or absent status: not conclusive, no advice from a
                // plain webhook trigger.
                _ => {}
            },
            Err(e) if e.is_unauthorized() => {
                warn!(
                    lifecycle_id = %lifecycle_id,
                    "Provider rejected credentials during status query"
                );
                advice.status = Some(AdviceStatus::rejected(ReasonCode::Sysm));
            }
            Err(e) if e.is_bad_request() => {
                warn!(
                    lifecycle_id = %lifecycle_id,
                    payment_id = %payment_id,
                    "Provider rejected status query as malformed"
                );
                advice.status = Some(AdviceStatus::rejected(ReasonCode::Sysp));
            }
            Err(e) => {
                error!(
                    lifecycle_id = %lifecycle_id,
                    payment_id = %payment_id,
                    error = %e,
                    "Provider status query failed"
                );
                return Err(e.into());
            }
        }

        // A caller poll always concludes: an inconclusive provider answer
        // becomes an outright rejection.
        if is_status_retrieval && advice.status.is_none() {
            advice.status = Some(AdviceStatus::rejected(ReasonCode::Rjct));
        }

        if advice.status.is_some() {
            self.deliver(record, &advice, &header).await?;
        } else {
            info!(
                lifecycle_id = %lifecycle_id,
                payment_id = %payment_id,
                "Provider status inconclusive, awaiting a later trigger"
            );
        }

        Ok(payment_id)
    }

    /// Sends the advice and records the audit row. Skips the wire entirely if
    /// the record already shows a sent advice.
    async fn deliver(
        &self,
        mut record: PaymentRecord,
        advice: &ConfirmationAdvice,
        header: &RequestHeader,
    ) -> AdapterResult<()> {
        let lifecycle_id = record.lifecycle_id.clone();

        if record.advice_sent {
            info!(
                lifecycle_id = %lifecycle_id,
                "Advice already marked sent on record, skipping delivery"
            );
            return Ok(());
        }

        let outcome = self
            .callback
            .deliver(&lifecycle_id, advice, header)
            .await
            .map_err(|e| {
                error!(
                    lifecycle_id = %lifecycle_id,
                    error = %e,
                    "Advice delivery failed before a response was received"
                );
                AdapterError::from(e)
            })?;

        if outcome.is_success() {
            record.advice_sent = true;
            record.advice_sent_at = Some(Utc::now());
            self.records
                .update(&record, ConflictPolicy::LastWriterWins)
                .await?;
            self.cache.invalidate(&lifecycle_id).await;
            info!(
                lifecycle_id = %lifecycle_id,
                status = ?advice.status,
                "Confirmation advice delivered"
            );
        } else {
            warn!(
                lifecycle_id = %lifecycle_id,
                status_code = outcome.status_code,
                "Caller rejected confirmation advice"
            );
        }

        let audit = ConfirmationAdviceAudit {
            lifecycle_id: lifecycle_id.clone(),
            request: advice.clone(),
            request_headers: header.clone(),
            success_response: outcome.is_success().then(|| outcome.body.clone()),
            error_response: (!outcome.is_success()).then(|| outcome.body.clone()),
            created_at: Utc::now(),
        };
        self.audits.create(&audit).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn released_lifecycle_locks_are_pruned_on_the_next_acquire() {
        let locks = LifecycleLocks::default();

        let guard = locks.acquire("L-1").await;
        drop(guard);

        let _guard = locks.acquire("L-2").await;
        let map = locks.locks.lock().await;
        assert_eq!(map.len(), 1);
        assert!(map.contains_key("L-2"));
    }

    #[tokio::test]
    async fn held_lifecycle_lock_survives_pruning() {
        let locks = LifecycleLocks::default();

        let _held = locks.acquire("L-1").await;
        let _other = locks.acquire("L-2").await;

        let map = locks.locks.lock().await;
        assert!(map.contains_key("L-1"));
        assert!(map.contains_key("L-2"));
    }
}
