//! In-memory fakes for the storage, provider, callback and token seams.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use tokio::sync::Mutex;
use uuid::Uuid;

use zapp_adapter::auth::TokenProvider;
use zapp_adapter::cache::PaymentCache;
use zapp_adapter::callback::{CallbackClient, CallbackOutcome, CallbackTransportError};
use zapp_adapter::config::{AdapterConfig, CacheConfig};
use zapp_adapter::error::AdapterResult;
use zapp_adapter::model::{
    AcceptPaymentOutput, Agreement, Amount, ConfirmationAdvice, ConfirmationAdviceAudit, Merchant,
    NewPaymentRequest, PaymentPayload, PaymentRecord, PayloadCreditor, PayloadDebtor,
    PayloadTransaction, RequestHeader,
};
use zapp_adapter::provider::{
    CreateAcceptPaymentInput, CreateMandatePaymentInput, PaymentStatusOutput, ProviderClient,
    ProviderError,
};
use zapp_adapter::services::{InitiationService, ReconciliationEngine};
use zapp_adapter::storage::{
    AdviceAuditStore, AgreementStore, ConflictPolicy, MerchantStore, PaymentPayloadStore,
    PaymentRecordStore, StorageError,
};

pub const MERCHANT_DESTINATION: &str = "6f1c2b3a-4d5e-4f60-8192-a3b4c5d6e7f8";

// ---------------------------------------------------------------------------
// In-memory stores
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryRecordStore {
    pub records: Mutex<HashMap<String, PaymentRecord>>,
}

#[async_trait]
impl PaymentRecordStore for MemoryRecordStore {
    async fn create(&self, record: &PaymentRecord) -> Result<PaymentRecord, StorageError> {
        let mut map = self.records.lock().await;
        if map.contains_key(&record.lifecycle_id) {
            return Err(StorageError::conflict("duplicate lifecycle id"));
        }
        map.insert(record.lifecycle_id.clone(), record.clone());
        Ok(record.clone())
    }

    async fn get(&self, lifecycle_id: &str) -> Result<PaymentRecord, StorageError> {
        self.records
            .lock()
            .await
            .get(lifecycle_id)
            .cloned()
            .ok_or_else(|| StorageError::not_found("no record"))
    }

    async fn update(
        &self,
        record: &PaymentRecord,
        _policy: ConflictPolicy,
    ) -> Result<PaymentRecord, StorageError> {
        self.records
            .lock()
            .await
            .insert(record.lifecycle_id.clone(), record.clone());
        Ok(record.clone())
    }

    async fn find_by_provider_payment_id(
        &self,
        provider_payment_id: &str,
    ) -> Result<PaymentRecord, StorageError> {
        self.records
            .lock()
            .await
            .values()
            .find(|r| r.provider_payment_id == provider_payment_id)
            .cloned()
            .ok_or_else(|| StorageError::not_found("no record for provider payment id"))
    }
}

#[derive(Default)]
pub struct MemoryPayloadStore {
    pub payloads: Mutex<HashMap<String, PaymentPayload>>,
}

#[async_trait]
impl PaymentPayloadStore for MemoryPayloadStore {
    async fn create(&self, payload: &PaymentPayload) -> Result<(), StorageError> {
        let mut map = self.payloads.lock().await;
        let id = payload.lifecycle_id().to_string();
        if map.contains_key(&id) {
            return Err(StorageError::conflict("duplicate payload"));
        }
        map.insert(id, payload.clone());
        Ok(())
    }

    async fn get(&self, lifecycle_id: &str) -> Result<PaymentPayload, StorageError> {
        self.payloads
            .lock()
            .await
            .get(lifecycle_id)
            .cloned()
            .ok_or_else(|| StorageError::not_found("no payload"))
    }
}

#[derive(Default)]
pub struct MemoryAuditStore {
    pub audits: Mutex<HashMap<String, ConfirmationAdviceAudit>>,
}

#[async_trait]
impl AdviceAuditStore for MemoryAuditStore {
    async fn create(&self, audit: &ConfirmationAdviceAudit) -> Result<(), StorageError> {
        self.audits
            .lock()
            .await
            .insert(audit.lifecycle_id.clone(), audit.clone());
        Ok(())
    }

    async fn get(&self, lifecycle_id: &str) -> Result<ConfirmationAdviceAudit, StorageError> {
        self.audits
            .lock()
            .await
            .get(lifecycle_id)
            .cloned()
            .ok_or_else(|| StorageError::not_found("no audit"))
    }
}

#[derive(Default)]
pub struct MemoryMerchantStore {
    pub merchants: Mutex<HashMap<String, Merchant>>,
}

#[async_trait]
impl MerchantStore for MemoryMerchantStore {
    async fn get_by_distributor_id(&self, distributor_id: &str) -> Result<Merchant, StorageError> {
        self.merchants
            .lock()
            .await
            .get(distributor_id)
            .cloned()
            .ok_or_else(|| StorageError::not_found("no merchant"))
    }
}

#[derive(Default)]
pub struct MemoryAgreementStore {
    pub agreements: Mutex<HashMap<String, Agreement>>,
}

#[async_trait]
impl AgreementStore for MemoryAgreementStore {
    async fn get_by_id(&self, agreement_id: &str) -> Result<Agreement, StorageError> {
        self.agreements
            .lock()
            .await
            .get(agreement_id)
            .cloned()
            .ok_or_else(|| StorageError::not_found("no agreement"))
    }
}

// ---------------------------------------------------------------------------
// Provider / callback / token fakes
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MockProvider {
    pub status_response: Mutex<Option<Result<PaymentStatusOutput, ProviderError>>>,
    pub status_calls: AtomicU32,
    pub accept_response: Mutex<Option<AcceptPaymentOutput>>,
    pub accept_inputs: Mutex<Vec<CreateAcceptPaymentInput>>,
    pub mandate_response: Mutex<Option<Uuid>>,
    pub mandate_calls: AtomicU32,
}

impl MockProvider {
    pub async fn set_status(&self, response: Result<PaymentStatusOutput, ProviderError>) {
        *self.status_response.lock().await = Some(response);
    }
}

#[async_trait]
impl ProviderClient for MockProvider {
    async fn get_accept_payment(
        &self,
        _token: &str,
        _payment_id: Uuid,
    ) -> Result<PaymentStatusOutput, ProviderError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        self.status_response
            .lock()
            .await
            .clone()
            .unwrap_or_else(|| Err(ProviderError::Transport("no response configured".into())))
    }

    async fn create_accept_payment(
        &self,
        _token: &str,
        input: &CreateAcceptPaymentInput,
    ) -> Result<AcceptPaymentOutput, ProviderError> {
        self.accept_inputs.lock().await.push(input.clone());
        self.accept_response
            .lock()
            .await
            .clone()
            .ok_or_else(|| ProviderError::Transport("no response configured".into()))
    }

    async fn create_mandate_payment(
        &self,
        _token: &str,
        _mandate_id: Uuid,
        _input: &CreateMandatePaymentInput,
    ) -> Result<Option<Uuid>, ProviderError> {
        self.mandate_calls.fetch_add(1, Ordering::SeqCst);
        Ok(*self.mandate_response.lock().await)
    }
}

pub struct MockCallback {
    pub deliveries: Mutex<Vec<ConfirmationAdvice>>,
    pub status_code: AtomicU32,
    pub fail_transport: std::sync::atomic::AtomicBool,
}

impl Default for MockCallback {
    fn default() -> Self {
        Self {
            deliveries: Mutex::new(Vec::new()),
            status_code: AtomicU32::new(200),
            fail_transport: std::sync::atomic::AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl CallbackClient for MockCallback {
    async fn deliver(
        &self,
        _lifecycle_id: &str,
        advice: &ConfirmationAdvice,
        _header: &RequestHeader,
    ) -> Result<CallbackOutcome, CallbackTransportError> {
        if self.fail_transport.load(Ordering::SeqCst) {
            return Err(CallbackTransportError("connection refused".into()));
        }
        self.deliveries.lock().await.push(advice.clone());
        Ok(CallbackOutcome {
            status_code: self.status_code.load(Ordering::SeqCst) as u16,
            body: json!({ "Result": "received" }),
        })
    }
}

pub struct StaticTokenProvider;

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn token_for_tenant(&self, _tenant_id: &str) -> AdapterResult<String> {
        Ok("test-token".to_string())
    }
}

// ---------------------------------------------------------------------------
// Harness and fixtures
// ---------------------------------------------------------------------------

pub fn adapter_config() -> AdapterConfig {
    AdapterConfig {
        initiating_party_id: "ZAPP-DSP".to_string(),
        product_id: "PBBA".to_string(),
        debtor_service_provider_id: "DEBTOR-DSP".to_string(),
        default_bank_id: "default-bank".to_string(),
        direct_agreement_id: "DIRECT".to_string(),
        record_poll_timeout: Duration::from_millis(200),
        record_poll_interval: Duration::from_millis(10),
    }
}

pub struct Harness {
    pub records: Arc<MemoryRecordStore>,
    pub payloads: Arc<MemoryPayloadStore>,
    pub audits: Arc<MemoryAuditStore>,
    pub merchants: Arc<MemoryMerchantStore>,
    pub agreements: Arc<MemoryAgreementStore>,
    pub provider: Arc<MockProvider>,
    pub callback: Arc<MockCallback>,
    pub cache: Arc<PaymentCache>,
    pub engine: Arc<ReconciliationEngine>,
    pub initiation: Arc<InitiationService>,
}

impl Harness {
    pub fn new() -> Self {
        let records = Arc::new(MemoryRecordStore::default());
        let payloads = Arc::new(MemoryPayloadStore::default());
        let audits = Arc::new(MemoryAuditStore::default());
        let merchants = Arc::new(MemoryMerchantStore::default());
        let agreements = Arc::new(MemoryAgreementStore::default());
        let provider = Arc::new(MockProvider::default());
        let callback = Arc::new(MockCallback::default());
        let tokens = Arc::new(StaticTokenProvider);
        let cache = Arc::new(PaymentCache::new(&CacheConfig {
            ttl: Duration::from_secs(60),
            max_entries: 1000,
        }));
        let config = adapter_config();

        let engine = Arc::new(ReconciliationEngine::new(
            records.clone(),
            payloads.clone(),
            audits.clone(),
            merchants.clone(),
            provider.clone(),
            callback.clone(),
            tokens.clone(),
            cache.clone(),
            config.clone(),
        ));
        let initiation = Arc::new(InitiationService::new(
            records.clone(),
            payloads.clone(),
            merchants.clone(),
            agreements.clone(),
            provider.clone(),
            tokens,
            cache.clone(),
            config,
        ));

        Self {
            records,
            payloads,
            audits,
            merchants,
            agreements,
            provider,
            callback,
            cache,
            engine,
            initiation,
        }
    }

    pub async fn seed_merchant(&self) -> Merchant {
        let merchant = Merchant {
            creditor_service_provider_id: "DIST-1".to_string(),
            creditor_id: "CRED-1".to_string(),
            destination_id: MERCHANT_DESTINATION.to_string(),
            participant_id: "PART-1".to_string(),
            tenant_id: "tenant-1".to_string(),
        };
        self.merchants
            .merchants
            .lock()
            .await
            .insert(merchant.creditor_service_provider_id.clone(), merchant.clone());
        merchant
    }

    /// Seeds a merchant plus an initiated payment with its stored payload.
    pub async fn seed_payment(&self, lifecycle_id: &str, provider_payment_id: Uuid) {
        self.seed_merchant().await;

        let record = PaymentRecord {
            lifecycle_id: lifecycle_id.to_string(),
            distributor_id: "DIST-1".to_string(),
            merchant_id: "tenant-1".to_string(),
            destination_id: MERCHANT_DESTINATION.to_string(),
            provider_payment_id: if provider_payment_id.is_nil() {
                String::new()
            } else {
                provider_payment_id.to_string()
            },
            provider_payment_url: String::new(),
            merchant_return_url: "https://merchant.example/return".to_string(),
            advice_sent: false,
            advice_sent_at: None,
            created_at: Utc::now(),
        };
        self.records
            .records
            .lock()
            .await
            .insert(lifecycle_id.to_string(), record);

        let payload = PaymentPayload {
            request: payment_request(lifecycle_id, "DIRECT"),
            headers: request_header(),
        };
        self.payloads
            .payloads
            .lock()
            .await
            .insert(lifecycle_id.to_string(), payload);
    }
}

pub fn payment_request(lifecycle_id: &str, agreement_id: &str) -> NewPaymentRequest {
    NewPaymentRequest {
        message_id: "msg-original".to_string(),
        business_type: "P2B".to_string(),
        debtor: PayloadDebtor {
            debtor_id: "debtor-1".to_string(),
        },
        creditor: PayloadCreditor {
            creditor_id: "CRED-1".to_string(),
            creditor_service_provider_id: "DIST-1".to_string(),
            creditor_return_url: "https://merchant.example/return".to_string(),
        },
        transaction: PayloadTransaction {
            payment_request_lifecycle_id: lifecycle_id.to_string(),
            instructed_amount: Amount {
                currency: "GBP".to_string(),
                value: "25.50".parse().unwrap(),
            },
            agreement_id: agreement_id.to_string(),
            purpose: None,
            category_purpose: Some("ECOM".to_string()),
            end_to_end_id: None,
        },
    }
}

pub fn request_header() -> RequestHeader {
    RequestHeader {
        request_id: "req-1".to_string(),
        participant_id: "PART-1".to_string(),
        product_id: "PBBA".to_string(),
        idempotency_key: "idem-1".to_string(),
    }
}
