use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::api::AppState;
use crate::error::{AdapterError, AdapterResult};
use crate::model::{
    AcceptPaymentOutput, Ack, NewPaymentRequest, PaymentRecord, RequestHeader,
    StatusRetrievalRequest,
};

fn header_value(headers: &HeaderMap, name: &str) -> String {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// Correlation headers carried on scheme requests. A missing request id gets
/// a generated one so downstream logs stay traceable.
fn request_header(headers: &HeaderMap) -> RequestHeader {
    let mut request_id = header_value(headers, "x-request-id");
    if request_id.is_empty() {
        request_id = Uuid::new_v4().to_string();
    }
    RequestHeader {
        request_id,
        participant_id: header_value(headers, "x-participant-id"),
        product_id: header_value(headers, "x-product-id"),
        idempotency_key: header_value(headers, "x-idempotency-key"),
    }
}

/// POST /agreement-payment-requests
pub async fn initiate_payment_request(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<NewPaymentRequest>,
) -> AdapterResult<Json<Ack>> {
    info!(
        lifecycle_id = %request.transaction.payment_request_lifecycle_id,
        "Received payment request"
    );
    let header = request_header(&headers);
    let ack = state.initiation.initiate(request, header).await?;
    Ok(Json(ack))
}

#[derive(Debug, Deserialize)]
pub struct CreatePaymentQuery {
    #[serde(default)]
    pub provider_id: Option<String>,
}

/// POST /payments/{lifecycle_id}
pub async fn create_payment(
    State(state): State<Arc<AppState>>,
    Path(lifecycle_id): Path<String>,
    Query(query): Query<CreatePaymentQuery>,
) -> AdapterResult<Json<AcceptPaymentOutput>> {
    let provider_id = query.provider_id.unwrap_or_default();
    let output = state
        .initiation
        .create_payment(&lifecycle_id, &provider_id)
        .await?;
    Ok(Json(output))
}

/// GET /payments/{lifecycle_id}
pub async fn get_payment(
    State(state): State<Arc<AppState>>,
    Path(lifecycle_id): Path<String>,
) -> AdapterResult<Json<PaymentRecord>> {
    let record = state
        .reconciliation
        .payment_from_cache(&lifecycle_id)
        .await?
        .ok_or_else(|| AdapterError::payment_not_found(&lifecycle_id))?;
    Ok(Json(record))
}

/// POST /payment-requests/{lifecycle_id}/status-retrievals
pub async fn retrieve_payment_status(
    State(state): State<Arc<AppState>>,
    Path(lifecycle_id): Path<String>,
    Json(request): Json<StatusRetrievalRequest>,
) -> AdapterResult<Json<Ack>> {
    info!(
        lifecycle_id = %lifecycle_id,
        retrieval_lifecycle_id = %request.payment_request_status_retrieval_lifecycle_id,
        "Received status retrieval request"
    );
    let ack = Arc::clone(&state.reconciliation)
        .get_payment_status(&lifecycle_id, request)
        .await?;
    Ok(Json(ack))
}
