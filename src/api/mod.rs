//! HTTP surface: payment initiation, payment creation, status retrieval,
//! webhook ingestion and health.

pub mod health;
pub mod payments;
pub mod webhooks;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::services::{InitiationService, ReconciliationEngine};

/// Shared handler state.
pub struct AppState {
    pub initiation: Arc<InitiationService>,
    pub reconciliation: Arc<ReconciliationEngine>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route(
            "/agreement-payment-requests",
            post(payments::initiate_payment_request),
        )
        .route(
            "/payments/{lifecycle_id}",
            post(payments::create_payment).get(payments::get_payment),
        )
        .route(
            "/payment-requests/{lifecycle_id}/status-retrievals",
            post(payments::retrieve_payment_status),
        )
        .route("/webhook", post(webhooks::handle_webhook))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
