//! Business services: payment initiation and status reconciliation.

pub mod initiation;
pub mod reconciliation;
pub mod retry;

pub use initiation::InitiationService;
pub use reconciliation::ReconciliationEngine;
pub use retry::RetryPolicy;
