//! Payment adapter bridging the Zapp scheme interface onto a downstream
//! payment-processing provider.
//!
//! The adapter accepts agreement payment requests, creates the provider-side
//! payment when the authorization flow starts, and reconciles provider
//! webhooks and caller status polls into exactly one confirmation advice per
//! payment lifecycle.

pub mod api;
pub mod auth;
pub mod cache;
pub mod callback;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod provider;
pub mod services;
pub mod storage;
