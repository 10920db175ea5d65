//! Bearer credential resolution for merchant tenants.
//!
//! Signing mechanics live outside this adapter; the trait is the seam the
//! services depend on.

use async_trait::async_trait;

use crate::error::{AdapterError, AdapterErrorKind, AdapterResult};

#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Returns a signed bearer credential scoped to the merchant's tenant.
    async fn token_for_tenant(&self, tenant_id: &str) -> AdapterResult<String>;
}

/// Environment-backed provider for deployments where the credential is issued
/// out of band and rotated externally.
pub struct EnvTokenProvider {
    token: String,
}

impl EnvTokenProvider {
    pub fn from_env() -> AdapterResult<Self> {
        let token = std::env::var("PROVIDER_BEARER_TOKEN").map_err(|_| {
            AdapterError::new(AdapterErrorKind::Configuration {
                message: "PROVIDER_BEARER_TOKEN is not set".to_string(),
            })
        })?;
        Ok(Self { token })
    }
}

#[async_trait]
impl TokenProvider for EnvTokenProvider {
    async fn token_for_tenant(&self, _tenant_id: &str) -> AdapterResult<String> {
        Ok(self.token.clone())
    }
}
