//! Application configuration module
//! Handles environment variable loading, configuration validation, and application settings

use std::env;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub cache: CacheConfig,
    pub logging: LoggingConfig,
    pub adapter: AdapterConfig,
    pub provider: ProviderConfig,
    pub callback: CallbackConfig,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connection_timeout: u64, // seconds
}

/// In-memory payment-record cache configuration
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub ttl: Duration,
    pub max_entries: usize,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

/// Log format options
#[derive(Debug, Clone)]
pub enum LogFormat {
    Json,
    Plain,
}

/// Scheme-side identifiers and reconciliation knobs. Collected here so the
/// engine takes one explicit struct instead of ambient lookups.
#[derive(Debug, Clone)]
pub struct AdapterConfig {
    /// Initiating-party id placed on every outbound advice and ack.
    pub initiating_party_id: String,
    /// Product id placed on advice request headers.
    pub product_id: String,
    /// Debtor service-provider id placed on the advice debtor block.
    pub debtor_service_provider_id: String,
    /// Bank used for direct-acceptance payments when the caller omits one.
    pub default_bank_id: String,
    /// Sentinel agreement id selecting the direct-acceptance path.
    pub direct_agreement_id: String,
    /// Wall-clock budget for the record-visibility polling loop.
    pub record_poll_timeout: Duration,
    /// Fixed delay between record-visibility polling attempts.
    pub record_poll_interval: Duration,
}

/// Downstream provider client configuration
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

/// Confirmation-advice callback configuration
#[derive(Debug, Clone)]
pub struct CallbackConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenv::dotenv().ok();

        Ok(AppConfig {
            server: ServerConfig::from_env()?,
            database: DatabaseConfig::from_env()?,
            cache: CacheConfig::from_env()?,
            logging: LoggingConfig::from_env()?,
            adapter: AdapterConfig::from_env()?,
            provider: ProviderConfig::from_env()?,
            callback: CallbackConfig::from_env()?,
        })
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.database.validate()?;
        self.adapter.validate()?;
        self.provider.validate()?;
        self.callback.validate()?;

        Ok(())
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(ServerConfig {
            host: env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("SERVER_PORT".to_string()))?,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::InvalidValue(
                "SERVER_PORT cannot be 0".to_string(),
            ));
        }

        if self.host.is_empty() {
            return Err(ConfigError::InvalidValue(
                "SERVER_HOST cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

impl DatabaseConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(DatabaseConfig {
            url: env::var("DATABASE_URL")
                .map_err(|_| ConfigError::MissingVariable("DATABASE_URL".to_string()))?,
            max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "20".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("DB_MAX_CONNECTIONS".to_string()))?,
            min_connections: env::var("DB_MIN_CONNECTIONS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("DB_MIN_CONNECTIONS".to_string()))?,
            connection_timeout: env::var("DB_CONNECTION_TIMEOUT")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("DB_CONNECTION_TIMEOUT".to_string()))?,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.url.is_empty() {
            return Err(ConfigError::InvalidValue("DATABASE_URL".to_string()));
        }

        if self.max_connections == 0 {
            return Err(ConfigError::InvalidValue("DB_MAX_CONNECTIONS".to_string()));
        }

        if self.min_connections > self.max_connections {
            return Err(ConfigError::InvalidValue(
                "DB_MIN_CONNECTIONS must be <= DB_MAX_CONNECTIONS".to_string(),
            ));
        }

        Ok(())
    }
}

impl CacheConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(CacheConfig {
            ttl: Duration::from_secs(
                env::var("CACHE_TTL_SECS")
                    .unwrap_or_else(|_| "60".to_string())
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue("CACHE_TTL_SECS".to_string()))?,
            ),
            max_entries: env::var("CACHE_MAX_ENTRIES")
                .unwrap_or_else(|_| "10000".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("CACHE_MAX_ENTRIES".to_string()))?,
        })
    }
}

impl LoggingConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(LoggingConfig {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "INFO".to_string()),
            format: match env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "plain".to_string())
                .as_str()
            {
                "json" => LogFormat::Json,
                _ => LogFormat::Plain,
            },
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let valid_levels = ["TRACE", "DEBUG", "INFO", "WARN", "ERROR"];
        if !valid_levels.contains(&self.level.to_uppercase().as_str()) {
            return Err(ConfigError::InvalidValue("LOG_LEVEL".to_string()));
        }

        Ok(())
    }
}

impl AdapterConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(AdapterConfig {
            initiating_party_id: env::var("INITIATING_PARTY_ID")
                .map_err(|_| ConfigError::MissingVariable("INITIATING_PARTY_ID".to_string()))?,
            product_id: env::var("PRODUCT_ID")
                .map_err(|_| ConfigError::MissingVariable("PRODUCT_ID".to_string()))?,
            debtor_service_provider_id: env::var("DEBTOR_SERVICE_PROVIDER_ID").map_err(|_| {
                ConfigError::MissingVariable("DEBTOR_SERVICE_PROVIDER_ID".to_string())
            })?,
            default_bank_id: env::var("DEFAULT_BANK_ID")
                .map_err(|_| ConfigError::MissingVariable("DEFAULT_BANK_ID".to_string()))?,
            direct_agreement_id: env::var("DIRECT_AGREEMENT_ID")
                .unwrap_or_else(|_| "DIRECT".to_string()),
            record_poll_timeout: Duration::from_secs(
                env::var("RECORD_POLL_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .map_err(|_| {
                        ConfigError::InvalidValue("RECORD_POLL_TIMEOUT_SECS".to_string())
                    })?,
            ),
            record_poll_interval: Duration::from_millis(100),
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.initiating_party_id.is_empty() {
            return Err(ConfigError::InvalidValue("INITIATING_PARTY_ID".to_string()));
        }

        if self.record_poll_timeout.is_zero() {
            return Err(ConfigError::InvalidValue(
                "RECORD_POLL_TIMEOUT_SECS".to_string(),
            ));
        }

        Ok(())
    }
}

impl ProviderConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(ProviderConfig {
            base_url: env::var("PROVIDER_BASE_URL")
                .map_err(|_| ConfigError::MissingVariable("PROVIDER_BASE_URL".to_string()))?,
            timeout_secs: env::var("PROVIDER_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("PROVIDER_TIMEOUT_SECS".to_string()))?,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue(
                "PROVIDER_BASE_URL must be a valid URL".to_string(),
            ));
        }

        Ok(())
    }
}

impl CallbackConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(CallbackConfig {
            base_url: env::var("CALLBACK_BASE_URL")
                .map_err(|_| ConfigError::MissingVariable("CALLBACK_BASE_URL".to_string()))?,
            timeout_secs: env::var("CALLBACK_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("CALLBACK_TIMEOUT_SECS".to_string()))?,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue(
                "CALLBACK_BASE_URL must be a valid URL".to_string(),
            ));
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),

    #[error("Invalid value for configuration: {0}")]
    InvalidValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_config_validation() {
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8000,
        };

        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_port_validation() {
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        };

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_adapter_config_requires_poll_budget() {
        let config = AdapterConfig {
            initiating_party_id: "DSP-1".to_string(),
            product_id: "PRD-1".to_string(),
            debtor_service_provider_id: "DEB-1".to_string(),
            default_bank_id: "bank-default".to_string(),
            direct_agreement_id: "DIRECT".to_string(),
            record_poll_timeout: Duration::ZERO,
            record_poll_interval: Duration::from_millis(100),
        };

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_provider_base_url_must_be_http() {
        let config = ProviderConfig {
            base_url: "ftp://provider.example".to_string(),
            timeout_secs: 30,
        };

        assert!(config.validate().is_err());
    }
}
