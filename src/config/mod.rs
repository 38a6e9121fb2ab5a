use crate::core::{AppError, Result};
use serde::Deserialize;
use std::env;

pub mod database;
pub mod server;

pub use database::DatabaseConfig;
pub use server::ServerConfig;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub paymob: PaymobConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub env: String,
    pub log_level: String,
}

/// Payment provider configuration
///
/// Built once at startup and handed to the gateway client by value; there is
/// no module-level mutable provider state anywhere in the crate.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymobConfig {
    /// Static API key exchanged for short-lived auth tokens
    pub api_key: String,
    /// Integration id for the hosted card iframe flow
    pub card_integration_id: i64,
    /// Integration id for the wallet intention flow
    pub wallet_integration_id: i64,
    /// Hosted iframe identifier used to build card payment URLs
    pub iframe_id: String,
    /// Shared secret for webhook HMAC verification
    pub hmac_secret: String,
    /// Provider API base URL
    pub base_url: String,
    /// Public key embedded in unified checkout URLs (wallet mode)
    pub public_key: Option<String>,
    /// Optional return URL template; `{course_id}` is substituted at initiation
    pub return_url_template: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let config = Config {
            app: AppConfig {
                env: env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
                log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            },
            database: DatabaseConfig::from_env()?,
            server: ServerConfig::from_env()?,
            paymob: PaymobConfig::from_env()?,
        };

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.paymob.validate()
    }
}

impl PaymobConfig {
    pub fn from_env() -> Result<Self> {
        Ok(PaymobConfig {
            api_key: require("PAYMOB_API_KEY")?,
            card_integration_id: require("PAYMOB_CARD_INTEGRATION_ID")?
                .parse()
                .map_err(|_| {
                    AppError::Configuration("PAYMOB_CARD_INTEGRATION_ID must be numeric".into())
                })?,
            wallet_integration_id: require("PAYMOB_WALLET_INTEGRATION_ID")?
                .parse()
                .map_err(|_| {
                    AppError::Configuration("PAYMOB_WALLET_INTEGRATION_ID must be numeric".into())
                })?,
            iframe_id: require("PAYMOB_IFRAME_ID")?,
            hmac_secret: require("PAYMOB_HMAC_SECRET")?,
            base_url: env::var("PAYMOB_BASE_URL")
                .unwrap_or_else(|_| "https://accept.paymob.com/api".to_string()),
            public_key: env::var("PAYMOB_PUBLIC_KEY").ok(),
            return_url_template: env::var("PAYMENT_RETURN_URL_TEMPLATE").ok(),
        })
    }

    /// Validate completeness; called at startup so misconfiguration fails
    /// fast instead of at first payment.
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(AppError::Configuration("PAYMOB_API_KEY is empty".into()));
        }

        if self.hmac_secret.trim().is_empty() {
            return Err(AppError::Configuration("PAYMOB_HMAC_SECRET is empty".into()));
        }

        if self.iframe_id.trim().is_empty() {
            return Err(AppError::Configuration("PAYMOB_IFRAME_ID is empty".into()));
        }

        if self.card_integration_id <= 0 || self.wallet_integration_id <= 0 {
            return Err(AppError::Configuration(
                "Integration ids must be positive".into(),
            ));
        }

        if let Some(template) = &self.return_url_template {
            if !template.contains("{course_id}") {
                return Err(AppError::Configuration(
                    "PAYMENT_RETURN_URL_TEMPLATE must contain {course_id}".into(),
                ));
            }
        }

        Ok(())
    }
}

fn require(key: &str) -> Result<String> {
    env::var(key).map_err(|_| AppError::Configuration(format!("{} not set", key)))
}
