use super::super::models::{
    AuthToken, BillingData, Intention, OrderRequest, PaymentKey, PaymentMode, ProviderOrder,
};
use async_trait::async_trait;
use std::time::Duration;

/// Errors surfaced by the payment gateway client
///
/// Each remote call has its own failure variant so the orchestrator can
/// record a precise failure reason on the payment row.
#[derive(thiserror::Error, Debug)]
pub enum GatewayError {
    /// Auth token exchange was rejected
    #[error("Gateway authentication failed: {0}")]
    Auth(String),

    /// Remote order registration was rejected
    #[error("Gateway order creation failed: {0}")]
    OrderCreation(String),

    /// Payment key request was rejected
    #[error("Gateway payment key request failed: {0}")]
    PaymentKey(String),

    /// Intention creation was rejected
    #[error("Gateway intention request failed: {0}")]
    Intention(String),

    /// The provider did not respond within the request timeout
    #[error("Gateway request timed out after {timeout:?}")]
    Timeout { timeout: Duration },

    /// Transport-level failure (DNS, connect, TLS)
    #[error("Gateway transport error: {0}")]
    Transport(#[source] reqwest::Error),

    /// The provider answered 2xx with a body we could not interpret
    #[error("Unexpected gateway response: {0}")]
    InvalidResponse(String),
}

/// Payment gateway operations used by the orchestrator
///
/// The provider's card flow takes three sequential calls; the wallet flow is
/// a single intention call. Both are expressed here so the orchestrator can
/// be tested against a stub implementation.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Exchange the static API key for a short-lived auth token
    async fn authenticate(&self) -> Result<AuthToken, GatewayError>;

    /// Register an order remotely; returns the provider-assigned order id
    async fn create_order(
        &self,
        token: &AuthToken,
        order: &OrderRequest,
    ) -> Result<ProviderOrder, GatewayError>;

    /// Request a single-use payment token for the given order
    async fn payment_key(
        &self,
        token: &AuthToken,
        order_id: i64,
        amount_cents: i64,
        currency: &str,
        billing: &BillingData,
        mode: PaymentMode,
    ) -> Result<PaymentKey, GatewayError>;

    /// Create a wallet-mode intention; returns a client secret for the
    /// unified checkout URL
    async fn create_intention(
        &self,
        order: &OrderRequest,
        course_id: &str,
        user_id: &str,
    ) -> Result<Intention, GatewayError>;
}
