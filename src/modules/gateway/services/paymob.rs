use super::super::models::{
    AuthToken, BillingData, Intention, OrderRequest, PaymentKey, PaymentMode, ProviderOrder,
};
use super::gateway_trait::{GatewayError, PaymentGateway};
use crate::config::PaymobConfig;
use crate::core::amount;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

/// Default per-request timeout against the provider
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// PayMob gateway client
///
/// Implements the card flow (`/auth/tokens` -> `/ecommerce/orders` ->
/// `/acceptance/payment_keys`) and the wallet intention flow
/// (`/v1/intention/`). API reference: https://docs.paymob.com
pub struct PaymobClient {
    client: Client,
    config: PaymobConfig,
    timeout: Duration,
}

impl PaymobClient {
    pub fn new(config: PaymobConfig) -> Self {
        Self {
            client: Client::new(),
            config,
            timeout: REQUEST_TIMEOUT,
        }
    }

    #[cfg(test)]
    pub fn with_timeout(config: PaymobConfig, timeout: Duration) -> Self {
        // bypass env proxies so requests reach local test listeners directly
        let client = Client::builder().no_proxy().build().unwrap();
        Self {
            client,
            config,
            timeout,
        }
    }

    /// POST a JSON body and return the parsed response body
    ///
    /// Timeouts map to `GatewayError::Timeout`; other transport failures to
    /// `GatewayError::Transport`. Non-2xx responses are reported through
    /// `on_status` so each call site keeps its own error variant.
    async fn post_json(
        &self,
        url: &str,
        auth_header: Option<&str>,
        body: &Value,
        on_status: impl Fn(String) -> GatewayError,
    ) -> Result<Value, GatewayError> {
        let mut request = self
            .client
            .post(url)
            .timeout(self.timeout)
            .header("Accept", "application/json")
            .json(body);

        if let Some(header) = auth_header {
            request = request.header("Authorization", header);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                GatewayError::Timeout {
                    timeout: self.timeout,
                }
            } else {
                GatewayError::Transport(e)
            }
        })?;

        let status = response.status();
        let body_text = response.text().await.map_err(|e| {
            if e.is_timeout() {
                GatewayError::Timeout {
                    timeout: self.timeout,
                }
            } else {
                GatewayError::Transport(e)
            }
        })?;

        if !status.is_success() {
            return Err(on_status(format!(
                "HTTP {} ({})",
                status.as_u16(),
                truncate(&body_text, 512)
            )));
        }

        serde_json::from_str(&body_text)
            .map_err(|e| GatewayError::InvalidResponse(format!("invalid JSON body: {}", e)))
    }
}

#[async_trait]
impl PaymentGateway for PaymobClient {
    async fn authenticate(&self) -> Result<AuthToken, GatewayError> {
        let url = format!("{}/auth/tokens", self.config.base_url);
        let body = json!({ "api_key": self.config.api_key });

        let response = self
            .post_json(&url, None, &body, GatewayError::Auth)
            .await?;

        let token = response["token"]
            .as_str()
            .ok_or_else(|| GatewayError::InvalidResponse("auth response missing token".into()))?;

        Ok(AuthToken(token.to_string()))
    }

    async fn create_order(
        &self,
        token: &AuthToken,
        order: &OrderRequest,
    ) -> Result<ProviderOrder, GatewayError> {
        let url = format!("{}/ecommerce/orders", self.config.base_url);
        let body = json!({
            "auth_token": token.0,
            "delivery_needed": false,
            "amount_cents": order.amount_cents,
            "currency": order.currency,
            "merchant_order_id": order.merchant_order_id,
            "items": [{
                "name": order.item_name,
                "amount_cents": order.amount_cents,
                "quantity": 1
            }]
        });

        let response = self
            .post_json(&url, None, &body, GatewayError::OrderCreation)
            .await?;

        let id = response["id"].as_i64().ok_or_else(|| {
            GatewayError::InvalidResponse("order response missing numeric id".into())
        })?;

        Ok(ProviderOrder { id, raw: response })
    }

    async fn payment_key(
        &self,
        token: &AuthToken,
        order_id: i64,
        amount_cents: i64,
        currency: &str,
        billing: &BillingData,
        mode: PaymentMode,
    ) -> Result<PaymentKey, GatewayError> {
        let url = format!("{}/acceptance/payment_keys", self.config.base_url);
        let integration_id = match mode {
            PaymentMode::Card => self.config.card_integration_id,
            PaymentMode::Wallet => self.config.wallet_integration_id,
        };

        let body = json!({
            "auth_token": token.0,
            "amount_cents": amount_cents,
            "expiration": 3600,
            "order_id": order_id,
            "billing_data": billing,
            "currency": currency,
            "integration_id": integration_id,
        });

        let response = self
            .post_json(&url, None, &body, GatewayError::PaymentKey)
            .await?;

        let key: PaymentKey = serde_json::from_value(response).map_err(|e| {
            GatewayError::InvalidResponse(format!("payment key response: {}", e))
        })?;

        Ok(key)
    }

    async fn create_intention(
        &self,
        order: &OrderRequest,
        course_id: &str,
        user_id: &str,
    ) -> Result<Intention, GatewayError> {
        let url = format!("{}/v1/intention/", self.config.base_url);

        // The intention endpoint takes amounts in the base currency unit,
        // unlike every other endpoint. Provider contract, not a choice.
        let major_amount = amount::cents_to_major_units(order.amount_cents);

        let body = json!({
            "amount": major_amount,
            "currency": order.currency,
            "payment_methods": [self.config.wallet_integration_id],
            "items": [{
                "name": order.item_name,
                "amount": major_amount,
                "quantity": 1
            }],
            "billing_data": order.billing,
            "special_reference": order.merchant_order_id,
            "extras": {
                "course_id": course_id,
                "user_id": user_id,
            }
        });

        let auth_header = format!("Token {}", self.config.api_key);
        let response = self
            .post_json(&url, Some(&auth_header), &body, GatewayError::Intention)
            .await?;

        let id = response["id"]
            .as_str()
            .ok_or_else(|| GatewayError::InvalidResponse("intention response missing id".into()))?
            .to_string();

        let client_secret = response["client_secret"]
            .as_str()
            .ok_or_else(|| {
                GatewayError::InvalidResponse("intention response missing client_secret".into())
            })?
            .to_string();

        let order_id = response["intention_order_id"].as_i64();

        Ok(Intention {
            id,
            client_secret,
            order_id,
            raw: response,
        })
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
