use super::super::models::Payment;
use super::super::repositories::PaymentStore;
use super::merchant_order::generate_merchant_order_id;
use crate::config::PaymobConfig;
use crate::core::{amount, AppError, Currency, Result};
use crate::modules::gateway::{BillingData, OrderRequest, PaymentGateway, PaymentMode};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

/// Client-supplied data for one payment attempt
#[derive(Debug, Clone, Deserialize)]
pub struct InitiatePaymentRequest {
    pub user_id: String,
    pub course_id: String,
    pub course_title: String,
    pub amount: Decimal,
    pub currency: Currency,
    pub mode: PaymentMode,
    pub billing: BillingData,
}

/// Mode-tagged handle returned to the caller's browser
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PaymentHandle {
    CardIframe {
        merchant_order_id: String,
        iframe_url: String,
        payment_token: String,
    },
    WalletCheckout {
        merchant_order_id: String,
        checkout_url: String,
        client_secret: String,
    },
}

/// Sequences the gateway calls for one payment attempt.
///
/// A payment row is persisted in pending before the first network call, so a
/// crash mid-flow still leaves a reconcilable record. Failed attempts are
/// never reused: a retry mints a fresh row with a fresh merchant order id.
pub struct PaymentOrchestrator {
    gateway: Arc<dyn PaymentGateway>,
    payments: Arc<dyn PaymentStore>,
    config: PaymobConfig,
}

impl PaymentOrchestrator {
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        payments: Arc<dyn PaymentStore>,
        config: PaymobConfig,
    ) -> Self {
        Self {
            gateway,
            payments,
            config,
        }
    }

    pub async fn initiate_payment(&self, request: InitiatePaymentRequest) -> Result<PaymentHandle> {
        let merchant_order_id =
            generate_merchant_order_id(&request.course_id, &request.user_id);

        let payment = Payment::new(
            request.user_id.clone(),
            request.course_id.clone(),
            request.amount,
            request.currency,
            merchant_order_id.clone(),
        )?;

        // Durable record before any provider call.
        self.payments.create(&payment).await?;

        info!(
            merchant_order_id = %merchant_order_id,
            mode = %request.mode,
            "Payment initiated"
        );

        let amount_cents = amount::to_cents(request.amount)?;
        let order = OrderRequest {
            merchant_order_id: merchant_order_id.clone(),
            amount_cents,
            currency: request.currency.to_string(),
            item_name: request.course_title.clone(),
            billing: request.billing.clone(),
        };

        let result = match request.mode {
            PaymentMode::Card => self.run_card_flow(&merchant_order_id, &order).await,
            PaymentMode::Wallet => self.run_wallet_flow(&merchant_order_id, &order, &request).await,
        };

        match result {
            Ok(handle) => Ok(handle),
            Err(e) => {
                error!(
                    merchant_order_id = %merchant_order_id,
                    error = %e,
                    "Payment initiation failed"
                );
                // Never leave the row pending forever on a known failure.
                self.payments
                    .mark_failed(&merchant_order_id, &e.to_string(), None)
                    .await?;
                Err(e)
            }
        }
    }

    async fn run_card_flow(
        &self,
        merchant_order_id: &str,
        order: &OrderRequest,
    ) -> Result<PaymentHandle> {
        let token = self.gateway.authenticate().await?;
        let provider_order = self.gateway.create_order(&token, order).await?;

        self.payments
            .attach_provider_order(merchant_order_id, provider_order.id, &provider_order.raw)
            .await?;

        let key = self
            .gateway
            .payment_key(
                &token,
                provider_order.id,
                order.amount_cents,
                &order.currency,
                &order.billing,
                PaymentMode::Card,
            )
            .await?;

        Ok(PaymentHandle::CardIframe {
            merchant_order_id: merchant_order_id.to_string(),
            iframe_url: self.build_iframe_url(&key.token, merchant_order_id),
            payment_token: key.token,
        })
    }

    async fn run_wallet_flow(
        &self,
        merchant_order_id: &str,
        order: &OrderRequest,
        request: &InitiatePaymentRequest,
    ) -> Result<PaymentHandle> {
        let public_key = self.config.public_key.clone().ok_or_else(|| {
            AppError::Configuration(
                "PAYMOB_PUBLIC_KEY is required for wallet checkout".to_string(),
            )
        })?;

        let intention = self
            .gateway
            .create_intention(order, &request.course_id, &request.user_id)
            .await?;

        if let Some(provider_order_id) = intention.order_id {
            self.payments
                .attach_provider_order(merchant_order_id, provider_order_id, &intention.raw)
                .await?;
        }

        let checkout_url = format!(
            "{}/unifiedcheckout/?publicKey={}&clientSecret={}",
            self.config.base_url, public_key, intention.client_secret
        );

        Ok(PaymentHandle::WalletCheckout {
            merchant_order_id: merchant_order_id.to_string(),
            checkout_url,
            client_secret: intention.client_secret,
        })
    }

    fn build_iframe_url(&self, payment_token: &str, merchant_order_id: &str) -> String {
        let mut url = format!(
            "{}/acceptance/iframes/{}?payment_token={}",
            self.config.base_url, self.config.iframe_id, payment_token
        );

        if let Some(template) = &self.config.return_url_template {
            // merchant_order_id is crs-{course}-usr-..., course sits between
            // the two markers
            if let Some(course_id) = course_id_of(merchant_order_id) {
                let return_url = template.replace("{course_id}", course_id);
                url.push_str("&redirection_url=");
                url.push_str(&return_url);
            }
        }

        url
    }
}

fn course_id_of(merchant_order_id: &str) -> Option<&str> {
    merchant_order_id
        .strip_prefix("crs-")?
        .split("-usr-")
        .next()
}
