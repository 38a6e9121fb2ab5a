//! Stub gateway for orchestrator tests: canned responses, optional
//! programmed failure at a chosen stage, call recording.

use async_trait::async_trait;
use coursepay::modules::gateway::{
    AuthToken, BillingData, GatewayError, Intention, OrderRequest, PaymentGateway, PaymentKey,
    PaymentMode, ProviderOrder,
};
use serde_json::json;
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailAt {
    Authenticate,
    CreateOrder,
    PaymentKey,
    Intention,
    Timeout,
}

#[derive(Default)]
pub struct MockGateway {
    pub fail_at: Option<FailAt>,
    /// merchant_order_ids seen by create_order / create_intention
    pub seen_orders: Mutex<Vec<String>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_at(stage: FailAt) -> Self {
        Self {
            fail_at: Some(stage),
            seen_orders: Mutex::new(Vec::new()),
        }
    }

    fn fail_if(&self, stage: FailAt) -> Result<(), GatewayError> {
        match self.fail_at {
            Some(FailAt::Timeout) => Err(GatewayError::Timeout {
                timeout: Duration::from_secs(30),
            }),
            Some(s) if s == stage => Err(match stage {
                FailAt::Authenticate => GatewayError::Auth("HTTP 401 (invalid key)".into()),
                FailAt::CreateOrder => {
                    GatewayError::OrderCreation("HTTP 422 (duplicate order)".into())
                }
                FailAt::PaymentKey => GatewayError::PaymentKey("HTTP 400 (bad billing)".into()),
                FailAt::Intention => GatewayError::Intention("HTTP 400 (bad amount)".into()),
                FailAt::Timeout => unreachable!(),
            }),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn authenticate(&self) -> Result<AuthToken, GatewayError> {
        self.fail_if(FailAt::Authenticate)?;
        Ok(AuthToken("test-auth-token".to_string()))
    }

    async fn create_order(
        &self,
        _token: &AuthToken,
        order: &OrderRequest,
    ) -> Result<ProviderOrder, GatewayError> {
        self.fail_if(FailAt::CreateOrder)?;
        self.seen_orders
            .lock()
            .unwrap()
            .push(order.merchant_order_id.clone());
        Ok(ProviderOrder {
            id: 5001,
            raw: json!({ "id": 5001, "merchant_order_id": order.merchant_order_id }),
        })
    }

    async fn payment_key(
        &self,
        _token: &AuthToken,
        _order_id: i64,
        _amount_cents: i64,
        _currency: &str,
        _billing: &BillingData,
        _mode: PaymentMode,
    ) -> Result<PaymentKey, GatewayError> {
        self.fail_if(FailAt::PaymentKey)?;
        Ok(PaymentKey {
            token: "test-payment-token".to_string(),
        })
    }

    async fn create_intention(
        &self,
        order: &OrderRequest,
        _course_id: &str,
        _user_id: &str,
    ) -> Result<Intention, GatewayError> {
        self.fail_if(FailAt::Intention)?;
        self.seen_orders
            .lock()
            .unwrap()
            .push(order.merchant_order_id.clone());
        Ok(Intention {
            id: "int_test_1".to_string(),
            client_secret: "cs_test_secret".to_string(),
            order_id: Some(7001),
            raw: json!({ "id": "int_test_1", "intention_order_id": 7001 }),
        })
    }
}
