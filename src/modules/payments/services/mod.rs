pub mod merchant_order;
pub mod orchestrator;
pub mod reconciler;

pub use merchant_order::generate_merchant_order_id;
pub use orchestrator::{InitiatePaymentRequest, PaymentHandle, PaymentOrchestrator};
pub use reconciler::{WebhookOutcome, WebhookReconciler};
