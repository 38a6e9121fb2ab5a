pub mod models;
pub mod services;

pub use models::{
    AuthToken, BillingData, Intention, OrderRequest, PaymentKey, PaymentMode, ProviderOrder,
};
pub use services::gateway_trait::{GatewayError, PaymentGateway};
pub use services::paymob::PaymobClient;
pub use services::signature;
