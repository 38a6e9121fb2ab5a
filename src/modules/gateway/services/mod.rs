pub mod gateway_trait;
pub mod paymob;
pub mod signature;

pub use gateway_trait::{GatewayError, PaymentGateway};
pub use paymob::PaymobClient;
