pub mod gateway;
pub mod payments;
