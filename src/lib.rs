//! CoursePay payment service library
//!
//! Payment initiation against the PayMob gateway and idempotent webhook
//! reconciliation for course enrollments.

pub mod config;
pub mod core;
pub mod middleware;
pub mod modules;

// Re-export commonly used types
pub use modules::gateway;
pub use modules::payments;
