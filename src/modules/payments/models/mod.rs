pub mod enrollment;
pub mod payment;
pub mod webhook_event;

pub use enrollment::Enrollment;
pub use payment::{Payment, PaymentStatus};
pub use webhook_event::{WebhookEvent, WebhookEventStatus};
