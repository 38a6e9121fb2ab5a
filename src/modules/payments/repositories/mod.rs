pub mod enrollment_repository;
pub mod payment_repository;
pub mod webhook_event_repository;

pub use enrollment_repository::{EnrollmentOutcome, EnrollmentStore, MySqlEnrollmentRepository};
pub use payment_repository::{CompletionOutcome, MySqlPaymentRepository, PaymentStore};
pub use webhook_event_repository::{MySqlWebhookEventRepository, WebhookEventStore};
