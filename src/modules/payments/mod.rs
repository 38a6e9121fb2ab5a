pub mod controllers;
pub mod models;
pub mod repositories;
pub mod services;

pub use models::{Enrollment, Payment, PaymentStatus, WebhookEvent, WebhookEventStatus};
pub use services::{PaymentOrchestrator, WebhookReconciler};
