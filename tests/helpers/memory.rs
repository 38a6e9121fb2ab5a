//! In-memory implementations of the persistence contracts, mirroring the
//! conditional-write and unique-constraint semantics of the MySQL schema.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use coursepay::core::{AppError, Result};
use coursepay::modules::payments::repositories::{
    CompletionOutcome, EnrollmentOutcome, EnrollmentStore, PaymentStore, WebhookEventStore,
};
use coursepay::modules::payments::{
    Enrollment, Payment, PaymentStatus, WebhookEvent, WebhookEventStatus,
};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Default)]
pub struct InMemoryStore {
    payments: Mutex<HashMap<String, Payment>>,
    events: Mutex<HashMap<String, WebhookEvent>>,
    enrollments: Mutex<Vec<Enrollment>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn payment(&self, merchant_order_id: &str) -> Option<Payment> {
        self.payments.lock().unwrap().get(merchant_order_id).cloned()
    }

    pub fn all_payments(&self) -> Vec<Payment> {
        let mut payments: Vec<_> = self.payments.lock().unwrap().values().cloned().collect();
        payments.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        payments
    }

    pub fn event(&self, id: &str) -> Option<WebhookEvent> {
        self.events.lock().unwrap().get(id).cloned()
    }

    pub fn event_count(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    pub fn enrollment_count(&self) -> usize {
        self.enrollments.lock().unwrap().len()
    }

    pub fn enrollments_for(&self, user_id: &str, course_id: &str) -> Vec<Enrollment> {
        self.enrollments
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.user_id == user_id && e.course_id == course_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl PaymentStore for InMemoryStore {
    async fn create(&self, payment: &Payment) -> Result<()> {
        let mut payments = self.payments.lock().unwrap();
        if payments.contains_key(&payment.merchant_order_id) {
            return Err(AppError::internal("duplicate merchant_order_id"));
        }
        payments.insert(payment.merchant_order_id.clone(), payment.clone());
        Ok(())
    }

    async fn find_by_merchant_order_id(
        &self,
        merchant_order_id: &str,
    ) -> Result<Option<Payment>> {
        Ok(self.payments.lock().unwrap().get(merchant_order_id).cloned())
    }

    async fn attach_provider_order(
        &self,
        merchant_order_id: &str,
        provider_order_id: i64,
        response: &serde_json::Value,
    ) -> Result<()> {
        let mut payments = self.payments.lock().unwrap();
        if let Some(payment) = payments.get_mut(merchant_order_id) {
            payment.provider_order_id = Some(provider_order_id);
            match payment.provider_response.as_mut().and_then(|v| v.as_array_mut()) {
                Some(blob) => blob.push(response.clone()),
                None => payment.provider_response = Some(json!([response])),
            }
            payment.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn mark_failed(
        &self,
        merchant_order_id: &str,
        reason: &str,
        provider_transaction_id: Option<i64>,
    ) -> Result<()> {
        let mut payments = self.payments.lock().unwrap();
        if let Some(payment) = payments.get_mut(merchant_order_id) {
            if matches!(
                payment.status,
                PaymentStatus::Pending | PaymentStatus::Processing
            ) {
                payment.status = PaymentStatus::Failed;
                payment.failure_reason = Some(reason.to_string());
                if provider_transaction_id.is_some() {
                    payment.provider_transaction_id = provider_transaction_id;
                }
                payment.updated_at = Utc::now();
            }
        }
        Ok(())
    }

    async fn complete(
        &self,
        merchant_order_id: &str,
        provider_transaction_id: Option<i64>,
        completed_at: DateTime<Utc>,
    ) -> Result<CompletionOutcome> {
        let mut payments = self.payments.lock().unwrap();
        let Some(payment) = payments.get_mut(merchant_order_id) else {
            return Err(AppError::not_found(format!("payment {}", merchant_order_id)));
        };
        match payment.status {
            PaymentStatus::Pending | PaymentStatus::Processing => {
                payment.status = PaymentStatus::Completed;
                if provider_transaction_id.is_some() {
                    payment.provider_transaction_id = provider_transaction_id;
                }
                payment.completed_at = Some(completed_at);
                payment.updated_at = Utc::now();
                Ok(CompletionOutcome::Transitioned)
            }
            PaymentStatus::Completed => Ok(CompletionOutcome::AlreadyCompleted),
            status => Ok(CompletionOutcome::NotEligible { status }),
        }
    }

    async fn cancel(&self, merchant_order_id: &str) -> Result<bool> {
        let mut payments = self.payments.lock().unwrap();
        if let Some(payment) = payments.get_mut(merchant_order_id) {
            if payment.status == PaymentStatus::Pending {
                payment.status = PaymentStatus::Cancelled;
                payment.updated_at = Utc::now();
                return Ok(true);
            }
        }
        Ok(false)
    }
}

#[async_trait]
impl WebhookEventStore for InMemoryStore {
    async fn create(&self, event: &WebhookEvent) -> Result<()> {
        self.events
            .lock()
            .unwrap()
            .insert(event.id.clone(), event.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<WebhookEvent>> {
        Ok(self.events.lock().unwrap().get(id).cloned())
    }

    async fn set_status(&self, id: &str, status: WebhookEventStatus) -> Result<()> {
        if let Some(event) = self.events.lock().unwrap().get_mut(id) {
            event.status = status;
            event.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn record_failure(&self, id: &str, error: &str) -> Result<()> {
        if let Some(event) = self.events.lock().unwrap().get_mut(id) {
            event.status = WebhookEventStatus::Failed;
            event.processing_attempts += 1;
            event.last_error = Some(error.to_string());
            event.updated_at = Utc::now();
        }
        Ok(())
    }
}

#[async_trait]
impl EnrollmentStore for InMemoryStore {
    async fn create(&self, enrollment: &Enrollment) -> Result<EnrollmentOutcome> {
        let mut enrollments = self.enrollments.lock().unwrap();
        let exists = enrollments
            .iter()
            .any(|e| e.user_id == enrollment.user_id && e.course_id == enrollment.course_id);

        if exists {
            return Ok(EnrollmentOutcome::AlreadyEnrolled);
        }

        enrollments.push(enrollment.clone());
        Ok(EnrollmentOutcome::Created)
    }

    async fn find_by_user_and_course(
        &self,
        user_id: &str,
        course_id: &str,
    ) -> Result<Option<Enrollment>> {
        Ok(self
            .enrollments
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.user_id == user_id && e.course_id == course_id)
            .cloned())
    }
}
