use super::super::models::{Enrollment, Payment, PaymentStatus, WebhookEvent, WebhookEventStatus};
use super::super::repositories::{
    CompletionOutcome, EnrollmentOutcome, EnrollmentStore, PaymentStore, WebhookEventStore,
};
use crate::core::{AppError, Result};
use crate::modules::gateway::signature;
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Payload fields a webhook must carry before we even look at the signature
const REQUIRED_FIELDS: [&str; 9] = [
    "id",
    "amount_cents",
    "success",
    "pending",
    "currency",
    "integration_id",
    "order.id",
    "created_at",
    "hmac",
];

/// Outcome of handling one webhook delivery
///
/// Every variant carries the audit event id; the controller maps variants to
/// HTTP statuses (rejections are 4xx, everything after a verified signature
/// is 2xx except an unknown merchant order id).
#[derive(Debug, Clone)]
pub enum WebhookOutcome {
    /// Structural or signature validation failed; no payment state touched
    Rejected { event_id: String, reason: String },

    /// Signature verified but no local payment matches the correlation key
    PaymentNotFound {
        event_id: String,
        merchant_order_id: String,
    },

    /// Payment completed (or was already completed on redelivery)
    Completed {
        event_id: String,
        merchant_order_id: String,
        /// Whether this delivery performed the transition
        transitioned: bool,
    },

    /// Provider reported success for a payment already cancelled or failed
    /// locally; acknowledged without completion or enrollment
    Superseded {
        event_id: String,
        merchant_order_id: String,
        status: PaymentStatus,
    },

    /// Provider reported a failed transaction
    Failed {
        event_id: String,
        merchant_order_id: String,
        reason: String,
    },

    /// Reconciliation itself failed after verification; recorded for
    /// operator retry, still ACKed to the provider
    ReconciliationFailed { event_id: String, error: String },
}

/// Maps inbound provider callbacks onto local payment and enrollment state.
///
/// Verification fails closed; state transitions are idempotent under
/// provider redelivery. There is no internal retry loop: failures after
/// verification are durably recorded and re-run through `retry_event`.
pub struct WebhookReconciler {
    payments: Arc<dyn PaymentStore>,
    events: Arc<dyn WebhookEventStore>,
    enrollments: Arc<dyn EnrollmentStore>,
    hmac_secret: String,
}

impl WebhookReconciler {
    pub fn new(
        payments: Arc<dyn PaymentStore>,
        events: Arc<dyn WebhookEventStore>,
        enrollments: Arc<dyn EnrollmentStore>,
        hmac_secret: String,
    ) -> Self {
        Self {
            payments,
            events,
            enrollments,
            hmac_secret,
        }
    }

    /// Handle one inbound delivery end to end.
    ///
    /// The audit row is written before anything else, so forged and
    /// malformed requests leave the same trail as genuine ones. Errors are
    /// only propagated when that first write fails.
    pub async fn handle_webhook(&self, raw: Value) -> Result<WebhookOutcome> {
        let event_type = raw
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or("transaction.processed")
            .to_string();

        let event = WebhookEvent::received(event_type, raw.clone());
        self.events.create(&event).await?;

        if let Err(missing) = validate_payload(&raw) {
            warn!(event_id = %event.id, missing = %missing, "Webhook rejected: malformed payload");
            self.events
                .set_status(&event.id, WebhookEventStatus::Rejected)
                .await?;
            return Ok(WebhookOutcome::Rejected {
                event_id: event.id,
                reason: format!("missing required field: {}", missing),
            });
        }

        // Security boundary. A bad signature is indistinguishable from a
        // forgery and must not touch payment state.
        if !signature::verify_hmac(&raw, &self.hmac_secret) {
            warn!(event_id = %event.id, "Webhook rejected: HMAC verification failed");
            self.events
                .set_status(&event.id, WebhookEventStatus::Rejected)
                .await?;
            return Ok(WebhookOutcome::Rejected {
                event_id: event.id,
                reason: "signature verification failed".to_string(),
            });
        }

        self.reconcile_verified(&event.id, &raw).await
    }

    /// Audit a delivery whose body was not valid JSON.
    ///
    /// The raw bytes are captured on the event row, so truncated and forged
    /// requests leave the same trail as genuine ones.
    pub async fn record_unparsable(&self, body: &[u8], parse_error: &str) -> Result<WebhookOutcome> {
        let payload = json!({ "raw_body": String::from_utf8_lossy(body) });
        let mut event = WebhookEvent::received("malformed".to_string(), payload);
        event.status = WebhookEventStatus::Rejected;
        self.events.create(&event).await?;

        warn!(event_id = %event.id, error = %parse_error, "Webhook rejected: body is not valid JSON");
        Ok(WebhookOutcome::Rejected {
            event_id: event.id,
            reason: format!("invalid JSON body: {}", parse_error),
        })
    }

    /// Operator-initiated re-run for a stored, already-verified event.
    pub async fn retry_event(&self, event_id: &str) -> Result<WebhookOutcome> {
        let event = self
            .events
            .find_by_id(event_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("webhook event {}", event_id)))?;

        match event.status {
            WebhookEventStatus::Failed => {}
            WebhookEventStatus::Verified => {
                return Err(AppError::validation("webhook event already processed"));
            }
            WebhookEventStatus::Received | WebhookEventStatus::Rejected => {
                return Err(AppError::validation(
                    "only verified-then-failed events can be retried",
                ));
            }
        }

        info!(event_id = %event.id, attempts = event.processing_attempts, "Retrying webhook event");
        self.reconcile_verified(&event.id, &event.payload).await
    }

    /// Steps shared by first delivery and operator retry: look up the
    /// payment, apply the provider's claimed outcome, record the audit
    /// status.
    async fn reconcile_verified(&self, event_id: &str, raw: &Value) -> Result<WebhookOutcome> {
        let Some(merchant_order_id) = raw
            .pointer("/order/merchant_order_id")
            .and_then(Value::as_str)
            .map(String::from)
        else {
            self.events
                .record_failure(event_id, "payload carries no order.merchant_order_id")
                .await?;
            return Ok(WebhookOutcome::PaymentNotFound {
                event_id: event_id.to_string(),
                merchant_order_id: String::new(),
            });
        };

        let Some(payment) = self
            .payments
            .find_by_merchant_order_id(&merchant_order_id)
            .await?
        else {
            // An unknown correlation key is an integration bug, not a
            // success. Do not silently ACK it.
            error!(
                event_id = %event_id,
                merchant_order_id = %merchant_order_id,
                "Webhook references unknown merchant order id"
            );
            self.events
                .record_failure(event_id, "no payment matches merchant_order_id")
                .await?;
            return Ok(WebhookOutcome::PaymentNotFound {
                event_id: event_id.to_string(),
                merchant_order_id,
            });
        };

        match self.apply_outcome(event_id, &payment, raw).await {
            Ok(outcome) => {
                self.events
                    .set_status(event_id, WebhookEventStatus::Verified)
                    .await?;
                Ok(outcome)
            }
            Err(e) => {
                error!(
                    event_id = %event_id,
                    merchant_order_id = %merchant_order_id,
                    error = %e,
                    "Reconciliation failed after verification"
                );
                self.events.record_failure(event_id, &e.to_string()).await?;
                Ok(WebhookOutcome::ReconciliationFailed {
                    event_id: event_id.to_string(),
                    error: e.to_string(),
                })
            }
        }
    }

    async fn apply_outcome(
        &self,
        event_id: &str,
        payment: &Payment,
        raw: &Value,
    ) -> Result<WebhookOutcome> {
        let success = flag(raw, "success").unwrap_or(false);
        let pending = flag(raw, "pending").unwrap_or(true);
        let error_occured = flag(raw, "error_occured").unwrap_or(false);
        // Non-numeric provider ids are kept out of the column rather than
        // coerced to a bogus value
        let transaction_id = raw.get("id").and_then(Value::as_i64);

        if success && !pending && !error_occured {
            let completion = self
                .payments
                .complete(&payment.merchant_order_id, transaction_id, Utc::now())
                .await?;

            let transitioned = match completion {
                CompletionOutcome::Transitioned => {
                    info!(
                        event_id = %event_id,
                        merchant_order_id = %payment.merchant_order_id,
                        provider_transaction_id = ?transaction_id,
                        "Payment completed"
                    );
                    true
                }
                CompletionOutcome::AlreadyCompleted => {
                    info!(
                        event_id = %event_id,
                        merchant_order_id = %payment.merchant_order_id,
                        "Duplicate success webhook for completed payment"
                    );
                    false
                }
                CompletionOutcome::NotEligible { status } => {
                    // A cancelled or failed payment never regains a success;
                    // acknowledged, but no enrollment may exist for it.
                    warn!(
                        event_id = %event_id,
                        merchant_order_id = %payment.merchant_order_id,
                        status = %status,
                        "Success webhook for terminal non-completed payment"
                    );
                    return Ok(WebhookOutcome::Superseded {
                        event_id: event_id.to_string(),
                        merchant_order_id: payment.merchant_order_id.clone(),
                        status,
                    });
                }
            };

            // Attempted on every success delivery: if an earlier attempt
            // completed the payment but crashed before enrolling, the
            // retry still enrolls, and the unique constraint absorbs
            // concurrent redeliveries.
            let enrollment = Enrollment::new(
                payment.user_id.clone(),
                payment.course_id.clone(),
                payment.id.clone(),
            );
            match self.enrollments.create(&enrollment).await? {
                EnrollmentOutcome::Created => {
                    info!(
                        user_id = %payment.user_id,
                        course_id = %payment.course_id,
                        "Enrollment created"
                    );
                }
                EnrollmentOutcome::AlreadyEnrolled => {}
            }

            Ok(WebhookOutcome::Completed {
                event_id: event_id.to_string(),
                merchant_order_id: payment.merchant_order_id.clone(),
                transitioned,
            })
        } else {
            let reason = failure_reason(raw, pending, error_occured);
            self.payments
                .mark_failed(&payment.merchant_order_id, &reason, transaction_id)
                .await?;

            info!(
                event_id = %event_id,
                merchant_order_id = %payment.merchant_order_id,
                reason = %reason,
                "Payment failed"
            );

            Ok(WebhookOutcome::Failed {
                event_id: event_id.to_string(),
                merchant_order_id: payment.merchant_order_id.clone(),
                reason,
            })
        }
    }
}

/// Check the fixed required field set; returns the first missing path
fn validate_payload(raw: &Value) -> std::result::Result<(), String> {
    for path in REQUIRED_FIELDS {
        let found = path
            .split('.')
            .try_fold(raw, |value, key| value.get(key))
            .is_some();
        if !found {
            return Err(path.to_string());
        }
    }
    Ok(())
}

/// Read a provider boolean that may arrive as a bool or a string
fn flag(raw: &Value, key: &str) -> Option<bool> {
    match raw.get(key)? {
        Value::Bool(b) => Some(*b),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// Derive a non-empty failure reason from the provider payload
fn failure_reason(raw: &Value, pending: bool, error_occured: bool) -> String {
    if let Some(message) = raw
        .pointer("/data/message")
        .and_then(Value::as_str)
        .filter(|m| !m.trim().is_empty())
    {
        return message.to_string();
    }

    if error_occured {
        "provider reported a transaction error".to_string()
    } else if pending {
        "transaction still pending at provider".to_string()
    } else {
        "transaction declined by provider".to_string()
    }
}
