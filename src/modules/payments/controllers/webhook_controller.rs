use super::super::services::{WebhookOutcome, WebhookReconciler};
use crate::core::Result;
use actix_web::{post, web, HttpResponse};
use serde_json::{json, Value};
use std::sync::Arc;

/// Provider callback endpoints
pub struct WebhookController {
    reconciler: Arc<WebhookReconciler>,
}

impl WebhookController {
    pub fn new(reconciler: Arc<WebhookReconciler>) -> Self {
        Self { reconciler }
    }

    /// Configure webhook routes under /api/payments
    pub fn configure(cfg: &mut web::ServiceConfig, reconciler: Arc<WebhookReconciler>) {
        let controller = web::Data::new(Self::new(reconciler));

        cfg.service(
            web::scope("/api/payments/webhook")
                .app_data(controller)
                .service(receive_webhook)
                .service(retry_webhook),
        );
    }
}

/// POST /api/payments/webhook
///
/// 4xx only for structural or signature rejection (and unknown correlation
/// keys, which indicate an integration bug). Once the signature verified,
/// internal reconciliation failures are still ACKed with 2xx to stop the
/// provider's redelivery storm; the audit row carries the failure for
/// operator retry.
#[post("")]
async fn receive_webhook(
    body: web::Bytes,
    controller: web::Data<WebhookController>,
) -> Result<HttpResponse> {
    // Raw bytes instead of a Json extractor: a body that fails to parse
    // must still leave an audit row before the 400 goes out.
    let outcome = match serde_json::from_slice::<Value>(&body) {
        Ok(raw) => controller.reconciler.handle_webhook(raw).await?,
        Err(e) => {
            controller
                .reconciler
                .record_unparsable(&body, &e.to_string())
                .await?
        }
    };
    Ok(outcome_response(outcome))
}

/// POST /api/payments/webhook/{event_id}/retry
///
/// Operator-initiated re-run of reconciliation for a stored event that
/// verified but failed afterwards.
#[post("/{event_id}/retry")]
async fn retry_webhook(
    path: web::Path<String>,
    controller: web::Data<WebhookController>,
) -> Result<HttpResponse> {
    let outcome = controller.reconciler.retry_event(&path.into_inner()).await?;
    Ok(outcome_response(outcome))
}

fn outcome_response(outcome: WebhookOutcome) -> HttpResponse {
    match outcome {
        WebhookOutcome::Rejected { event_id, reason } => {
            HttpResponse::BadRequest().json(json!({
                "status": "rejected",
                "event_id": event_id,
                "reason": reason,
            }))
        }
        WebhookOutcome::PaymentNotFound {
            event_id,
            merchant_order_id,
        } => HttpResponse::NotFound().json(json!({
            "status": "failed",
            "event_id": event_id,
            "merchant_order_id": merchant_order_id,
            "reason": "no matching payment",
        })),
        WebhookOutcome::Completed {
            event_id,
            merchant_order_id,
            transitioned,
        } => HttpResponse::Ok().json(json!({
            "status": "ok",
            "event_id": event_id,
            "merchant_order_id": merchant_order_id,
            "duplicate": !transitioned,
        })),
        WebhookOutcome::Superseded {
            event_id,
            merchant_order_id,
            status,
        } => HttpResponse::Ok().json(json!({
            "status": "ok",
            "event_id": event_id,
            "merchant_order_id": merchant_order_id,
            "payment_status": status.to_string(),
            "applied": false,
        })),
        WebhookOutcome::Failed {
            event_id,
            merchant_order_id,
            reason,
        } => HttpResponse::Ok().json(json!({
            "status": "ok",
            "event_id": event_id,
            "merchant_order_id": merchant_order_id,
            "payment_status": "failed",
            "reason": reason,
        })),
        WebhookOutcome::ReconciliationFailed { event_id, error } => {
            // Verified but not reconciled: ACK anyway, the event row holds
            // the failure for retry.
            HttpResponse::Ok().json(json!({
                "status": "accepted",
                "event_id": event_id,
                "recorded_error": error,
            }))
        }
    }
}
