use super::super::repositories::PaymentStore;
use super::super::services::{InitiatePaymentRequest, PaymentOrchestrator};
use crate::core::{AppError, Result};
use actix_web::{get, post, web, HttpResponse};
use std::sync::Arc;
use tracing::info;

/// Payment initiation and status endpoints
pub struct PaymentController {
    orchestrator: Arc<PaymentOrchestrator>,
    payments: Arc<dyn PaymentStore>,
}

impl PaymentController {
    pub fn new(orchestrator: Arc<PaymentOrchestrator>, payments: Arc<dyn PaymentStore>) -> Self {
        Self {
            orchestrator,
            payments,
        }
    }

    /// Configure payment routes under /api/payments
    pub fn configure(
        cfg: &mut web::ServiceConfig,
        orchestrator: Arc<PaymentOrchestrator>,
        payments: Arc<dyn PaymentStore>,
    ) {
        let controller = web::Data::new(Self::new(orchestrator, payments));

        cfg.service(
            web::scope("/api/payments")
                .app_data(controller)
                .service(initiate_payment)
                .service(get_payment)
                .service(cancel_payment),
        );
    }
}

/// POST /api/payments/initiate
///
/// Creates a pending payment, drives the provider flow for the requested
/// mode and returns the handle (iframe or checkout URL) for the browser.
/// Gateway failures surface as a 502-family error after the payment row was
/// marked failed; the client retries with a fresh request.
#[post("/initiate")]
async fn initiate_payment(
    body: web::Json<InitiatePaymentRequest>,
    controller: web::Data<PaymentController>,
) -> Result<HttpResponse> {
    let handle = controller
        .orchestrator
        .initiate_payment(body.into_inner())
        .await?;

    Ok(HttpResponse::Created().json(handle))
}

/// GET /api/payments/{merchant_order_id}
///
/// Status lookup for the client-side return page.
#[get("/{merchant_order_id}")]
async fn get_payment(
    path: web::Path<String>,
    controller: web::Data<PaymentController>,
) -> Result<HttpResponse> {
    let merchant_order_id = path.into_inner();

    let payment = controller
        .payments
        .find_by_merchant_order_id(&merchant_order_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("payment {}", merchant_order_id)))?;

    Ok(HttpResponse::Ok().json(payment))
}

/// POST /api/payments/{merchant_order_id}/cancel
///
/// Explicit user/admin cancellation; only a still-pending payment cancels.
#[post("/{merchant_order_id}/cancel")]
async fn cancel_payment(
    path: web::Path<String>,
    controller: web::Data<PaymentController>,
) -> Result<HttpResponse> {
    let merchant_order_id = path.into_inner();

    let cancelled = controller.payments.cancel(&merchant_order_id).await?;
    if !cancelled {
        return Err(AppError::validation(
            "payment is not pending and cannot be cancelled",
        ));
    }

    info!(merchant_order_id = %merchant_order_id, "Payment cancelled");

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "merchant_order_id": merchant_order_id,
        "status": "cancelled"
    })))
}
