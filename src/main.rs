use actix_cors::Cors;
use actix_web::{web, App, HttpResponse, HttpServer};
use coursepay::config::Config;
use coursepay::middleware::RequestId;
use coursepay::modules::gateway::PaymobClient;
use coursepay::modules::payments::controllers::{PaymentController, WebhookController};
use coursepay::modules::payments::repositories::{
    MySqlEnrollmentRepository, MySqlPaymentRepository, MySqlWebhookEventRepository,
};
use coursepay::modules::payments::{PaymentOrchestrator, WebhookReconciler};
use std::sync::Arc;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "coursepay=debug,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env().expect("Failed to load configuration");
    config.validate().expect("Configuration validation failed");

    tracing::info!("Starting CoursePay payment service");
    tracing::info!("Environment: {}", config.app.env);
    tracing::info!("Server binding to: {}", config.server.bind_address());

    // Create database connection pool
    let db_pool = config
        .database
        .create_pool()
        .await
        .expect("Failed to create database pool");

    tracing::info!(
        "Database pool initialized ({} connections)",
        config.database.pool_size
    );

    // Wire stores, gateway client and services
    let payments: Arc<dyn coursepay::modules::payments::repositories::PaymentStore> =
        Arc::new(MySqlPaymentRepository::new(db_pool.clone()));
    let events: Arc<dyn coursepay::modules::payments::repositories::WebhookEventStore> =
        Arc::new(MySqlWebhookEventRepository::new(db_pool.clone()));
    let enrollments: Arc<dyn coursepay::modules::payments::repositories::EnrollmentStore> =
        Arc::new(MySqlEnrollmentRepository::new(db_pool.clone()));

    let gateway = Arc::new(PaymobClient::new(config.paymob.clone()));
    let orchestrator = Arc::new(PaymentOrchestrator::new(
        gateway,
        payments.clone(),
        config.paymob.clone(),
    ));
    let reconciler = Arc::new(WebhookReconciler::new(
        payments.clone(),
        events,
        enrollments,
        config.paymob.hmac_secret.clone(),
    ));

    let bind_address = config.server.bind_address();
    let workers = config.server.workers;

    let server = HttpServer::new(move || {
        let orchestrator = orchestrator.clone();
        let payments = payments.clone();
        let reconciler = reconciler.clone();

        App::new()
            .wrap(TracingLogger::default())
            .wrap(RequestId)
            .wrap(Cors::permissive())
            .configure(move |cfg| {
                WebhookController::configure(cfg, reconciler);
                PaymentController::configure(cfg, orchestrator, payments);
            })
            .route("/health", web::get().to(health_check))
    })
    .workers(workers)
    .bind(&bind_address)?
    .run();

    tracing::info!("Server started at http://{}", bind_address);

    server.await
}

async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "coursepay"
    }))
}
