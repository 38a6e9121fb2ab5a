use super::super::models::{WebhookEvent, WebhookEventStatus};
use crate::core::{AppError, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::MySqlPool;

/// Persistence contract for the webhook audit log
#[async_trait]
pub trait WebhookEventStore: Send + Sync {
    /// Persist a freshly received event; always the first write of a
    /// webhook delivery
    async fn create(&self, event: &WebhookEvent) -> Result<()>;

    async fn find_by_id(&self, id: &str) -> Result<Option<WebhookEvent>>;

    async fn set_status(&self, id: &str, status: WebhookEventStatus) -> Result<()>;

    /// Record a reconciliation failure: bumps `processing_attempts`, stores
    /// the error and moves the event to `Failed`
    async fn record_failure(&self, id: &str, error: &str) -> Result<()>;
}

/// MySQL-backed webhook event store
pub struct MySqlWebhookEventRepository {
    pool: MySqlPool,
}

impl MySqlWebhookEventRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WebhookEventStore for MySqlWebhookEventRepository {
    async fn create(&self, event: &WebhookEvent) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO webhook_events (
                id, event_type, payload, signature, status,
                processing_attempts, last_error, merchant_order_id,
                created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&event.id)
        .bind(&event.event_type)
        .bind(&event.payload)
        .bind(&event.signature)
        .bind(event.status)
        .bind(event.processing_attempts)
        .bind(&event.last_error)
        .bind(&event.merchant_order_id)
        .bind(event.created_at)
        .bind(event.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::internal(format!("Failed to create webhook event: {}", e)))?;

        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<WebhookEvent>> {
        let event = sqlx::query_as::<_, WebhookEvent>(
            r#"
            SELECT
                id, event_type, payload, signature, status,
                processing_attempts, last_error, merchant_order_id,
                created_at, updated_at
            FROM webhook_events
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::internal(format!("Failed to fetch webhook event: {}", e)))?;

        Ok(event)
    }

    async fn set_status(&self, id: &str, status: WebhookEventStatus) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE webhook_events
            SET status = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(status)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::internal(format!("Failed to update webhook event: {}", e)))?;

        Ok(())
    }

    async fn record_failure(&self, id: &str, error: &str) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE webhook_events
            SET status = ?,
                processing_attempts = processing_attempts + 1,
                last_error = ?,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(WebhookEventStatus::Failed)
        .bind(error)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::internal(format!("Failed to record webhook failure: {}", e)))?;

        Ok(())
    }
}
