use super::super::models::{Payment, PaymentStatus};
use crate::core::{AppError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::MySqlPool;

/// Result of a conditional completion attempt
///
/// Distinguishes a terminal-but-not-completed payment (cancelled or failed)
/// from a redelivered success: the former must never produce an enrollment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionOutcome {
    /// This call performed the transition to COMPLETED
    Transitioned,
    /// The payment was already COMPLETED by an earlier delivery
    AlreadyCompleted,
    /// The payment is in a terminal non-completed state and stays there
    NotEligible { status: PaymentStatus },
}

/// Persistence contract for payment rows
///
/// The store is an external collaborator; the orchestrator and reconciler
/// only depend on this trait, which keeps them testable against an
/// in-memory implementation.
#[async_trait]
pub trait PaymentStore: Send + Sync {
    async fn create(&self, payment: &Payment) -> Result<()>;

    async fn find_by_merchant_order_id(&self, merchant_order_id: &str)
        -> Result<Option<Payment>>;

    /// Record the provider-assigned order id and the raw response blob
    /// after initiation succeeded remotely
    async fn attach_provider_order(
        &self,
        merchant_order_id: &str,
        provider_order_id: i64,
        response: &serde_json::Value,
    ) -> Result<()>;

    /// Mark a payment failed with a reason (initiation failures and
    /// failure webhooks)
    async fn mark_failed(
        &self,
        merchant_order_id: &str,
        reason: &str,
        provider_transaction_id: Option<i64>,
    ) -> Result<()>;

    /// Conditionally complete a payment.
    ///
    /// Transitions only when the current status is still non-terminal, so
    /// two concurrent success webhooks for the same merchant order id yield
    /// exactly one transition. A cancelled or failed payment reports
    /// `NotEligible` and keeps its status.
    async fn complete(
        &self,
        merchant_order_id: &str,
        provider_transaction_id: Option<i64>,
        completed_at: DateTime<Utc>,
    ) -> Result<CompletionOutcome>;

    /// Explicit user/admin cancellation; only a pending payment can cancel
    async fn cancel(&self, merchant_order_id: &str) -> Result<bool>;
}

/// MySQL-backed payment store
pub struct MySqlPaymentRepository {
    pool: MySqlPool,
}

impl MySqlPaymentRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PaymentStore for MySqlPaymentRepository {
    async fn create(&self, payment: &Payment) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO payments (
                id, user_id, course_id, amount, currency, status,
                merchant_order_id, provider_order_id, provider_transaction_id,
                provider_response, failure_reason, completed_at,
                created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&payment.id)
        .bind(&payment.user_id)
        .bind(&payment.course_id)
        .bind(payment.amount)
        .bind(&payment.currency)
        .bind(payment.status)
        .bind(&payment.merchant_order_id)
        .bind(payment.provider_order_id)
        .bind(payment.provider_transaction_id)
        .bind(&payment.provider_response)
        .bind(&payment.failure_reason)
        .bind(payment.completed_at)
        .bind(payment.created_at)
        .bind(payment.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::internal(format!("Failed to create payment: {}", e)))?;

        Ok(())
    }

    async fn find_by_merchant_order_id(
        &self,
        merchant_order_id: &str,
    ) -> Result<Option<Payment>> {
        let payment = sqlx::query_as::<_, Payment>(
            r#"
            SELECT
                id, user_id, course_id, amount, currency, status,
                merchant_order_id, provider_order_id, provider_transaction_id,
                provider_response, failure_reason, completed_at,
                created_at, updated_at
            FROM payments
            WHERE merchant_order_id = ?
            "#,
        )
        .bind(merchant_order_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::internal(format!("Failed to fetch payment: {}", e)))?;

        Ok(payment)
    }

    async fn attach_provider_order(
        &self,
        merchant_order_id: &str,
        provider_order_id: i64,
        response: &serde_json::Value,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE payments
            SET provider_order_id = ?,
                provider_response = JSON_ARRAY_APPEND(
                    COALESCE(provider_response, JSON_ARRAY()), '$', CAST(? AS JSON)
                ),
                updated_at = ?
            WHERE merchant_order_id = ?
            "#,
        )
        .bind(provider_order_id)
        .bind(response)
        .bind(Utc::now())
        .bind(merchant_order_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::internal(format!("Failed to attach provider order: {}", e)))?;

        Ok(())
    }

    async fn mark_failed(
        &self,
        merchant_order_id: &str,
        reason: &str,
        provider_transaction_id: Option<i64>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE payments
            SET status = ?,
                failure_reason = ?,
                provider_transaction_id = COALESCE(?, provider_transaction_id),
                updated_at = ?
            WHERE merchant_order_id = ?
              AND status IN (?, ?)
            "#,
        )
        .bind(PaymentStatus::Failed)
        .bind(reason)
        .bind(provider_transaction_id)
        .bind(Utc::now())
        .bind(merchant_order_id)
        .bind(PaymentStatus::Pending)
        .bind(PaymentStatus::Processing)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::internal(format!("Failed to mark payment failed: {}", e)))?;

        Ok(())
    }

    async fn complete(
        &self,
        merchant_order_id: &str,
        provider_transaction_id: Option<i64>,
        completed_at: DateTime<Utc>,
    ) -> Result<CompletionOutcome> {
        // Conditional write: the WHERE clause is the idempotency guard for
        // concurrent success webhooks referencing the same order.
        let result = sqlx::query(
            r#"
            UPDATE payments
            SET status = ?,
                provider_transaction_id = COALESCE(?, provider_transaction_id),
                completed_at = ?,
                updated_at = ?
            WHERE merchant_order_id = ?
              AND status IN (?, ?)
            "#,
        )
        .bind(PaymentStatus::Completed)
        .bind(provider_transaction_id)
        .bind(completed_at)
        .bind(Utc::now())
        .bind(merchant_order_id)
        .bind(PaymentStatus::Pending)
        .bind(PaymentStatus::Processing)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::internal(format!("Failed to complete payment: {}", e)))?;

        if result.rows_affected() > 0 {
            return Ok(CompletionOutcome::Transitioned);
        }

        // No rows matched: the payment is terminal. Re-read to tell a
        // redelivered success apart from a cancelled or failed payment.
        let status: Option<PaymentStatus> = sqlx::query_scalar(
            "SELECT status FROM payments WHERE merchant_order_id = ?",
        )
        .bind(merchant_order_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::internal(format!("Failed to read payment status: {}", e)))?;

        match status {
            Some(PaymentStatus::Completed) => Ok(CompletionOutcome::AlreadyCompleted),
            Some(status) => Ok(CompletionOutcome::NotEligible { status }),
            None => Err(AppError::not_found(format!(
                "payment {}",
                merchant_order_id
            ))),
        }
    }

    async fn cancel(&self, merchant_order_id: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE payments
            SET status = ?, updated_at = ?
            WHERE merchant_order_id = ? AND status = ?
            "#,
        )
        .bind(PaymentStatus::Cancelled)
        .bind(Utc::now())
        .bind(merchant_order_id)
        .bind(PaymentStatus::Pending)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::internal(format!("Failed to cancel payment: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }
}
