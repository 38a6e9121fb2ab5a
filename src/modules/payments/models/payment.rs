use crate::core::{AppError, Currency, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Payment lifecycle status
///
/// Transitions are monotonic: `Pending -> Processing -> {Completed | Failed}`,
/// with `Cancelled` reachable only from `Pending` through an explicit user or
/// admin action, never through a webhook. `Completed`, `Failed` and
/// `Cancelled` are terminal for the webhook path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "VARCHAR(20)", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Cancelled,
}

impl Default for PaymentStatus {
    fn default() -> Self {
        PaymentStatus::Pending
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "pending"),
            PaymentStatus::Processing => write!(f, "processing"),
            PaymentStatus::Completed => write!(f, "completed"),
            PaymentStatus::Failed => write!(f, "failed"),
            PaymentStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "processing" => Ok(PaymentStatus::Processing),
            "completed" => Ok(PaymentStatus::Completed),
            "failed" => Ok(PaymentStatus::Failed),
            "cancelled" => Ok(PaymentStatus::Cancelled),
            _ => Err(format!("Invalid payment status: {}", s)),
        }
    }
}

impl PaymentStatus {
    /// Whether the webhook path may still move this payment
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PaymentStatus::Completed | PaymentStatus::Failed | PaymentStatus::Cancelled
        )
    }

    pub fn can_transition_to(&self, next: PaymentStatus) -> bool {
        use PaymentStatus::*;
        matches!(
            (self, next),
            (Pending, Processing)
                | (Pending, Completed)
                | (Pending, Failed)
                | (Pending, Cancelled)
                | (Processing, Completed)
                | (Processing, Failed)
        )
    }
}

/// One course purchase attempt
///
/// Created in `Pending` before any call to the provider, so a crash mid-flow
/// always leaves a reconcilable record. `merchant_order_id` is the only
/// stable join key between this row and the provider's records.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Payment {
    /// Local identifier (UUID)
    pub id: String,

    /// Buyer reference
    pub user_id: String,

    /// Purchased course reference
    pub course_id: String,

    /// Major-unit amount
    pub amount: Decimal,

    /// ISO currency code
    pub currency: String,

    pub status: PaymentStatus,

    /// Locally generated correlation key, globally unique, echoed back by
    /// the provider in webhooks
    pub merchant_order_id: String,

    /// Provider-assigned order id; null until the provider responds
    pub provider_order_id: Option<i64>,

    /// Provider-assigned transaction id; set on terminal webhook
    pub provider_transaction_id: Option<i64>,

    /// Raw provider payloads kept for audit
    pub provider_response: Option<serde_json::Value>,

    /// Set when the payment reaches a failed state
    pub failure_reason: Option<String>,

    /// Set when the payment completes
    pub completed_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    pub fn new(
        user_id: String,
        course_id: String,
        amount: Decimal,
        currency: Currency,
        merchant_order_id: String,
    ) -> Result<Self> {
        if amount <= Decimal::ZERO {
            return Err(AppError::validation("Payment amount must be positive"));
        }

        if user_id.trim().is_empty() {
            return Err(AppError::validation("User ID cannot be empty"));
        }

        if course_id.trim().is_empty() {
            return Err(AppError::validation("Course ID cannot be empty"));
        }

        if merchant_order_id.trim().is_empty() {
            return Err(AppError::validation("Merchant order ID cannot be empty"));
        }

        let now = Utc::now();

        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id,
            course_id,
            amount,
            currency: currency.to_string(),
            status: PaymentStatus::Pending,
            merchant_order_id,
            provider_order_id: None,
            provider_transaction_id: None,
            provider_response: None,
            failure_reason: None,
            completed_at: None,
            created_at: now,
            updated_at: now,
        })
    }
}
