use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Audit status of an inbound webhook delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "VARCHAR(20)", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum WebhookEventStatus {
    /// Persisted before any validation ran
    Received,
    /// Signature checked out and reconciliation finished
    Verified,
    /// Structural or signature validation failed; no payment state touched
    Rejected,
    /// Signature checked out but reconciliation failed; retryable
    Failed,
}

impl std::fmt::Display for WebhookEventStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WebhookEventStatus::Received => write!(f, "received"),
            WebhookEventStatus::Verified => write!(f, "verified"),
            WebhookEventStatus::Rejected => write!(f, "rejected"),
            WebhookEventStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Append-only audit record, one per inbound callback
///
/// Every delivery produces exactly one row regardless of outcome, so forged
/// and malformed requests are as visible as genuine ones.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WebhookEvent {
    pub id: String,
    pub event_type: String,
    /// Raw payload exactly as received
    pub payload: serde_json::Value,
    /// Claimed hmac, if the payload carried one
    pub signature: Option<String>,
    pub status: WebhookEventStatus,
    pub processing_attempts: i32,
    pub last_error: Option<String>,
    /// Correlation key extracted from the payload, when present
    pub merchant_order_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WebhookEvent {
    pub fn received(event_type: String, payload: serde_json::Value) -> Self {
        let signature = payload
            .get("hmac")
            .and_then(|v| v.as_str())
            .map(String::from);
        let merchant_order_id = payload
            .pointer("/order/merchant_order_id")
            .and_then(|v| v.as_str())
            .map(String::from);
        let now = Utc::now();

        Self {
            id: uuid::Uuid::new_v4().to_string(),
            event_type,
            payload,
            signature,
            status: WebhookEventStatus::Received,
            processing_attempts: 0,
            last_error: None,
            merchant_order_id,
            created_at: now,
            updated_at: now,
        }
    }
}
