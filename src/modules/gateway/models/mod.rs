use serde::{Deserialize, Serialize};

/// Payment mode selected by the caller at initiation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMode {
    /// Hosted card iframe flow (auth -> order -> payment key)
    Card,
    /// Wallet intention flow (single intention call)
    Wallet,
}

impl std::fmt::Display for PaymentMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentMode::Card => write!(f, "card"),
            PaymentMode::Wallet => write!(f, "wallet"),
        }
    }
}

/// Short-lived bearer token returned by the provider's auth endpoint
///
/// Valid for a single payment flow; callers must not cache it across flows.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthToken(pub String);

/// Order data sent to the provider when registering a payment
#[derive(Debug, Clone, Serialize)]
pub struct OrderRequest {
    /// Locally generated correlation key echoed back in webhooks
    pub merchant_order_id: String,
    /// Amount in minor units (cents/piastres)
    pub amount_cents: i64,
    /// ISO currency code
    pub currency: String,
    /// Human-readable description of the purchased item
    pub item_name: String,
    pub billing: BillingData,
}

/// Buyer billing details required by the provider
///
/// Address fields the platform does not collect are sent as "NA", which the
/// provider accepts for digital goods.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingData {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    #[serde(default = "na")]
    pub apartment: String,
    #[serde(default = "na")]
    pub floor: String,
    #[serde(default = "na")]
    pub street: String,
    #[serde(default = "na")]
    pub building: String,
    #[serde(default = "na")]
    pub city: String,
    #[serde(default = "na")]
    pub state: String,
    #[serde(default = "na")]
    pub country: String,
    #[serde(default = "na")]
    pub postal_code: String,
}

fn na() -> String {
    "NA".to_string()
}

impl BillingData {
    pub fn new(first_name: String, last_name: String, email: String, phone_number: String) -> Self {
        Self {
            first_name,
            last_name,
            email,
            phone_number,
            apartment: na(),
            floor: na(),
            street: na(),
            building: na(),
            city: na(),
            state: na(),
            country: na(),
            postal_code: na(),
        }
    }
}

/// Provider-assigned order returned by the order registration endpoint
#[derive(Debug, Clone)]
pub struct ProviderOrder {
    pub id: i64,
    /// Raw provider response, kept for the payment audit blob
    pub raw: serde_json::Value,
}

/// Single-use payment token scoped to one integration id
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentKey {
    pub token: String,
}

/// Intention created through the wallet-mode endpoint
#[derive(Debug, Clone)]
pub struct Intention {
    pub id: String,
    pub client_secret: String,
    /// Provider order id assigned to the intention, when present
    pub order_id: Option<i64>,
    /// Raw provider response, kept for the payment audit blob
    pub raw: serde_json::Value,
}
