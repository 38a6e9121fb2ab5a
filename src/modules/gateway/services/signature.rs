//! Webhook HMAC verification.
//!
//! The provider signs each transaction callback by concatenating a fixed,
//! ordered list of payload fields with no separator and computing
//! HMAC-SHA512 over the result with the shared secret. The field list and
//! its order are the provider's contract; changing either silently breaks
//! every future verification.

use hmac::{Hmac, Mac};
use serde_json::Value;
use sha2::Sha512;

type HmacSha512 = Hmac<Sha512>;

/// Signed fields in the exact order the provider concatenates them.
///
/// Dotted entries are looked up through nested objects; `order.id` means the
/// nested order object contributes only its id.
pub const SIGNED_FIELDS: [&str; 20] = [
    "amount_cents",
    "created_at",
    "currency",
    "error_occured",
    "has_parent_transaction",
    "id",
    "integration_id",
    "is_3d_secure",
    "is_auth",
    "is_capture",
    "is_refunded",
    "is_standalone_payment",
    "is_voided",
    "order.id",
    "owner",
    "pending",
    "source_data.pan",
    "source_data.sub_type",
    "source_data.type",
    "success",
];

/// Build the exact byte string the provider signed.
///
/// Returns `None` when any signed field is absent or is not a scalar; a
/// payload that cannot be reconstructed can never verify.
pub fn signed_field_concat(payload: &Value) -> Option<String> {
    let mut concatenated = String::new();

    for path in SIGNED_FIELDS {
        let value = lookup(payload, path)?;
        concatenated.push_str(&render_scalar(value)?);
    }

    Some(concatenated)
}

/// Verify the payload's claimed `hmac` against the shared secret.
///
/// Never panics and never errors: any missing field, malformed hex, or
/// digest mismatch is simply `false`. The underlying comparison is
/// constant-time.
pub fn verify_hmac(payload: &Value, secret: &str) -> bool {
    let Some(claimed) = payload.get("hmac").and_then(Value::as_str) else {
        return false;
    };

    let Ok(claimed_bytes) = hex::decode(claimed) else {
        return false;
    };

    let Some(message) = signed_field_concat(payload) else {
        return false;
    };

    let Ok(mut mac) = HmacSha512::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(message.as_bytes());
    mac.verify_slice(&claimed_bytes).is_ok()
}

/// Compute the hex HMAC digest for a payload, as the provider would.
///
/// Used by tests and by fixture tooling; production code only verifies.
pub fn compute_hmac(payload: &Value, secret: &str) -> Option<String> {
    let message = signed_field_concat(payload)?;
    let mut mac = HmacSha512::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(message.as_bytes());
    Some(hex::encode(mac.finalize().into_bytes()))
}

/// Resolve a dotted path through nested JSON objects
fn lookup<'a>(payload: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(payload, |value, key| value.get(key))
}

/// Render a scalar the way the provider's signer stringifies it.
///
/// Booleans become `true`/`false`, numbers keep their JSON form, strings are
/// taken verbatim and null renders as `null` (a present-but-null field is
/// still signed). Arrays and objects are never signed.
fn render_scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Null => Some("null".to_string()),
        Value::Array(_) | Value::Object(_) => None,
    }
}
