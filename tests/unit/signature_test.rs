// Exhaustive coverage of the webhook HMAC contract: the field list and its
// order are provider-mandated, so every signed field gets a tamper test.

use coursepay::gateway::signature::{
    compute_hmac, signed_field_concat, verify_hmac, SIGNED_FIELDS,
};
use serde_json::{json, Value};

const SECRET: &str = "whsec_course_pay_test";

fn transaction_payload() -> Value {
    json!({
        "type": "TRANSACTION",
        "id": 987654,
        "amount_cents": 15000,
        "created_at": "2026-08-01T10:15:00.000000",
        "currency": "EGP",
        "error_occured": false,
        "has_parent_transaction": false,
        "integration_id": 111,
        "is_3d_secure": true,
        "is_auth": false,
        "is_capture": false,
        "is_refunded": false,
        "is_standalone_payment": true,
        "is_voided": false,
        "order": {
            "id": 424242,
            "merchant_order_id": "crs-abc-usr-123-1700000000000"
        },
        "owner": 5150,
        "pending": false,
        "source_data": {
            "pan": "2345",
            "sub_type": "MasterCard",
            "type": "card"
        },
        "success": true
    })
}

fn signed_payload() -> Value {
    let mut payload = transaction_payload();
    let digest = compute_hmac(&payload, SECRET).expect("payload must be signable");
    payload["hmac"] = json!(digest);
    payload
}

/// Replace the value at a dotted path
fn set_path(payload: &mut Value, path: &str, value: Value) {
    let pointer = format!("/{}", path.replace('.', "/"));
    *payload.pointer_mut(&pointer).unwrap() = value;
}

#[test]
fn valid_signature_verifies() {
    assert!(verify_hmac(&signed_payload(), SECRET));
}

#[test]
fn wrong_secret_fails() {
    assert!(!verify_hmac(&signed_payload(), "some-other-secret"));
}

#[test]
fn tampering_any_signed_field_fails() {
    for path in SIGNED_FIELDS {
        let mut payload = signed_payload();
        let original = payload
            .pointer(&format!("/{}", path.replace('.', "/")))
            .unwrap()
            .clone();

        let tampered = match original {
            Value::Bool(b) => json!(!b),
            Value::Number(n) => json!(n.as_i64().unwrap() + 1),
            Value::String(s) => json!(format!("{}x", s)),
            other => panic!("unexpected signed value at {}: {:?}", path, other),
        };

        set_path(&mut payload, path, tampered);
        assert!(
            !verify_hmac(&payload, SECRET),
            "tampering {} must break verification",
            path
        );
    }
}

#[test]
fn tampering_hmac_itself_fails() {
    let mut payload = signed_payload();
    let claimed = payload["hmac"].as_str().unwrap().to_string();

    // flip one hex nibble
    let flipped_char = if claimed.starts_with('0') { "1" } else { "0" };
    let tampered = format!("{}{}", flipped_char, &claimed[1..]);
    payload["hmac"] = json!(tampered);

    assert!(!verify_hmac(&payload, SECRET));
}

#[test]
fn removing_any_signed_field_fails_without_panic() {
    for path in SIGNED_FIELDS {
        let mut payload = signed_payload();

        match path.split_once('.') {
            Some((parent, child)) => {
                payload[parent].as_object_mut().unwrap().remove(child);
            }
            None => {
                payload.as_object_mut().unwrap().remove(path);
            }
        }

        assert!(
            !verify_hmac(&payload, SECRET),
            "missing {} must fail verification",
            path
        );
    }
}

#[test]
fn missing_hmac_field_fails() {
    assert!(!verify_hmac(&transaction_payload(), SECRET));
}

#[test]
fn non_scalar_signed_field_fails() {
    let mut payload = signed_payload();
    set_path(&mut payload, "source_data.pan", json!({ "nested": true }));
    assert!(!verify_hmac(&payload, SECRET));
}

#[test]
fn garbage_hmac_values_fail_without_panic() {
    for garbage in ["", "zz", "not hex at all", "0123"] {
        let mut payload = signed_payload();
        payload["hmac"] = json!(garbage);
        assert!(!verify_hmac(&payload, SECRET));
    }
}

#[test]
fn concat_is_order_sensitive() {
    // the concatenation must follow the declared field order, not payload
    // key order; serde_json object key order is irrelevant
    let concat = signed_field_concat(&transaction_payload()).unwrap();
    let amount_pos = concat.find("15000").unwrap();
    let success_pos = concat.rfind("true").unwrap();
    assert!(amount_pos < success_pos, "amount_cents precedes success");
}

#[test]
fn null_pan_is_signed_as_literal_null() {
    // wallet transactions carry a null pan; the provider still signs it
    let mut payload = transaction_payload();
    payload["source_data"]["pan"] = Value::Null;
    let digest = compute_hmac(&payload, SECRET).unwrap();
    payload["hmac"] = json!(digest);
    assert!(verify_hmac(&payload, SECRET));
}

#[test]
fn verification_is_deterministic() {
    let payload = signed_payload();
    for _ in 0..10 {
        assert!(verify_hmac(&payload, SECRET));
    }
}
