use chrono::Utc;
use std::sync::atomic::{AtomicI64, Ordering};

// Highest nonce handed out so far; nudged past the wall clock when two
// calls land in the same millisecond.
static LAST_NONCE: AtomicI64 = AtomicI64::new(0);

/// Generate the correlation key the provider echoes back in webhooks.
///
/// Format: `crs-{course_id}-usr-{user_id}-{nonce}` where the nonce is a
/// strictly increasing millisecond timestamp. Two concurrent calls, even for
/// the same (course, user) pair, always produce distinct ids.
pub fn generate_merchant_order_id(course_id: &str, user_id: &str) -> String {
    format!("crs-{}-usr-{}-{}", course_id, user_id, next_nonce())
}

fn next_nonce() -> i64 {
    let now = Utc::now().timestamp_millis();
    loop {
        let last = LAST_NONCE.load(Ordering::Acquire);
        let candidate = now.max(last + 1);
        if LAST_NONCE
            .compare_exchange(last, candidate, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            return candidate;
        }
    }
}
