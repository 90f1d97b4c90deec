//! Per-client token-bucket admission control

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Instant;

struct RateBucket {
    tokens: f64,
    last_refill: Instant,
}

/// Token bucket per hashed client id. Capacity doubles as the refill rate
/// in tokens per second; refill is computed lazily at each check against a
/// monotonic clock. Buckets are never evicted, so the map grows with the
/// number of distinct clients seen over the process lifetime.
pub struct RateLimiter {
    capacity: f64,
    buckets: Mutex<HashMap<String, RateBucket>>,
}

impl RateLimiter {
    pub fn new(capacity: f64) -> Self {
        Self {
            capacity,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    /// Admit the request and consume one token, or reject it. The
    /// read-modify-write is atomic under the map lock; a client seen for
    /// the first time starts with a full bucket.
    pub fn check(&self, client: &str) -> bool {
        let now = Instant::now();
        let mut buckets = self.buckets.lock().unwrap();
        let bucket = buckets.entry(client.to_string()).or_insert(RateBucket {
            tokens: self.capacity,
            last_refill: now,
        });

        let elapsed = now.duration_since(bucket.last_refill).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * self.capacity).min(self.capacity);
        bucket.last_refill = now;

        if bucket.tokens < 1.0 {
            return false;
        }
        bucket.tokens -= 1.0;
        true
    }
}
