//! Client-side id generation.

use chrono::Utc;
use std::sync::atomic::{AtomicI64, Ordering};

/// Millisecond-timestamp ids that never repeat within a process.
///
/// Two calls in the same millisecond get consecutive values instead of
/// colliding; ids stay ordered by creation time.
#[derive(Debug, Default)]
pub struct IdGenerator {
    last: AtomicI64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start above an already-used id (e.g. the newest persisted event).
    pub fn seed(&self, floor: i64) {
        self.last.fetch_max(floor, Ordering::SeqCst);
    }

    pub fn next_id(&self) -> i64 {
        let now = Utc::now().timestamp_millis();
        let mut prev = self.last.load(Ordering::SeqCst);
        loop {
            let candidate = now.max(prev + 1);
            match self
                .last
                .compare_exchange(prev, candidate, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(_) => return candidate,
                Err(actual) => prev = actual,
            }
        }
    }
}
