use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use chrono::Utc;

/// Source of "now" for reconciles: the wall clock, or a manual clock that
/// tests move by hand.
#[derive(Debug, Clone, Default)]
pub enum ServerClock {
    #[default]
    System,
    Manual(Arc<AtomicI64>),
}

impl ServerClock {
    pub fn manual(start_ms: i64) -> Self {
        ServerClock::Manual(Arc::new(AtomicI64::new(start_ms)))
    }

    /// Milliseconds since the Unix epoch.
    pub fn now_ms(&self) -> i64 {
        match self {
            ServerClock::System => Utc::now().timestamp_millis(),
            ServerClock::Manual(t) => t.load(Ordering::SeqCst),
        }
    }

    /// Move a manual clock; no-op on the system clock.
    pub fn set_ms(&self, ms: i64) {
        if let ServerClock::Manual(t) = self {
            t.store(ms, Ordering::SeqCst);
        }
    }
}
