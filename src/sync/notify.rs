//! Change notification bus.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use tracing::error;

pub type Listener = Arc<dyn Fn() + Send + Sync>;

type Registry = Mutex<Vec<(u64, Listener)>>;

#[derive(Default)]
pub struct ChangeBus {
    listeners: Arc<Registry>,
    next_id: AtomicU64,
}

impl ChangeBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.lock().push((id, Arc::new(listener)));
        Subscription {
            id,
            registry: Arc::downgrade(&self.listeners),
        }
    }

    /// Call every listener in registration order. A panicking listener is
    /// logged and skipped.
    pub fn notify(&self) {
        // snapshot: listeners may (un)subscribe while being notified
        let snapshot: Vec<(u64, Listener)> = self.lock().clone();

        for (id, listener) in snapshot {
            if catch_unwind(AssertUnwindSafe(|| listener())).is_err() {
                error!(listener = id, "change listener panicked");
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(u64, Listener)>> {
        self.listeners.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Handle returned by [`ChangeBus::subscribe`].
pub struct Subscription {
    id: u64,
    registry: Weak<Registry>,
}

impl Subscription {
    pub fn unsubscribe(self) {
        if let Some(registry) = self.registry.upgrade() {
            registry
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .retain(|(id, _)| *id != self.id);
        }
    }
}
