use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Network reachability check done before each flush.
#[async_trait]
pub trait NetworkProbe: Send + Sync {
    async fn is_online(&self) -> bool;
}

/// Fixed answer, decided at startup (`--offline`, remote disabled…).
#[derive(Debug, Clone, Copy)]
pub struct StaticProbe(pub bool);

#[async_trait]
impl NetworkProbe for StaticProbe {
    async fn is_online(&self) -> bool {
        self.0
    }
}

/// Shared on/off switch; clones observe the same state.
#[derive(Debug, Clone)]
pub struct SwitchProbe {
    online: Arc<AtomicBool>,
}

impl SwitchProbe {
    pub fn new(online: bool) -> Self {
        Self {
            online: Arc::new(AtomicBool::new(online)),
        }
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }
}

#[async_trait]
impl NetworkProbe for SwitchProbe {
    async fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }
}
