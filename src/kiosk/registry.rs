use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::kiosk::flow::ClockAttempt;
use crate::models::clock::ClockType;

struct Slot {
    created_at: Instant,
    attempt: Arc<Mutex<ClockAttempt>>,
}

/// Live kiosk attempts, keyed by their random id.
///
/// Each attempt sits behind its own mutex so two requests on the same
/// attempt run one after the other.
#[derive(Clone)]
pub struct AttemptRegistry {
    slots: Arc<RwLock<HashMap<Uuid, Slot>>>,
    ttl: Duration,
}

impl AttemptRegistry {
    pub fn new(ttl: Duration) -> Self {
        Self {
            slots: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Opens a new attempt and returns its handle.
    pub async fn start(&self, clock_type: ClockType) -> Arc<Mutex<ClockAttempt>> {
        let attempt = ClockAttempt::new(clock_type);
        let id = attempt.id();
        let attempt = Arc::new(Mutex::new(attempt));

        self.slots.write().await.insert(
            id,
            Slot {
                created_at: Instant::now(),
                attempt: attempt.clone(),
            },
        );
        tracing::debug!("🕒 Kiosk attempt {} opened ({})", id, clock_type);
        attempt
    }

    /// Looks an attempt up. Expired attempts are reported as missing.
    pub async fn get(&self, id: Uuid) -> Result<Arc<Mutex<ClockAttempt>>> {
        let slots = self.slots.read().await;
        match slots.get(&id) {
            Some(slot) if slot.created_at.elapsed() < self.ttl => Ok(slot.attempt.clone()),
            _ => Err(AppError::NotFound(
                "Clock attempt not found or expired".to_string(),
            )),
        }
    }

    /// Drops an attempt. Unknown ids are ignored.
    pub async fn remove(&self, id: Uuid) {
        if self.slots.write().await.remove(&id).is_some() {
            tracing::debug!("🗑️ Kiosk attempt {} discarded", id);
        }
    }

    /// Removes attempts older than the TTL and returns how many went.
    pub async fn sweep(&self) -> usize {
        let mut slots = self.slots.write().await;
        let before = slots.len();
        slots.retain(|_, slot| slot.created_at.elapsed() < self.ttl);
        before - slots.len()
    }

    pub async fn count(&self) -> usize {
        self.slots.read().await.len()
    }

    /// Sweeps expired attempts on a fixed period, forever.
    pub async fn run_sweeper(self, every: Duration) {
        let mut interval = tokio::time::interval(every);
        interval.tick().await;
        loop {
            interval.tick().await;
            let removed = self.sweep().await;
            if removed > 0 {
                tracing::info!(
                    "🧹 Swept {} expired kiosk attempts, {} still open",
                    removed,
                    self.count().await
                );
            }
        }
    }
}
