// SPDX-License-Identifier: GPL-3.0-or-later

use crate::error::{Result, ScrobblerError};
use std::sync::Arc;
use tokio::sync::{Mutex, Semaphore};
use tokio::time::{sleep_until, Duration, Instant};

/// Spaces out web service calls.
///
/// The service allows five requests per second per client. Callers queue on
/// a single permit and each one is released no earlier than `min_interval`
/// after the previous one.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    permit: Arc<Semaphore>,
    min_interval: Duration,
    next_slot: Arc<Mutex<Option<Instant>>>,
}

impl RateLimiter {
    pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(200);

    pub fn new(min_interval: Duration) -> Self {
        Self {
            permit: Arc::new(Semaphore::new(1)),
            min_interval,
            next_slot: Arc::new(Mutex::new(None)),
        }
    }

    /// Wait for the next free slot.
    pub async fn acquire(&self) -> Result<()> {
        let _permit = self
            .permit
            .acquire()
            .await
            .map_err(|_| ScrobblerError::RateLimiterClosed)?;

        let mut next_slot = self.next_slot.lock().await;
        if let Some(slot) = *next_slot {
            if slot > Instant::now() {
                tracing::trace!(target: "api", "rate limited until {:?}", slot);
                sleep_until(slot).await;
            }
        }
        *next_slot = Some(Instant::now() + self.min_interval);
        Ok(())
    }

    /// Refuse every further request. Pending and later `acquire` calls fail
    /// with `RateLimiterClosed`.
    pub fn close(&self) {
        self.permit.close();
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(Self::DEFAULT_INTERVAL)
    }
}
