//! Minimum-interval gate for outbound requests.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Serializes callers so consecutive acquisitions are at least `cooldown` apart.
///
/// Owned by whoever composes the search tool; state lives as long as that owner.
#[derive(Debug)]
pub struct SearchThrottle {
    cooldown: Duration,
    last: Mutex<Option<Instant>>,
}

impl SearchThrottle {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last: Mutex::new(None),
        }
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Wait out the remaining cooldown, then record this acquisition.
    ///
    /// `on_wait` is called with the delay before sleeping, only when a delay is needed.
    /// Returns the delay that was applied.
    pub async fn acquire(&self, on_wait: impl FnOnce(Duration)) -> Duration {
        let mut last = self.last.lock().await;

        let wait = last
            .map(|at| self.cooldown.saturating_sub(at.elapsed()))
            .unwrap_or(Duration::ZERO);

        if !wait.is_zero() {
            on_wait(wait);
            tokio::time::sleep(wait).await;
        }

        *last = Some(Instant::now());
        wait
    }
}
