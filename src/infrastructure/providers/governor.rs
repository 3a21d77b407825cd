use crate::config::RateBudget;
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::time::{sleep, Duration, Instant};

struct Window {
    started: Instant,
    used: u32,
}

/// Shared per-provider call budget over a rolling window.
///
/// All concurrent resolutions draw from the same budget. `acquire` waits
/// for the window to roll only up to the budget's `max_wait_ms`; past that
/// it reports failure so the caller abandons the tier instead of stalling
/// the whole batch.
pub struct RateGovernor {
    budgets: HashMap<String, RateBudget>,
    windows: Mutex<HashMap<String, Window>>,
}

impl RateGovernor {
    pub fn new(budgets: HashMap<String, RateBudget>) -> Self {
        Self {
            budgets,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Consume one permit for `provider`. Providers without a configured
    /// budget are unmetered.
    pub async fn acquire(&self, provider: &str) -> bool {
        let Some(budget) = self.budgets.get(provider) else {
            return true;
        };
        let window_len = Duration::from_secs(budget.window_secs);
        let deadline = Instant::now() + Duration::from_millis(budget.max_wait_ms);

        loop {
            let wait = {
                let mut windows = self
                    .windows
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner());
                let now = Instant::now();
                let window = windows.entry(provider.to_string()).or_insert(Window {
                    started: now,
                    used: 0,
                });
                if now.duration_since(window.started) >= window_len {
                    window.started = now;
                    window.used = 0;
                }
                if window.used < budget.max_calls {
                    window.used += 1;
                    return true;
                }
                window_len.saturating_sub(now.duration_since(window.started))
            };

            if Instant::now() + wait > deadline {
                return false;
            }
            sleep(wait).await;
        }
    }
}
