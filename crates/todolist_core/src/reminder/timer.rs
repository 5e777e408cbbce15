use std::time::Duration;
use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;

const MIN_PERIOD: Duration = Duration::from_millis(1);
// Roughly thirty years; far enough that the tick never arrives.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Recurring reminder tick that can be cancelled from anywhere.
///
/// The first tick fires one full period after `start`. Ticks missed while
/// the owner was busy are skipped rather than replayed. Dropping the timer
/// cancels it, so a torn-down owner never sees another tick.
pub struct ReminderTimer {
    interval: Interval,
    cancel: CancellationToken,
}

impl ReminderTimer {
    /// Must be called from within a tokio runtime.
    pub fn start(period: Duration) -> Self {
        let period = period.max(MIN_PERIOD);
        let now = Instant::now();
        let first = now
            .checked_add(period)
            .or_else(|| now.checked_add(FAR_FUTURE))
            .unwrap_or(now);
        let mut interval = interval_at(first, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Self {
            interval,
            cancel: CancellationToken::new(),
        }
    }

    pub fn period(&self) -> Duration {
        self.interval.period()
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Waits for the next tick. `None` once the timer is cancelled.
    pub async fn tick(&mut self) -> Option<Instant> {
        if self.cancel.is_cancelled() {
            return None;
        }

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            at = self.interval.tick() => Some(at),
        }
    }
}

impl Drop for ReminderTimer {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
