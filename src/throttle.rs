//! Rate limiting for walk-mode work.
//!
//! One abstraction, used for independent policies: the arrival cooldown,
//! the redraw throttle, and the off-route notice. Each keeps its own
//! last-fired time, so tuning one never affects the others.

use jiff::{SignedDuration, Timestamp};

/// Minimum redraw interval with power saving off.
pub const REFRESH_INTERVAL: SignedDuration = SignedDuration::from_millis(2_000);

/// Minimum redraw interval with power saving on.
pub const POWER_SAVING_REFRESH_INTERVAL: SignedDuration = SignedDuration::from_millis(8_000);

/// Gates an action to at most once per interval.
///
/// Ready when nothing has fired yet, or when strictly more than `interval`
/// has passed since the last firing. Time running backwards (out-of-order
/// input) is never ready.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    interval: SignedDuration,
    last: Option<Timestamp>,
}

impl RateLimiter {
    pub fn new(interval: SignedDuration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    /// Changes the interval, keeping the last-fired time.
    pub fn set_interval(&mut self, interval: SignedDuration) {
        self.interval = interval;
    }

    #[cfg(test)]
    pub fn last(&self) -> Option<Timestamp> {
        self.last
    }

    pub fn is_ready(&self, now: Timestamp) -> bool {
        match self.last {
            None => true,
            Some(last) => now.duration_since(last) > self.interval,
        }
    }

    /// Records a firing at `now`.
    pub fn mark(&mut self, now: Timestamp) {
        self.last = Some(now);
    }

    /// Checks and marks in one step. Returns whether the action may run.
    pub fn try_acquire(&mut self, now: Timestamp) -> bool {
        if self.is_ready(now) {
            self.mark(now);
            true
        } else {
            false
        }
    }
}

/// Rate limits expensive redraws independently of fix arrival.
#[derive(Debug, Clone)]
pub struct RefreshThrottle {
    limiter: RateLimiter,
}

impl RefreshThrottle {
    pub fn new(power_saving: bool) -> Self {
        Self {
            limiter: RateLimiter::new(Self::interval_for(power_saving)),
        }
    }

    pub fn interval_for(power_saving: bool) -> SignedDuration {
        if power_saving {
            POWER_SAVING_REFRESH_INTERVAL
        } else {
            REFRESH_INTERVAL
        }
    }

    pub fn set_power_saving(&mut self, power_saving: bool) {
        self.limiter.set_interval(Self::interval_for(power_saving));
    }

    /// Whether a fix at `now` may trigger a redraw. An allowed fix is recorded.
    pub fn allow(&mut self, now: Timestamp) -> bool {
        self.limiter.try_acquire(now)
    }
}
