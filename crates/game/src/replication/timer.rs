use std::time::Duration;

/// Accumulates simulation time and fires once per elapsed period.
///
/// Used for the flush cadence and for hello retries. Firing resets the
/// accumulator to zero rather than carrying the remainder.
#[derive(Debug, Clone)]
pub struct IntervalTimer {
    period: Duration,
    elapsed: Duration,
}

impl IntervalTimer {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            elapsed: Duration::ZERO,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Add `delta`; returns true on the tick the period is reached.
    pub fn advance(&mut self, delta: Duration) -> bool {
        self.elapsed = self.elapsed.saturating_add(delta);
        if self.elapsed >= self.period {
            self.elapsed = Duration::ZERO;
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        self.elapsed = Duration::ZERO;
    }
}
