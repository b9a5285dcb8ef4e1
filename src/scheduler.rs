//! Frame pacing for the animation loop.

use std::time::{Duration, Instant};

/// Paces animation frames
pub trait Scheduler {
    /// Time left before the next frame is due
    fn until_next_frame(&self) -> Duration;
    /// Blocks until the next frame is due and books the one after it
    fn wait_next_frame(&mut self);
}

/// Fires at a fixed target rate
#[derive(Debug, Clone)]
pub struct FixedRateScheduler {
    period: Duration,
    next_deadline: Instant,
}

impl FixedRateScheduler {
    pub fn new(frame_rate: f64) -> Self {
        let period = Duration::from_secs_f64(1.0 / frame_rate.max(1e-3));
        FixedRateScheduler {
            period,
            next_deadline: Instant::now() + period,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn remaining_at(&self, now: Instant) -> Duration {
        self.next_deadline.saturating_duration_since(now)
    }

    /// Books the next deadline. A frame that overran skips ahead instead of
    /// queueing a burst of catch-up frames.
    pub fn advance_at(&mut self, now: Instant) {
        self.next_deadline += self.period;
        if self.next_deadline < now {
            self.next_deadline = now + self.period;
        }
    }
}

impl Scheduler for FixedRateScheduler {
    fn until_next_frame(&self) -> Duration {
        self.remaining_at(Instant::now())
    }

    fn wait_next_frame(&mut self) {
        let remaining = self.until_next_frame();
        if !remaining.is_zero() {
            std::thread::sleep(remaining);
        }
        self.advance_at(Instant::now());
    }
}

/// Never waits; for headless runs
#[derive(Debug, Clone, Copy, Default)]
pub struct Unthrottled;

impl Scheduler for Unthrottled {
    fn until_next_frame(&self) -> Duration {
        Duration::ZERO
    }

    fn wait_next_frame(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn period_follows_frame_rate() {
        let scheduler = FixedRateScheduler::new(50.0);
        assert_eq!(scheduler.period(), Duration::from_millis(20));
    }

    #[test]
    fn advance_steps_by_period() {
        let mut scheduler = FixedRateScheduler::new(50.0);
        let start = scheduler.next_deadline;
        scheduler.advance_at(start);
        assert_eq!(scheduler.remaining_at(start), Duration::from_millis(20));
    }

    #[test]
    fn overrun_skips_ahead() {
        let mut scheduler = FixedRateScheduler::new(50.0);
        let late = scheduler.next_deadline + Duration::from_secs(1);
        assert_eq!(scheduler.remaining_at(late), Duration::ZERO);
        scheduler.advance_at(late);
        assert_eq!(scheduler.remaining_at(late), Duration::from_millis(20));
    }

    #[test]
    fn unthrottled_never_waits() {
        let mut scheduler = Unthrottled;
        scheduler.wait_next_frame();
        assert_eq!(scheduler.until_next_frame(), Duration::ZERO);
    }
}
