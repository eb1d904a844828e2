//! Monotonic millisecond clock, standing in for the teacher's
//! `rt_tick_get_millisecond`/`clock::tick_from_millisecond` pair.
//!
//! The teacher's kernel counts hardware ticks and converts to milliseconds
//! per board's tick frequency; on a hosted OS there is no tick to count, so
//! this wraps `std::time::Instant` directly and reports milliseconds since
//! an arbitrary epoch fixed at `Clock::new()`. Only elapsed time is
//! meaningful, matching `spec.md`'s use of "monotonic clock" throughout
//! (never wall-clock time).

use std::time::Instant;

#[derive(Debug, Clone)]
pub struct Clock {
    epoch: Instant,
}

impl Clock {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }

    /// Milliseconds elapsed since this clock was created. Equivalent to
    /// `rt_tick_get_millisecond`.
    pub fn now_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn now_ms_is_monotonic_nondecreasing() {
        let clock = Clock::new();
        let a = clock.now_ms();
        std::thread::sleep(std::time::Duration::from_millis(5));
        let b = clock.now_ms();
        assert!(b >= a);
    }
}
