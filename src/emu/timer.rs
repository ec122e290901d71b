use std::time::{Duration, Instant};

/// Rate at which the delay and sound timers count down.
pub const TIMER_HZ: u64 = 60;

const NANOS_IN_SECOND: u64 = 1_000_000_000;

/// Wall-clock time between two decrements of a running timer.
pub const TIMER_INTERVAL: Duration = Duration::from_nanos(NANOS_IN_SECOND / TIMER_HZ);

/// An 8-bit down-counter decremented at [`TIMER_HZ`] of wall-clock time.
///
/// The timer is idle at zero and running otherwise. Decrements are driven
/// by the timestamps passed to [`update`](Self::update), not by how often
/// it is called.
#[derive(Debug, Clone, Copy)]
pub struct Timer {
    value: u8,
    /// Point in time the current interval is measured from.
    reference: Instant,
}

impl Timer {
    pub fn new(now: Instant) -> Self {
        Self {
            value: 0,
            reference: now,
        }
    }

    pub fn value(&self) -> u8 {
        self.value
    }

    pub fn is_running(&self) -> bool {
        self.value > 0
    }

    /// Loads a new value. The next decrement is a full interval after `now`.
    pub fn set(&mut self, value: u8, now: Instant) {
        self.value = value;
        self.reference = now;
    }

    /// Counts down once for every whole interval elapsed since the last decrement.
    pub fn update(&mut self, now: Instant) {
        if !self.is_running() {
            return;
        }

        let elapsed = now.saturating_duration_since(self.reference);
        let intervals = elapsed.as_nanos() / TIMER_INTERVAL.as_nanos();
        if intervals == 0 {
            return;
        }

        if intervals >= u128::from(self.value) {
            self.value = 0;
            self.reference = now;
            return;
        }

        // intervals < value <= 255 here
        self.value -= intervals as u8;
        // Advance by whole intervals so the remainder carries into the next one.
        self.reference += TIMER_INTERVAL * intervals as u32;
    }

    /// Moves the reference point forward, as if the time in `paused` never happened.
    pub fn shift(&mut self, paused: Duration) {
        self.reference += paused;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_interval() {
        assert_eq!(TIMER_INTERVAL.as_millis(), 16);
        assert_eq!(TIMER_INTERVAL.as_nanos(), 16_666_666);
    }

    #[test]
    fn test_decrements_once_per_boundary() {
        let t0 = Instant::now();
        let mut timer = Timer::new(t0);
        timer.set(5, t0);

        for t in [1, 5, 10, 16] {
            timer.update(t0 + ms(t));
            assert_eq!(timer.value(), 5, "at {t}ms");
        }

        timer.update(t0 + ms(17));
        assert_eq!(timer.value(), 4);

        // Still inside the second interval (ends at 33.3ms).
        timer.update(t0 + ms(25));
        timer.update(t0 + ms(33));
        assert_eq!(timer.value(), 4);

        timer.update(t0 + ms(34));
        assert_eq!(timer.value(), 3);
    }

    #[test]
    fn test_late_update_catches_up() {
        let t0 = Instant::now();
        let mut timer = Timer::new(t0);
        timer.set(10, t0);

        // Three whole intervals in one go.
        timer.update(t0 + ms(51));
        assert_eq!(timer.value(), 7);

        // The partial interval is kept: the fourth boundary is at 66.7ms.
        timer.update(t0 + ms(66));
        assert_eq!(timer.value(), 7);
        timer.update(t0 + ms(67));
        assert_eq!(timer.value(), 6);
    }

    #[test]
    fn test_never_below_zero() {
        let t0 = Instant::now();
        let mut timer = Timer::new(t0);
        timer.set(2, t0);

        timer.update(t0 + Duration::from_secs(60));
        assert_eq!(timer.value(), 0);
        assert!(!timer.is_running());

        timer.update(t0 + Duration::from_secs(61));
        assert_eq!(timer.value(), 0);
    }

    #[test]
    fn test_idle_timer_does_not_accumulate() {
        let t0 = Instant::now();
        let mut timer = Timer::new(t0);

        timer.update(t0 + Duration::from_secs(1));
        timer.set(3, t0 + Duration::from_secs(1));

        timer.update(t0 + Duration::from_secs(1) + ms(10));
        assert_eq!(timer.value(), 3);
    }

    #[test]
    fn test_shift_pauses_countdown() {
        let t0 = Instant::now();
        let mut timer = Timer::new(t0);
        timer.set(3, t0);

        timer.update(t0 + ms(10));
        timer.shift(ms(1000));

        timer.update(t0 + ms(1010));
        assert_eq!(timer.value(), 3);
        timer.update(t0 + ms(1017));
        assert_eq!(timer.value(), 2);
    }
}
