//! Delay and sound timers, and the rate bookkeeping that drives them.

use std::time::Duration;

/// Rate the delay and sound timers count down at.
pub const TIMER_RATE: Hz = Hz(60);

const NANOS_PER_SECOND: u128 = 1_000_000_000;

/// A frequency, in events per second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hz(pub u32);

/// An 8-bit counter that ticks down to zero and stays there.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Timer {
    value: u8,
}

impl Timer {
    pub fn value(&self) -> u8 {
        self.value
    }

    pub fn set(&mut self, value: u8) {
        self.value = value;
    }

    pub fn tick(&mut self) {
        self.value = self.value.saturating_sub(1);
    }

    pub fn is_active(&self) -> bool {
        self.value > 0
    }
}

/// Converts elapsed wall-clock time into a whole number of events at a fixed rate.
///
/// The total elapsed time is kept, not just the remainder, so events never
/// drift: after exactly one second at 60 Hz, exactly 60 events have fired.
#[derive(Debug, Clone)]
pub struct Pacer {
    rate: Hz,
    elapsed_nanos: u128,
    fired: u128,
}

impl Pacer {
    pub fn new(rate: Hz) -> Pacer {
        Pacer {
            rate,
            elapsed_nanos: 0,
            fired: 0,
        }
    }

    /// Add elapsed time.
    pub fn advance(&mut self, elapsed: Duration) {
        self.elapsed_nanos += elapsed.as_nanos();
    }

    /// Number of events due that have not fired yet.
    pub fn pending(&self) -> u128 {
        self.due() - self.fired
    }

    /// Time, from the start, at which event `n` (1-based) falls due.
    pub fn deadline(&self, n: u128) -> u128 {
        if self.rate.0 == 0 {
            return u128::MAX;
        }
        // Ceiling division, so the event is due at or after its exact time.
        (n * NANOS_PER_SECOND + self.rate.0 as u128 - 1) / self.rate.0 as u128
    }

    /// Time, from the start, at which the next unfired event falls due.
    pub fn next_deadline(&self) -> u128 {
        self.deadline(self.fired + 1)
    }

    /// Mark one pending event as fired.
    pub fn fire(&mut self) {
        debug_assert!(self.pending() > 0);
        self.fired += 1;
    }

    /// Forget all elapsed time and fired events.
    pub fn reset(&mut self) {
        self.elapsed_nanos = 0;
        self.fired = 0;
    }

    /// Time until the next event is due, zero if one is already pending.
    pub fn until_next(&self) -> Duration {
        let remaining = self.next_deadline().saturating_sub(self.elapsed_nanos);
        Duration::from_nanos(remaining.min(u64::MAX as u128) as u64)
    }

    fn due(&self) -> u128 {
        self.elapsed_nanos * self.rate.0 as u128 / NANOS_PER_SECOND
    }
}

impl From<Hz> for Duration {
    fn from(freq: Hz) -> Self {
        if freq.0 == 0 {
            Duration::from_nanos(0)
        } else {
            Duration::from_nanos(NANOS_PER_SECOND as u64 / freq.0 as u64)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timer_counts_down_and_stops_at_zero() {
        let mut timer = Timer::default();
        assert!(!timer.is_active());

        timer.set(2);
        timer.tick();
        assert_eq!(timer.value(), 1);
        assert!(timer.is_active());

        timer.tick();
        timer.tick();
        assert_eq!(timer.value(), 0);
        assert!(!timer.is_active());
    }

    #[test]
    fn one_second_at_60hz_fires_60_times() {
        let mut pacer = Pacer::new(TIMER_RATE);
        pacer.advance(Duration::from_secs(1));
        assert_eq!(pacer.pending(), 60);
    }

    #[test]
    fn small_steps_do_not_drift() {
        let mut pacer = Pacer::new(TIMER_RATE);
        for _ in 0..1000 {
            pacer.advance(Duration::from_millis(1));
            while pacer.pending() > 0 {
                pacer.fire();
            }
        }
        assert_eq!(pacer.fired, 60);
    }

    #[test]
    fn deadlines_are_rounded_up() {
        let pacer = Pacer::new(Hz(60));
        assert_eq!(pacer.deadline(1), 16_666_667);
        assert_eq!(pacer.deadline(60), 1_000_000_000);
    }

    #[test]
    fn until_next_counts_down() {
        let mut pacer = Pacer::new(Hz(500));
        assert_eq!(pacer.until_next(), Duration::from_millis(2));
        pacer.advance(Duration::from_millis(1));
        assert_eq!(pacer.until_next(), Duration::from_millis(1));
        pacer.advance(Duration::from_millis(1));
        assert_eq!(pacer.until_next(), Duration::from_nanos(0));
    }

    #[test]
    fn zero_rate_never_fires() {
        let mut pacer = Pacer::new(Hz(0));
        pacer.advance(Duration::from_secs(10));
        assert_eq!(pacer.pending(), 0);
    }

    #[test]
    fn hz_to_period() {
        let interval: Duration = Hz(60).into();
        assert_eq!(interval.as_millis(), 16);
    }
}
