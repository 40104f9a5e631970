use rand::Rng;
use std::thread;
use std::time::Duration;

const BASE_DELAY: Duration = Duration::from_millis(1);
const GROWTH_FACTOR: u32 = 2;
const MAX_DELAY: Duration = Duration::from_millis(50);

/// Multiplicative backoff for transaction retries.
///
/// Each pause draws a jittered delay from the current step, then the step
/// grows by a constant factor up to a cap. The jitter keeps transactions
/// that aborted each other from retrying in lockstep and colliding again.
#[derive(Clone, Debug)]
pub struct Backoff {
    /// The undithered delay of the next pause.
    next: Duration,
    base: Duration,
    cap: Duration,
    factor: u32,
}

impl Backoff {
    /// A backoff starting at `base` and growing by `factor` per pause,
    /// never exceeding `cap`.
    pub fn new(base: Duration, factor: u32, cap: Duration) -> Backoff {
        Backoff {
            next: base.min(cap),
            base,
            cap,
            factor,
        }
    }

    /// Sleep for the next delay.
    pub fn pause(&mut self) {
        thread::sleep(self.advance());
    }

    /// Take the next delay without sleeping and grow the step.
    pub fn advance(&mut self) -> Duration {
        let delay = Backoff::jittered(self.next);
        self.next = (self.next * self.factor).min(self.cap);
        delay
    }

    /// The undithered delay the next pause will draw from.
    pub fn current(&self) -> Duration {
        self.next
    }

    /// Drop back to the base delay.
    pub fn reset(&mut self) {
        self.next = self.base.min(self.cap);
    }

    /// Pick a delay uniformly from the upper half of `[0, delay]`.
    fn jittered(delay: Duration) -> Duration {
        let micros = delay.as_micros() as u64;
        if micros == 0 {
            return delay;
        }

        Duration::from_micros(rand::thread_rng().gen_range(micros / 2..=micros))
    }
}

/// One millisecond base delay, doubling per pause, capped at 50
/// milliseconds.
impl Default for Backoff {
    fn default() -> Self {
        Backoff::new(BASE_DELAY, GROWTH_FACTOR, MAX_DELAY)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn delays_grow_to_the_cap() {
        let mut backoff = Backoff::new(Duration::from_millis(1), 2, Duration::from_millis(50));

        let mut raw = Vec::new();
        for _ in 0..10 {
            raw.push(backoff.current());
            backoff.advance();
        }

        assert_eq!(raw[0], Duration::from_millis(1));
        assert_eq!(raw[1], Duration::from_millis(2));
        assert_eq!(raw[5], Duration::from_millis(32));
        // 64 ms caps at 50.
        assert_eq!(raw[6], Duration::from_millis(50));
        assert_eq!(raw[9], Duration::from_millis(50));
    }

    #[test]
    fn jitter_stays_within_half_of_the_delay() {
        for _ in 0..1000 {
            let jittered = Backoff::jittered(Duration::from_millis(10));

            assert!(jittered >= Duration::from_millis(5));
            assert!(jittered <= Duration::from_millis(10));
        }
    }

    #[test]
    fn advance_reports_a_jittered_delay() {
        let mut backoff = Backoff::default();

        let delay = backoff.advance();

        assert!(delay >= Duration::from_micros(500));
        assert!(delay <= Duration::from_millis(1));
    }

    #[test]
    fn zero_base_never_panics() {
        let mut backoff = Backoff::new(Duration::ZERO, 2, Duration::ZERO);

        assert_eq!(backoff.advance(), Duration::ZERO);
        assert_eq!(backoff.advance(), Duration::ZERO);
    }

    #[test]
    fn reset_returns_to_the_base_delay() {
        let mut backoff = Backoff::default();

        backoff.advance();
        backoff.advance();
        assert!(backoff.current() > Duration::from_millis(1));

        backoff.reset();
        assert_eq!(backoff.current(), Duration::from_millis(1));
    }
}
