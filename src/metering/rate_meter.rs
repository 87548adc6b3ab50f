//! Exponential moving average (EMA) rate meter.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Smoothing factor for an EMA spanning `window` when sampled every `interval`.
///
/// Uses the span conversion `alpha = 2 / (N + 1)` with `N = window / interval`,
/// floored and clamped to at least one sample so alpha stays in `(0, 1]`.
pub fn alpha_for_window(window: Duration, interval: Duration) -> f64 {
    let interval_secs = interval.as_secs_f64();
    let samples = if interval_secs > 0.0 {
        (window.as_secs_f64() / interval_secs).floor().max(1.0)
    } else {
        1.0
    };
    2.0 / (samples + 1.0)
}

/// Throughput estimator for a single entity.
///
/// `update` and `rate` are lock-free. `tick` is called once per interval by
/// the owning registry; only the very first tick may take a lock.
#[derive(Debug)]
pub struct RateMeter {
    /// Events recorded since the last tick.
    uncounted: AtomicU64,
    /// Smoothing factor.
    alpha: f64,
    /// Published rate in events/sec, stored as `f64` bits.
    rate: AtomicU64,
    /// Set once the first tick has seeded `rate`.
    initialized: AtomicBool,
    /// Serializes the one-time seed.
    init_lock: Mutex<()>,
    interval: Duration,
}

impl RateMeter {
    pub fn new(alpha: f64, interval: Duration) -> Self {
        Self {
            uncounted: AtomicU64::new(0),
            alpha,
            rate: AtomicU64::new(0f64.to_bits()),
            initialized: AtomicBool::new(false),
            init_lock: Mutex::new(()),
            interval,
        }
    }

    /// Build a meter whose alpha spans `window` at the given tick interval.
    pub fn with_window(window: Duration, interval: Duration) -> Self {
        Self::new(alpha_for_window(window, interval), interval)
    }

    /// Record `n` events.
    pub fn update(&self, n: u64) {
        self.uncounted.fetch_add(n, Ordering::Relaxed);
    }

    /// Fold the events since the last tick into the published rate.
    pub fn tick(&self) {
        if self.initialized.load(Ordering::Acquire) {
            self.update_rate(self.fetch_instant_rate());
            return;
        }

        let _guard = self.init_lock.lock().expect("rate meter init mutex poisoned");
        if self.initialized.load(Ordering::Acquire) {
            self.update_rate(self.fetch_instant_rate());
        } else {
            self.rate.store(self.fetch_instant_rate().to_bits(), Ordering::Release);
            self.initialized.store(true, Ordering::Release);
        }
    }

    /// Last published rate in events per second.
    pub fn rate(&self) -> f64 {
        f64::from_bits(self.rate.load(Ordering::Acquire))
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Swap the accumulator to zero and return this interval's events/sec.
    fn fetch_instant_rate(&self) -> f64 {
        let count = self.uncounted.swap(0, Ordering::AcqRel);
        let secs = self.interval.as_secs_f64();
        if secs > 0.0 {
            count as f64 / secs
        } else {
            0.0
        }
    }

    fn update_rate(&self, instant: f64) {
        // Ticks come from a single driver; the CAS keeps a stray concurrent
        // tick from losing an update.
        let mut current_bits = self.rate.load(Ordering::Acquire);
        loop {
            let current = f64::from_bits(current_bits);
            let next = current + self.alpha * (instant - current);
            match self.rate.compare_exchange_weak(
                current_bits,
                next.to_bits(),
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => break,
                Err(actual) => current_bits = actual,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    const INTERVAL: Duration = Duration::from_secs(5);

    #[test]
    fn test_alpha_for_window() {
        // One minute window at 5s ticks: N = 12, alpha = 2/13.
        let alpha = alpha_for_window(Duration::from_secs(60), INTERVAL);
        assert!((alpha - 2.0 / 13.0).abs() < 1e-12);

        // Window shorter than the interval degrades to alpha = 1.
        assert_eq!(alpha_for_window(Duration::from_secs(1), INTERVAL), 1.0);
        assert_eq!(alpha_for_window(Duration::from_secs(60), Duration::ZERO), 1.0);
    }

    #[test]
    fn test_first_tick_seeds_rate() {
        let meter = RateMeter::with_window(Duration::from_secs(60), INTERVAL);
        assert_eq!(meter.rate(), 0.0);

        meter.update(50);
        meter.tick();
        assert_eq!(meter.rate(), 10.0);
    }

    #[test]
    fn test_rate_is_events_per_second() {
        // A nanosecond-scaled divisor would report 100 / 5e9 here.
        let meter = RateMeter::new(0.5, INTERVAL);
        meter.update(100);
        meter.tick();
        assert_eq!(meter.rate(), 20.0);
        assert!(meter.rate() > 1e-3);
    }

    #[test]
    fn test_ema_update_step() {
        let meter = RateMeter::new(0.5, Duration::from_secs(1));
        meter.update(10);
        meter.tick(); // seed: 10
        meter.update(20);
        meter.tick(); // 10 + 0.5 * (20 - 10)
        assert_eq!(meter.rate(), 15.0);
    }

    #[test]
    fn test_constant_rate_converges() {
        let meter = RateMeter::with_window(Duration::from_secs(60), INTERVAL);
        // Seed low, then sustain 40 events/sec.
        meter.update(0);
        meter.tick();
        for _ in 0..200 {
            meter.update(200);
            meter.tick();
        }
        assert!((meter.rate() - 40.0).abs() < 1e-6, "rate = {}", meter.rate());
    }

    #[test]
    fn test_burst_decays_geometrically() {
        let meter = RateMeter::new(0.25, Duration::from_secs(1));
        meter.update(1000);
        meter.tick();
        let seed = meter.rate();
        assert_eq!(seed, 1000.0);

        let mut previous = seed;
        for _ in 0..50 {
            meter.tick();
            let rate = meter.rate();
            assert!(rate >= 0.0);
            assert!(rate <= seed);
            assert!((rate - previous * 0.75).abs() < 1e-9);
            previous = rate;
        }
        assert!(previous < 1.0);
    }

    #[test]
    fn test_concurrent_updates_are_not_lost() {
        let meter = Arc::new(RateMeter::new(1.0, Duration::from_secs(1)));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let meter = meter.clone();
                std::thread::spawn(move || {
                    for _ in 0..1_000 {
                        meter.update(1);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        meter.tick();
        assert_eq!(meter.rate(), 8_000.0);
    }

    #[test]
    fn test_concurrent_first_ticks_seed_once() {
        let meter = Arc::new(RateMeter::new(0.5, Duration::from_secs(1)));
        meter.update(100);

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let meter = meter.clone();
                std::thread::spawn(move || meter.tick())
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        // Exactly one tick saw the 100 events and the others saw zero.
        // Whichever order they ran in, the seed happened once and later
        // ticks only decayed it.
        let rate = meter.rate();
        assert!(rate > 0.0 && rate <= 100.0, "rate = {}", rate);
    }
}
