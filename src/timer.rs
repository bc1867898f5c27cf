//! Monotonic clock used by the benchmark harness.
//!
//! The process-wide [`Calibration`] is computed on first use and never
//! changes afterwards. It fixes the epoch all timestamps are measured from
//! and records the cost of a single clock read.

use std::hint::black_box;
use std::sync::OnceLock;
use std::time::Instant;

/// Clock reads averaged when measuring read overhead.
const CALIBRATION_SAMPLES: u32 = 1000;

/// Source of nanosecond timestamps.
pub trait Clock {
    /// Nanoseconds since an arbitrary, fixed origin. Never decreases.
    fn now_ns(&self) -> f64;
}

/// Write-once timing parameters shared by every [`MonotonicClock`].
#[derive(Debug)]
pub struct Calibration {
    epoch: Instant,
    read_overhead_ns: f64,
}

impl Calibration {
    fn measure() -> Self {
        let epoch = Instant::now();
        let start = Instant::now();
        for _ in 0..CALIBRATION_SAMPLES {
            black_box(Instant::now());
        }
        let read_overhead_ns = start.elapsed().as_nanos() as f64 / f64::from(CALIBRATION_SAMPLES);
        Self {
            epoch,
            read_overhead_ns,
        }
    }

    /// Average cost of one clock read, in nanoseconds.
    pub fn read_overhead_ns(&self) -> f64 {
        self.read_overhead_ns
    }
}

/// The process-wide calibration, measured on first call.
pub fn calibration() -> &'static Calibration {
    static CALIBRATION: OnceLock<Calibration> = OnceLock::new();
    CALIBRATION.get_or_init(Calibration::measure)
}

/// [`Clock`] backed by [`Instant`].
#[derive(Clone, Copy, Debug, Default)]
pub struct MonotonicClock;

impl Clock for MonotonicClock {
    #[inline]
    fn now_ns(&self) -> f64 {
        calibration().epoch.elapsed().as_nanos() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calibration_is_initialized_once() {
        let a = calibration() as *const Calibration;
        let b = calibration() as *const Calibration;
        assert_eq!(a, b);
        assert!(calibration().read_overhead_ns() >= 0.0);
    }

    #[test]
    fn monotonic_clock_never_goes_backwards() {
        let clock = MonotonicClock;
        let mut last = clock.now_ns();
        for _ in 0..1000 {
            let now = clock.now_ns();
            assert!(now >= last);
            last = now;
        }
    }
}
