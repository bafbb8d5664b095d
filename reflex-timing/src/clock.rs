use std::time::{Duration, Instant};

/// Monotonic time source for elapsed-duration measurement.
///
/// The engine is single-threaded and cooperative, so implementations need
/// no synchronization; `sleep` is only used to pace the polling loop when
/// a poll interval is configured.
pub trait Clock {
    type Timestamp: Copy;
    fn now(&self) -> Self::Timestamp;
    fn elapsed(&self, since: Self::Timestamp) -> Duration;
    fn sleep(&self, d: Duration);
}

/// Wall-clock monotonic timer. Timestamps are nanoseconds since the
/// clock was created.
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    epoch: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    type Timestamp = u64;

    fn now(&self) -> u64 {
        self.epoch.elapsed().as_nanos() as u64
    }

    fn elapsed(&self, since: u64) -> Duration {
        Duration::from_nanos(self.now().saturating_sub(since))
    }

    fn sleep(&self, d: Duration) {
        high_precision_sleep(d);
    }
}

/// Sleeps against the monotonic clock. On Linux `clock_nanosleep` avoids
/// the timer-slack rounding of `thread::sleep`.
pub fn high_precision_sleep(duration: Duration) {
    #[cfg(target_os = "linux")]
    {
        let req = libc::timespec {
            tv_sec: duration.as_secs() as libc::time_t,
            tv_nsec: duration.subsec_nanos() as libc::c_long,
        };
        unsafe {
            libc::clock_nanosleep(libc::CLOCK_MONOTONIC, 0, &req, std::ptr::null_mut());
        }
    }
    #[cfg(not(target_os = "linux"))]
    std::thread::sleep(duration);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_are_monotonic() {
        let clock = MonotonicClock::new();
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }

    #[test]
    fn elapsed_grows_with_sleep() {
        let clock = MonotonicClock::new();
        let start = clock.now();
        clock.sleep(Duration::from_millis(5));
        assert!(clock.elapsed(start) >= Duration::from_millis(5));
    }
}
