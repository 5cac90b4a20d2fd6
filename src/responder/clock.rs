//! # Time Sources (clock.rs)
//!
//! The responder never schedules timers. Window expiry is decided lazily by
//! comparing the current time against the start of the window, so the only
//! thing it needs from the outside world is "what time is it now?". This
//! module answers that question behind a small trait so tests can drive time
//! by hand.
//!
//! ```text
//!     Clock implementations:
//!
//!     SystemClock:
//!     ├─ Wall-clock epoch captured once at process start
//!     └─ Advanced with a monotonic Instant afterwards
//!
//!     ManualClock:
//!     ├─ Atomic millisecond counter
//!     └─ Moved forward (or backward) explicitly by the caller
//! ```

use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

// Monotonic time base so that wall-clock adjustments after startup do not
// move the responder's notion of "now".
static START_TIME_BASE: OnceLock<(Instant, u64)> = OnceLock::new();

/// Source of the current time in milliseconds since the Unix epoch.
///
/// Implementations must be cheap to call; `respond()` reads the clock on
/// every request while holding the responder lock.
pub trait Clock: Send + Sync + Debug {
    /// Returns the current time in milliseconds since the Unix epoch.
    fn now_ms(&self) -> u64;
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    #[inline]
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }
}

/// Production clock backed by the system time.
///
/// The wall-clock epoch is sampled once and then advanced with
/// [`Instant`], so the values it returns never go backwards within a process.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[inline(always)]
    fn now_ms(&self) -> u64 {
        current_time_ms()
    }
}

/// Clock whose time only changes when told to.
///
/// Clones share the same underlying counter, which makes it convenient to
/// hand one copy to a [`Responder`](crate::Responder) and keep another in the
/// test to move time around.
///
/// # Example
///
/// ```rust
/// use windowgate::{Clock, ManualClock};
///
/// let clock = ManualClock::new(1_000);
/// clock.advance_ms(500);
/// assert_eq!(clock.now_ms(), 1_500);
///
/// clock.set_ms(10);
/// assert_eq!(clock.now_ms(), 10);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now_ms: Arc<AtomicU64>,
}

impl ManualClock {
    /// Creates a clock frozen at `start_ms`.
    pub fn new(start_ms: u64) -> Self {
        Self {
            now_ms: Arc::new(AtomicU64::new(start_ms)),
        }
    }

    /// Sets the current time. Moving backwards is allowed.
    pub fn set_ms(&self, now_ms: u64) {
        self.now_ms.store(now_ms, Ordering::SeqCst);
    }

    /// Moves the clock forward by `delta_ms`, saturating at `u64::MAX`.
    pub fn advance_ms(&self, delta_ms: u64) {
        // The closure always returns Some, so the update cannot fail.
        let _ = self
            .now_ms
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |now| {
                Some(now.saturating_add(delta_ms))
            });
    }

    /// Moves the clock forward by a [`Duration`], saturating at `u64::MAX`.
    pub fn advance(&self, delta: Duration) {
        self.advance_ms(delta.as_millis().min(u64::MAX as u128) as u64);
    }
}

impl Clock for ManualClock {
    #[inline]
    fn now_ms(&self) -> u64 {
        self.now_ms.load(Ordering::SeqCst)
    }
}

/// Returns the current time in milliseconds since the Unix epoch.
///
/// Uses the process-wide monotonic base, so consecutive calls are
/// non-decreasing even if the system clock is adjusted.
#[inline(always)]
pub fn current_time_ms() -> u64 {
    let (start, base_ms) = START_TIME_BASE.get_or_init(|| {
        let epoch_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        (Instant::now(), epoch_ms)
    });
    base_ms.saturating_add(start.elapsed().as_millis() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_system_clock_is_monotonic() {
        let clock = SystemClock;
        let mut last = clock.now_ms();
        for _ in 0..1000 {
            let now = clock.now_ms();
            assert!(now >= last);
            last = now;
        }
    }

    #[test]
    fn test_system_clock_is_near_wall_clock() {
        let wall = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_millis() as u64;
        let now = current_time_ms();
        assert!(now.abs_diff(wall) < 5_000);
    }

    #[test]
    fn test_system_clock_advances() {
        let before = current_time_ms();
        thread::sleep(Duration::from_millis(15));
        assert!(current_time_ms() >= before + 10);
    }

    #[test]
    fn test_manual_clock_moves_only_when_told() {
        let clock = ManualClock::new(42);
        assert_eq!(clock.now_ms(), 42);
        assert_eq!(clock.now_ms(), 42);

        clock.advance_ms(8);
        assert_eq!(clock.now_ms(), 50);

        clock.advance(Duration::from_secs(1));
        assert_eq!(clock.now_ms(), 1_050);

        clock.set_ms(3);
        assert_eq!(clock.now_ms(), 3);
    }

    #[test]
    fn test_manual_clock_saturates() {
        let clock = ManualClock::new(u64::MAX - 10);
        clock.advance_ms(100);
        assert_eq!(clock.now_ms(), u64::MAX);

        let clock = ManualClock::new(5);
        clock.advance(Duration::MAX);
        assert_eq!(clock.now_ms(), u64::MAX);
    }

    #[test]
    fn test_manual_clock_clones_share_time() {
        let clock = ManualClock::new(0);
        let handle = clock.clone();
        handle.advance_ms(250);
        assert_eq!(clock.now_ms(), 250);
    }

    #[test]
    fn test_arc_clock_delegates() {
        let clock: Arc<dyn Clock> = Arc::new(ManualClock::new(77));
        assert_eq!(clock.now_ms(), 77);
    }
}
