//! # Core Responder Implementation
//!
//! This module implements the windowed single-success responder: within each
//! window the first caller gets `true` and everybody else gets `false` until
//! the window runs out.
//!
//! ## Lazy Window Expiry
//!
//! ```text
//!     t=0      t=5      t=10                         t=31000
//!      │        │        │                              │
//!      ✅       ❌       ❌      (no calls, no timer)      ✅  ← new window
//!      └───────── window 1 (30000ms) ─────────┘          └── window 2
//! ```
//!
//! There is no background timer. The request that discovers an expired window
//! resets the counters first and is then counted as the first request of the
//! new window, which is why it succeeds.
//!
//! ## Atomicity
//!
//! The expiry check, the reset, the success decision and the counter updates
//! all happen under one lock, so two callers racing across a window boundary
//! can never both see an unclaimed window.

use super::{
    clock::{Clock, SystemClock},
    config::ResponderConfig,
    stats::{Response, WindowStats},
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Mutable window state guarded by the responder lock.
#[derive(Debug, Clone, Copy)]
struct WindowState {
    total_requests: u64,
    true_responses: u64,
    false_responses: u64,
    window_start_ms: u64,
    skew_reported: bool,
}

impl WindowState {
    fn new(now_ms: u64) -> Self {
        Self {
            total_requests: 0,
            true_responses: 0,
            false_responses: 0,
            window_start_ms: now_ms,
            skew_reported: false,
        }
    }

    fn reset(&mut self, now_ms: u64) {
        *self = Self::new(now_ms);
    }

    fn snapshot(&self) -> WindowStats {
        WindowStats {
            total_requests: self.total_requests,
            true_responses: self.true_responses,
            false_responses: self.false_responses,
            window_start_ms: self.window_start_ms,
        }
    }
}

/// Grants exactly one `true` per time window.
///
/// The responder owns its state outright; there is no global instance.
/// Construct one per process (or per logical shard, see
/// [`ResponderManager`](crate::ResponderManager)) and share it with `Arc`.
///
/// ## Example
///
/// ```rust
/// use windowgate::{ManualClock, Responder, ResponderConfig};
///
/// let clock = ManualClock::new(0);
/// let responder = Responder::with_clock(ResponderConfig::new(30_000), clock.clone());
///
/// assert!(responder.respond().success);
/// clock.set_ms(5);
/// assert!(!responder.respond().success);
///
/// clock.set_ms(31_000);
/// let response = responder.respond();
/// assert!(response.success);
/// assert_eq!(response.stats.total_requests, 1);
/// ```
///
/// ## Thread Safety
///
/// `Responder` is `Send + Sync`. All operations take a short
/// `parking_lot::Mutex` critical section and never block on I/O.
pub struct Responder {
    state: Mutex<WindowState>,
    window_ms: u64,
    clock: Arc<dyn Clock>,

    /// Last time `respond()` or `reset_manually()` ran, for idle detection.
    last_access_ms: AtomicU64,
}

impl Responder {
    /// Creates a responder with the default 30 second window and the system clock.
    pub fn new() -> Self {
        Self::with_config(ResponderConfig::default())
    }

    /// Creates a responder using the system clock.
    ///
    /// # Panics
    ///
    /// Panics if the configuration is invalid (see [`ResponderConfig::validate`]).
    pub fn with_config(config: ResponderConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }

    /// Creates a responder reading time from `clock`.
    ///
    /// # Panics
    ///
    /// Panics if the configuration is invalid (see [`ResponderConfig::validate`]).
    pub fn with_clock(config: ResponderConfig, clock: impl Clock + 'static) -> Self {
        Self::with_shared_clock(config, Arc::new(clock))
    }

    pub(crate) fn with_shared_clock(config: ResponderConfig, clock: Arc<dyn Clock>) -> Self {
        config
            .validate()
            .expect("Invalid responder configuration");

        let now_ms = clock.now_ms();
        Self {
            state: Mutex::new(WindowState::new(now_ms)),
            window_ms: config.window_ms,
            clock,
            last_access_ms: AtomicU64::new(now_ms),
        }
    }

    /// Answers one request.
    ///
    /// Returns `success = true` if this is the first call of the current
    /// window, `false` otherwise, together with a snapshot of the counters
    /// after this call was counted.
    ///
    /// ```text
    ///     respond() flow:
    ///
    ///     now - windowStart >= window? ──Yes──► reset counters, windowStart = now
    ///              │                                      │
    ///              No ◄───────────────────────────────────┘
    ///              ▼
    ///     total += 1
    ///     trueResponses == 0? ──Yes──► trueResponses += 1 ──► ✅
    ///              │
    ///              No ──► falseResponses += 1 ──► ❌
    /// ```
    pub fn respond(&self) -> Response {
        let mut state = self.state.lock();
        let now_ms = self.clock.now_ms();
        self.last_access_ms.store(now_ms, Ordering::Relaxed);

        if now_ms < state.window_start_ms {
            // Backward clock jump: treat as "not yet expired". Warn once per window.
            if !state.skew_reported {
                warn!(
                    "Clock moved backwards by {}ms; keeping current window",
                    state.window_start_ms - now_ms
                );
                state.skew_reported = true;
            }
        }

        let elapsed = now_ms.saturating_sub(state.window_start_ms);
        if elapsed >= self.window_ms {
            debug!(
                "Window expired after {}ms ({} requests, {} rejected); starting new window",
                elapsed, state.total_requests, state.false_responses
            );
            state.reset(now_ms);
        }

        state.total_requests += 1;
        let success = state.true_responses == 0;
        if success {
            state.true_responses += 1;
        } else {
            state.false_responses += 1;
        }

        Response {
            success,
            stats: state.snapshot(),
        }
    }

    /// Returns a copy of the current counters.
    ///
    /// Does not look at the clock: an expired window is reported as-is until
    /// the next `respond()` rolls it over.
    pub fn stats(&self) -> WindowStats {
        self.state.lock().snapshot()
    }

    /// Starts a fresh window immediately, regardless of elapsed time.
    ///
    /// Returns the zeroed snapshot. The next `respond()` succeeds.
    pub fn reset_manually(&self) -> WindowStats {
        let mut state = self.state.lock();
        let now_ms = self.clock.now_ms();
        self.last_access_ms.store(now_ms, Ordering::Relaxed);
        info!(
            "Manual reset ({} requests in discarded window)",
            state.total_requests
        );
        state.reset(now_ms);
        state.snapshot()
    }

    /// Time left before the current window expires.
    ///
    /// Returns [`Duration::ZERO`] when the window has already run out (the
    /// rollover itself still waits for the next `respond()`).
    pub fn time_until_next_window(&self) -> Duration {
        let window_start_ms = self.state.lock().window_start_ms;
        let elapsed = self.clock.now_ms().saturating_sub(window_start_ms);
        Duration::from_millis(self.window_ms.saturating_sub(elapsed))
    }

    /// Configured window length in milliseconds.
    #[inline]
    pub fn window_ms(&self) -> u64 {
        self.window_ms
    }

    /// Configured window length.
    #[inline]
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }

    /// Whether the responder can be dropped without losing anything.
    ///
    /// True when nothing has called `respond()` or `reset_manually()` for at
    /// least `idle_ms` *and* the current window has expired. A shard whose
    /// window is still running holds a claimed success; dropping it would let
    /// a fresh responder grant a second one in the same window.
    pub fn is_idle(&self, idle_ms: u64) -> bool {
        let now_ms = self.clock.now_ms();
        let last = self.last_access_ms.load(Ordering::Relaxed);
        if now_ms.saturating_sub(last) < idle_ms {
            return false;
        }

        let window_start_ms = self.state.lock().window_start_ms;
        now_ms.saturating_sub(window_start_ms) >= self.window_ms
    }

    pub(crate) fn last_access_ms(&self) -> u64 {
        self.last_access_ms.load(Ordering::Relaxed)
    }
}

impl Default for Responder {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Responder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Responder")
            .field("window_ms", &self.window_ms)
            .field("stats", &self.stats())
            .finish()
    }
}
