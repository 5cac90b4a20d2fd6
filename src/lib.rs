//! # Windowgate - One Winner Per Window
//!
//! A small, thread-safe responder that hands out exactly one `true` per
//! time window. Every other call in the same window gets `false`. When the
//! window runs out, the next caller wins again.
//!
//! ## The Window Rule
//!
//! ```text
//!     window = 30s
//!
//!     t=0s    respond() ─► ✅ true   (first call of the window)
//!     t=5s    respond() ─► ❌ false
//!     t=10s   respond() ─► ❌ false
//!     t=31s   respond() ─► ✅ true   (window expired, new window starts here)
//! ```
//!
//! Typical use: trigger one downstream side effect per interval no matter
//! how many requests arrive.
//!
//! ## Quick Start
//!
//! ```rust
//! use windowgate::Responder;
//!
//! // Default window: 30 seconds
//! let responder = Responder::new();
//!
//! let response = responder.respond();
//! if response.success {
//!     println!("✅ first call in this window");
//! }
//!
//! println!("{}", responder.stats());
//! ```
//!
//! ### Custom Configuration
//!
//! ```rust
//! use windowgate::{ManualClock, ResponderBuilder};
//!
//! let clock = ManualClock::new(0);
//! let responder = ResponderBuilder::new()
//!     .window_ms(1_000)
//!     .clock(clock.clone())
//!     .build();
//!
//! assert!(responder.respond().success);
//! assert!(!responder.respond().success);
//!
//! clock.advance_ms(1_000);
//! assert!(responder.respond().success);
//! ```
//!
//! ## Semantics
//!
//! - **Lazy expiry** - no timers; the call that finds the window expired
//!   starts the new window and is counted in it.
//! - **Atomic** - expiry check, reset and success decision share one lock.
//! - **Non-mutating reads** - [`Responder::stats`] never rolls the window.
//! - **Manual reset** - [`Responder::reset_manually`] starts a fresh window now.
//! - **Clock skew** - a clock that moves backwards never triggers a reset.
//!
//! ## HTTP
//!
//! With the default `http` feature, [`http::build_router`] exposes the
//! responder as JSON endpoints and the `windowgate-server` binary serves it.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(
    missing_docs,
    rust_2018_idioms,
    unreachable_pub,
    missing_debug_implementations
)]
#![forbid(unsafe_code)]

mod responder;

#[cfg(feature = "http")]
#[cfg_attr(docsrs, doc(cfg(feature = "http")))]
pub mod http;

pub use responder::{
    current_time_ms, Clock, ManagerStats, ManualClock, Responder, ResponderConfig,
    ResponderManager, Response, SystemClock, WindowStats, DEFAULT_MAX_KEYS, DEFAULT_WINDOW_MS,
};

use std::sync::Arc;

/// A responder wrapped in `Arc` for sharing across threads or handlers.
pub type SharedResponder = Arc<Responder>;

/// A keyed manager wrapped in `Arc`.
pub type SharedManager = Arc<ResponderManager>;

/// Version information for the crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports.
///
/// ```rust
/// use windowgate::prelude::*;
///
/// let responder = Responder::with_config(ResponderConfig::per_seconds(10));
/// ```
pub mod prelude {
    pub use crate::{
        Clock, ManagerStats, ManualClock, Responder, ResponderBuilder, ResponderConfig,
        ResponderManager, Response, SharedManager, SharedResponder, SystemClock, WindowStats,
    };
}

/// Builder for responders with non-default settings.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use windowgate::ResponderBuilder;
///
/// let responder = ResponderBuilder::new()
///     .window(Duration::from_secs(5))
///     .build();
/// assert_eq!(responder.window_ms(), 5_000);
///
/// let result = ResponderBuilder::new().window_ms(0).try_build();
/// assert!(result.is_err());
/// ```
#[derive(Debug)]
pub struct ResponderBuilder {
    config: ResponderConfig,
    clock: Arc<dyn Clock>,
}

impl ResponderBuilder {
    /// Starts from a 30 second window and the system clock.
    pub fn new() -> Self {
        Self {
            config: ResponderConfig::default(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Sets the window length in milliseconds (must be > 0).
    pub fn window_ms(mut self, window_ms: u64) -> Self {
        self.config.window_ms = window_ms;
        self
    }

    /// Sets the window length.
    pub fn window(mut self, window: std::time::Duration) -> Self {
        self.config = ResponderConfig::from_duration(window);
        self
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ResponderConfig) -> Self {
        self.config = config;
        self
    }

    /// Injects a time source.
    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Builds the responder.
    ///
    /// # Panics
    ///
    /// Panics if the window length is zero. Use [`try_build`](Self::try_build)
    /// to handle the error instead.
    pub fn build(self) -> Responder {
        Responder::with_shared_clock(self.config, self.clock)
    }

    /// Builds the responder, returning an error for an invalid configuration.
    ///
    /// # Errors
    ///
    /// Returns the validation message if the window length is zero.
    pub fn try_build(self) -> Result<Responder, &'static str> {
        self.config.validate()?;
        Ok(Responder::with_shared_clock(self.config, self.clock))
    }
}

impl Default for ResponderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_basic_functionality() {
        let responder = Responder::with_clock(ResponderConfig::default(), ManualClock::new(0));

        assert!(responder.respond().success);
        for _ in 0..9 {
            assert!(!responder.respond().success);
        }

        let stats = responder.stats();
        assert_eq!(stats.total_requests, 10);
        assert_eq!(stats.true_responses, 1);
        assert_eq!(stats.false_responses, 9);
    }

    #[test]
    fn test_builder() {
        let clock = ManualClock::new(100);
        let responder = ResponderBuilder::new()
            .window_ms(250)
            .clock(clock.clone())
            .build();

        assert_eq!(responder.window_ms(), 250);
        assert_eq!(responder.stats().window_start_ms, 100);
    }

    #[test]
    fn test_builder_validation() {
        assert!(ResponderBuilder::new().window_ms(0).try_build().is_err());
        assert!(ResponderBuilder::new()
            .window(Duration::from_micros(10))
            .try_build()
            .is_err());
        assert!(ResponderBuilder::new().window_ms(1).try_build().is_ok());
    }

    #[test]
    fn test_builder_config() {
        let responder = ResponderBuilder::default()
            .config(ResponderConfig::per_minutes(1))
            .build();
        assert_eq!(responder.window(), Duration::from_secs(60));
    }

    #[test]
    fn test_builder_default_window() {
        assert_eq!(ResponderBuilder::default().build().window_ms(), DEFAULT_WINDOW_MS);
    }

    #[test]
    fn test_thread_safety() {
        let responder: SharedResponder = Arc::new(Responder::new());
        let handles: Vec<_> = (0..10)
            .map(|_| {
                let responder = responder.clone();
                thread::spawn(move || (0..200).filter(|_| responder.respond().success).count())
            })
            .collect();

        let total: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        // 2000 calls well inside one 30 second window.
        assert_eq!(total, 1);
    }

    #[test]
    fn test_prelude_imports() {
        use crate::prelude::*;

        let _responder = Responder::new();
        let _config = ResponderConfig::default();
        let _clock = ManualClock::new(0);
        let _manager = ResponderManager::new(ResponderConfig::default());
    }

    #[test]
    fn test_shared_types() {
        let _shared: SharedResponder = Arc::new(Responder::new());
        let _manager: SharedManager = Arc::new(ResponderManager::new(ResponderConfig::default()));
    }

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
