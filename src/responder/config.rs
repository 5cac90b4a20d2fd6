//! # Responder Configuration
//!
//! Settings for the windowed responder. There is exactly one knob that
//! changes behavior: how long a window lasts.
//!
//! ```text
//!     Window Configuration:
//!
//!     windowStart                          windowStart + window_ms
//!         │◄────────────── window_ms ──────────────►│
//!         │ ✅ ❌ ❌ ❌ ❌ ❌ ❌ ❌ ❌ ❌ ❌ ❌ ❌ ❌ │ ✅ ❌ ...
//!         │ first call wins, the rest lose          │ next window
//! ```

use std::time::Duration;

/// Window length used when nothing else is configured (30 seconds).
pub const DEFAULT_WINDOW_MS: u64 = 30_000;

/// Configuration for a [`Responder`](crate::Responder).
///
/// # Example
///
/// ```rust
/// use windowgate::ResponderConfig;
///
/// let config = ResponderConfig::per_seconds(5);
/// assert_eq!(config.window_ms, 5_000);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponderConfig {
    /// Length of one window in milliseconds. Must be greater than 0.
    pub window_ms: u64,
}

impl Default for ResponderConfig {
    fn default() -> Self {
        Self {
            window_ms: DEFAULT_WINDOW_MS,
        }
    }
}

impl ResponderConfig {
    /// Creates a configuration with an explicit window length in milliseconds.
    pub fn new(window_ms: u64) -> Self {
        Self { window_ms }
    }

    /// One success every `seconds` seconds.
    pub fn per_seconds(seconds: u64) -> Self {
        Self {
            window_ms: seconds.saturating_mul(1000),
        }
    }

    /// One success every `minutes` minutes.
    pub fn per_minutes(minutes: u64) -> Self {
        Self {
            window_ms: minutes.saturating_mul(60_000),
        }
    }

    /// Builds a configuration from a [`Duration`], truncated to milliseconds.
    pub fn from_duration(window: Duration) -> Self {
        Self {
            window_ms: window.as_millis().min(u64::MAX as u128) as u64,
        }
    }

    /// Window length as a [`Duration`].
    #[inline]
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the window length is zero. A zero window would
    /// expire on every call and turn the responder into "always true".
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.window_ms == 0 {
            return Err("window_ms must be greater than 0");
        }
        Ok(())
    }
}
