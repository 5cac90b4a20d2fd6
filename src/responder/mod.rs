//! # Responder Module
//!
//! Internal implementation of the windowed single-success responder.
//!
//! ## Module Structure
//!
//! ```text
//!     responder/
//!     ├── mod.rs          (You are here - Module organization)
//!     ├── clock.rs        (Injectable time sources)
//!     ├── config.rs       (Window configuration and validation)
//!     ├── core.rs         (The responder itself)
//!     ├── manager.rs      (Per-key responders with idle cleanup)
//!     └── stats.rs        (Snapshots and their wire format)
//! ```
//!
//! ## Architecture Flow
//!
//! ```text
//!     Caller
//!        │
//!        ▼
//!     ┌─────────┐
//!     │ Manager │ ◄── Optional: one responder per key
//!     └────┬────┘
//!          ▼
//!     ┌─────────┐      ┌───────┐
//!     │  Core   │ ───► │ Clock │
//!     └────┬────┘      └───────┘
//!          ▼
//!     ┌─────────┐
//!     │  Stats  │ ◄── Snapshot copies returned to callers
//!     └─────────┘
//! ```

mod clock;
mod config;
mod core;
mod manager;
mod stats;

/// Time sources
pub use clock::{current_time_ms, Clock, ManualClock, SystemClock};

/// Configuration
pub use config::{ResponderConfig, DEFAULT_WINDOW_MS};

/// The responder
pub use core::Responder;

/// Keyed responders
pub use manager::{ManagerStats, ResponderManager, DEFAULT_MAX_KEYS};

/// Snapshots
pub use stats::{Response, WindowStats};
