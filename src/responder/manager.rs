//! # Keyed Responder Manager
//!
//! One responder per logical shard. Each key (a tenant, a route, a device id,
//! whatever the caller uses to partition traffic) gets its own independent
//! window, so a success granted to `"alpha"` says nothing about `"beta"`.
//!
//! ```text
//!     "alpha" ──┐
//!     "beta"  ──┼──► ResponderManager ──► Responder per key
//!     "gamma" ──┘          │
//!                    ┌─────▼────────┐
//!                    │  DashMap     │
//!                    │  key → R     │
//!                    │  key → R     │
//!                    └──────────────┘
//! ```
//!
//! Memory is bounded: at most `max_keys` shards are tracked, and shards that
//! have not been touched for `idle_ms` are dropped by [`ResponderManager::cleanup`]
//! (manually or from the background cleanup thread). A shard is only dropped
//! once its window has expired, so the fresh window it gets the next time its
//! key shows up never overlaps the old one.

use super::{
    clock::{Clock, SystemClock},
    config::ResponderConfig,
    core::Responder,
    stats::{Response, WindowStats},
};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::io;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default cap on simultaneously tracked keys.
pub const DEFAULT_MAX_KEYS: usize = 10_000;

const DEFAULT_CLEANUP_INTERVAL_MS: u64 = 60_000;
const DEFAULT_IDLE_MS: u64 = 300_000;

/// Manager for per-key responders.
///
/// ## Example
///
/// ```rust
/// use windowgate::{ResponderConfig, ResponderManager};
///
/// let manager = ResponderManager::new(ResponderConfig::per_seconds(30));
///
/// assert_eq!(manager.respond("alpha").map(|r| r.success), Some(true));
/// assert_eq!(manager.respond("alpha").map(|r| r.success), Some(false));
/// assert_eq!(manager.respond("beta").map(|r| r.success), Some(true));
/// assert_eq!(manager.active_keys(), 2);
/// ```
#[derive(Clone)]
pub struct ResponderManager {
    responders: Arc<DashMap<String, Arc<Responder>, ahash::RandomState>>,

    /// Tracked key count, kept alongside the map for cheap capacity checks.
    active_count: Arc<AtomicUsize>,

    config: ResponderConfig,
    clock: Arc<dyn Clock>,
    max_keys: usize,
    cleanup_interval_ms: u64,
    idle_ms: u64,

    total_created: Arc<AtomicU64>,
    total_cleaned: Arc<AtomicU64>,
}

impl ResponderManager {
    /// Creates a manager using the system clock and default cleanup settings
    /// (cleanup every minute, drop keys idle for five minutes).
    ///
    /// # Panics
    ///
    /// Panics if the configuration is invalid.
    pub fn new(config: ResponderConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }

    /// Creates a manager whose responders all read time from `clock`.
    ///
    /// # Panics
    ///
    /// Panics if the configuration is invalid.
    pub fn with_clock(config: ResponderConfig, clock: impl Clock + 'static) -> Self {
        config
            .validate()
            .expect("Invalid responder configuration");

        Self {
            responders: Arc::new(DashMap::with_hasher(ahash::RandomState::new())),
            active_count: Arc::new(AtomicUsize::new(0)),
            config,
            clock: Arc::new(clock),
            max_keys: DEFAULT_MAX_KEYS,
            cleanup_interval_ms: DEFAULT_CLEANUP_INTERVAL_MS,
            idle_ms: DEFAULT_IDLE_MS,
            total_created: Arc::new(AtomicU64::new(0)),
            total_cleaned: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Overrides the cleanup cadence and the idle threshold (milliseconds).
    pub fn with_cleanup_settings(mut self, cleanup_interval_ms: u64, idle_ms: u64) -> Self {
        self.cleanup_interval_ms = cleanup_interval_ms.max(1);
        self.idle_ms = idle_ms;
        self
    }

    /// Overrides the maximum number of tracked keys.
    pub fn with_max_keys(mut self, max_keys: usize) -> Self {
        self.max_keys = max_keys;
        self
    }

    /// Returns the responder for `key`, creating it on first use.
    ///
    /// Returns `None` when the manager is full and cleanup could not free a
    /// slot.
    pub fn get_responder(&self, key: &str) -> Option<Arc<Responder>> {
        self.with_responder(key, Arc::clone)
    }

    /// Answers one request for `key`. `None` means the manager is full.
    ///
    /// The call runs while the map entry is held, so cleanup cannot drop the
    /// shard between lookup and `respond()`.
    pub fn respond(&self, key: &str) -> Option<Response> {
        self.with_responder(key, |responder| responder.respond())
    }

    fn with_responder<R>(&self, key: &str, f: impl FnOnce(&Arc<Responder>) -> R) -> Option<R> {
        if let Some(responder) = self.responders.get(key) {
            return Some(f(responder.value()));
        }

        if self.active_count.load(Ordering::Acquire) >= self.max_keys {
            self.cleanup();
            if self.active_count.load(Ordering::Acquire) >= self.max_keys {
                warn!("Responder capacity reached, rejecting key: {}", key);
                return None;
            }
        }

        match self.responders.entry(key.to_owned()) {
            Entry::Occupied(occupied) => Some(f(occupied.get())),
            Entry::Vacant(vacant) => {
                let prev = self.active_count.fetch_add(1, Ordering::AcqRel);
                if prev >= self.max_keys {
                    self.active_count.fetch_sub(1, Ordering::AcqRel);
                    warn!("Responder capacity race detected, rejecting key: {}", key);
                    return None;
                }

                let responder = Arc::new(Responder::with_shared_clock(
                    self.config,
                    self.clock.clone(),
                ));
                let inserted = vacant.insert(responder);

                self.total_created.fetch_add(1, Ordering::Relaxed);
                debug!("Created responder for key: {} (total: {})", key, prev + 1);
                Some(f(inserted.value()))
            }
        }
    }

    /// Current counters for `key`, if it is tracked. Never creates a shard.
    pub fn stats(&self, key: &str) -> Option<WindowStats> {
        self.responders.get(key).map(|responder| responder.stats())
    }

    /// Manually resets `key`'s window, if it is tracked.
    pub fn reset(&self, key: &str) -> Option<WindowStats> {
        self.responders
            .get(key)
            .map(|responder| responder.reset_manually())
    }

    /// Stops tracking `key`. Returns whether it was tracked.
    pub fn remove(&self, key: &str) -> bool {
        if self.responders.remove(key).is_some() {
            self.active_count.fetch_sub(1, Ordering::AcqRel);
            self.total_cleaned.fetch_add(1, Ordering::Relaxed);
            true
        } else {
            false
        }
    }

    /// Drops every shard idle for at least the configured idle threshold
    /// whose window has also expired (see [`Responder::is_idle`]).
    ///
    /// Returns the number of shards removed.
    pub fn cleanup(&self) -> u64 {
        let mut removed = 0;
        let idle_ms = self.idle_ms;

        self.responders.retain(|key, responder| {
            if responder.is_idle(idle_ms) {
                debug!("Removing idle responder for key: {}", key);
                removed += 1;
                self.active_count.fetch_sub(1, Ordering::AcqRel);
                false
            } else {
                true
            }
        });

        if removed > 0 {
            self.total_cleaned.fetch_add(removed, Ordering::Relaxed);
            info!("Cleanup removed {} idle responders", removed);
        }
        removed
    }

    /// Number of tracked keys.
    #[inline]
    pub fn active_keys(&self) -> usize {
        self.active_count.load(Ordering::Acquire)
    }

    /// Snapshot of the manager's own bookkeeping.
    pub fn manager_stats(&self) -> ManagerStats {
        ManagerStats {
            active_keys: self.active_keys(),
            total_created: self.total_created.load(Ordering::Relaxed),
            total_cleaned: self.total_cleaned.load(Ordering::Relaxed),
            max_keys: self.max_keys,
        }
    }

    /// Starts a cleanup thread that runs until a message is sent on (or the
    /// sender side of) the returned channel is dropped.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the thread cannot be spawned.
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::sync::Arc;
    /// use windowgate::{ResponderConfig, ResponderManager};
    ///
    /// let manager = Arc::new(ResponderManager::new(ResponderConfig::default()));
    /// let (handle, stop_tx) = manager.clone().start_stoppable_cleanup_thread().unwrap();
    ///
    /// stop_tx.send(()).unwrap();
    /// handle.join().unwrap();
    /// ```
    pub fn start_stoppable_cleanup_thread(
        self: Arc<Self>,
    ) -> io::Result<(thread::JoinHandle<()>, mpsc::Sender<()>)> {
        let (stop_tx, stop_rx) = mpsc::channel();
        let manager = self;

        let handle = thread::Builder::new()
            .name("windowgate-cleanup".to_string())
            .spawn(move || {
                info!(
                    "Started cleanup thread (interval: {}ms, idle threshold: {}ms)",
                    manager.cleanup_interval_ms, manager.idle_ms
                );

                loop {
                    match stop_rx.recv_timeout(Duration::from_millis(manager.cleanup_interval_ms)) {
                        Ok(()) | Err(mpsc::RecvTimeoutError::Disconnected) => {
                            info!("Cleanup thread stopping");
                            break;
                        }
                        Err(mpsc::RecvTimeoutError::Timeout) => {
                            manager.cleanup();

                            let stats = manager.manager_stats();
                            if stats.is_near_capacity() {
                                warn!(
                                    "High key usage: {} responders ({:.0}% of capacity)",
                                    stats.active_keys,
                                    stats.capacity_used() * 100.0
                                );
                            }
                        }
                    }
                }
            })?;

        Ok((handle, stop_tx))
    }
}

impl std::fmt::Debug for ResponderManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponderManager")
            .field("config", &self.config)
            .field("active_keys", &self.active_keys())
            .field("max_keys", &self.max_keys)
            .field("cleanup_interval_ms", &self.cleanup_interval_ms)
            .field("idle_ms", &self.idle_ms)
            .finish()
    }
}

/// Bookkeeping counters for a [`ResponderManager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManagerStats {
    /// Keys currently tracked.
    pub active_keys: usize,
    /// Shards created since startup.
    pub total_created: u64,
    /// Shards removed (idle cleanup or explicit removal) since startup.
    pub total_cleaned: u64,
    /// Upper bound on tracked keys.
    pub max_keys: usize,
}

impl ManagerStats {
    /// Fraction of the key budget in use.
    pub fn capacity_used(&self) -> f64 {
        if self.max_keys == 0 {
            1.0
        } else {
            self.active_keys as f64 / self.max_keys as f64
        }
    }

    /// True at 90% of the key budget or above.
    pub fn is_near_capacity(&self) -> bool {
        self.capacity_used() >= 0.9
    }
}
