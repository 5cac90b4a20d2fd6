//! # Window Statistics
//!
//! Snapshot types handed out by the responder. A snapshot is a plain copy of
//! the counters at one instant; later calls never change a snapshot that has
//! already been returned.
//!
//! ```text
//!     WindowStats:
//!     ┌─────────────────────────────────────┐
//!     │  totalRequests:  3                  │
//!     │  trueResponses:  1   (0 or 1)       │
//!     │  falseResponses: 2                  │
//!     │  lastResetTime:  2024-05-01T12:00Z  │
//!     └─────────────────────────────────────┘
//! ```
//!
//! On the wire the snapshot uses camelCase keys and an ISO-8601 timestamp for
//! the window start, matching what the HTTP endpoints return.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Immutable copy of a responder's window counters.
///
/// Invariant for every snapshot produced by a responder:
/// `total_requests == true_responses + false_responses` and
/// `true_responses <= 1`.
///
/// ## Example
///
/// ```rust
/// use windowgate::{ManualClock, Responder, ResponderConfig};
///
/// let responder = Responder::with_clock(ResponderConfig::default(), ManualClock::new(0));
/// responder.respond();
/// responder.respond();
///
/// let stats = responder.stats();
/// assert_eq!(stats.total_requests, 2);
/// assert_eq!(stats.true_responses, 1);
/// assert_eq!(stats.false_responses, 1);
/// assert!(stats.is_consistent());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowStats {
    /// Calls to `respond()` counted in the current window.
    pub total_requests: u64,

    /// Calls that received `true` in the current window (0 or 1).
    pub true_responses: u64,

    /// Calls that received `false` in the current window.
    pub false_responses: u64,

    /// When the current window began, in milliseconds since the Unix epoch.
    #[serde(rename = "lastResetTime", with = "iso_millis")]
    pub window_start_ms: u64,
}

impl WindowStats {
    /// Zeroed counters for a window starting at `window_start_ms`.
    #[inline]
    pub fn empty(window_start_ms: u64) -> Self {
        Self {
            total_requests: 0,
            true_responses: 0,
            false_responses: 0,
            window_start_ms,
        }
    }

    /// Window start as a UTC timestamp.
    pub fn last_reset_time(&self) -> DateTime<Utc> {
        millis_to_datetime(self.window_start_ms)
    }

    /// Whether the window's single success has already been handed out.
    #[inline]
    pub fn is_claimed(&self) -> bool {
        self.true_responses > 0
    }

    /// Checks the counter invariants.
    #[inline]
    pub fn is_consistent(&self) -> bool {
        self.true_responses <= 1
            && self.total_requests == self.true_responses + self.false_responses
    }

    /// Fraction of calls in this window that received `true`.
    ///
    /// An untouched window reports 0.0.
    pub fn success_rate(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            self.true_responses as f64 / self.total_requests as f64
        }
    }

    /// Fraction of calls in this window that received `false`.
    pub fn rejection_rate(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            self.false_responses as f64 / self.total_requests as f64
        }
    }

    /// Human-readable multi-line summary.
    pub fn summary(&self) -> String {
        format!(
            "Window Stats:\n\
             ├─ Started: {}\n\
             ├─ Counters:\n\
             │  ├─ Total Requests: {}\n\
             │  ├─ True Responses: {}\n\
             │  └─ False Responses: {}\n\
             └─ Rates:\n\
                ├─ Success Rate: {:.2}%\n\
                └─ Rejection Rate: {:.2}%",
            format_iso(self.window_start_ms),
            self.total_requests,
            self.true_responses,
            self.false_responses,
            self.success_rate() * 100.0,
            self.rejection_rate() * 100.0,
        )
    }
}

impl fmt::Display for WindowStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.summary())
    }
}

/// Outcome of a single `respond()` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    /// `true` for the first call of a window, `false` otherwise.
    pub success: bool,

    /// Counters immediately after this call was counted.
    pub stats: WindowStats,
}

fn millis_to_datetime(ms: u64) -> DateTime<Utc> {
    let ms = i64::try_from(ms).unwrap_or(i64::MAX);
    DateTime::from_timestamp_millis(ms).unwrap_or(DateTime::<Utc>::MAX_UTC)
}

fn format_iso(ms: u64) -> String {
    millis_to_datetime(ms).to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Serializes epoch milliseconds as an RFC 3339 string with millisecond
/// precision (`1970-01-01T00:00:31.000Z`).
mod iso_millis {
    use chrono::DateTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S: Serializer>(ms: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_iso(*ms))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let parsed = DateTime::parse_from_rfc3339(&raw).map_err(de::Error::custom)?;
        u64::try_from(parsed.timestamp_millis())
            .map_err(|_| de::Error::custom("lastResetTime precedes the Unix epoch"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(total: u64, ok: u64, rejected: u64) -> WindowStats {
        WindowStats {
            total_requests: total,
            true_responses: ok,
            false_responses: rejected,
            window_start_ms: 31_000,
        }
    }

    #[test]
    fn test_empty_snapshot() {
        let empty = WindowStats::empty(5);
        assert_eq!(empty.total_requests, 0);
        assert!(!empty.is_claimed());
        assert!(empty.is_consistent());
        assert_eq!(empty.success_rate(), 0.0);
        assert_eq!(empty.rejection_rate(), 0.0);
    }

    #[test]
    fn test_rates() {
        let s = stats(4, 1, 3);
        assert_eq!(s.success_rate(), 0.25);
        assert_eq!(s.rejection_rate(), 0.75);
        assert!(s.is_claimed());
    }

    #[test]
    fn test_consistency_check() {
        assert!(stats(3, 1, 2).is_consistent());
        assert!(!stats(3, 2, 1).is_consistent());
        assert!(!stats(4, 1, 2).is_consistent());
    }

    #[test]
    fn test_last_reset_time() {
        let s = stats(1, 1, 0);
        assert_eq!(s.last_reset_time().timestamp_millis(), 31_000);
    }

    #[test]
    fn test_serializes_with_wire_names() {
        let json = serde_json::to_value(stats(3, 1, 2)).unwrap();
        assert_eq!(json["totalRequests"], 3);
        assert_eq!(json["trueResponses"], 1);
        assert_eq!(json["falseResponses"], 2);
        assert_eq!(json["lastResetTime"], "1970-01-01T00:00:31.000Z");
        assert!(json.get("windowStartMs").is_none());
    }

    #[test]
    fn test_deserializes_iso_timestamp() {
        let parsed: WindowStats = serde_json::from_str(
            r#"{"totalRequests":2,"trueResponses":1,"falseResponses":1,
                "lastResetTime":"2024-01-01T00:00:00.250Z"}"#,
        )
        .unwrap();
        assert_eq!(parsed.window_start_ms, 1_704_067_200_250);
        assert_eq!(parsed.total_requests, 2);
    }

    #[test]
    fn test_rejects_pre_epoch_timestamp() {
        let parsed: Result<WindowStats, _> = serde_json::from_str(
            r#"{"totalRequests":0,"trueResponses":0,"falseResponses":0,
                "lastResetTime":"1969-12-31T23:59:59Z"}"#,
        );
        assert!(parsed.is_err());
    }

    #[test]
    fn test_response_shape() {
        let response = Response {
            success: true,
            stats: stats(1, 1, 0),
        };
        let json = serde_json::to_value(response).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["stats"]["totalRequests"], 1);
    }

    #[test]
    fn test_summary_display() {
        let s = stats(10, 1, 9);
        let display = format!("{}", s);
        assert!(display.contains("Window Stats"));
        assert!(display.contains("Total Requests: 10"));
        assert!(display.contains("Success Rate: 10.00%"));
        assert!(display.contains("1970-01-01T00:00:31.000Z"));
    }
}
