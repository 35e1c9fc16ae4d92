//! Core types for the hi-res log interval engine
//!
//! This module defines the records the engine consumes and the intervals,
//! sub-periods and status sets it emits. Everything here is plain data: the
//! engine derives these values per request and holds no state across calls.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Timestamp type used throughout the engine (controller local time)
pub type Timestamp = NaiveDateTime;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Suffix appended to the descriptor of a synthesized boundary record
pub const SYNTHETIC_MARKER: &str = "**";

/// Sentinel returned when a descriptor lookup has no entry
pub const UNKNOWN_DESCRIPTOR: &str = "UNKNOWN";

/// Errors that can occur while building intervals
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Invalid query window: start {start} is after end {end}")]
    InvalidWindow { start: Timestamp, end: Timestamp },

    #[error("Invalid pairing rule for start code {start_code}: {reason}")]
    InvalidPairingRule { start_code: i32, reason: String },

    #[error("Unresolvable orphan in channel {start_code}/{parameter}: {reason}")]
    UnresolvableOrphan {
        start_code: i32,
        parameter: i32,
        reason: String,
    },

    #[error("No descriptor for event code {event_code} (parameter {parameter})")]
    UnresolvableLabel { event_code: i32, parameter: i32 },
}

/// Output category an interval feeds into
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusCategory {
    /// Vehicle phase signal states (green, yellow, red clearance)
    Phase,
    /// Overlap signal states
    Overlap,
    /// Everything else: detectors, preemption, pedestrian, alarms
    #[default]
    Ops,
}

impl fmt::Display for StatusCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusCategory::Phase => write!(f, "phase"),
            StatusCategory::Overlap => write!(f, "overlap"),
            StatusCategory::Ops => write!(f, "ops"),
        }
    }
}

/// Raw event as read from a controller log, before descriptor annotation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEvent {
    pub timestamp: Timestamp,
    pub event_code: i32,
    pub parameter: i32,
}

impl RawEvent {
    pub fn new(timestamp: Timestamp, event_code: i32, parameter: i32) -> Self {
        Self {
            timestamp,
            event_code,
            parameter,
        }
    }
}

/// A single annotated record of the hi-res log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Controller timestamp (millisecond resolution)
    pub timestamp: Timestamp,
    /// Event code (e.g. 1 = Phase Begin Green)
    pub event_code: i32,
    /// Event parameter (phase, overlap, detector channel, ...)
    pub parameter: i32,
    /// Human readable event description
    pub descriptor: String,
}

impl EventRecord {
    pub fn new(
        timestamp: Timestamp,
        event_code: i32,
        parameter: i32,
        descriptor: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            event_code,
            parameter,
            descriptor: descriptor.into(),
        }
    }
}

/// A reconstructed start→end span for one channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    pub start_ts: Timestamp,
    pub end_ts: Timestamp,
    pub parameter: i32,
    pub abbreviation: String,
    pub category: StatusCategory,
    /// Code of the record that opened the interval
    pub start_code: i32,
    /// Code of the record that closed the interval
    pub end_code: i32,
    pub start_descriptor: String,
    pub end_descriptor: String,
    /// True if no log record backs the start (boundary repaired)
    pub synthetic_start: bool,
    /// True if no log record backs the end (boundary repaired)
    pub synthetic_end: bool,
}

impl Interval {
    /// Status label, e.g. `2G` for parameter 2 with abbreviation `G`
    pub fn label(&self) -> String {
        format!("{}{}", self.parameter, self.abbreviation)
    }

    pub fn duration(&self) -> Duration {
        self.end_ts - self.start_ts
    }

    /// Duration in seconds with millisecond precision
    pub fn duration_secs(&self) -> f64 {
        self.duration().num_milliseconds() as f64 / 1000.0
    }

    /// Zero-length interval; callers must not divide by its duration
    pub fn is_degenerate(&self) -> bool {
        self.start_ts == self.end_ts
    }

    /// Half-open membership test used by status aggregation
    pub fn is_active_at(&self, t: Timestamp) -> bool {
        self.start_ts <= t && t < self.end_ts
    }
}

/// One slice of the query window, either in flash or in normal operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashSubPeriod {
    pub start_ts: Timestamp,
    pub end_ts: Timestamp,
    pub is_flash: bool,
}

impl FlashSubPeriod {
    pub fn new(start_ts: Timestamp, end_ts: Timestamp, is_flash: bool) -> Self {
        Self {
            start_ts,
            end_ts,
            is_flash,
        }
    }

    pub fn duration(&self) -> Duration {
        self.end_ts - self.start_ts
    }

    /// Closed-range membership, used when restricting the log to the period
    pub fn encloses(&self, t: Timestamp) -> bool {
        self.start_ts <= t && t <= self.end_ts
    }
}

/// Query window for one site
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryWindow {
    pub site_id: String,
    pub start: Timestamp,
    pub end: Timestamp,
}

impl QueryWindow {
    /// Create a window, rejecting a start after the end
    pub fn new(site_id: impl Into<String>, start: Timestamp, end: Timestamp) -> Result<Self> {
        if start > end {
            return Err(EngineError::InvalidWindow { start, end });
        }
        Ok(Self {
            site_id: normalize_site_id(&site_id.into()),
            start,
            end,
        })
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

/// Left-pad numeric site ids to the five characters used in file names
pub fn normalize_site_id(site_id: &str) -> String {
    let trimmed = site_id.trim();
    if !trimmed.is_empty() && trimmed.len() < 5 && trimmed.chars().all(|c| c.is_ascii_digit()) {
        format!("{:0>5}", trimmed)
    } else {
        trimmed.to_string()
    }
}

/// Active labels for one record, grouped by category
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSet {
    pub phase: Vec<String>,
    pub overlap: Vec<String>,
    pub ops: Vec<String>,
}

impl StatusSet {
    pub fn get(&self, category: StatusCategory) -> &[String] {
        match category {
            StatusCategory::Phase => &self.phase,
            StatusCategory::Overlap => &self.overlap,
            StatusCategory::Ops => &self.ops,
        }
    }

    pub fn get_mut(&mut self, category: StatusCategory) -> &mut Vec<String> {
        match category {
            StatusCategory::Phase => &mut self.phase,
            StatusCategory::Overlap => &mut self.overlap,
            StatusCategory::Ops => &mut self.ops,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.phase.is_empty() && self.overlap.is_empty() && self.ops.is_empty()
    }
}

/// A log record with its status lists and display band attached
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotatedRecord {
    #[serde(flatten)]
    pub record: EventRecord,
    pub status: StatusSet,
    /// Alternating band flag for grid row highlighting
    pub time_group: bool,
}
