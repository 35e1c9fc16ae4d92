//! Hi-Res Log Interval Engine
//!
//! A stateless library that turns a traffic-signal controller's high-resolution
//! event log into on/off intervals and per-record status sets.
//!
//! # Architecture
//!
//! The pipeline runs once per request over a closed, sorted batch of records:
//! - Splits the window into flash and non-flash sub-periods
//! - Splits the log into channels (one pairing rule, one parameter)
//! - Repairs repeated signals and truncated boundaries in each channel
//! - Zips the alternating channel into intervals
//! - Attaches active interval labels to every record, per category
//!
//! The library does NOT:
//! - Discover or parse log files
//! - Serialize results to CSV/JSON
//! - Keep any state between requests
//!
//! File handling and output formatting live in the application layer
//! (hires-log-cli).
//!
//! # Example Usage
//!
//! ```
//! use chrono::NaiveDate;
//! use hires_log_engine::{
//!     Engine, PairingRule, QueryWindow, RawEvent, ReferenceData, StatusCategory,
//! };
//!
//! let t = |s| NaiveDate::from_ymd_opt(2024, 8, 22).unwrap().and_hms_opt(6, 0, s).unwrap();
//!
//! let reference = ReferenceData::new().add_rule(
//!     PairingRule::new(1, vec![7], "G")
//!         .unwrap()
//!         .with_category(StatusCategory::Phase),
//! );
//! let engine = Engine::new(reference).unwrap();
//!
//! let log = engine.annotate(vec![
//!     RawEvent::new(t(5), 7, 2),
//!     RawEvent::new(t(10), 1, 2),
//!     RawEvent::new(t(30), 7, 2),
//! ]);
//! let window = QueryWindow::new("151", t(0), t(59)).unwrap();
//! let output = engine.process(&log, &window).unwrap();
//!
//! // the green that was already running at 06:00:00 is repaired
//! assert_eq!(output.intervals.len(), 2);
//! assert!(output.intervals[0].synthetic_start);
//! ```

// Public modules
pub mod banding;
pub mod config;
pub mod engine;
pub mod event_log;
pub mod flash;
pub mod interval;
pub mod pairing;
pub mod status;
pub mod types;

// Re-export main types for convenience
pub use config::{
    DescriptorTable, FlashConfig, FlashState, PairingRule, PairingTable, ReferenceData,
    SingleEventRule,
};
pub use engine::{Engine, EngineOutput, EngineStats};
pub use event_log::EventLog;
pub use flash::FlashPeriods;
pub use types::{
    AnnotatedRecord, EngineError, EventRecord, FlashSubPeriod, Interval, QueryWindow, RawEvent,
    Result, StatusCategory, StatusSet, Timestamp,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_basics() {
        // Smoke test: an engine with no rules builds nothing
        let engine = Engine::new(ReferenceData::new()).unwrap();
        assert!(engine.reference().pairs.is_empty());
        assert!(!VERSION.is_empty());
    }
}
