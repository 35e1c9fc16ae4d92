//! Main engine API
//!
//! The [`Engine`] owns the reference tables and runs the full pipeline for one
//! request: flash detection, interval building, single-event marks, status
//! aggregation and time-group banding.

use crate::banding::time_groups;
use crate::config::ReferenceData;
use crate::event_log::EventLog;
use crate::flash::detect_flash_periods;
use crate::interval::build_intervals;
use crate::status::StatusAggregator;
use crate::types::{
    AnnotatedRecord, FlashSubPeriod, Interval, QueryWindow, RawEvent, Result, StatusCategory,
    Timestamp,
};
use serde::Serialize;

/// Entry point for interval extraction
///
/// The engine holds only immutable reference data, so one instance can serve
/// concurrent requests from several threads.
#[derive(Debug, Clone)]
pub struct Engine {
    reference: ReferenceData,
}

impl Engine {
    /// Create an engine, validating the reference tables
    ///
    /// # Example
    /// ```
    /// use hires_log_engine::{Engine, PairingRule, ReferenceData};
    ///
    /// let reference = ReferenceData::new()
    ///     .add_rule(PairingRule::new(1, vec![7], "G").unwrap());
    /// let engine = Engine::new(reference).unwrap();
    /// assert_eq!(engine.reference().pairs.len(), 1);
    /// ```
    pub fn new(reference: ReferenceData) -> Result<Self> {
        reference.validate()?;
        log::debug!(
            "Engine created with {} pairing rules, {} single codes, {} descriptors",
            reference.pairs.len(),
            reference.singles.len(),
            reference.descriptors.len()
        );
        Ok(Self { reference })
    }

    pub fn reference(&self) -> &ReferenceData {
        &self.reference
    }

    /// Build an event log from raw events using this engine's descriptors
    pub fn annotate<I>(&self, events: I) -> EventLog
    where
        I: IntoIterator<Item = RawEvent>,
    {
        EventLog::from_raw(events, &self.reference.descriptors)
    }

    /// Run the full pipeline over one log and window
    ///
    /// # Example
    /// ```
    /// use chrono::NaiveDate;
    /// use hires_log_engine::{Engine, PairingRule, QueryWindow, RawEvent, ReferenceData};
    ///
    /// let t = |s| NaiveDate::from_ymd_opt(2024, 9, 20).unwrap().and_hms_opt(9, 0, s).unwrap();
    /// let engine = Engine::new(
    ///     ReferenceData::new().add_rule(PairingRule::new(1, vec![7], "G").unwrap()),
    /// )
    /// .unwrap();
    ///
    /// let log = engine.annotate(vec![RawEvent::new(t(1), 1, 2), RawEvent::new(t(9), 7, 2)]);
    /// let window = QueryWindow::new("151", t(0), t(10)).unwrap();
    /// let output = engine.process(&log, &window).unwrap();
    ///
    /// assert_eq!(output.intervals.len(), 1);
    /// assert_eq!(output.records[0].status.ops, vec!["2G"]);
    /// ```
    pub fn process(&self, log: &EventLog, window: &QueryWindow) -> Result<EngineOutput> {
        log::info!(
            "Processing site {} from {} to {} ({} records)",
            window.site_id,
            window.start,
            window.end,
            log.len()
        );

        // Split the window around flash, then pair inside the normal parts
        let periods = detect_flash_periods(log.records(), &self.reference.flash, window.start, window.end)?;
        let intervals = build_intervals(log, &self.reference, &periods);
        let singles = self.single_marks(log, window);

        // Attach labels to every record
        let mut aggregator = StatusAggregator::new(log);
        aggregator
            .add_intervals(&intervals)
            .add_singles(&self.reference.singles, window.start, window.end)
            .add_flash(periods.sub_periods(), &self.reference.flash.label);
        let statuses = aggregator.finish();

        // Combine records, statuses and band flags
        let records = log
            .iter()
            .cloned()
            .zip(statuses)
            .zip(time_groups(log))
            .map(|((record, status), time_group)| AnnotatedRecord {
                record,
                status,
                time_group,
            })
            .collect();

        let output = EngineOutput {
            site_id: window.site_id.clone(),
            window_start: window.start,
            window_end: window.end,
            intervals,
            singles,
            flash_periods: periods.into_inner(),
            records,
        };

        let stats = output.stats();
        log::info!(
            "Built {} intervals ({} synthetic endpoints), {} single marks, {} flash periods",
            stats.num_intervals,
            stats.num_synthetic_endpoints,
            stats.num_singles,
            stats.num_flash_periods
        );

        Ok(output)
    }

    /// Zero-length marks for single-event codes inside the window
    fn single_marks(&self, log: &EventLog, window: &QueryWindow) -> Vec<Interval> {
        log.between(window.start, window.end)
            .iter()
            .filter_map(|r| {
                self.reference.single_label(r.event_code).map(|label| Interval {
                    start_ts: r.timestamp,
                    end_ts: r.timestamp,
                    parameter: r.parameter,
                    abbreviation: label.to_string(),
                    category: StatusCategory::Ops,
                    start_code: r.event_code,
                    end_code: r.event_code,
                    start_descriptor: r.descriptor.clone(),
                    end_descriptor: r.descriptor.clone(),
                    synthetic_start: false,
                    synthetic_end: false,
                })
            })
            .collect()
    }
}

/// Everything the engine derives for one request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineOutput {
    pub site_id: String,
    pub window_start: Timestamp,
    pub window_end: Timestamp,
    /// Paired intervals in discovery order
    pub intervals: Vec<Interval>,
    /// Zero-length marks for single-event codes
    pub singles: Vec<Interval>,
    pub flash_periods: Vec<FlashSubPeriod>,
    /// Every log record with its status lists and band flag
    pub records: Vec<AnnotatedRecord>,
}

impl EngineOutput {
    /// Intervals of one status category, in discovery order
    pub fn intervals_in(&self, category: StatusCategory) -> impl Iterator<Item = &Interval> {
        self.intervals.iter().filter(move |i| i.category == category)
    }

    /// Intervals and single marks merged and sorted by start time
    pub fn export_rows(&self) -> Vec<&Interval> {
        let mut rows: Vec<&Interval> = self.intervals.iter().chain(self.singles.iter()).collect();
        rows.sort_by_key(|i| i.start_ts);
        rows
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            num_records: self.records.len(),
            num_intervals: self.intervals.len(),
            num_synthetic_endpoints: self
                .intervals
                .iter()
                .map(|i| i.synthetic_start as usize + i.synthetic_end as usize)
                .sum(),
            num_singles: self.singles.len(),
            num_flash_periods: self.flash_periods.iter().filter(|p| p.is_flash).count(),
        }
    }
}

/// Summary counts for one engine run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EngineStats {
    pub num_records: usize,
    pub num_intervals: usize,
    pub num_synthetic_endpoints: usize,
    pub num_singles: usize,
    pub num_flash_periods: usize,
}
