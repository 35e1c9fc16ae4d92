//! Status aggregation
//!
//! Attaches to every log record the labels of the intervals active at its
//! timestamp, grouped by category. Membership is half-open: an interval covers
//! `start_ts <= t < end_ts`.

use crate::config::SingleEventRule;
use crate::event_log::EventLog;
use crate::types::{FlashSubPeriod, Interval, StatusCategory, StatusSet, Timestamp};

/// Accumulates status labels for the records of one log
///
/// Labels are appended in the order they are fed in, so feeding intervals in
/// discovery order keeps every status list deterministic.
pub struct StatusAggregator<'a> {
    log: &'a EventLog,
    statuses: Vec<StatusSet>,
}

impl<'a> StatusAggregator<'a> {
    pub fn new(log: &'a EventLog) -> Self {
        Self {
            log,
            statuses: vec![StatusSet::default(); log.len()],
        }
    }

    /// Append each interval's label to the records it covers, in its own category
    pub fn add_intervals(&mut self, intervals: &[Interval]) -> &mut Self {
        for interval in intervals {
            let label = interval.label();
            for i in self.log.half_open_range(interval.start_ts, interval.end_ts) {
                self.statuses[i].get_mut(interval.category).push(label.clone());
            }
        }
        self
    }

    /// Append fixed labels to records whose own code is a single-event code
    ///
    /// Only records inside the closed `[start, end]` window are labelled, the
    /// same scope the engine uses for single-event marks.
    pub fn add_singles(&mut self, singles: &[SingleEventRule], start: Timestamp, end: Timestamp) -> &mut Self {
        if singles.is_empty() {
            return self;
        }
        let records = self.log.records();
        for i in self.log.closed_range(start, end) {
            for single in singles.iter().filter(|s| s.event_code == records[i].event_code) {
                self.statuses[i].ops.push(single.label.clone());
            }
        }
        self
    }

    /// Append the flash label to every record inside a flash sub-period
    pub fn add_flash<'p, I>(&mut self, periods: I, label: &str) -> &mut Self
    where
        I: IntoIterator<Item = &'p FlashSubPeriod>,
    {
        for period in periods.into_iter().filter(|p| p.is_flash) {
            for i in self.log.half_open_range(period.start_ts, period.end_ts) {
                self.statuses[i].ops.push(label.to_string());
            }
        }
        self
    }

    /// Labels collected so far for one category, indexed like the log
    pub fn category(&self, category: StatusCategory) -> Vec<&[String]> {
        self.statuses.iter().map(|s| s.get(category)).collect()
    }

    pub fn finish(self) -> Vec<StatusSet> {
        self.statuses
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EventRecord, Timestamp};
    use chrono::{Duration, NaiveDate};

    fn ts(sec: i64) -> Timestamp {
        NaiveDate::from_ymd_opt(2024, 9, 20)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
            + Duration::seconds(sec)
    }

    fn log(seconds: &[i64]) -> EventLog {
        EventLog::new(seconds.iter().map(|&s| EventRecord::new(ts(s), 82, 1, "")).collect())
    }

    fn interval(start: i64, end: i64, parameter: i32, abbreviation: &str, category: StatusCategory) -> Interval {
        Interval {
            start_ts: ts(start),
            end_ts: ts(end),
            parameter,
            abbreviation: abbreviation.to_string(),
            category,
            start_code: 1,
            end_code: 7,
            start_descriptor: String::new(),
            end_descriptor: String::new(),
            synthetic_start: false,
            synthetic_end: false,
        }
    }

    #[test]
    fn test_overlapping_intervals_both_listed() {
        let log = log(&[0, 1, 2, 3, 5, 6]);
        let intervals = vec![
            interval(0, 5, 2, "G", StatusCategory::Phase),
            interval(2, 6, 6, "G", StatusCategory::Phase),
        ];
        let mut aggregator = StatusAggregator::new(&log);
        aggregator.add_intervals(&intervals);
        let statuses = aggregator.finish();

        assert_eq!(statuses[0].phase, vec!["2G"]);
        assert_eq!(statuses[3].phase, vec!["2G", "6G"]);
        // end is exclusive
        assert_eq!(statuses[4].phase, vec!["6G"]);
        assert!(statuses[5].phase.is_empty());
    }

    #[test]
    fn test_categories_kept_apart() {
        let log = log(&[0, 1]);
        let intervals = vec![
            interval(0, 2, 2, "G", StatusCategory::Phase),
            interval(0, 2, 1, "OG", StatusCategory::Overlap),
            interval(0, 2, 5, "Det", StatusCategory::Ops),
        ];
        let mut aggregator = StatusAggregator::new(&log);
        aggregator.add_intervals(&intervals);
        assert_eq!(aggregator.category(StatusCategory::Overlap)[1].to_vec(), vec!["1OG"]);
        let statuses = aggregator.finish();
        assert_eq!(statuses[1].phase, vec!["2G"]);
        assert_eq!(statuses[1].overlap, vec!["1OG"]);
        assert_eq!(statuses[1].ops, vec!["5Det"]);
    }

    #[test]
    fn test_single_events_and_flash() {
        let log = EventLog::new(vec![
            EventRecord::new(ts(0), 131, 3, ""),
            EventRecord::new(ts(2), 173, 5, ""),
            EventRecord::new(ts(4), 82, 1, ""),
            EventRecord::new(ts(6), 173, 2, ""),
        ]);
        let singles = vec![SingleEventRule {
            event_code: 131,
            label: "CoordChange".to_string(),
        }];
        let periods = vec![
            FlashSubPeriod::new(ts(0), ts(2), false),
            FlashSubPeriod::new(ts(2), ts(6), true),
            FlashSubPeriod::new(ts(6), ts(8), false),
        ];

        let mut aggregator = StatusAggregator::new(&log);
        aggregator.add_singles(&singles, ts(0), ts(8)).add_flash(&periods, "Flash");
        let statuses = aggregator.finish();

        assert_eq!(statuses[0].ops, vec!["CoordChange"]);
        assert_eq!(statuses[1].ops, vec!["Flash"]);
        assert_eq!(statuses[2].ops, vec!["Flash"]);
        assert!(statuses[3].ops.is_empty());
    }

    #[test]
    fn test_single_labels_limited_to_window() {
        let log = EventLog::new(vec![
            EventRecord::new(ts(0), 131, 3, ""),
            EventRecord::new(ts(5), 131, 4, ""),
            EventRecord::new(ts(10), 131, 5, ""),
            EventRecord::new(ts(12), 131, 6, ""),
        ]);
        let singles = vec![SingleEventRule {
            event_code: 131,
            label: "CoordChange".to_string(),
        }];

        let mut aggregator = StatusAggregator::new(&log);
        aggregator.add_singles(&singles, ts(5), ts(10));
        let statuses = aggregator.finish();

        assert!(statuses[0].ops.is_empty());
        assert_eq!(statuses[1].ops, vec!["CoordChange"]);
        // window end is inclusive
        assert_eq!(statuses[2].ops, vec!["CoordChange"]);
        assert!(statuses[3].ops.is_empty());
    }

    #[test]
    fn test_membership_matches_interval_predicate() {
        let log = log(&[0, 1, 2, 3, 4, 5, 6, 7]);
        let intervals = vec![
            interval(1, 4, 1, "A", StatusCategory::Ops),
            interval(3, 3, 2, "B", StatusCategory::Ops),
            interval(4, 7, 3, "C", StatusCategory::Ops),
        ];
        let mut aggregator = StatusAggregator::new(&log);
        aggregator.add_intervals(&intervals);
        let statuses = aggregator.finish();

        for (record, status) in log.iter().zip(&statuses) {
            for i in &intervals {
                assert_eq!(
                    status.ops.contains(&i.label()),
                    i.is_active_at(record.timestamp),
                    "label {} at {}",
                    i.label(),
                    record.timestamp
                );
            }
        }
    }
}
