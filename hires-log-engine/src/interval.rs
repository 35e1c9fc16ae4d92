//! Interval building
//!
//! Runs every pairing rule over every non-flash sub-period, repairs each
//! channel and zips its alternating start/end records into intervals.

use crate::config::{DescriptorTable, PairingRule, ReferenceData};
use crate::event_log::EventLog;
use crate::flash::FlashPeriods;
use crate::pairing::{repair_alternation, repair_boundaries, split_channels, Channel, ChannelEvent};
use crate::types::{FlashSubPeriod, Interval};

/// Build intervals for all rules over the non-flash parts of the window
///
/// Output order is rule table order, then sub-period, then parameter, then
/// time. A channel that cannot be repaired is skipped; the remaining channels
/// and rules are still processed.
pub fn build_intervals(log: &EventLog, reference: &ReferenceData, periods: &FlashPeriods) -> Vec<Interval> {
    let mut intervals = Vec::new();
    for rule in reference.pairs.iter() {
        let before = intervals.len();

        // Flash sub-periods are never paired
        for period in periods.normal() {
            intervals.extend(build_rule_intervals(log, rule, period, &reference.descriptors));
        }
        if intervals.len() == before {
            log::debug!(
                "Rule {} -> {:?} ({}) inactive in this window",
                rule.start_code,
                rule.end_codes,
                rule.abbreviation
            );
        }
    }
    intervals
}

/// Build intervals for one rule inside one sub-period
pub fn build_rule_intervals(
    log: &EventLog,
    rule: &PairingRule,
    period: &FlashSubPeriod,
    descriptors: &DescriptorTable,
) -> Vec<Interval> {
    let records = log.between(period.start_ts, period.end_ts);
    let mut intervals = Vec::new();

    for channel in split_channels(records, rule) {
        let parameter = channel.parameter;

        // Drop repeated signals, then close the edges of the period
        let channel = repair_alternation(channel, rule);
        match repair_boundaries(channel, rule, period.start_ts, period.end_ts, descriptors) {
            Ok(channel) => {
                // Zip starts with ends
                let paired = pair_channel(&channel, rule);
                if paired.is_empty() {
                    log::debug!("Empty channel {}/{}", rule.start_code, parameter);
                }
                intervals.extend(paired);
            }
            Err(e) => {
                log::warn!("Skipping channel {}/{}: {}", rule.start_code, parameter, e);
            }
        }
    }

    intervals
}

/// Zip the n-th start with the n-th end of an alternating channel
pub fn pair_channel(channel: &Channel, rule: &PairingRule) -> Vec<Interval> {
    let starts = channel.events.iter().filter(|e| rule.is_start(e.event_code()));
    let ends = channel.events.iter().filter(|e| rule.is_end(e.event_code()));

    starts
        .zip(ends)
        .map(|(start, end)| make_interval(start, end, channel.parameter, rule))
        .collect()
}

fn make_interval(start: &ChannelEvent, end: &ChannelEvent, parameter: i32, rule: &PairingRule) -> Interval {
    Interval {
        start_ts: start.timestamp(),
        end_ts: end.timestamp(),
        parameter,
        abbreviation: rule.abbreviation.clone(),
        category: rule.category,
        start_code: start.event_code(),
        end_code: end.event_code(),
        start_descriptor: start.record.descriptor.clone(),
        end_descriptor: end.record.descriptor.clone(),
        synthetic_start: start.synthetic,
        synthetic_end: end.synthetic,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flash::detect_flash_periods;
    use crate::types::{EventRecord, StatusCategory, Timestamp};
    use chrono::{Duration, NaiveDate};

    fn ts(sec: i64) -> Timestamp {
        NaiveDate::from_ymd_opt(2024, 9, 20)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
            + Duration::seconds(sec)
    }

    fn rec(sec: i64, code: i32, param: i32) -> EventRecord {
        EventRecord::new(ts(sec), code, param, format!("{}", code))
    }

    fn reference() -> ReferenceData {
        ReferenceData::new()
            .add_rule(
                PairingRule::new(1, vec![7], "G")
                    .unwrap()
                    .with_category(StatusCategory::Phase),
            )
            .add_rule(
                PairingRule::new(8, vec![9], "Y")
                    .unwrap()
                    .with_category(StatusCategory::Phase),
            )
    }

    fn spans(intervals: &[Interval]) -> Vec<(i64, i64, i32, &str)> {
        intervals
            .iter()
            .map(|i| {
                (
                    (i.start_ts - ts(0)).num_seconds(),
                    (i.end_ts - ts(0)).num_seconds(),
                    i.parameter,
                    i.abbreviation.as_str(),
                )
            })
            .collect()
    }

    fn run(records: Vec<EventRecord>, start: i64, end: i64) -> Vec<Interval> {
        let log = EventLog::new(records);
        let reference = reference();
        let periods = detect_flash_periods(log.records(), &reference.flash, ts(start), ts(end)).unwrap();
        build_intervals(&log, &reference, &periods)
    }

    #[test]
    fn test_rule_then_parameter_order() {
        let intervals = run(
            vec![
                rec(1, 1, 6),
                rec(2, 1, 2),
                rec(3, 7, 2),
                rec(4, 8, 2),
                rec(5, 7, 6),
                rec(6, 9, 2),
            ],
            0,
            10,
        );
        assert_eq!(
            spans(&intervals),
            vec![(2, 3, 2, "G"), (1, 5, 6, "G"), (4, 6, 2, "Y")]
        );
        assert_eq!(intervals[0].start_code, 1);
        assert_eq!(intervals[0].end_code, 7);
        assert_eq!(intervals[0].category, StatusCategory::Phase);
    }

    #[test]
    fn test_pairing_skips_flash_period() {
        let intervals = run(
            vec![
                rec(1, 1, 2),
                rec(3, 7, 2),
                rec(5, 173, 5),
                rec(6, 1, 2),
                rec(7, 7, 2),
                rec(8, 173, 2),
                rec(9, 1, 2),
            ],
            0,
            12,
        );
        assert_eq!(spans(&intervals), vec![(1, 3, 2, "G"), (9, 12, 2, "G")]);
        assert!(intervals[1].synthetic_end);
        assert!(!intervals[1].synthetic_start);
    }

    #[test]
    fn test_rule_with_no_end_codes_in_log() {
        let intervals = run(vec![rec(1, 8, 4)], 0, 10);
        assert_eq!(spans(&intervals), vec![(1, 10, 4, "Y")]);
        assert!(intervals[0].synthetic_end);
    }

    #[test]
    fn test_pair_channel_alternation_invariant() {
        let rule = PairingRule::new(61, vec![65, 64], "OG").unwrap();
        let channel = Channel::from_records(
            1,
            vec![rec(1, 61, 1), rec(2, 64, 1), rec(3, 61, 1), rec(4, 65, 1)],
        );
        let intervals = pair_channel(&channel, &rule);
        assert_eq!(intervals.len(), 2);
        for i in &intervals {
            assert_eq!(i.start_code, rule.start_code);
            assert!(rule.end_codes.contains(&i.end_code));
        }
        assert!(intervals[0].end_ts <= intervals[1].start_ts);
    }
}
