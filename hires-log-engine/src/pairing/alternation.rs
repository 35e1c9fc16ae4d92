//! Alternation repair
//!
//! Hardware occasionally reports the same signal twice in a row
//! (`start, end, end, start`). Pairing needs strict alternation, so repeated
//! signals are collapsed to their first occurrence.

use super::channel::{Channel, ChannelEvent};
use crate::config::PairingRule;

/// Collapse repeated signals in a channel, keeping the first of each run
///
/// With one end code the channel is shift-compared on raw codes: a record is
/// dropped when its code equals the previous record's code. With several end
/// codes two consecutive end records differ in code, so the comparison is on
/// role instead: the second of two adjacent end records is dropped, as is the
/// second of two adjacent start records.
///
/// The first record is always kept, even when it is an end; boundary repair
/// gives it a synthetic start.
pub fn repair_alternation(channel: Channel, rule: &PairingRule) -> Channel {
    let before = channel.len();
    let events = if rule.end_codes.len() == 1 {
        shift_compare(channel.events)
    } else {
        adjacent_roles(channel.events, rule)
    };

    if events.len() != before {
        log::trace!(
            "Collapsed {} repeated events in channel {}/{}",
            before - events.len(),
            rule.start_code,
            channel.parameter
        );
    }

    Channel::new(channel.parameter, events)
}

fn shift_compare(events: Vec<ChannelEvent>) -> Vec<ChannelEvent> {
    let mut kept = Vec::with_capacity(events.len());
    let mut previous: Option<i32> = None;
    for event in events {
        let code = event.event_code();
        if previous != Some(code) {
            kept.push(event);
        }
        previous = Some(code);
    }
    kept
}

fn adjacent_roles(events: Vec<ChannelEvent>, rule: &PairingRule) -> Vec<ChannelEvent> {
    let mut kept = Vec::with_capacity(events.len());
    let mut previous_was_end: Option<bool> = None;
    for event in events {
        let is_end = rule.is_end(event.event_code());
        if previous_was_end != Some(is_end) {
            kept.push(event);
        }
        previous_was_end = Some(is_end);
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EventRecord;
    use chrono::NaiveDate;

    fn channel(codes: &[i32]) -> Channel {
        let base = NaiveDate::from_ymd_opt(2024, 8, 4)
            .unwrap()
            .and_hms_opt(14, 0, 0)
            .unwrap();
        Channel::from_records(
            3,
            codes.iter().enumerate().map(|(i, &code)| {
                EventRecord::new(base + chrono::Duration::seconds(i as i64), code, 3, "")
            }),
        )
    }

    #[test]
    fn test_duplicate_end_collapsed() {
        let rule = PairingRule::new(1, vec![7], "G").unwrap();
        let repaired = repair_alternation(channel(&[1, 7, 7, 1, 7]), &rule);
        assert_eq!(repaired.codes(), vec![1, 7, 1, 7]);
    }

    #[test]
    fn test_leading_end_run_collapses_to_first() {
        let rule = PairingRule::new(1, vec![7], "G").unwrap();
        let repaired = repair_alternation(channel(&[7, 7, 7, 1, 7]), &rule);
        assert_eq!(repaired.codes(), vec![7, 1, 7]);
        // first occurrence wins
        assert_eq!(repaired.events[0].timestamp(), channel(&[7]).events[0].timestamp());
    }

    #[test]
    fn test_duplicate_start_collapsed() {
        let rule = PairingRule::new(1, vec![7], "G").unwrap();
        let repaired = repair_alternation(channel(&[1, 1, 7, 1]), &rule);
        assert_eq!(repaired.codes(), vec![1, 7, 1]);
    }

    #[test]
    fn test_multiple_end_codes_first_write_wins() {
        let rule = PairingRule::new(61, vec![65, 64], "OG").unwrap();
        let repaired = repair_alternation(channel(&[61, 64, 65, 61, 65, 65, 61, 61, 64]), &rule);
        assert_eq!(repaired.codes(), vec![61, 64, 61, 65, 61, 64]);
    }

    #[test]
    fn test_already_alternating_is_untouched() {
        let rule = PairingRule::new(61, vec![65, 64], "OG").unwrap();
        let original = channel(&[64, 61, 65, 61]);
        let repaired = repair_alternation(original.clone(), &rule);
        assert_eq!(repaired, original);
    }

    #[test]
    fn test_empty_channel() {
        let rule = PairingRule::new(1, vec![7], "G").unwrap();
        assert!(repair_alternation(channel(&[]), &rule).is_empty());
    }
}
