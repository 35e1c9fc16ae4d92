//! Boundary repair
//!
//! A channel cut by the period edges can open with an end (its start happened
//! before the period) or close with a start (its end happens after). Both get a
//! synthetic counterpart pinned to the period edge.

use super::channel::{Channel, ChannelEvent};
use crate::config::{DescriptorTable, PairingRule};
use crate::types::{EngineError, EventRecord, Result, Timestamp, SYNTHETIC_MARKER};

/// Make a repaired channel start with a start and finish with an end
///
/// Channels that already satisfy this are returned unchanged, so repeated
/// calls are a no-op. Synthetic records carry the code's descriptor with the
/// `**` marker appended. Fails with [`EngineError::UnresolvableOrphan`] when
/// the period bounds do not enclose the channel.
pub fn repair_boundaries(
    mut channel: Channel,
    rule: &PairingRule,
    period_start: Timestamp,
    period_end: Timestamp,
    descriptors: &DescriptorTable,
) -> Result<Channel> {
    let (Some(first), Some(last)) = (channel.events.first().cloned(), channel.events.last().cloned())
    else {
        return Ok(channel);
    };

    let orphan = |reason: String| EngineError::UnresolvableOrphan {
        start_code: rule.start_code,
        parameter: channel.parameter,
        reason,
    };

    if period_start > period_end {
        return Err(orphan(format!(
            "period start {} is after period end {}",
            period_start, period_end
        )));
    }

    if rule.is_end(first.event_code()) {
        if period_start > first.timestamp() {
            return Err(orphan(format!(
                "leading end at {} precedes period start {}",
                first.timestamp(),
                period_start
            )));
        }
        let descriptor = synthetic_descriptor(descriptors, rule.start_code, channel.parameter);
        channel.events.insert(
            0,
            ChannelEvent::synthetic(EventRecord::new(
                period_start,
                rule.start_code,
                channel.parameter,
                descriptor,
            )),
        );
        log::trace!(
            "Synthesized start at {} for channel {}/{}",
            period_start,
            rule.start_code,
            channel.parameter
        );
    }

    if rule.is_start(last.event_code()) {
        if period_end < last.timestamp() {
            return Err(orphan(format!(
                "trailing start at {} follows period end {}",
                last.timestamp(),
                period_end
            )));
        }
        let end_code = rule.nominal_end_code()?;
        let descriptor = synthetic_descriptor(descriptors, end_code, channel.parameter);
        channel.events.push(ChannelEvent::synthetic(EventRecord::new(
            period_end,
            end_code,
            channel.parameter,
            descriptor,
        )));
        log::trace!(
            "Synthesized end at {} for channel {}/{}",
            period_end,
            rule.start_code,
            channel.parameter
        );
    }

    Ok(channel)
}

fn synthetic_descriptor(descriptors: &DescriptorTable, event_code: i32, parameter: i32) -> String {
    format!("{}{}", descriptors.describe(event_code, parameter), SYNTHETIC_MARKER)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn ts(sec: i64) -> Timestamp {
        NaiveDate::from_ymd_opt(2024, 8, 4)
            .unwrap()
            .and_hms_opt(14, 0, 0)
            .unwrap()
            + Duration::seconds(sec)
    }

    fn channel(events: &[(i64, i32)]) -> Channel {
        Channel::from_records(
            1,
            events
                .iter()
                .map(|&(sec, code)| EventRecord::new(ts(sec), code, 1, format!("code {}", code))),
        )
    }

    fn rule() -> PairingRule {
        PairingRule::new(1, vec![7, 9], "G").unwrap()
    }

    fn descriptors() -> DescriptorTable {
        DescriptorTable::new()
            .with_code(1, "Phase Begin Green")
            .with_code(7, "Phase Gap Out")
    }

    #[test]
    fn test_leading_end_gets_synthetic_start() {
        let repaired = repair_boundaries(channel(&[(2, 7), (3, 1), (4, 7)]), &rule(), ts(0), ts(5), &descriptors()).unwrap();
        assert_eq!(repaired.codes(), vec![1, 7, 1, 7]);
        let start = &repaired.events[0];
        assert!(start.synthetic);
        assert_eq!(start.timestamp(), ts(0));
        assert_eq!(start.record.parameter, 1);
        assert_eq!(start.record.descriptor, "Phase Begin Green**");
    }

    #[test]
    fn test_trailing_start_gets_nominal_end() {
        let repaired = repair_boundaries(channel(&[(1, 1), (2, 9), (3, 1)]), &rule(), ts(0), ts(5), &descriptors()).unwrap();
        assert_eq!(repaired.codes(), vec![1, 9, 1, 7]);
        let end = repaired.events.last().unwrap();
        assert!(end.synthetic);
        assert_eq!(end.timestamp(), ts(5));
        assert_eq!(end.record.descriptor, "Phase Gap Out**");
    }

    #[test]
    fn test_single_orphan_end_and_start() {
        let repaired = repair_boundaries(channel(&[(2, 9)]), &rule(), ts(0), ts(5), &descriptors()).unwrap();
        assert_eq!(repaired.codes(), vec![1, 9]);

        let repaired = repair_boundaries(channel(&[(2, 1)]), &rule(), ts(0), ts(5), &descriptors()).unwrap();
        assert_eq!(repaired.codes(), vec![1, 7]);
    }

    #[test]
    fn test_repair_is_idempotent() {
        let once = repair_boundaries(channel(&[(2, 7), (3, 1)]), &rule(), ts(0), ts(5), &descriptors()).unwrap();
        let twice = repair_boundaries(once.clone(), &rule(), ts(0), ts(5), &descriptors()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_orphan_at_period_edge_is_degenerate() {
        let repaired = repair_boundaries(channel(&[(0, 7)]), &rule(), ts(0), ts(5), &descriptors()).unwrap();
        assert_eq!(repaired.events[0].timestamp(), repaired.events[1].timestamp());
    }

    #[test]
    fn test_unresolvable_orphan() {
        let result = repair_boundaries(channel(&[(2, 7)]), &rule(), ts(3), ts(5), &descriptors());
        assert!(matches!(result, Err(EngineError::UnresolvableOrphan { .. })));

        let result = repair_boundaries(channel(&[(2, 1)]), &rule(), ts(0), ts(1), &descriptors());
        assert!(matches!(result, Err(EngineError::UnresolvableOrphan { .. })));

        let result = repair_boundaries(channel(&[(2, 1)]), &rule(), ts(5), ts(0), &descriptors());
        assert!(matches!(result, Err(EngineError::UnresolvableOrphan { .. })));
    }

    #[test]
    fn test_rule_without_end_codes_is_an_error() {
        let mut rule = rule();
        rule.end_codes.clear();
        let result = repair_boundaries(channel(&[(2, 1)]), &rule, ts(0), ts(5), &descriptors());
        assert!(matches!(result, Err(EngineError::InvalidPairingRule { start_code: 1, .. })));
    }

    #[test]
    fn test_empty_channel_passes_through() {
        let repaired = repair_boundaries(channel(&[]), &rule(), ts(0), ts(5), &descriptors()).unwrap();
        assert!(repaired.is_empty());
    }
}
