//! Channel splitting
//!
//! Filters the log down to one rule's codes and groups the result by the
//! parameters the rule's start code was seen with.

use crate::config::PairingRule;
use crate::types::{EventRecord, Timestamp};
use std::collections::BTreeSet;

/// A record inside a channel, possibly synthesized by boundary repair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelEvent {
    pub record: EventRecord,
    /// True if no log record backs this event
    pub synthetic: bool,
}

impl ChannelEvent {
    pub fn observed(record: EventRecord) -> Self {
        Self {
            record,
            synthetic: false,
        }
    }

    pub fn synthetic(record: EventRecord) -> Self {
        Self {
            record,
            synthetic: true,
        }
    }

    pub fn timestamp(&self) -> Timestamp {
        self.record.timestamp
    }

    pub fn event_code(&self) -> i32 {
        self.record.event_code
    }
}

/// Ordered records of one rule for one parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub parameter: i32,
    pub events: Vec<ChannelEvent>,
}

impl Channel {
    pub fn new(parameter: i32, events: Vec<ChannelEvent>) -> Self {
        Self { parameter, events }
    }

    /// Build a channel from observed records
    pub fn from_records<I>(parameter: i32, records: I) -> Self
    where
        I: IntoIterator<Item = EventRecord>,
    {
        Self::new(parameter, records.into_iter().map(ChannelEvent::observed).collect())
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn codes(&self) -> Vec<i32> {
        self.events.iter().map(ChannelEvent::event_code).collect()
    }
}

/// Split records into one channel per start-code parameter, ascending
///
/// Parameters that only ever appear on end codes cannot open an interval and
/// are ignored.
pub fn split_channels(records: &[EventRecord], rule: &PairingRule) -> Vec<Channel> {
    let parameters: BTreeSet<i32> = records
        .iter()
        .filter(|r| rule.is_start(r.event_code))
        .map(|r| r.parameter)
        .collect();

    parameters
        .into_iter()
        .map(|parameter| {
            Channel::from_records(
                parameter,
                records
                    .iter()
                    .filter(|r| r.parameter == parameter && rule.matches(r.event_code))
                    .cloned(),
            )
        })
        .collect()
}
