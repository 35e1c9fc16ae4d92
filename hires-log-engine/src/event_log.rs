//! Ordered, immutable event log for one site and time window

use crate::config::DescriptorTable;
use crate::types::{EventRecord, RawEvent, Timestamp};
use serde::Serialize;

/// Ordered sequence of event records
///
/// Records are sorted by timestamp, ties broken by event code. The sort is
/// stable, so records sharing both keep their input order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EventLog {
    records: Vec<EventRecord>,
}

impl EventLog {
    /// Build a log from already annotated records
    pub fn new(mut records: Vec<EventRecord>) -> Self {
        records.sort_by_key(|r| (r.timestamp, r.event_code));
        Self { records }
    }

    /// Build a log from raw events, attaching descriptors from the lookup table
    ///
    /// Codes missing from the table get the `UNKNOWN` sentinel descriptor.
    pub fn from_raw<I>(events: I, descriptors: &DescriptorTable) -> Self
    where
        I: IntoIterator<Item = RawEvent>,
    {
        let mut unknown = 0usize;
        let records = events
            .into_iter()
            .map(|e| {
                let descriptor = match descriptors.resolve(e.event_code, e.parameter) {
                    Ok(text) => text,
                    Err(err) => {
                        unknown += 1;
                        log::trace!("{}", err);
                        crate::types::UNKNOWN_DESCRIPTOR
                    }
                };
                EventRecord::new(e.timestamp, e.event_code, e.parameter, descriptor)
            })
            .collect();

        if unknown > 0 {
            log::debug!("{} records have no descriptor", unknown);
        }

        Self::new(records)
    }

    pub fn records(&self) -> &[EventRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, EventRecord> {
        self.records.iter()
    }

    pub fn first_timestamp(&self) -> Option<Timestamp> {
        self.records.first().map(|r| r.timestamp)
    }

    pub fn last_timestamp(&self) -> Option<Timestamp> {
        self.records.last().map(|r| r.timestamp)
    }

    /// Records with `start <= timestamp <= end`, as a borrowed slice
    pub fn between(&self, start: Timestamp, end: Timestamp) -> &[EventRecord] {
        &self.records[self.closed_range(start, end)]
    }

    /// Index range of records with `start <= timestamp <= end`
    pub fn closed_range(&self, start: Timestamp, end: Timestamp) -> std::ops::Range<usize> {
        let lo = self.records.partition_point(|r| r.timestamp < start);
        let hi = self.records.partition_point(|r| r.timestamp <= end);
        lo..hi.max(lo)
    }

    /// Index range of records with `start <= timestamp < end`
    pub fn half_open_range(&self, start: Timestamp, end: Timestamp) -> std::ops::Range<usize> {
        let lo = self.records.partition_point(|r| r.timestamp < start);
        let hi = self.records.partition_point(|r| r.timestamp < end);
        lo..hi.max(lo)
    }

    /// New log holding only the records inside the closed range
    pub fn restrict(&self, start: Timestamp, end: Timestamp) -> EventLog {
        EventLog {
            records: self.between(start, end).to_vec(),
        }
    }
}

impl<'a> IntoIterator for &'a EventLog {
    type Item = &'a EventRecord;
    type IntoIter = std::slice::Iter<'a, EventRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
