//! Time-group banding for grid display
//!
//! Distinct timestamps are consumed two at a time; records at the first
//! timestamp of each pair get the band flag. Rows therefore alternate by moment
//! rather than by row. Cosmetic only.

use crate::event_log::EventLog;

/// Band flag for every record of the log, indexed like the log
pub fn time_groups(log: &EventLog) -> Vec<bool> {
    let mut distinct = log.iter().map(|r| r.timestamp).collect::<Vec<_>>();
    distinct.dedup();

    let mut flags = vec![false; log.len()];
    for pair in distinct.chunks_exact(2) {
        for i in log.half_open_range(pair[0], pair[1]) {
            flags[i] = true;
        }
    }
    flags
}
