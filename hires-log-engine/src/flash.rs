//! Flash period detection
//!
//! While a controller is in flash, normal phase and overlap signaling is
//! suspended, so pairing must not run across a flash period. This module splits
//! the query window into alternating flash and non-flash sub-periods based on
//! the configured transition events.

use crate::config::{FlashConfig, FlashState};
use crate::types::{EngineError, EventRecord, FlashSubPeriod, Result, Timestamp};
use serde::Serialize;

/// Partition of a query window into flash and non-flash sub-periods
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlashPeriods {
    sub_periods: Vec<FlashSubPeriod>,
}

impl FlashPeriods {
    /// All sub-periods in time order; contiguous and covering the window
    pub fn sub_periods(&self) -> &[FlashSubPeriod] {
        &self.sub_periods
    }

    /// Sub-periods during which normal pairing holds
    pub fn normal(&self) -> impl Iterator<Item = &FlashSubPeriod> {
        self.sub_periods.iter().filter(|p| !p.is_flash)
    }

    /// Sub-periods spent in flash
    pub fn flash(&self) -> impl Iterator<Item = &FlashSubPeriod> {
        self.sub_periods.iter().filter(|p| p.is_flash)
    }

    pub fn has_flash(&self) -> bool {
        self.sub_periods.iter().any(|p| p.is_flash)
    }

    pub fn into_inner(self) -> Vec<FlashSubPeriod> {
        self.sub_periods
    }
}

/// Split `[window_start, window_end]` into flash and non-flash sub-periods
///
/// Only transitions inside the window are considered. Repeated transitions into
/// the same state are collapsed to the first. The window edges get virtual
/// markers in the state opposite to the nearest real transition, so a window
/// that opens mid-flash starts with a flash sub-period. A flash entered and left
/// at the same instant leaves the surrounding period whole, and the result
/// always holds at least one sub-period.
pub fn detect_flash_periods(
    records: &[EventRecord],
    config: &FlashConfig,
    window_start: Timestamp,
    window_end: Timestamp,
) -> Result<FlashPeriods> {
    if window_start > window_end {
        return Err(EngineError::InvalidWindow {
            start: window_start,
            end: window_end,
        });
    }

    let mut transitions: Vec<(Timestamp, FlashState)> = Vec::new();
    for record in records
        .iter()
        .filter(|r| r.timestamp >= window_start && r.timestamp <= window_end)
    {
        if let Some(state) = config.classify(record) {
            if transitions.last().map(|&(_, s)| s) != Some(state) {
                transitions.push((record.timestamp, state));
            }
        }
    }

    let (Some(&(_, first)), Some(&(_, last))) = (transitions.first(), transitions.last()) else {
        log::debug!("No flash transitions between {} and {}", window_start, window_end);
        return Ok(FlashPeriods {
            sub_periods: vec![FlashSubPeriod::new(window_start, window_end, false)],
        });
    };

    let mut markers = Vec::with_capacity(transitions.len() + 2);
    markers.push((window_start, first.complement()));
    markers.extend(transitions.iter().copied());
    markers.push((window_end, last.complement()));

    // Walk marker pairs; an instantaneous toggle leaves two neighbours in the
    // same state, which are merged back into one sub-period
    let mut sub_periods: Vec<FlashSubPeriod> = Vec::with_capacity(markers.len());
    for pair in markers.windows(2).filter(|pair| pair[0].0 < pair[1].0) {
        let is_flash = pair[0].1 == FlashState::Enter;
        if let Some(previous) = sub_periods.last_mut().filter(|p| p.is_flash == is_flash) {
            previous.end_ts = pair[1].0;
            continue;
        }
        sub_periods.push(FlashSubPeriod::new(pair[0].0, pair[1].0, is_flash));
    }

    // Zero-length window: the state left by the last transition holds
    if sub_periods.is_empty() {
        sub_periods.push(FlashSubPeriod::new(
            window_start,
            window_end,
            last == FlashState::Enter,
        ));
    }

    log::debug!(
        "Detected {} flash transitions, {} sub-periods",
        transitions.len(),
        sub_periods.len()
    );

    Ok(FlashPeriods { sub_periods })
}
