//! Channel pairing stages
//!
//! A channel is the part of the log that belongs to one pairing rule and one
//! parameter. Each channel goes through three stages before it is zipped into
//! intervals:
//! 1. [`channel`] splits the log into per-parameter channels
//! 2. [`alternation`] collapses repeated signals so start/end alternate
//! 3. [`boundary`] synthesizes orphan endpoints at the period edges

pub mod alternation;
pub mod boundary;
pub mod channel;

pub use alternation::repair_alternation;
pub use boundary::repair_boundaries;
pub use channel::{split_channels, Channel, ChannelEvent};
