//! Case-centric process discovery
/// Alpha miner
pub mod alpha;
/// Footprint (directly-follows based behavioral relations) of an event log
pub mod footprint;
