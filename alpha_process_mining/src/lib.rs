#![warn(
    clippy::doc_markdown,
    missing_debug_implementations,
    rust_2018_idioms,
    missing_docs
)]
#![allow(clippy::needless_doctest_main)]
#![doc = include_str!("../README.md")]

///
/// Core data structures: event logs and Petri nets
///
pub mod core;

///
/// Process Discovery (footprints and the Alpha miner)
///
pub mod discovery;

///
/// Conformance Checking (token-based replay)
///
pub mod conformance;

#[cfg(test)]
mod tests;

#[doc(inline)]
pub use crate::core::event_data::case_centric::{Event, EventLog, EventLogActivityProjection, Trace};
#[doc(inline)]
pub use crate::core::process_models::case_centric::petri_net::{
    Marking, PetriNet, PetriNetExecution, PlaceID, TransitionID,
};
#[doc(inline)]
pub use discovery::case_centric::alpha::{AlphaMinerConfig, AlphaMinerStatistics, DiscoveryError};
#[doc(inline)]
pub use discovery::case_centric::footprint::{Footprint, Relation};
#[doc(inline)]
pub use conformance::case_centric::token_based_replay::{
    check_fitness, token_based_replay, ReplayConfig, ReplayStrategy, TokenBasedReplayError,
    TokenBasedReplayResult,
};

///
/// Discover a [`PetriNet`] from an [`EventLog`] using the Alpha miner with default [`AlphaMinerConfig`]
///
/// ```
/// use alpha_process_mining::{check_fitness, discover, Event, EventLog};
/// use alpha_process_mining::core::chrono::DateTime;
///
/// let mut log = EventLog::new();
/// for (case, acts) in [("c1", ["A", "B", "D"]), ("c2", ["A", "C", "D"])] {
///     for (i, act) in acts.iter().enumerate() {
///         let time = DateTime::from_timestamp(i as i64, 0).unwrap().fixed_offset();
///         log.add_event(case, Event::new(*act, time));
///     }
/// }
/// let net = discover(&log).unwrap();
/// assert!(net.place_by_name("({A},{B,C})").is_some());
/// assert_eq!(check_fitness(&log, &net).unwrap(), 1.0);
/// ```
pub fn discover(log: &EventLog) -> Result<PetriNet, DiscoveryError> {
    discover_with_config(log, &AlphaMinerConfig::default())
}

///
/// Discover a [`PetriNet`] from an [`EventLog`] using the Alpha miner
///
pub fn discover_with_config(
    log: &EventLog,
    config: &AlphaMinerConfig,
) -> Result<PetriNet, DiscoveryError> {
    discovery::case_centric::alpha::alpha_discover_petri_net(log, config)
}

///
/// Discover a [`PetriNet`] from an [`EventLog`] using the Alpha miner
///
/// Additionally returns [`AlphaMinerStatistics`] (sizes of intermediate results and durations)
///
pub fn discover_with_statistics(
    log: &EventLog,
    config: &AlphaMinerConfig,
) -> Result<(PetriNet, AlphaMinerStatistics), DiscoveryError> {
    discovery::case_centric::alpha::alpha_discover_petri_net_with_statistics(&log.into(), config)
}
