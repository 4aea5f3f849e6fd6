//! Case-centric conformance checking
/// Token-based replay (fitness of an event log on a Petri net)
pub mod token_based_replay;
pub use token_based_replay::{
    check_fitness, token_based_replay, ReplayConfig, ReplayStrategy, TokenBasedReplayError,
    TokenBasedReplayResult,
};
