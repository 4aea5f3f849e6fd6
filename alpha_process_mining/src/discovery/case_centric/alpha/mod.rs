//! Alpha Process Discovery Algorithm
/// Alpha Place Candidate Building (independent sets and causal pairs)
pub mod candidate_building;
/// Alpha Place Candidate Pruning (maximality)
pub mod candidate_pruning;
/// Full Alpha Discovery algorithm
pub mod full;

pub use full::{
    alpha_discover_petri_net, alpha_discover_petri_net_with_statistics, AlphaMinerConfig,
    AlphaMinerStatistics, DiscoveryError,
};
