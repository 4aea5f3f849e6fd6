use std::{
    fmt::Display,
    time::{SystemTime, UNIX_EPOCH},
};

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{
    core::{
        event_data::case_centric::{EventLog, EventLogActivityProjection},
        process_models::case_centric::petri_net::{PetriNet, PetriNetError, TransitionID},
    },
    discovery::case_centric::footprint::Footprint,
};

use super::{
    candidate_building::{
        build_candidates, independent_sets, set_to_indices, ActivitySet, RelationMasks,
        MAX_ALPHABET_SIZE,
    },
    candidate_pruning::maximal_candidates,
};

/// Name of the place holding the initial token
pub const START_PLACE_NAME: &str = "start";
/// Name of the place fed by all end activities
pub const END_PLACE_NAME: &str = "end";

/// Alphabet size above which a slow candidate search is reported
const LARGE_ALPHABET: usize = 16;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
/// Algorithm parameters for the Alpha miner
pub struct AlphaMinerConfig {
    /// Maximal number of distinct activities of a log (at most [`MAX_ALPHABET_SIZE`])
    ///
    /// The candidate search is exponential in the number of activities.
    pub max_activities: usize,
}

impl Default for AlphaMinerConfig {
    fn default() -> Self {
        Self { max_activities: 20 }
    }
}

impl AlphaMinerConfig {
    /// Serialize Alpha miner parameters to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
    /// Deserialize Alpha miner parameters from JSON string
    ///
    /// Missing fields are set to their default value.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Check that the configuration can be used for discovery
    pub fn validate(&self) -> Result<(), DiscoveryError> {
        if self.max_activities > MAX_ALPHABET_SIZE {
            return Err(DiscoveryError::InvalidConfig(format!(
                "max_activities is {}, but at most {} activities are supported",
                self.max_activities, MAX_ALPHABET_SIZE
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Errors of the Alpha miner
pub enum DiscoveryError {
    /// The log contains more distinct activities than allowed by [`AlphaMinerConfig::max_activities`]
    TooManyActivities {
        /// Number of distinct activities in the log
        found: usize,
        /// Configured limit
        limit: usize,
    },
    /// Unusable [`AlphaMinerConfig`]
    InvalidConfig(String),
    /// Building the resulting [`PetriNet`] failed
    PetriNet(PetriNetError),
}

impl Display for DiscoveryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiscoveryError::TooManyActivities { found, limit } => write!(
                f,
                "Log contains {found} distinct activities, but at most {limit} are allowed"
            ),
            DiscoveryError::InvalidConfig(reason) => write!(f, "Invalid configuration: {reason}"),
            DiscoveryError::PetriNet(e) => write!(f, "Could not build Petri net: {e}"),
        }
    }
}

impl std::error::Error for DiscoveryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DiscoveryError::PetriNet(e) => Some(e),
            _ => None,
        }
    }
}

impl From<PetriNetError> for DiscoveryError {
    fn from(e: PetriNetError) -> Self {
        DiscoveryError::PetriNet(e)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
/// Sizes of intermediate results and durations (in seconds) per part of the Alpha miner (+ total time)
pub struct AlphaMinerStatistics {
    /// Number of distinct activities
    pub num_activities: usize,
    /// Number of independent activity sets (candidate sides)
    pub num_independent_sets: usize,
    /// Number of place candidates `(A, B)`
    pub num_candidates: usize,
    /// Number of maximal place candidates (= places between transitions)
    pub num_maximal_candidates: usize,
    /// Duration for computing the footprint (in seconds)
    pub footprint: f32,
    /// Duration for building place candidates (in seconds)
    pub cnd_building: f32,
    /// Duration for pruning place candidates (in seconds)
    pub prune_cnd: f32,
    /// Duration for constructing Petri net (in seconds)
    pub build_net: f32,
    /// Total duration (in seconds)
    pub total: f32,
}

impl AlphaMinerStatistics {
    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Get current system time milliseconds
pub fn get_current_time_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}

fn seconds_since(start: u128, get_time_millis_fn: &dyn Fn() -> u128) -> f32 {
    get_time_millis_fn().saturating_sub(start) as f32 / 1000.0
}

/// Name of the place for candidate `(A, B)`, e.g. `({A},{B,C})`
pub fn candidate_place_name(fp: &Footprint, (a, b): (ActivitySet, ActivitySet)) -> String {
    let names = |set: ActivitySet| {
        set_to_indices(set)
            .into_iter()
            .map(|act| fp.activity_name(act))
            .join(",")
    };
    format!("({{{}}},{{{}}})", names(a), names(b))
}

///
/// Discover a [`PetriNet`] from an [`EventLog`] using the Alpha miner
///
pub fn alpha_discover_petri_net(
    log: &EventLog,
    config: &AlphaMinerConfig,
) -> Result<PetriNet, DiscoveryError> {
    let log_proj: EventLogActivityProjection = log.into();
    alpha_discover_petri_net_with_statistics(&log_proj, config).map(|(net, _)| net)
}

///
/// Discover a [`PetriNet`] using the Alpha miner
///
/// Additionally returns [`AlphaMinerStatistics`] for performance measurements
///
pub fn alpha_discover_petri_net_with_statistics(
    log_proj: &EventLogActivityProjection,
    config: &AlphaMinerConfig,
) -> Result<(PetriNet, AlphaMinerStatistics), DiscoveryError> {
    alpha_discover_petri_net_with_timing_fn(log_proj, config, &get_current_time_millis)
}

/// Run Alpha miner discovery
///
/// Measures durations of [`AlphaMinerStatistics`] using the passed `get_time_millis_fn` function
pub fn alpha_discover_petri_net_with_timing_fn(
    log_proj: &EventLogActivityProjection,
    config: &AlphaMinerConfig,
    get_time_millis_fn: &dyn Fn() -> u128,
) -> Result<(PetriNet, AlphaMinerStatistics), DiscoveryError> {
    config.validate()?;
    let num_activities = log_proj.activities.len();
    if num_activities > config.max_activities {
        return Err(DiscoveryError::TooManyActivities {
            found: num_activities,
            limit: config.max_activities,
        });
    }
    log::info!("Started Alpha Discovery ({num_activities} activities)");
    if num_activities > LARGE_ALPHABET {
        log::warn!(
            "Candidate search is exponential in the number of activities; \
             {num_activities} activities may take long"
        );
    }
    let mut stats = AlphaMinerStatistics {
        num_activities,
        ..Default::default()
    };
    let total_start = get_time_millis_fn();

    let mut start = get_time_millis_fn();
    let fp = Footprint::from_projection(log_proj);
    let masks = RelationMasks::from_footprint(&fp);
    stats.footprint = seconds_since(start, get_time_millis_fn);
    log::debug!(
        "Footprint: {} directly-follows pairs, {} start and {} end activities",
        fp.df_relation().count(),
        fp.start_activities.len(),
        fp.end_activities.len()
    );

    start = get_time_millis_fn();
    let sides = independent_sets(&masks);
    stats.num_independent_sets = sides.len();
    let cnds = build_candidates(&masks, &sides);
    stats.num_candidates = cnds.len();
    stats.cnd_building = seconds_since(start, get_time_millis_fn);
    log::debug!(
        "Built {} candidates from {} independent sets",
        cnds.len(),
        sides.len()
    );
    log::debug!("Building candidates took: {:.4}s", stats.cnd_building);

    start = get_time_millis_fn();
    let sel = maximal_candidates(&cnds);
    stats.num_maximal_candidates = sel.len();
    stats.prune_cnd = seconds_since(start, get_time_millis_fn);
    log::debug!("Kept {} maximal candidates", sel.len());
    log::debug!("Pruning candidates took: {:.4}s", stats.prune_cnd);

    start = get_time_millis_fn();
    let pn = build_petri_net(&fp, &sel)?;
    stats.build_net = seconds_since(start, get_time_millis_fn);
    stats.total = seconds_since(total_start, get_time_millis_fn);
    log::info!(
        "Discovered Petri net with {} places and {} transitions in {:.4}s",
        pn.places().len(),
        pn.transitions().len(),
        stats.total
    );
    Ok((pn, stats))
}

///
/// Construct the [`PetriNet`] for the maximal candidates `sel` (in canonical order)
///
/// Transitions are created in alphabet order. Places are created in the order
/// start place, one place per candidate in `sel`, end place.
fn build_petri_net(
    fp: &Footprint,
    sel: &[(ActivitySet, ActivitySet)],
) -> Result<PetriNet, DiscoveryError> {
    let mut pn = PetriNet::new();
    let transitions: Vec<TransitionID> = fp
        .activities
        .iter()
        .map(|act| pn.add_transition(act.as_str()))
        .collect();

    let start_place = pn.add_place(START_PLACE_NAME);
    for a in &fp.start_activities {
        pn.add_arc(start_place, transitions[*a])?;
    }

    for (a, b) in sel {
        let p = pn.add_place(candidate_place_name(fp, (*a, *b)));
        for act in set_to_indices(*a) {
            pn.add_arc(transitions[act], p)?;
        }
        for act in set_to_indices(*b) {
            pn.add_arc(p, transitions[act])?;
        }
    }

    let end_place = pn.add_place(END_PLACE_NAME);
    for a in &fp.end_activities {
        pn.add_arc(transitions[*a], end_place)?;
    }

    pn.set_start_place(start_place)?;
    pn.set_end_place(end_place)?;
    pn.add_to_initial_marking(start_place)?;
    Ok(pn)
}
