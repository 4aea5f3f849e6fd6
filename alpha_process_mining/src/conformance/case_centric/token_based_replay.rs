use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::core::{
    event_data::case_centric::{EventLog, EventLogActivityProjection},
    process_models::case_centric::petri_net::{Marking, PetriNet, PlaceID, TransitionID},
};

///
/// Errors than can occur for the input of the token-based replay algorithm
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenBasedReplayError {
    /// Error if no initial marking (or, for [`ReplayStrategy::SharedMarking`], no start place) is provided
    NoInitialMarking,
}

impl std::fmt::Display for TokenBasedReplayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenBasedReplayError::NoInitialMarking => {
                write!(f, "No initial marking")
            }
        }
    }
}

impl std::error::Error for TokenBasedReplayError {}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
/// How the marking is handled between cases
pub enum ReplayStrategy {
    /// Every trace variant starts from a fresh copy of the initial marking; counters are weighted by variant frequency
    #[default]
    PerVariantReset,
    /// All cases are replayed on a single marking, injecting one token into the start place per case.
    /// Remaining tokens are only counted once, after the last case.
    SharedMarking,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
/// Parameters for token-based replay
pub struct ReplayConfig {
    /// Marking handling between cases
    pub strategy: ReplayStrategy,
    /// Replay variants in parallel (only used for [`ReplayStrategy::PerVariantReset`])
    pub parallel: bool,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            strategy: ReplayStrategy::PerVariantReset,
            parallel: true,
        }
    }
}

impl ReplayConfig {
    /// Serialize replay parameters to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
    /// Deserialize replay parameters from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

///
/// Token counters of token-based replay
///
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayCounts {
    /// Produced tokens during token-based replay
    pub produced: u64,
    /// Consumed tokens during token-based replay
    pub consumed: u64,
    /// Missing tokens during token-based replay
    pub missing: u64,
    /// Remaining tokens (outside of the end place) after token-based replay
    pub remaining: u64,
    /// Events whose activity has no transition in the net
    ///
    /// Only for diagnostics, not part of the fitness.
    pub skipped_events: u64,
}

impl ReplayCounts {
    /// Computes the fitness from the produced, consumed, missing, and remaining tokens
    ///
    /// `0.5 * (1 - missing/consumed) + 0.5 * (1 - remaining/produced)`, where a term with zero denominator is `1.0`.
    /// The result is always in `[0, 1]`.
    pub fn compute_fitness(&self) -> f64 {
        let term = |num: u64, denom: u64| {
            if denom == 0 {
                1.0
            } else {
                1.0 - (num as f64 / denom as f64).clamp(0.0, 1.0)
            }
        };
        (0.5 * term(self.missing, self.consumed) + 0.5 * term(self.remaining, self.produced))
            .clamp(0.0, 1.0)
    }

    fn weighted(&self, w: u64) -> ReplayCounts {
        ReplayCounts {
            produced: self.produced * w,
            consumed: self.consumed * w,
            missing: self.missing * w,
            remaining: self.remaining * w,
            skipped_events: self.skipped_events * w,
        }
    }
}

impl std::ops::AddAssign for ReplayCounts {
    fn add_assign(&mut self, rhs: Self) {
        self.produced += rhs.produced;
        self.consumed += rhs.consumed;
        self.missing += rhs.missing;
        self.remaining += rhs.remaining;
        self.skipped_events += rhs.skipped_events;
    }
}

///
/// Replay result of one trace variant
///
/// With [`ReplayStrategy::SharedMarking`], tokens left behind by a case stay in the shared marking
/// and are only counted once in [`TokenBasedReplayResult::totals`].
/// The per-variant `counts` then belong to the _last_ replayed case of the variant,
/// `counts.remaining` is always 0 and `fitness` only reflects missing tokens.
///
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantReplayResult {
    /// Activities of the variant
    pub activities: Vec<String>,
    /// Number of cases with this variant
    pub frequency: u64,
    /// Counters for a _single_ case of this variant (the last one for a shared marking)
    pub counts: ReplayCounts,
    /// Fitness of a single case of this variant computed from `counts`
    pub fitness: f64,
}

///
/// Result from the token-based replay computation
///
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenBasedReplayResult {
    /// Counters summed over all cases
    pub totals: ReplayCounts,
    /// Per-variant breakdown (in variant order of [`EventLogActivityProjection`])
    pub variants: Vec<VariantReplayResult>,
}

impl TokenBasedReplayResult {
    /// Initializes a [`TokenBasedReplayResult`]
    pub fn new() -> TokenBasedReplayResult {
        Self::default()
    }

    /// Computes the fitness from the total produced, consumed, missing, and remaining tokens
    pub fn compute_fitness(&self) -> f64 {
        self.totals.compute_fitness()
    }
}

/// Tokens left in `marking`, not counting `end_place`
fn remaining_tokens(marking: &Marking, end_place: Option<PlaceID>) -> u64 {
    marking
        .iter()
        .filter(|(p, _)| Some(*p) != end_place)
        .map(|(_, c)| c)
        .sum()
}

/// Fire the transitions of one case in `marking`; `None` stands for an activity unknown to the net
fn replay_case(
    petri_net: &PetriNet,
    marking: &mut Marking,
    case: &[Option<TransitionID>],
) -> ReplayCounts {
    let mut counts = ReplayCounts::default();
    for t in case {
        match t {
            Some(t) => {
                let res = petri_net.force_fire_in(marking, *t);
                counts.missing += res.missing;
                counts.consumed += res.consumed;
                counts.produced += res.produced;
            }
            None => counts.skipped_events += 1,
        }
    }
    counts
}

///
/// Computes token-based replay of `event_log` on `petri_net` (see [`ReplayStrategy`])
///
/// Activities are matched to transitions by label. Events of activities without a transition are skipped.
///
pub fn token_based_replay(
    petri_net: &PetriNet,
    event_log: &EventLog,
    config: &ReplayConfig,
) -> Result<TokenBasedReplayResult, TokenBasedReplayError> {
    let log_proj: EventLogActivityProjection = event_log.into();
    let act_to_transition: Vec<Option<TransitionID>> = log_proj
        .activities
        .iter()
        .map(|act| petri_net.transition_by_label(act))
        .collect();
    let unknown: Vec<&String> = log_proj
        .activities
        .iter()
        .zip(&act_to_transition)
        .filter_map(|(act, t)| t.is_none().then_some(act))
        .collect();
    if !unknown.is_empty() {
        log::debug!("Skipping activities without transition: {:?}", unknown);
    }
    let variants: Vec<(Vec<Option<TransitionID>>, u64)> = log_proj
        .traces
        .iter()
        .map(|(trace, w)| (trace.iter().map(|a| act_to_transition[*a]).collect(), *w))
        .collect();

    let (totals, counts) = match config.strategy {
        ReplayStrategy::PerVariantReset => {
            let initial_marking = petri_net
                .initial_marking()
                .ok_or(TokenBasedReplayError::NoInitialMarking)?;
            let replay_variant = |(case, _w): &(Vec<Option<TransitionID>>, u64)| {
                let mut marking = initial_marking.clone();
                let mut counts = replay_case(petri_net, &mut marking, case);
                counts.remaining = remaining_tokens(&marking, petri_net.end_place());
                counts
            };
            let counts: Vec<ReplayCounts> = if config.parallel {
                variants.par_iter().map(replay_variant).collect()
            } else {
                variants.iter().map(replay_variant).collect()
            };
            let mut totals = ReplayCounts::default();
            for (c, (_, w)) in counts.iter().zip(&variants) {
                totals += c.weighted(*w);
            }
            (totals, counts)
        }
        ReplayStrategy::SharedMarking => {
            let start_place = petri_net
                .start_place()
                .ok_or(TokenBasedReplayError::NoInitialMarking)?;
            let mut exec = petri_net.execute_from(Marking::new());
            let mut totals = ReplayCounts::default();
            let mut counts = Vec::with_capacity(variants.len());
            for (case, w) in &variants {
                let mut variant_counts = ReplayCounts::default();
                for _ in 0..*w {
                    exec.add_marking(start_place)
                        .map_err(|_| TokenBasedReplayError::NoInitialMarking)?;
                    let mut marking = exec.snapshot_marking();
                    variant_counts = replay_case(petri_net, &mut marking, case);
                    exec.restore_marking(marking);
                    totals += variant_counts;
                }
                counts.push(variant_counts);
            }
            totals.remaining = remaining_tokens(exec.marking(), petri_net.end_place());
            (totals, counts)
        }
    };

    let variants = log_proj
        .traces
        .iter()
        .zip(counts)
        .map(|((trace, w), counts)| VariantReplayResult {
            activities: log_proj.trace_to_names(trace),
            frequency: *w,
            counts,
            fitness: counts.compute_fitness(),
        })
        .collect();
    let result = TokenBasedReplayResult { totals, variants };
    log::debug!(
        "Token-based replay: produced {}, consumed {}, missing {}, remaining {}, skipped events {}",
        totals.produced,
        totals.consumed,
        totals.missing,
        totals.remaining,
        totals.skipped_events
    );
    Ok(result)
}

///
/// Fitness of `event_log` on `petri_net` using per-variant token-based replay
///
/// See [`ReplayCounts::compute_fitness`] for the formula.
pub fn check_fitness(
    event_log: &EventLog,
    petri_net: &PetriNet,
) -> Result<f64, TokenBasedReplayError> {
    let fitness =
        token_based_replay(petri_net, event_log, &ReplayConfig::default())?.compute_fitness();
    log::info!("Token-based replay fitness: {fitness:.4}");
    Ok(fitness)
}
