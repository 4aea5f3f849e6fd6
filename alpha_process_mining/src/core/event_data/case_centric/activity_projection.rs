use std::collections::{BTreeSet, HashMap};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::event_log_struct::EventLog;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
/// Projection of an event log on just activity labels
///
/// Cases with identical activity sequences are grouped into one _variant_ together with their frequency.
///
/// Activities are sorted lexicographically, so activity indices (and thus everything derived from them)
/// do not depend on case or event insertion order.
/// Variants are sorted by their activity index sequence.
pub struct EventLogActivityProjection {
    /// Sorted activity labels; the position is the activity index
    pub activities: Vec<String>,
    /// Mapping of activity label to activity index
    pub act_to_index: HashMap<String, usize>,
    /// Trace variants (activity index sequences) with their frequency
    pub traces: Vec<(Vec<usize>, u64)>,
}

impl From<&EventLog> for EventLogActivityProjection {
    fn from(val: &EventLog) -> Self {
        let acts_per_trace: Vec<Vec<&str>> = val
            .cases
            .par_iter()
            .map(|(_case_id, trace)| trace.activities())
            .collect();
        let activities: Vec<String> = acts_per_trace
            .iter()
            .flatten()
            .copied()
            .collect::<BTreeSet<&str>>()
            .into_iter()
            .map(String::from)
            .collect();
        let act_to_index: HashMap<String, usize> = activities
            .iter()
            .enumerate()
            .map(|(i, act)| (act.clone(), i))
            .collect();
        let mut traces_set: HashMap<Vec<usize>, u64> = HashMap::new();
        acts_per_trace.iter().for_each(|t| {
            let trace: Vec<usize> = t.iter().map(|act| act_to_index[*act]).collect();
            *traces_set.entry(trace).or_insert(0) += 1;
        });
        let mut traces: Vec<(Vec<usize>, u64)> = traces_set.into_iter().collect();
        traces.sort();

        EventLogActivityProjection {
            activities,
            act_to_index,
            traces,
        }
    }
}

impl EventLogActivityProjection {
    /// Sorted activity names of a _set_ of activity indices
    pub fn acts_to_names(&self, acts: &[usize]) -> Vec<String> {
        let mut ret: Vec<String> = acts
            .iter()
            .map(|act| self.activities[*act].clone())
            .collect();
        ret.sort();
        ret
    }

    /// Activity names of a variant, keeping the order of the variant
    pub fn trace_to_names(&self, trace: &[usize]) -> Vec<String> {
        trace
            .iter()
            .map(|act| self.activities[*act].clone())
            .collect()
    }

    /// Number of cases represented by the projection (sum of variant frequencies)
    pub fn num_cases(&self) -> u64 {
        self.traces.iter().map(|(_, w)| w).sum()
    }
}
