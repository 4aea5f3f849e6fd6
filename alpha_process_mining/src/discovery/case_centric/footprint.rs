//! Footprint (behavioral relations) of an event log

use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    fmt::Display,
};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::core::event_data::case_centric::{EventLog, EventLogActivityProjection};

///
/// Relation between two activities `a` and `b` of a [`Footprint`]
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Relation {
    /// `a → b`: `a` is directly followed by `b`, but never the other way around
    Causal,
    /// `a ← b`: `b` is directly followed by `a`, but never the other way around
    ReverseCausal,
    /// `a || b`: directly-follows in both directions
    Parallel,
    /// `a # b`: directly-follows in neither direction
    Choice,
}

impl Relation {
    /// Symbol used in footprint matrices
    pub fn symbol(&self) -> &'static str {
        match self {
            Relation::Causal => "→",
            Relation::ReverseCausal => "←",
            Relation::Parallel => "||",
            Relation::Choice => "#",
        }
    }
}

///
/// Footprint of an event log
///
/// Contains the (sorted) activity alphabet, start and end activities, and the directly-follows relation
/// from which the causal, parallel and choice relations are derived.
/// Activities are referred to by their index in [`Footprint::activities`].
///
/// Only pairs of _distinct_ activities are recorded as directly-follows;
/// an activity directly following itself is not part of the footprint.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Footprint {
    /// Sorted activity alphabet
    pub activities: Vec<String>,
    act_to_index: HashMap<String, usize>,
    /// Activities that start at least one case
    pub start_activities: BTreeSet<usize>,
    /// Activities that end at least one case
    pub end_activities: BTreeSet<usize>,
    df_frequencies: BTreeMap<(usize, usize), u64>,
}

impl Footprint {
    ///
    /// Compute the footprint of an [`EventLog`]
    ///
    /// Events of each case are considered in timestamp order.
    pub fn from_event_log(log: &EventLog) -> Self {
        Self::from_projection(&log.into())
    }

    /// Compute the footprint of an [`EventLogActivityProjection`]
    pub fn from_projection(log: &EventLogActivityProjection) -> Self {
        let start_activities: BTreeSet<usize> =
            log.traces.iter().filter_map(|(t, _)| t.first().copied()).collect();
        let end_activities: BTreeSet<usize> =
            log.traces.iter().filter_map(|(t, _)| t.last().copied()).collect();
        let df_frequencies: BTreeMap<(usize, usize), u64> = log
            .traces
            .par_iter()
            .map(|(t, w)| {
                t.windows(2)
                    .filter(|pair| pair[0] != pair[1])
                    .map(|pair| ((pair[0], pair[1]), *w))
                    .collect::<Vec<_>>()
            })
            .flatten()
            .fold(BTreeMap::<(usize, usize), u64>::new, |mut map, (df_pair, w)| {
                *map.entry(df_pair).or_insert(0) += w;
                map
            })
            .reduce(BTreeMap::new, |mut m1, m2| {
                for (k, v) in m2 {
                    *m1.entry(k).or_default() += v;
                }
                m1
            });

        Footprint {
            activities: log.activities.clone(),
            act_to_index: log.act_to_index.clone(),
            start_activities,
            end_activities,
            df_frequencies,
        }
    }

    /// Number of activities in the alphabet
    pub fn num_activities(&self) -> usize {
        self.activities.len()
    }

    /// Index of an activity label
    pub fn activity_index(&self, activity: &str) -> Option<usize> {
        self.act_to_index.get(activity).copied()
    }

    /// Label of an activity index
    pub fn activity_name(&self, act: usize) -> &str {
        &self.activities[act]
    }

    /// Checks if `a` is start activity of some case
    pub fn is_start_activity(&self, a: usize) -> bool {
        self.start_activities.contains(&a)
    }

    /// Checks if `a` is end activity of some case
    pub fn is_end_activity(&self, a: usize) -> bool {
        self.end_activities.contains(&a)
    }

    /// Checks if `b` directly follows `a` in some case
    pub fn directly_follows(&self, a: usize, b: usize) -> bool {
        self.df_frequencies.contains_key(&(a, b))
    }

    /// How often `b` directly follows `a` (over all cases)
    pub fn df_frequency(&self, a: usize, b: usize) -> u64 {
        self.df_frequencies.get(&(a, b)).copied().unwrap_or(0)
    }

    /// All directly-follows pairs with their frequency
    pub fn df_relation(&self) -> impl Iterator<Item = ((usize, usize), u64)> + '_ {
        self.df_frequencies.iter().map(|(k, v)| (*k, *v))
    }

    /// Footprint relation between `a` and `b`
    ///
    /// Since activities never directly follow themselves in the footprint, `relation(a, a)` is always [`Relation::Choice`].
    pub fn relation(&self, a: usize, b: usize) -> Relation {
        match (self.directly_follows(a, b), self.directly_follows(b, a)) {
            (true, false) => Relation::Causal,
            (false, true) => Relation::ReverseCausal,
            (true, true) => Relation::Parallel,
            (false, false) => Relation::Choice,
        }
    }

    /// Footprint relation between two activity labels (`None` if one of them is not part of the alphabet)
    pub fn relation_by_name(&self, a: &str, b: &str) -> Option<Relation> {
        Some(self.relation(self.activity_index(a)?, self.activity_index(b)?))
    }

    /// `a → b`
    pub fn is_causal(&self, a: usize, b: usize) -> bool {
        self.relation(a, b) == Relation::Causal
    }

    /// `a || b`
    pub fn is_parallel(&self, a: usize, b: usize) -> bool {
        self.relation(a, b) == Relation::Parallel
    }

    /// `a # b`
    pub fn is_choice(&self, a: usize, b: usize) -> bool {
        self.relation(a, b) == Relation::Choice
    }

    /// All causal pairs `a → b`, sorted
    pub fn causal_pairs(&self) -> Vec<(usize, usize)> {
        self.df_frequencies
            .keys()
            .filter(|(a, b)| !self.directly_follows(*b, *a))
            .copied()
            .collect()
    }
}

impl Display for Footprint {
    /// Footprint matrix (rows: `a`, columns: `b`, cell: relation of `a` and `b`)
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let width = self
            .activities
            .iter()
            .map(|a| a.chars().count())
            .max()
            .unwrap_or(0)
            .max(2);
        write!(f, "{:width$}", "")?;
        for b in &self.activities {
            write!(f, " | {:width$}", b)?;
        }
        writeln!(f)?;
        for (a, name) in self.activities.iter().enumerate() {
            write!(f, "{:width$}", name)?;
            for b in 0..self.activities.len() {
                write!(f, " | {:width$}", self.relation(a, b).symbol())?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{clean_log, log_from_sequences};

    #[test]
    fn clean_log_footprint() {
        let fp = Footprint::from_event_log(&clean_log());
        assert_eq!(fp.activities, vec!["A", "B", "C", "D"]);
        let idx = |a: &str| fp.activity_index(a).unwrap();
        assert_eq!(
            fp.start_activities,
            vec![idx("A")].into_iter().collect::<BTreeSet<_>>()
        );
        assert_eq!(
            fp.end_activities,
            vec![idx("D")].into_iter().collect::<BTreeSet<_>>()
        );
        assert_eq!(
            fp.causal_pairs(),
            vec![
                (idx("A"), idx("B")),
                (idx("A"), idx("C")),
                (idx("B"), idx("D")),
                (idx("C"), idx("D"))
            ]
        );
        assert_eq!(fp.relation_by_name("B", "C"), Some(Relation::Choice));
        assert_eq!(fp.relation_by_name("D", "B"), Some(Relation::ReverseCausal));
        assert_eq!(fp.relation_by_name("A", "X"), None);
    }

    #[test]
    fn parallel_and_frequencies() {
        let log = log_from_sequences(&[
            ("1", &["a", "b", "c", "d"]),
            ("2", &["a", "c", "b", "d"]),
            ("3", &["a", "b", "c", "d"]),
            ("4", &["a", "a", "d"]),
        ]);
        let fp = Footprint::from_event_log(&log);
        let [a, b, c, d] = ["a", "b", "c", "d"].map(|x| fp.activity_index(x).unwrap());
        assert!(fp.is_parallel(b, c));
        assert!(fp.is_parallel(c, b));
        assert!(fp.is_causal(a, b));
        assert!(fp.is_choice(b, b));
        assert_eq!(fp.df_frequency(b, c), 2);
        assert_eq!(fp.df_frequency(c, b), 1);
        assert_eq!(fp.df_frequency(a, d), 1);
        // Self loops are not recorded
        assert!(!fp.directly_follows(a, a));
        assert_eq!(fp.df_frequency(a, a), 0);
    }

    #[test]
    fn relations_partition_distinct_pairs() {
        let log = log_from_sequences(&[
            ("1", &["a", "b", "c", "e"]),
            ("2", &["a", "c", "b", "e"]),
            ("3", &["a", "d", "e"]),
            ("4", &["d", "b", "a"]),
        ]);
        let fp = Footprint::from_event_log(&log);
        let n = fp.num_activities();
        for a in 0..n {
            for b in 0..n {
                if a == b {
                    continue;
                }
                let holds = [
                    fp.is_causal(a, b),
                    fp.is_causal(b, a),
                    fp.is_parallel(a, b),
                    fp.is_choice(a, b),
                ];
                assert_eq!(holds.iter().filter(|h| **h).count(), 1, "{a} {b}");
            }
        }
    }

    #[test]
    fn footprint_matrix_display() {
        let fp = Footprint::from_event_log(&clean_log());
        let rendered = fp.to_string();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[1], "A  | #  | →  | →  | # ");
        assert_eq!(lines[4], "D  | #  | ←  | ←  | # ");
    }
}
