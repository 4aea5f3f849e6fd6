use rayon::prelude::*;

use crate::discovery::case_centric::footprint::Footprint;

/// Set of activities (bit `i` set iff activity index `i` is contained)
pub type ActivitySet = u64;

/// Largest alphabet that can be represented by an [`ActivitySet`]
pub const MAX_ALPHABET_SIZE: usize = ActivitySet::BITS as usize;

/// Activity indices contained in `set` (ascending)
pub fn set_to_indices(set: ActivitySet) -> Vec<usize> {
    let mut ret = Vec::with_capacity(set.count_ones() as usize);
    let mut rest = set;
    while rest != 0 {
        ret.push(rest.trailing_zeros() as usize);
        rest &= rest - 1;
    }
    ret
}

/// [`ActivitySet`] of the given activity indices
pub fn indices_to_set(acts: &[usize]) -> ActivitySet {
    acts.iter().fold(0, |set, a| set | (1 << a))
}

/// `a` is a subset of `b`
pub fn is_subset(a: ActivitySet, b: ActivitySet) -> bool {
    a & !b == 0
}

///
/// Per-activity bit masks of the footprint relations needed for candidate building
///
/// `independent_of[a]` contains every activity `b` with `a # b` (including `a` itself),
/// `causal_successors[a]` every `b` with `a → b`.
#[derive(Debug, Clone)]
pub struct RelationMasks {
    /// Activities in choice relation with each activity
    pub independent_of: Vec<ActivitySet>,
    /// Causal successors of each activity
    pub causal_successors: Vec<ActivitySet>,
}

impl RelationMasks {
    /// Build the relation masks of a footprint with at most [`MAX_ALPHABET_SIZE`] activities
    pub fn from_footprint(fp: &Footprint) -> Self {
        let n = fp.num_activities();
        debug_assert!(n <= MAX_ALPHABET_SIZE);
        let mask_of = |pred: &dyn Fn(usize) -> bool| -> ActivitySet {
            (0..n).filter(|b| pred(*b)).fold(0, |set, b| set | (1 << b))
        };
        RelationMasks {
            independent_of: (0..n).map(|a| mask_of(&|b| fp.is_choice(a, b))).collect(),
            causal_successors: (0..n).map(|a| mask_of(&|b| fp.is_causal(a, b))).collect(),
        }
    }

    /// Checks if all activities of `set` are pairwise in choice relation
    pub fn is_independent(&self, set: ActivitySet) -> bool {
        set_to_indices(set)
            .into_iter()
            .all(|a| is_subset(set, self.independent_of[a]))
    }

    /// Activities that are causal successors of _every_ activity in `set`
    pub fn common_causal_successors(&self, set: ActivitySet) -> ActivitySet {
        set_to_indices(set)
            .into_iter()
            .fold(ActivitySet::MAX, |common, a| common & self.causal_successors[a])
    }
}

///
/// Enumerate all nonempty independent activity sets
///
/// A set is independent if no two of its activities directly follow each other (in either direction).
/// Sets are generated by extending an independent set with an activity of a higher index than all
/// of its members. The extension is independent iff the new activity is independent of every member,
/// so validity of the parent is never checked again.
///
/// _Complexity_: Linear in the number of independent sets, which is exponential in the alphabet size
/// in the worst case (e.g., if no activities directly follow each other).
///
/// The result is sorted by size first and then numerically (i.e., deterministic).
pub fn independent_sets(masks: &RelationMasks) -> Vec<ActivitySet> {
    let n = masks.independent_of.len();
    let mut sets: Vec<ActivitySet> = Vec::new();
    // Frontier: independent sets of the previous size, together with the activities that may still extend them
    let mut frontier: Vec<(ActivitySet, ActivitySet)> = (0..n)
        .map(|a| (1 << a, masks.independent_of[a] & higher_than(a)))
        .collect();
    while !frontier.is_empty() {
        sets.extend(frontier.iter().map(|(set, _)| *set));
        frontier = frontier
            .par_iter()
            .flat_map_iter(|(set, extensions)| {
                set_to_indices(*extensions).into_iter().map(move |b| {
                    (
                        set | (1 << b),
                        extensions & masks.independent_of[b] & higher_than(b),
                    )
                })
            })
            .collect();
    }
    sets.sort_by_key(|s| (s.count_ones(), *s));
    sets
}

/// All activities with an index strictly larger than `a`
fn higher_than(a: usize) -> ActivitySet {
    if a + 1 >= MAX_ALPHABET_SIZE {
        0
    } else {
        ActivitySet::MAX << (a + 1)
    }
}

///
/// Build all place candidates `(A, B)`
///
/// `A` and `B` are independent sets (see [`independent_sets`]) and every activity of `A` is causally
/// related to every activity of `B` (`a → b`).
///
/// Candidates are evaluated in parallel per left-hand side `A`; the relation masks are only read.
pub fn build_candidates(
    masks: &RelationMasks,
    sides: &[ActivitySet],
) -> Vec<(ActivitySet, ActivitySet)> {
    sides
        .par_iter()
        .flat_map_iter(|a| {
            let common = masks.common_causal_successors(*a);
            sides
                .iter()
                .filter(move |b| common != 0 && is_subset(**b, common))
                .map(move |b| (*a, *b))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{clean_log, log_from_sequences};

    fn named(fp: &Footprint, set: ActivitySet) -> Vec<&str> {
        set_to_indices(set)
            .into_iter()
            .map(|a| fp.activity_name(a))
            .collect()
    }

    #[test]
    fn set_conversions() {
        assert_eq!(set_to_indices(0b1011), vec![0, 1, 3]);
        assert_eq!(indices_to_set(&[3, 0, 1]), 0b1011);
        assert_eq!(set_to_indices(1 << 63), vec![63]);
        assert!(is_subset(0b0010, 0b0110));
        assert!(!is_subset(0b1010, 0b0110));
        assert_eq!(higher_than(63), 0);
        assert_eq!(higher_than(0), ActivitySet::MAX - 1);
    }

    #[test]
    fn independent_sets_of_clean_log() {
        let fp = Footprint::from_event_log(&clean_log());
        let masks = RelationMasks::from_footprint(&fp);
        let sets: Vec<Vec<&str>> = independent_sets(&masks)
            .into_iter()
            .map(|s| named(&fp, s))
            .collect();
        // A # D and B # C
        assert_eq!(
            sets,
            vec![
                vec!["A"],
                vec!["B"],
                vec!["C"],
                vec!["D"],
                vec!["B", "C"],
                vec!["A", "D"]
            ]
        );
        for s in independent_sets(&masks) {
            assert!(masks.is_independent(s));
        }
    }

    #[test]
    fn unrelated_activities_give_all_subsets() {
        // Single-event cases: no directly-follows at all
        let log = log_from_sequences(&[
            ("1", &["a"]),
            ("2", &["b"]),
            ("3", &["c"]),
            ("4", &["d"]),
        ]);
        let fp = Footprint::from_event_log(&log);
        let masks = RelationMasks::from_footprint(&fp);
        assert_eq!(independent_sets(&masks).len(), 15);
        assert!(build_candidates(&masks, &independent_sets(&masks)).is_empty());
    }

    #[test]
    fn candidates_of_clean_log() {
        let fp = Footprint::from_event_log(&clean_log());
        let masks = RelationMasks::from_footprint(&fp);
        let mut cnds: Vec<(Vec<&str>, Vec<&str>)> =
            build_candidates(&masks, &independent_sets(&masks))
                .into_iter()
                .map(|(a, b)| (named(&fp, a), named(&fp, b)))
                .collect();
        cnds.sort();
        assert_eq!(
            cnds,
            vec![
                (vec!["A"], vec!["B"]),
                (vec!["A"], vec!["B", "C"]),
                (vec!["A"], vec!["C"]),
                (vec!["B"], vec!["D"]),
                (vec!["B", "C"], vec!["D"]),
                (vec!["C"], vec!["D"]),
            ]
        );
    }
}
