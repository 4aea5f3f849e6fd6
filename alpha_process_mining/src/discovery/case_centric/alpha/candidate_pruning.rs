use std::collections::HashSet;

use rayon::prelude::*;

use super::candidate_building::{is_subset, set_to_indices, ActivitySet};

/// Checks if candidate `(a1, b1)` is contained in `(a2, b2)`, i.e., `a1 ⊆ a2` and `b1 ⊆ b2`
pub fn is_contained_in(
    (a1, b1): (ActivitySet, ActivitySet),
    (a2, b2): (ActivitySet, ActivitySet),
) -> bool {
    is_subset(a1, a2) && is_subset(b1, b2)
}

///
/// Keep only the maximal candidates
///
/// A candidate is maximal if no _other_ candidate contains it (see [`is_contained_in`]).
/// Duplicates are removed.
///
/// `cnds` must be downward closed: with `(A, B)`, every `(A', B')` with nonempty `A' ⊆ A`
/// and `B' ⊆ B` is a candidate as well. This holds for the output of
/// [`build_candidates`](super::candidate_building::build_candidates), since subsets of independent sets
/// are independent and remain causally related.
/// Then `(A, B)` is maximal iff no candidate extends `A` or `B` by a single activity,
/// so each candidate is only compared against at most `|T|` others.
///
/// Returned candidates are in canonical order: sorted by the ascending activity index
/// vectors of their left-hand side and then of their right-hand side.
pub fn maximal_candidates(
    cnds: &[(ActivitySet, ActivitySet)],
) -> Vec<(ActivitySet, ActivitySet)> {
    let cnd_set: HashSet<(ActivitySet, ActivitySet)> = cnds.iter().copied().collect();
    let alphabet: ActivitySet = cnd_set.iter().fold(0, |all, &(a, b)| all | a | b);
    let mut ret: Vec<(ActivitySet, ActivitySet)> = cnd_set
        .par_iter()
        .filter(|&&(a, b)| {
            let extends_a = set_to_indices(alphabet & !a)
                .into_iter()
                .any(|x| cnd_set.contains(&(a | (1 << x), b)));
            let extends_b = set_to_indices(alphabet & !b)
                .into_iter()
                .any(|y| cnd_set.contains(&(a, b | (1 << y))));
            !extends_a && !extends_b
        })
        .copied()
        .collect();
    ret.sort_by_cached_key(|(a, b)| (set_to_indices(*a), set_to_indices(*b)));
    ret
}
