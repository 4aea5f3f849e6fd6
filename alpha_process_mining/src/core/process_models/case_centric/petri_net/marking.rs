use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::petri_net_struct::{PetriNet, PetriNetError, PlaceID, TransitionID};

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
///
/// Marking of a Petri net: Assigning [`PlaceID`]s to a number of tokens
///
/// Places not mentioned hold zero tokens. Token counts are unsigned and can never become negative.
pub struct Marking {
    // Only non-zero counts are stored, so equal markings are structurally equal
    tokens: BTreeMap<PlaceID, u64>,
}

impl Marking {
    /// Create the empty marking
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tokens in place `p`
    pub fn token_count(&self, p: PlaceID) -> u64 {
        self.tokens.get(&p).copied().unwrap_or(0)
    }

    /// Add `count` tokens to place `p`
    pub fn add_tokens(&mut self, p: PlaceID, count: u64) {
        if count > 0 {
            *self.tokens.entry(p).or_insert(0) += count;
        }
    }

    ///
    /// Remove one token from place `p`
    ///
    /// Returns `false` (and changes nothing) if the place is empty.
    pub fn remove_token(&mut self, p: PlaceID) -> bool {
        match self.tokens.get_mut(&p) {
            Some(c) if *c > 1 => {
                *c -= 1;
                true
            }
            Some(_) => {
                self.tokens.remove(&p);
                true
            }
            None => false,
        }
    }

    /// Total number of tokens over all places
    pub fn total_tokens(&self) -> u64 {
        self.tokens.values().sum()
    }

    /// Iterate over all places holding at least one token
    pub fn iter(&self) -> impl Iterator<Item = (PlaceID, u64)> + '_ {
        self.tokens.iter().map(|(p, c)| (*p, *c))
    }

    /// Checks if no place holds a token
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl FromIterator<(PlaceID, u64)> for Marking {
    fn from_iter<I: IntoIterator<Item = (PlaceID, u64)>>(iter: I) -> Self {
        let mut m = Marking::new();
        for (p, c) in iter {
            m.add_tokens(p, c);
        }
        m
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
///
/// Token movements caused by one (forced) firing
///
pub struct FireResult {
    /// Tokens consumed from input places
    pub consumed: u64,
    /// Tokens produced into output places
    pub produced: u64,
    /// Tokens that had to be created because an input place was empty
    pub missing: u64,
}

#[derive(Debug, Clone)]
///
/// An execution of a [`PetriNet`]: the (shared, read-only) net plus an exclusively owned [`Marking`]
///
/// Created through [`PetriNet::execute`] or [`PetriNet::execute_from`].
pub struct PetriNetExecution<'net> {
    net: &'net PetriNet,
    marking: Marking,
}

impl<'net> PetriNetExecution<'net> {
    /// Create a new execution of `net`, starting in `marking`
    pub fn new(net: &'net PetriNet, marking: Marking) -> Self {
        Self { net, marking }
    }

    /// The executed net
    pub fn net(&self) -> &'net PetriNet {
        self.net
    }

    /// Current marking
    pub fn marking(&self) -> &Marking {
        &self.marking
    }

    /// Check if transition `t` is enabled in the current marking (see [`PetriNet::is_enabled_in`])
    pub fn is_enabled(&self, t: TransitionID) -> bool {
        self.net.is_enabled_in(&self.marking, t)
    }

    /// All transitions enabled in the current marking
    pub fn enabled_transitions(&self) -> Vec<TransitionID> {
        self.net
            .transitions()
            .iter()
            .map(|t| t.id())
            .filter(|t| self.is_enabled(*t))
            .collect()
    }

    /// Fire `t` if it is enabled (see [`PetriNet::fire_in`])
    pub fn fire(&mut self, t: TransitionID) -> bool {
        self.net.fire_in(&mut self.marking, t)
    }

    /// Fire `t`, creating missing input tokens first (see [`PetriNet::force_fire_in`])
    pub fn force_fire(&mut self, t: TransitionID) -> FireResult {
        self.net.force_fire_in(&mut self.marking, t)
    }

    /// Number of tokens currently in place `p`
    pub fn token_count(&self, p: PlaceID) -> u64 {
        self.marking.token_count(p)
    }

    /// Put one additional token into place `p`
    pub fn add_marking(&mut self, p: PlaceID) -> Result<(), PetriNetError> {
        if self.net.place(p).is_none() {
            return Err(PetriNetError::UnknownPlace(p));
        }
        self.marking.add_tokens(p, 1);
        Ok(())
    }

    /// Copy of the current marking
    pub fn snapshot_marking(&self) -> Marking {
        self.marking.clone()
    }

    /// Replace the current marking
    pub fn restore_marking(&mut self, marking: Marking) {
        self.marking = marking;
    }

    /// Go back to a fresh copy of the net's initial marking
    pub fn reset(&mut self) {
        self.marking = self.net.initial_marking().cloned().unwrap_or_default();
    }

    /// Consume the execution, returning its final marking
    pub fn into_marking(self) -> Marking {
        self.marking
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// start -> A -> p1 -> {B, C} -> p2 -> D -> end
    fn sequence_net() -> (PetriNet, Vec<PlaceID>, Vec<TransitionID>) {
        let mut net = PetriNet::new();
        let places: Vec<PlaceID> = ["start", "p1", "p2", "end"]
            .iter()
            .map(|n| net.add_place(*n))
            .collect();
        let transitions: Vec<TransitionID> = ["A", "B", "C", "D"]
            .iter()
            .map(|l| net.add_transition(*l))
            .collect();
        net.add_arc(places[0], transitions[0]).unwrap();
        net.add_arc(transitions[0], places[1]).unwrap();
        for t in &transitions[1..3] {
            net.add_arc(places[1], *t).unwrap();
            net.add_arc(*t, places[2]).unwrap();
        }
        net.add_arc(places[2], transitions[3]).unwrap();
        net.add_arc(transitions[3], places[3]).unwrap();
        net.set_start_place(places[0]).unwrap();
        net.set_end_place(places[3]).unwrap();
        net.add_to_initial_marking(places[0]).unwrap();
        (net, places, transitions)
    }

    #[test]
    fn firing_sequence() {
        let (net, p, t) = sequence_net();
        let mut exec = net.execute();
        assert_eq!(exec.enabled_transitions(), vec![t[0]]);
        assert!(!exec.fire(t[3]));
        assert!(exec.fire(t[0]));
        assert_eq!(exec.enabled_transitions(), vec![t[1], t[2]]);
        assert!(exec.fire(t[2]));
        assert!(!exec.is_enabled(t[1]));
        assert!(exec.fire(t[3]));
        assert_eq!(exec.token_count(p[3]), 1);
        assert_eq!(exec.marking().total_tokens(), 1);
        // The net's canonical marking is unaffected by executions
        assert_eq!(net.initial_marking().unwrap().token_count(p[0]), 1);
        assert_eq!(net.execute().token_count(p[3]), 0);
    }

    #[test]
    fn transition_without_inputs_is_enabled() {
        let mut net = PetriNet::new();
        let p = net.add_place("out");
        let t = net.add_transition("generate");
        net.add_arc(t, p).unwrap();
        let mut exec = net.execute();
        assert!(exec.is_enabled(t));
        assert!(exec.fire(t));
        assert!(exec.fire(t));
        assert_eq!(exec.token_count(p), 2);
    }

    #[test]
    fn force_fire_accounts_for_deficit() {
        let (net, p, t) = sequence_net();
        let mut exec = net.execute();
        let res = exec.force_fire(t[3]);
        assert_eq!(
            res,
            FireResult {
                consumed: 1,
                produced: 1,
                missing: 1
            }
        );
        assert_eq!(exec.token_count(p[2]), 0);
        assert_eq!(exec.token_count(p[3]), 1);
        assert_eq!(exec.token_count(p[0]), 1);

        // Enabled transitions are fired without any missing tokens
        let res = exec.force_fire(t[0]);
        assert_eq!(res.missing, 0);
        assert_eq!(exec.token_count(p[1]), 1);
    }

    #[test]
    fn token_balance_over_arbitrary_firings() {
        let (net, _p, t) = sequence_net();
        let mut exec = net.execute();
        for round in 0..20 {
            let tr = t[(round * 7 + 3) % t.len()];
            let before = exec.marking().total_tokens();
            if round % 2 == 0 {
                let enabled = exec.is_enabled(tr);
                let fired = exec.fire(tr);
                assert_eq!(enabled, fired);
                if !fired {
                    assert_eq!(exec.marking().total_tokens(), before);
                }
            } else {
                let res = exec.force_fire(tr);
                assert_eq!(
                    exec.marking().total_tokens(),
                    before + res.missing + res.produced - res.consumed
                );
            }
        }
    }

    #[test]
    fn snapshot_and_restore() {
        let (net, p, t) = sequence_net();
        let mut exec = net.execute();
        let snapshot = exec.snapshot_marking();
        exec.fire(t[0]);
        exec.add_marking(p[2]).unwrap();
        assert_eq!(exec.token_count(p[2]), 1);
        exec.restore_marking(snapshot.clone());
        assert_eq!(exec.marking(), &snapshot);
        exec.fire(t[0]);
        exec.reset();
        assert_eq!(exec.marking(), net.initial_marking().unwrap());

        let mut other = PetriNet::new();
        for i in 0..10 {
            other.add_place(format!("x{i}"));
        }
        let foreign = other.places()[9].id();
        assert_eq!(
            exec.add_marking(foreign),
            Err(PetriNetError::UnknownPlace(foreign))
        );
    }

    #[test]
    fn marking_only_stores_non_zero_counts() {
        let (_net, p, _t) = sequence_net();
        let mut m: Marking = vec![(p[0], 2), (p[1], 0)].into_iter().collect();
        assert_eq!(m.iter().collect::<Vec<_>>(), vec![(p[0], 2)]);
        assert!(m.remove_token(p[0]));
        assert!(m.remove_token(p[0]));
        assert!(!m.remove_token(p[0]));
        assert!(m.is_empty());
        assert_eq!(m, Marking::new());
    }
}
