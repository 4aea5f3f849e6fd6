use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use super::marking::{FireResult, Marking, PetriNetExecution};

#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize, Hash, Eq, PartialOrd, Ord)]
/// Place ID
///
/// Place and transition identifiers are separate types, so a place can never be passed where a
/// transition is expected (and vice versa).
pub struct PlaceID(usize);
impl PlaceID {
    /// Get the dense index of the place (position in [`PetriNet::places`])
    pub fn index(self) -> usize {
        self.0
    }
}
impl From<&Place> for PlaceID {
    fn from(value: &Place) -> Self {
        value.id
    }
}

#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize, Hash, Eq, PartialOrd, Ord)]
/// Transition ID
pub struct TransitionID(usize);
impl TransitionID {
    /// Get the dense index of the transition (position in [`PetriNet::transitions`])
    pub fn index(self) -> usize {
        self.0
    }
}
impl From<&Transition> for TransitionID {
    fn from(value: &Transition) -> Self {
        value.id
    }
}

#[derive(Debug, PartialEq, Clone, Copy, Hash, Eq, PartialOrd, Ord)]
/// Any node (Place or Transition) of a Petri net
pub enum NodeID {
    /// A place
    Place(PlaceID),
    /// A transition
    Transition(TransitionID),
}
impl From<PlaceID> for NodeID {
    fn from(value: PlaceID) -> Self {
        NodeID::Place(value)
    }
}
impl From<TransitionID> for NodeID {
    fn from(value: TransitionID) -> Self {
        NodeID::Transition(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// Place in a Petri net
pub struct Place {
    id: PlaceID,
    /// Human-readable name of the place
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// Transition in a Petri net
pub struct Transition {
    id: TransitionID,
    /// Activity label of the transition
    pub label: String,
    inputs: Vec<PlaceID>,
    outputs: Vec<PlaceID>,
}

impl Place {
    /// ID of this place
    pub fn id(&self) -> PlaceID {
        self.id
    }
}

impl Transition {
    /// ID of this transition
    pub fn id(&self) -> TransitionID {
        self.id
    }
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
/// Arc in a Petri net
///
/// Connecting a transition and a place (or the other way around).
/// Arcs always move exactly one token.
pub enum ArcType {
    /// From Place to Transition (input arc of the transition)
    PlaceTransition(PlaceID, TransitionID),
    /// From Transition to Place (output arc of the transition)
    TransitionPlace(TransitionID, PlaceID),
}

impl ArcType {
    /// Create new from place to transition
    pub fn place_to_transition(from: PlaceID, to: TransitionID) -> ArcType {
        ArcType::PlaceTransition(from, to)
    }
    /// Create new from transition to place
    pub fn transition_to_place(from: TransitionID, to: PlaceID) -> ArcType {
        ArcType::TransitionPlace(from, to)
    }
    /// Checks if a given node is start or end of this arc
    pub fn contains(&self, id: NodeID) -> bool {
        let (p, t) = match *self {
            ArcType::PlaceTransition(p, t) | ArcType::TransitionPlace(t, p) => (p, t),
        };
        match id {
            NodeID::Place(x) => p == x,
            NodeID::Transition(x) => t == x,
        }
    }
}

///
/// Errors that can occur when building a [`PetriNet`]
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PetriNetError {
    /// Referenced place does not exist in this net
    UnknownPlace(PlaceID),
    /// Referenced transition does not exist in this net
    UnknownTransition(TransitionID),
    /// Arc would connect two places or two transitions
    InvalidArc(NodeID, NodeID),
}

impl std::fmt::Display for PetriNetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PetriNetError::UnknownPlace(p) => write!(f, "Unknown place {}", p.index()),
            PetriNetError::UnknownTransition(t) => {
                write!(f, "Unknown transition {}", t.index())
            }
            PetriNetError::InvalidArc(from, to) => write!(
                f,
                "Arcs must connect a place and a transition (got {:?} -> {:?})",
                from, to
            ),
        }
    }
}

impl std::error::Error for PetriNetError {}

#[derive(Debug, Clone, Default)]
///
/// A Petri net of [`Place`]s and [`Transition`]s
///
/// Bipartite graph of [`Place`]s and [`Transition`]s with arcs ([`ArcType`]) connecting them,
/// an initial [`Marking`] and optionally a distinguished start and end place.
///
/// The net itself only holds the static structure and the canonical initial marking.
/// Markings evolve in a [`PetriNetExecution`] (see [`PetriNet::execute`]) or through the `*_in`
/// functions operating on an explicit [`Marking`].
/// Thus, one net can be shared (read-only) by any number of concurrent executions.
///
/// ```rust
/// use alpha_process_mining::core::process_models::case_centric::petri_net::PetriNet;
///
/// let mut net = PetriNet::new();
/// let p1 = net.add_place("p1");
/// let p2 = net.add_place("p2");
/// let t = net.add_transition("go");
/// net.add_arc(p1, t).unwrap();
/// net.add_arc(t, p2).unwrap();
/// net.add_to_initial_marking(p1).unwrap();
///
/// let mut exec = net.execute();
/// assert!(exec.fire(t));
/// assert_eq!(exec.token_count(p2), 1);
/// assert!(!exec.fire(t));
/// ```
pub struct PetriNet {
    places: Vec<Place>,
    transitions: Vec<Transition>,
    arcs: BTreeSet<ArcType>,
    label_to_transition: HashMap<String, TransitionID>,
    start_place: Option<PlaceID>,
    end_place: Option<PlaceID>,
    initial_marking: Option<Marking>,
}

impl PetriNet {
    /// Create new [`PetriNet`] with no places or transitions
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a place with the given name
    pub fn add_place<S: Into<String>>(&mut self, name: S) -> PlaceID {
        let id = PlaceID(self.places.len());
        self.places.push(Place {
            id,
            name: name.into(),
        });
        id
    }

    ///
    /// Add a transition with the given activity label
    ///
    /// The label is registered for [`PetriNet::transition_by_label`].
    /// If several transitions share a label, lookups resolve to the first one added.
    pub fn add_transition<S: Into<String>>(&mut self, label: S) -> TransitionID {
        let id = TransitionID(self.transitions.len());
        let label: String = label.into();
        self.label_to_transition.entry(label.clone()).or_insert(id);
        self.transitions.push(Transition {
            id,
            label,
            inputs: Vec::new(),
            outputs: Vec::new(),
        });
        id
    }

    ///
    /// Add an arc from `source` to `target`
    ///
    /// Whether this is an input or output arc is decided by which side is the place.
    /// Adding an already existing arc has no effect.
    ///
    pub fn add_arc<S, T>(&mut self, source: S, target: T) -> Result<(), PetriNetError>
    where
        S: Into<NodeID>,
        T: Into<NodeID>,
    {
        let arc = match (source.into(), target.into()) {
            (NodeID::Place(p), NodeID::Transition(t)) => ArcType::place_to_transition(p, t),
            (NodeID::Transition(t), NodeID::Place(p)) => ArcType::transition_to_place(t, p),
            (from, to) => return Err(PetriNetError::InvalidArc(from, to)),
        };
        self.add_arc_type(arc)
    }

    /// Add an arc given as [`ArcType`]
    pub fn add_arc_type(&mut self, arc: ArcType) -> Result<(), PetriNetError> {
        let (p, t) = match arc {
            ArcType::PlaceTransition(p, t) | ArcType::TransitionPlace(t, p) => (p, t),
        };
        self.check_place(p)?;
        self.check_transition(t)?;
        if !self.arcs.insert(arc) {
            return Ok(());
        }
        let transition = &mut self.transitions[t.0];
        let places = match arc {
            ArcType::PlaceTransition(_, _) => &mut transition.inputs,
            ArcType::TransitionPlace(_, _) => &mut transition.outputs,
        };
        if let Err(pos) = places.binary_search(&p) {
            places.insert(pos, p);
        }
        Ok(())
    }

    fn check_place(&self, p: PlaceID) -> Result<(), PetriNetError> {
        if p.0 < self.places.len() {
            Ok(())
        } else {
            Err(PetriNetError::UnknownPlace(p))
        }
    }

    fn check_transition(&self, t: TransitionID) -> Result<(), PetriNetError> {
        if t.0 < self.transitions.len() {
            Ok(())
        } else {
            Err(PetriNetError::UnknownTransition(t))
        }
    }

    /// Mark a place as the distinguished start place
    pub fn set_start_place(&mut self, p: PlaceID) -> Result<(), PetriNetError> {
        self.check_place(p)?;
        self.start_place = Some(p);
        Ok(())
    }

    /// Mark a place as the distinguished end place
    pub fn set_end_place(&mut self, p: PlaceID) -> Result<(), PetriNetError> {
        self.check_place(p)?;
        self.end_place = Some(p);
        Ok(())
    }

    /// Set the initial marking
    pub fn set_initial_marking(&mut self, marking: Marking) {
        self.initial_marking = Some(marking);
    }

    /// Add one token to place `p` in the initial marking (creating the initial marking if there is none yet)
    pub fn add_to_initial_marking(&mut self, p: PlaceID) -> Result<(), PetriNetError> {
        self.check_place(p)?;
        self.initial_marking
            .get_or_insert_with(Marking::new)
            .add_tokens(p, 1);
        Ok(())
    }

    /// Places (indexed by [`PlaceID::index`])
    pub fn places(&self) -> &[Place] {
        &self.places
    }

    /// Transitions (indexed by [`TransitionID::index`])
    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    /// All arcs, in a deterministic order
    pub fn arcs(&self) -> impl Iterator<Item = &ArcType> + '_ {
        self.arcs.iter()
    }

    /// Get a place by ID
    pub fn place(&self, p: PlaceID) -> Option<&Place> {
        self.places.get(p.0)
    }

    /// Get a transition by ID
    pub fn transition(&self, t: TransitionID) -> Option<&Transition> {
        self.transitions.get(t.0)
    }

    /// Distinguished start place (if any)
    pub fn start_place(&self) -> Option<PlaceID> {
        self.start_place
    }

    /// Distinguished end place (if any)
    pub fn end_place(&self) -> Option<PlaceID> {
        self.end_place
    }

    /// Canonical initial marking (if any)
    pub fn initial_marking(&self) -> Option<&Marking> {
        self.initial_marking.as_ref()
    }

    /// Look up the transition for an activity label
    pub fn transition_by_label(&self, label: &str) -> Option<TransitionID> {
        self.label_to_transition.get(label).copied()
    }

    /// Label of a transition
    pub fn label_of(&self, t: TransitionID) -> Option<&str> {
        self.transitions.get(t.0).map(|t| t.label.as_str())
    }

    /// Look up a place by its name (linear scan; intended for inspection, not replay)
    pub fn place_by_name(&self, name: &str) -> Option<PlaceID> {
        self.places.iter().find(|p| p.name == name).map(|p| p.id)
    }

    /// Checks if several transitions share the same label
    pub fn contains_duplicate_labels(&self) -> bool {
        self.label_to_transition.len() != self.transitions.len()
    }

    /// Get the preset (input places) of a transition
    pub fn preset_of_transition(&self, t: TransitionID) -> &[PlaceID] {
        self.transitions
            .get(t.0)
            .map(|t| t.inputs.as_slice())
            .unwrap_or(&[])
    }

    /// Get the postset (output places) of a transition
    pub fn postset_of_transition(&self, t: TransitionID) -> &[PlaceID] {
        self.transitions
            .get(t.0)
            .map(|t| t.outputs.as_slice())
            .unwrap_or(&[])
    }

    /// Get the preset of a place (transitions producing into it)
    pub fn preset_of_place(&self, p: PlaceID) -> Vec<TransitionID> {
        self.arcs
            .iter()
            .filter_map(|arc| match *arc {
                ArcType::TransitionPlace(from, to) if to == p => Some(from),
                _ => None,
            })
            .collect()
    }

    /// Get the postset of a place (transitions consuming from it)
    pub fn postset_of_place(&self, p: PlaceID) -> Vec<TransitionID> {
        self.arcs
            .iter()
            .filter_map(|arc| match *arc {
                ArcType::PlaceTransition(from, to) if from == p => Some(to),
                _ => None,
            })
            .collect()
    }

    ///
    /// Start an execution from a private copy of the initial marking
    ///
    /// A net without initial marking starts from the empty marking.
    pub fn execute(&self) -> PetriNetExecution<'_> {
        PetriNetExecution::new(self, self.initial_marking.clone().unwrap_or_default())
    }

    /// Start an execution from the given marking
    pub fn execute_from(&self, marking: Marking) -> PetriNetExecution<'_> {
        PetriNetExecution::new(self, marking)
    }

    ///
    /// Check if transition `t` is enabled in `marking`
    ///
    /// Every input place needs at least one token. A transition without input places is always enabled.
    /// Transitions not belonging to this net are never enabled.
    pub fn is_enabled_in(&self, marking: &Marking, t: TransitionID) -> bool {
        match self.transitions.get(t.0) {
            Some(transition) => transition
                .inputs
                .iter()
                .all(|p| marking.token_count(*p) >= 1),
            None => false,
        }
    }

    ///
    /// Fire transition `t` in `marking` (strict mode)
    ///
    /// Returns `false` and leaves `marking` untouched if `t` is not enabled.
    pub fn fire_in(&self, marking: &mut Marking, t: TransitionID) -> bool {
        if !self.is_enabled_in(marking, t) {
            return false;
        }
        let transition = &self.transitions[t.0];
        for p in &transition.inputs {
            marking.remove_token(*p);
        }
        for p in &transition.outputs {
            marking.add_tokens(*p, 1);
        }
        true
    }

    ///
    /// Fire transition `t` in `marking`, creating missing tokens (tolerant mode)
    ///
    /// Input places without a token first receive one (counted as `missing`), then `t` fires normally.
    /// Transitions not belonging to this net change nothing and report zero counts.
    pub fn force_fire_in(&self, marking: &mut Marking, t: TransitionID) -> FireResult {
        let Some(transition) = self.transitions.get(t.0) else {
            return FireResult::default();
        };
        let mut res = FireResult::default();
        for p in &transition.inputs {
            if marking.token_count(*p) == 0 {
                marking.add_tokens(*p, 1);
                res.missing += 1;
            }
        }
        for p in &transition.inputs {
            marking.remove_token(*p);
            res.consumed += 1;
        }
        for p in &transition.outputs {
            marking.add_tokens(*p, 1);
            res.produced += 1;
        }
        res
    }
}
