//! Typestate lattice values and edge functions
//!
//! A value is the set of states an object may be in. The meet is union
//! (may-analysis) and the neutral element is the empty set.
//!
//! Edge functions are transition relations. States the relation does not
//! mention map to themselves. The relation is kept canonical (no explicit
//! `s -> {s}` entries) so that equal functions compare equal, which the
//! solver relies on to detect its fixpoint.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::features::ideal::domain::{IdeValue, ValueTransformer};

use super::protocol::State;

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateSet(BTreeSet<State>);

impl StateSet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn singleton(state: State) -> Self {
        Self(BTreeSet::from([state]))
    }

    pub fn contains(&self, state: &State) -> bool {
        self.0.contains(state)
    }

    pub fn iter(&self) -> impl Iterator<Item = &State> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn union(&self, other: &Self) -> Self {
        Self(self.0.union(&other.0).cloned().collect())
    }
}

impl FromIterator<State> for StateSet {
    fn from_iter<I: IntoIterator<Item = State>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IdeValue for StateSet {
    fn meet(&self, other: &Self) -> Self {
        self.union(other)
    }
}

impl fmt::Display for StateSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.0.iter().map(|s| s.name.as_str()).collect();
        write!(f, "{{{}}}", names.join(", "))
    }
}

/// Transition relation with implicit identity
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TransitionFunction {
    relation: BTreeMap<State, BTreeSet<State>>,
}

impl TransitionFunction {
    /// Relation from `(from, to)` pairs
    pub fn from_transitions(pairs: impl IntoIterator<Item = (State, State)>) -> Self {
        let mut relation: BTreeMap<State, BTreeSet<State>> = BTreeMap::new();
        for (from, to) in pairs {
            relation.entry(from).or_default().insert(to);
        }
        Self::canonical(relation)
    }

    fn canonical(mut relation: BTreeMap<State, BTreeSet<State>>) -> Self {
        relation.retain(|from, to| !(to.len() == 1 && to.contains(from)));
        Self { relation }
    }

    /// States reachable from `state` in one step
    pub fn image(&self, state: &State) -> BTreeSet<State> {
        match self.relation.get(state) {
            Some(to) => to.clone(),
            None => BTreeSet::from([state.clone()]),
        }
    }

    pub fn is_identity(&self) -> bool {
        self.relation.is_empty()
    }

    /// Explicit (non-identity) entries
    pub fn transitions(&self) -> impl Iterator<Item = (&State, &BTreeSet<State>)> {
        self.relation.iter()
    }

    fn domain<'s>(&'s self, other: &'s Self) -> BTreeSet<&'s State> {
        self.relation.keys().chain(other.relation.keys()).collect()
    }
}

impl ValueTransformer<StateSet> for TransitionFunction {
    fn identity() -> Self {
        Self::default()
    }

    fn compute_target(&self, source: &StateSet) -> StateSet {
        source.iter().flat_map(|s| self.image(s)).collect()
    }

    fn compose_with(&self, second: &Self) -> Self {
        let relation = self
            .domain(second)
            .into_iter()
            .map(|from| {
                let to: BTreeSet<State> = self
                    .image(from)
                    .iter()
                    .flat_map(|mid| second.image(mid))
                    .collect();
                (from.clone(), to)
            })
            .collect();
        Self::canonical(relation)
    }

    fn meet_with(&self, other: &Self) -> Self {
        let relation = self
            .domain(other)
            .into_iter()
            .map(|from| {
                let mut to = self.image(from);
                to.extend(other.image(from));
                (from.clone(), to)
            })
            .collect();
        Self::canonical(relation)
    }
}

impl fmt::Display for TransitionFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_identity() {
            return write!(f, "id");
        }
        let parts: Vec<String> = self
            .relation
            .iter()
            .map(|(from, to)| {
                let to: Vec<&str> = to.iter().map(|s| s.name.as_str()).collect();
                format!("{} -> {{{}}}", from, to.join(", "))
            })
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}
