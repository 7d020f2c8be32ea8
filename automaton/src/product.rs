use bitvec::slice::BitSlice;
use bitvec::vec::BitVec;
use log::debug;
use solver::index::IndexedSet;
use solver::Map;

use crate::{Automaton, AutomatonError, LabelId, StateId, Transition};

/// Runs several automata over the same expressions in lockstep.
///
/// A product state is the tuple of the component states and a product label
/// is the tuple of the component labels, both interned on first sight.
pub struct AutomatonProduct<A> {
    components: Vec<A>,
    states: IndexedSet<StateId, Vec<StateId>>,
    labels: IndexedSet<LabelId, Vec<LabelId>>,
    cache: Map<(BitVec, StateId), Vec<Transition>>,
}

impl<A: Automaton> AutomatonProduct<A> {
    pub fn new(components: Vec<A>) -> Result<Self, AutomatonError> {
        let Some((first, rest)) = components.split_first() else {
            return Err(AutomatonError::EmptyProduct);
        };
        if rest.iter().any(|other| other.expressions() != first.expressions()) {
            return Err(AutomatonError::IncompatibleAutomata);
        }

        let mut states = IndexedSet::default();
        states.insert_full(components.iter().map(|c| c.initial_state()).collect());
        debug!("product of {} automata", components.len());

        Ok(Self { components, states, labels: IndexedSet::default(), cache: Map::default() })
    }

    pub fn components(&self) -> &[A] {
        &self.components
    }

    /// The component states of a product state.
    pub fn state_tuple(&self, state: StateId) -> &[StateId] {
        &self.states[state]
    }

    fn step(&mut self, valuation: &BitSlice, state: StateId) -> Vec<Transition> {
        let tuple = self.states[state].clone();

        // Cartesian product of the component successors, first component major.
        let mut partial = vec![(Vec::new(), Vec::new())];
        for (component, &inner) in self.components.iter_mut().zip(&tuple) {
            let successors = component.query(valuation, inner);
            partial = partial
                .into_iter()
                .flat_map(|(states, labels): (Vec<StateId>, Vec<LabelId>)| {
                    successors.iter().map(move |t| {
                        let mut states = states.clone();
                        let mut labels = labels.clone();
                        states.push(t.state);
                        labels.push(t.label);
                        (states, labels)
                    })
                })
                .collect();
        }

        partial
            .into_iter()
            .map(|(states, labels)| Transition {
                state: self.states.insert_full(states).0,
                label: self.labels.insert_full(labels).0,
            })
            .collect()
    }
}

impl<A: Automaton> Automaton for AutomatonProduct<A> {
    type Label = Vec<LabelId>;

    fn expressions(&self) -> &[String] {
        self.components[0].expressions()
    }

    fn initial_state(&self) -> StateId {
        StateId(0)
    }

    fn state_count(&self) -> usize {
        self.states.len()
    }

    fn is_deterministic(&self) -> bool {
        self.components.iter().all(|c| c.is_deterministic())
    }

    fn query(&mut self, valuation: &BitSlice, state: StateId) -> Vec<Transition> {
        let key = (valuation.to_bitvec(), state);
        if let Some(transitions) = self.cache.get(&key) {
            return transitions.clone();
        }
        let transitions = self.step(valuation, state);
        self.cache.insert(key, transitions.clone());
        transitions
    }

    fn label(&self, label: LabelId) -> &Vec<LabelId> {
        &self.labels[label]
    }
}
