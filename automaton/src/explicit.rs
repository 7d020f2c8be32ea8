use std::hash::Hash;

use bitvec::slice::BitSlice;
use bitvec::vec::BitVec;
use log::debug;
use solver::index::{AsIndex, IndexedSet, IndexedVec};

use crate::hoa::{Acceptance, Guard, Hoa, HoaEdge, HoaState};
use crate::{Automaton, AutomatonError, LabelId, StateId, Transition};

/// Sorted acceptance sets of a transition.
pub type Marks = Vec<u32>;

/// Priority of a transition under the min-parity condition: the least
/// priority seen infinitely often is even exactly for accepting runs.
pub type Priority = usize;

/// Beyond this many propositions determinism is only read from the header.
const MAX_ENUMERATED_APS: usize = 12;

struct Edge {
    guard: Guard,
    target: StateId,
    label: LabelId,
}

/// An automaton with explicitly stored guarded edges.
///
/// When no edge of a state is enabled the automaton moves to an implicit
/// rejecting sink, which is the last state.
pub struct ExplicitAutomaton<L> {
    expressions: Vec<String>,
    initial: StateId,
    deterministic: bool,
    edges: IndexedVec<StateId, Vec<Edge>>,
    labels: IndexedSet<LabelId, L>,
    sink: Transition,
}

impl<L: Hash + Eq> ExplicitAutomaton<L> {
    fn build(
        hoa: &Hoa,
        initial: StateId,
        raw: IndexedVec<StateId, Vec<(Guard, StateId, L)>>,
        sink_label: L,
    ) -> Self {
        let mut labels = IndexedSet::default();
        let mut edges = raw
            .into_vec()
            .into_iter()
            .map(|edges| {
                edges
                    .into_iter()
                    .map(|(guard, target, label)| {
                        let (label, _) = labels.insert_full(label);
                        Edge { guard, target, label }
                    })
                    .collect::<Vec<_>>()
            })
            .collect::<IndexedVec<StateId, _>>();

        let (sink_label, _) = labels.insert_full(sink_label);
        let sink = Transition { state: edges.push(Vec::new()), label: sink_label };

        let declared = hoa.properties.iter().any(|p| p == "deterministic");
        let deterministic = declared || enumerate_deterministic(&edges, hoa.aps.len());
        debug!(
            "automaton: {} states, {} labels, deterministic: {deterministic}",
            edges.len(),
            labels.len()
        );

        Self { expressions: hoa.aps.clone(), initial, deterministic, edges, labels, sink }
    }
}

impl ExplicitAutomaton<Marks> {
    /// Keeps the acceptance sets of every transition as its label. States
    /// keep their numbering.
    pub fn with_marks(hoa: &Hoa) -> Result<Self, AutomatonError> {
        let initial = initial_state(hoa)?;
        let mut raw = empty_edges(hoa.state_count);
        for state in &hoa.states {
            for edge in &state.edges {
                raw[StateId(state.id)].push((
                    edge.guard.clone(),
                    StateId(edge.target),
                    marks_of(state, edge),
                ));
            }
        }
        Ok(Self::build(hoa, initial, raw, rejecting_marks(hoa)))
    }
}

enum Condition {
    /// Generalized Büchi over several sets, which needs a counter.
    Degeneralize(Vec<u32>),
    Relabel(Relabel),
}

/// Conditions that only need new labels on the existing transitions.
enum Relabel {
    Constant(bool),
    Buchi(u32),
    CoBuchi(u32),
    /// A single Rabin pair `Fin(fin) & Inf(inf)`.
    Rabin { fin: u32, inf: u32 },
    Parity { max: bool, even: bool, colors: u32 },
}

impl Relabel {
    fn priority(&self, marks: &Marks) -> Priority {
        match *self {
            Relabel::Constant(accepting) => usize::from(!accepting),
            Relabel::Buchi(set) => usize::from(!marks.contains(&set)),
            Relabel::CoBuchi(set) => match marks.contains(&set) {
                true => 1,
                false => 2,
            },
            Relabel::Rabin { fin, inf } => match (marks.contains(&fin), marks.contains(&inf)) {
                (true, _) => 1,
                (false, true) => 0,
                (false, false) => 2,
            },
            Relabel::Parity { max, even, colors } => parity_priority(max, even, colors, marks),
        }
    }
}

impl ExplicitAutomaton<Priority> {
    /// Converts the acceptance condition into min-parity priorities on
    /// transitions.
    ///
    /// Generalized Büchi conditions over `k > 1` sets are degeneralized with a
    /// counter, so state `q` of the input becomes states `q * k .. q * k + k`.
    pub fn parity(hoa: &Hoa) -> Result<Self, AutomatonError> {
        let initial = initial_state(hoa)?;

        let (copies, raw) = match classify(hoa)? {
            Condition::Degeneralize(sets) => (sets.len(), degeneralize(hoa, &sets)),
            Condition::Relabel(relabel) => {
                let mut raw = empty_edges(hoa.state_count);
                for state in &hoa.states {
                    for edge in &state.edges {
                        raw[StateId(state.id)].push((
                            edge.guard.clone(),
                            StateId(edge.target),
                            relabel.priority(&marks_of(state, edge)),
                        ));
                    }
                }
                (1, raw)
            }
        };

        let initial = StateId(initial.to_usize() * copies);
        Ok(Self::build(hoa, initial, raw, 1))
    }
}

/// Copy `counter` of a state waits for a transition in `sets[counter]`; a
/// transition completing the round has priority 0 and resets the counter.
fn degeneralize(hoa: &Hoa, sets: &[u32]) -> IndexedVec<StateId, Vec<(Guard, StateId, Priority)>> {
    let k = sets.len();
    let mut raw = empty_edges(hoa.state_count * k);
    for state in &hoa.states {
        for edge in &state.edges {
            let marks = marks_of(state, edge);
            for counter in 0..k {
                let mut next = counter;
                while next < k && marks.contains(&sets[next]) {
                    next += 1;
                }
                let (next, priority) = match next == k {
                    true => (0, 0),
                    false => (next, 1),
                };
                raw[StateId(state.id * k + counter)].push((
                    edge.guard.clone(),
                    StateId(edge.target * k + next),
                    priority,
                ));
            }
        }
    }
    raw
}

impl<L> Automaton for ExplicitAutomaton<L> {
    type Label = L;

    fn expressions(&self) -> &[String] {
        &self.expressions
    }

    fn initial_state(&self) -> StateId {
        self.initial
    }

    fn state_count(&self) -> usize {
        self.edges.len()
    }

    fn is_deterministic(&self) -> bool {
        self.deterministic
    }

    fn query(&mut self, valuation: &BitSlice, state: StateId) -> Vec<Transition> {
        let mut transitions = self.edges[state]
            .iter()
            .filter(|edge| edge.guard.eval(valuation))
            .map(|edge| Transition { state: edge.target, label: edge.label })
            .collect::<Vec<_>>();
        if transitions.is_empty() {
            transitions.push(self.sink);
        }
        transitions
    }

    fn label(&self, label: LabelId) -> &L {
        &self.labels[label]
    }
}

fn initial_state(hoa: &Hoa) -> Result<StateId, AutomatonError> {
    match hoa.start.as_slice() {
        [initial] => Ok(StateId(*initial)),
        start => Err(AutomatonError::InitialStates(start.len())),
    }
}

fn empty_edges<T>(state_count: usize) -> IndexedVec<StateId, Vec<T>> {
    (0..state_count).map(|_| Vec::new()).collect()
}

fn marks_of(state: &HoaState, edge: &HoaEdge) -> Marks {
    let mut marks = state.marks.iter().chain(&edge.marks).copied().collect::<Vec<_>>();
    marks.sort_unstable();
    marks.dedup();
    marks
}

/// A set of marks that is rejecting when it is the only one seen infinitely often.
fn rejecting_marks(hoa: &Hoa) -> Marks {
    let sets = hoa.acceptance_sets;
    let rejects = |marks: &Marks| !hoa.acceptance.accepts(&|set| marks.contains(&set));

    let candidates = [Vec::new(), (0..sets).collect()];
    if let Some(marks) = candidates.into_iter().find(|marks| rejects(marks)) {
        return marks;
    }
    if sets <= 16 {
        for bits in 0..1u32 << sets {
            let marks = (0..sets).filter(|set| bits >> set & 1 == 1).collect();
            if rejects(&marks) {
                return marks;
            }
        }
    }
    Vec::new()
}

fn classify(hoa: &Hoa) -> Result<Condition, AutomatonError> {
    if let [kind, order, parity, colors] = hoa.acc_name.as_slice() {
        if kind == "parity" {
            let max = match order.as_str() {
                "min" => false,
                "max" => true,
                _ => return Err(AutomatonError::UnsupportedAcceptance(hoa.acc_name.join(" "))),
            };
            let even = match parity.as_str() {
                "even" => true,
                "odd" => false,
                _ => return Err(AutomatonError::UnsupportedAcceptance(hoa.acc_name.join(" "))),
            };
            let colors = colors
                .parse()
                .map_err(|_| AutomatonError::UnsupportedAcceptance(hoa.acc_name.join(" ")))?;
            return Ok(Condition::Relabel(Relabel::Parity { max, even, colors }));
        }
    }

    match &hoa.acceptance {
        Acceptance::True => Ok(Condition::Relabel(Relabel::Constant(true))),
        Acceptance::False => Ok(Condition::Relabel(Relabel::Constant(false))),
        Acceptance::Inf(set) => Ok(Condition::Relabel(Relabel::Buchi(*set))),
        Acceptance::Fin(set) => Ok(Condition::Relabel(Relabel::CoBuchi(*set))),
        Acceptance::And(conds) => match conds.as_slice() {
            [Acceptance::Fin(fin), Acceptance::Inf(inf)]
            | [Acceptance::Inf(inf), Acceptance::Fin(fin)] => {
                Ok(Condition::Relabel(Relabel::Rabin { fin: *fin, inf: *inf }))
            }
            _ => generalized_buchi(hoa, conds),
        },
        other => Err(AutomatonError::UnsupportedAcceptance(other.to_string())),
    }
}

fn generalized_buchi(hoa: &Hoa, conds: &[Acceptance]) -> Result<Condition, AutomatonError> {
    conds
        .iter()
        .map(|cond| match cond {
            Acceptance::Inf(set) => Some(*set),
            _ => None,
        })
        .collect::<Option<Vec<_>>>()
        .map(Condition::Degeneralize)
        .ok_or_else(|| AutomatonError::UnsupportedAcceptance(hoa.acceptance.to_string()))
}

/// Maps the color of a transition under any of the four parity conventions to
/// a min-even priority. Uncolored transitions count as the least significant
/// color.
fn parity_priority(max: bool, even: bool, colors: u32, marks: &Marks) -> Priority {
    let colors = colors as usize;
    if !max {
        let color = marks.first().map_or(colors, |&c| c as usize);
        return if even { color } else { color + 1 };
    }

    // Shift colors up by one so that uncolored transitions become 0, then
    // reverse the order around a bound of the right parity.
    let shifted = marks.last().map_or(0, |&c| c as usize + 1);
    let bound = if even { colors | 1 } else { colors + colors % 2 };
    bound - shifted
}

fn enumerate_deterministic(edges: &IndexedVec<StateId, Vec<Edge>>, ap_count: usize) -> bool {
    if ap_count > MAX_ENUMERATED_APS {
        return false;
    }
    let mut valuation = BitVec::repeat(false, ap_count);
    for bits in 0..1usize << ap_count {
        for ap in 0..ap_count {
            valuation.set(ap, bits >> ap & 1 == 1);
        }
        let ambiguous = edges
            .iter()
            .any(|edges| edges.iter().filter(|edge| edge.guard.eval(&valuation)).count() > 1);
        if ambiguous {
            return false;
        }
    }
    true
}
