//! Automata over the atomic propositions of a model, as consumed by the
//! product construction.

mod explicit;
mod formula;
mod hoa;
mod product;
mod synthesis;


use bitvec::slice::BitSlice;
use bitvec::vec::BitVec;
use solver::new_index;
use thiserror::Error;

pub use explicit::{ExplicitAutomaton, Marks, Priority};
pub use formula::{render, Formula, Rendered};
pub use hoa::{parse_hoa, Acceptance, Guard, Hoa, HoaEdge, HoaError, HoaState};
pub use product::AutomatonProduct;
pub use synthesis::{Ltl2Tgba, SynthesisError, Synthesizer};

new_index!(pub index StateId);
new_index!(pub index LabelId);

/// Truth values of an automaton's expressions, in the order of
/// [`Automaton::expressions`].
pub type Valuation = BitVec;

/// One successor of an automaton step: the next state and the label of the
/// transition taken.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Transition {
    pub state: StateId,
    pub label: LabelId,
}

#[derive(Debug, Error, PartialEq)]
pub enum AutomatonError {
    #[error("unsupported acceptance condition `{0}`")]
    UnsupportedAcceptance(String),
    #[error("automata over different expressions cannot be combined")]
    IncompatibleAutomata,
    #[error("a product needs at least one automaton")]
    EmptyProduct,
    #[error("expected exactly one initial state, found {0}")]
    InitialStates(usize),
}

/// An automaton read by the product construction.
///
/// States and labels are interned: equal states and labels always get the
/// same id, and ids never change once handed out. Querying may discover new
/// states, hence `&mut self`.
pub trait Automaton {
    type Label;

    fn expressions(&self) -> &[String];

    fn initial_state(&self) -> StateId;

    /// Number of states discovered so far.
    fn state_count(&self) -> usize;

    fn is_deterministic(&self) -> bool;

    /// The successors of `state` when reading `valuation`. A deterministic
    /// automaton always returns exactly one transition.
    fn query(&mut self, valuation: &BitSlice, state: StateId) -> Vec<Transition>;

    fn label(&self, label: LabelId) -> &Self::Label;
}
