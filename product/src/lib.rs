//! Product of a model with an automaton over the model's propositions, and
//! the games played on it.

mod check;
mod game;
mod graph;
mod model;


use solver::new_index;
use thiserror::Error;

pub use check::{check_formula, check_qualitative, check_quantitative, CheckError};
pub use game::{build_game, ProductGame};
pub use graph::{ProductGraph, ProductState};
pub use model::{ExplicitModel, Model};

new_index!(pub index ModelNode);

#[derive(Debug, Error, PartialEq)]
pub enum ProductError {
    #[error("the product needs more than the {limit} reserved automaton states")]
    InsufficientStates { limit: usize },
    #[error("games can only be built from deterministic automata")]
    NondeterministicAutomaton,
}
