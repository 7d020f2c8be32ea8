//! Solvers computing the probability with which Even wins.

mod schewe;


use crate::game::ParityGame;
use crate::qualitative::SolveError;
use crate::strategy::{QuantitativeResult, StrategyRequest};

pub use schewe::Schewe;

pub trait QuantitativeSolver {
    /// Probability with which Even wins from every node of `game`, together
    /// with the decisions of the players selected by `request`.
    fn solve<G: ParityGame>(
        &self,
        game: &G,
        request: StrategyRequest,
    ) -> Result<QuantitativeResult, SolveError>;
}
