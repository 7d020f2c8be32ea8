//! Solvers computing the nodes each player wins, with probability one when
//! stochastic nodes are involved.

mod gadget;
mod jurdzinski;
mod mcnaughton;

#[cfg(test)]
mod test;

use thiserror::Error;

use crate::game::{GameError, NodeId, ParityGame, Player};
use crate::strategy::{QualitativeResult, StrategyRequest};

pub use gadget::{Gadget, NonStochasticSolver};
pub use jurdzinski::{Jurdzinski, LiftMethod, LiftOrder};
pub use mcnaughton::McNaughton;

#[derive(Debug, Error, PartialEq)]
pub enum SolveError {
    #[error("invalid game")]
    InvalidGame(#[from] GameError),
    #[error("node {0} is stochastic, which this solver does not support")]
    StochasticNode(NodeId),
}

pub trait QualitativeSolver {
    /// Partitions the nodes of `game` into the regions won by Even and Odd.
    ///
    /// With `strict_even` Even has to win with probability one, otherwise it
    /// is Odd that has to. The decisions of the players selected by `request`
    /// are recorded in the result's strategy.
    fn solve<G: ParityGame>(
        &self,
        game: &G,
        strict_even: bool,
        request: StrategyRequest,
    ) -> Result<QualitativeResult, SolveError>;
}

/// Fails on the first stochastic node, for solvers of two player games.
fn reject_stochastic<G: ParityGame>(game: &G) -> Result<(), SolveError> {
    match game.nodes().find(|&n| game.player_of(n) == Player::Stochastic) {
        Some(n) => Err(SolveError::StochasticNode(n)),
        None => Ok(()),
    }
}
