//! Parity games in the PGSolver text format.

mod conv;
mod parser;

#[cfg(test)]
mod test;

pub use conv::{to_game, ConvError, Converted};
pub use parser::{parse_parity_game, parse_parity_solution};
use solver::game::Player;

/// A node as written in the file. Priorities follow the PGSolver convention:
/// the player of the highest priority seen infinitely often wins.
#[derive(Debug)]
pub struct Node {
    pub id: usize,
    pub priority: usize,
    pub owner: Player,
    pub successors: Vec<usize>,
    pub name: Option<String>,
}

#[derive(Debug)]
pub struct ParityGame {
    /// Largest node id, as declared in the header.
    pub max_id: usize,
    pub start: Option<usize>,
    pub nodes: Vec<Node>,
}
