use solver::game::{Game, NodeId};
use solver::index::IndexedVec;
use solver::Map;
use thiserror::Error;

use crate::ParityGame;

#[derive(Debug, Error, PartialEq)]
pub enum ConvError {
    #[error("node {0} is declared twice")]
    DuplicateNode(usize),
    #[error("node {node} has successor {successor} which is never declared")]
    UnknownSuccessor { node: usize, successor: usize },
}

/// A PGSolver game renumbered densely for the solvers.
#[derive(Debug)]
pub struct Converted {
    pub game: Game,
    /// PGSolver id of every game node.
    pub ids: IndexedVec<NodeId, usize>,
    pub node_of: Map<usize, NodeId>,
}

/// Converts to the min-parity convention of the solvers.
///
/// Priorities are mirrored around the largest priority rounded up to an even
/// number, which reverses their order and keeps their parity.
pub fn to_game(pg: &ParityGame) -> Result<Converted, ConvError> {
    let top = pg.nodes.iter().map(|n| n.priority).max().map_or(0, |p| p + p % 2);

    let mut game = Game::new();
    let mut ids = IndexedVec::new();
    let mut node_of = Map::default();
    for node in &pg.nodes {
        let n = game.add_node(node.owner, top - node.priority);
        ids.push(node.id);
        if node_of.insert(node.id, n).is_some() {
            return Err(ConvError::DuplicateNode(node.id));
        }
    }

    for (node, n) in pg.nodes.iter().zip(ids.indexes()) {
        for &successor in &node.successors {
            let &succ = node_of
                .get(&successor)
                .ok_or(ConvError::UnknownSuccessor { node: node.id, successor })?;
            game.add_edge(n, succ);
        }
    }

    Ok(Converted { game, ids, node_of })
}
