use automaton::{Automaton, Priority};
use log::debug;
use solver::game::{Game, NodeId, Player, INFINITE_PRIORITY};
use solver::index::IndexedVec;

use crate::graph::{ProductGraph, ProductState};
use crate::model::Model;
use crate::ProductError;

/// A game built from the reachable part of a product.
#[derive(Clone, Debug)]
pub struct ProductGame {
    pub game: Game,
    /// The product node behind every game node.
    pub states: IndexedVec<NodeId, ProductState>,
    /// Game nodes of the initial model nodes, in the model's order.
    pub initial: Vec<NodeId>,
}

/// Turns the product with a deterministic parity automaton into a game where
/// the players of `coalition` play Even against the other players.
///
/// State nodes belong to Even when their controller is in the coalition and
/// to Odd otherwise, distribution nodes are stochastic. A node's priority is
/// the priority of the automaton transition taken there; nodes where the
/// automaton does not move get the largest priority.
pub fn build_game<M, A>(
    graph: &mut ProductGraph<'_, M, A>,
    coalition: &[usize],
) -> Result<ProductGame, ProductError>
where
    M: Model,
    A: Automaton<Label = Priority>,
{
    if !graph.automaton().is_deterministic() {
        return Err(ProductError::NondeterministicAutomaton);
    }

    let initial = graph.initial_nodes()?;
    let model = graph.model();
    let mut game = Game::new();
    let mut states = IndexedVec::new();

    // Product nodes are numbered as they are reached, so node `n` of the
    // product becomes node `n` of the game.
    let mut edges = Vec::new();
    let mut next = 0;
    while next < graph.node_count() {
        let n = NodeId(next);
        let state = graph.state(n);
        let player = match model.is_state(state.model) {
            true if coalition.contains(&model.controller_of(state.model)) => Player::Even,
            true => Player::Odd,
            false => Player::Stochastic,
        };
        let priority = match graph.node_label(n)? {
            Some(label) => *graph.automaton().label(label),
            None => INFINITE_PRIORITY,
        };
        game.add_node(player, priority);
        states.push(state);

        for i in 0..graph.successor_count(n)? {
            edges.push((n, graph.successor(n, i)?, graph.weight(n, i)?));
        }
        next += 1;
    }

    for (from, to, weight) in edges {
        game.add_weighted_edge(from, to, weight);
    }
    game.normalize_priorities();
    debug!("product game: {} nodes, {} initial", states.len(), initial.len());

    Ok(ProductGame { game, states, initial })
}
