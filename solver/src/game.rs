use std::fmt;

use bitvec::vec::BitVec;
use thiserror::Error;

use crate::index::{AsIndex, IndexedVec};
use crate::new_index;

new_index!(pub index NodeId);

/// Sentinel for "no priority"; replaced by `max_priority + 1` before solving.
pub const INFINITE_PRIORITY: usize = usize::MAX;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Player {
    Even,
    Odd,
    Stochastic,
}

impl Player {
    pub fn opponent(self) -> Player {
        match self {
            Player::Even => Player::Odd,
            Player::Odd => Player::Even,
            Player::Stochastic => Player::Stochastic,
        }
    }

    /// The player favoured by a priority under the min-parity condition.
    pub fn of_priority(priority: usize) -> Player {
        match priority % 2 {
            0 => Player::Even,
            _ => Player::Odd,
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Player::Even => f.write_str("even"),
            Player::Odd => f.write_str("odd"),
            Player::Stochastic => f.write_str("stochastic"),
        }
    }
}

/// A (possibly stochastic) parity game under the min-parity condition.
///
/// Successors are ordered, and decisions refer to a successor by its position.
pub trait ParityGame {
    fn node_count(&self) -> usize;

    fn player_of(&self, n: NodeId) -> Player;
    fn priority_of(&self, n: NodeId) -> usize;

    fn successor_count(&self, n: NodeId) -> usize;
    fn successor(&self, n: NodeId, i: usize) -> NodeId;

    /// Probability weight of an edge. Only meaningful for stochastic nodes.
    fn weight(&self, n: NodeId, i: usize) -> f64;

    fn successors_of(&self, n: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.successor_count(n)).map(move |i| self.successor(n, i))
    }

    fn nodes(&self) -> impl Iterator<Item = NodeId> {
        (0..self.node_count()).map(NodeId)
    }

    fn max_priority(&self) -> Option<usize> {
        self.nodes().map(|n| self.priority_of(n)).filter(|&p| p != INFINITE_PRIORITY).max()
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum GameError {
    #[error("node {node} has successor {successor} which is not part of the game")]
    SuccessorOutOfRange { node: NodeId, successor: usize },
    #[error("node {0} has no successors")]
    DeadEnd(NodeId),
    #[error("edge {index} of stochastic node {node} has invalid weight {weight}")]
    InvalidWeight { node: NodeId, index: usize, weight: f64 },
    #[error("node {0} has an infinite priority, normalize priorities first")]
    InfinitePriority(NodeId),
}

/// Checks the well-formedness conditions every solver relies on.
pub fn validate_game<G: ParityGame>(game: &G) -> Result<(), GameError> {
    let node_count = game.node_count();
    for n in game.nodes() {
        if game.priority_of(n) == INFINITE_PRIORITY {
            return Err(GameError::InfinitePriority(n));
        }
        let count = game.successor_count(n);
        if count == 0 {
            return Err(GameError::DeadEnd(n));
        }
        for i in 0..count {
            let succ = game.successor(n, i).to_usize();
            if succ >= node_count {
                return Err(GameError::SuccessorOutOfRange { node: n, successor: succ });
            }
            if game.player_of(n) == Player::Stochastic {
                let weight = game.weight(n, i);
                if !weight.is_finite() || weight <= 0.0 {
                    return Err(GameError::InvalidWeight { node: n, index: i, weight });
                }
            }
        }
    }
    Ok(())
}

/// Explicitly stored game.
#[derive(Clone, Debug, Default)]
pub struct Game {
    players: IndexedVec<NodeId, Player>,
    priorities: IndexedVec<NodeId, usize>,
    successors: IndexedVec<NodeId, Vec<NodeId>>,
    weights: IndexedVec<NodeId, Vec<f64>>,
}

impl Game {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, player: Player, priority: usize) -> NodeId {
        self.successors.push(Vec::new());
        self.weights.push(Vec::new());
        self.priorities.push(priority);
        self.players.push(player)
    }

    pub fn add_edge(&mut self, from: NodeId, to: NodeId) {
        self.add_weighted_edge(from, to, 1.0);
    }

    pub fn add_weighted_edge(&mut self, from: NodeId, to: NodeId, weight: f64) {
        self.successors[from].push(to);
        self.weights[from].push(weight);
    }

    pub fn set_priority(&mut self, n: NodeId, priority: usize) {
        self.priorities[n] = priority;
    }

    /// Replaces [`INFINITE_PRIORITY`] by one more than the largest finite priority.
    pub fn normalize_priorities(&mut self) {
        let infinite = self.max_priority().map_or(0, |p| p + 1);
        for priority in self.priorities.iter_mut() {
            if *priority == INFINITE_PRIORITY {
                *priority = infinite;
            }
        }
    }

    /// Copies any game into explicit storage.
    pub fn from_game<G: ParityGame>(game: &G) -> Self {
        let mut result = Game::new();
        for n in game.nodes() {
            result.add_node(game.player_of(n), game.priority_of(n));
        }
        for n in game.nodes() {
            for i in 0..game.successor_count(n) {
                result.add_weighted_edge(n, game.successor(n, i), game.weight(n, i));
            }
        }
        result
    }
}

impl ParityGame for Game {
    fn node_count(&self) -> usize {
        self.players.len()
    }

    fn player_of(&self, n: NodeId) -> Player {
        self.players[n]
    }

    fn priority_of(&self, n: NodeId) -> usize {
        self.priorities[n]
    }

    fn successor_count(&self, n: NodeId) -> usize {
        self.successors[n].len()
    }

    fn successor(&self, n: NodeId, i: usize) -> NodeId {
        self.successors[n][i]
    }

    fn weight(&self, n: NodeId, i: usize) -> f64 {
        self.weights[n][i]
    }

    fn successors_of(&self, n: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.successors[n].iter().copied()
    }
}

/// Predecessor lists of a game, each entry remembering which successor
/// position of the predecessor leads to the node.
pub struct Predecessors {
    offsets: Vec<usize>,
    edges: Vec<(NodeId, usize)>,
}

impl Predecessors {
    pub fn new<G: ParityGame>(game: &G) -> Self {
        let node_count = game.node_count();
        let mut offsets = vec![0; node_count + 1];
        for n in game.nodes() {
            for succ in game.successors_of(n) {
                offsets[succ.to_usize() + 1] += 1;
            }
        }
        for i in 0..node_count {
            offsets[i + 1] += offsets[i];
        }

        let mut fill = offsets.clone();
        let mut edges = vec![(NodeId(0), 0); offsets[node_count]];
        for n in game.nodes() {
            for (i, succ) in game.successors_of(n).enumerate() {
                let slot = &mut fill[succ.to_usize()];
                edges[*slot] = (n, i);
                *slot += 1;
            }
        }

        Self { offsets, edges }
    }

    pub fn of(&self, n: NodeId) -> &[(NodeId, usize)] {
        &self.edges[self.offsets[n.to_usize()]..self.offsets[n.to_usize() + 1]]
    }
}

/// A set of nodes of one game, stored as a bitset over the whole node range.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct NodeSet {
    bits: BitVec,
}

impl NodeSet {
    pub fn new(universe: usize) -> Self {
        Self { bits: BitVec::repeat(false, universe) }
    }

    pub fn full(universe: usize) -> Self {
        Self { bits: BitVec::repeat(true, universe) }
    }

    pub fn from_nodes(universe: usize, nodes: impl IntoIterator<Item = NodeId>) -> Self {
        let mut set = Self::new(universe);
        for n in nodes {
            set.insert(n);
        }
        set
    }

    pub fn universe(&self) -> usize {
        self.bits.len()
    }

    pub fn contains(&self, n: NodeId) -> bool {
        self.bits.get(n.to_usize()).map_or(false, |bit| *bit)
    }

    /// Returns whether the node was newly added.
    pub fn insert(&mut self, n: NodeId) -> bool {
        !self.bits.replace(n.to_usize(), true)
    }

    pub fn remove(&mut self, n: NodeId) -> bool {
        self.bits.replace(n.to_usize(), false)
    }

    pub fn clear(&mut self) {
        self.bits.fill(false);
    }

    pub fn len(&self) -> usize {
        self.bits.count_ones()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.not_any()
    }

    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.bits.iter_ones().map(NodeId)
    }

    pub fn union_with(&mut self, other: &NodeSet) {
        for i in other.bits.iter_ones() {
            self.bits.set(i, true);
        }
    }

    pub fn subtract(&mut self, other: &NodeSet) {
        for i in other.bits.iter_ones() {
            self.bits.set(i, false);
        }
    }

    pub fn difference(&self, other: &NodeSet) -> NodeSet {
        let mut result = self.clone();
        result.subtract(other);
        result
    }

    pub fn is_disjoint(&self, other: &NodeSet) -> bool {
        self.bits.iter_ones().all(|i| !other.bits.get(i).map_or(false, |bit| *bit))
    }

    pub fn is_subset(&self, other: &NodeSet) -> bool {
        self.bits.iter_ones().all(|i| other.bits.get(i).map_or(false, |bit| *bit))
    }
}

impl fmt::Debug for NodeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.bits.iter_ones()).finish()
    }
}
