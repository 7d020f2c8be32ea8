use crate::game::{NodeId, NodeSet, ParityGame, Player};
use crate::index::IndexedVec;

/// Which players should get their decisions computed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StrategyRequest {
    pub even: bool,
    pub odd: bool,
}

impl StrategyRequest {
    pub const NONE: StrategyRequest = StrategyRequest { even: false, odd: false };
    pub const EVEN: StrategyRequest = StrategyRequest { even: true, odd: false };
    pub const ODD: StrategyRequest = StrategyRequest { even: false, odd: true };
    pub const BOTH: StrategyRequest = StrategyRequest { even: true, odd: true };

    pub fn any(self) -> bool {
        self.even || self.odd
    }

    pub fn wants(self, player: Player) -> bool {
        match player {
            Player::Even => self.even,
            Player::Odd => self.odd,
            Player::Stochastic => false,
        }
    }

    /// The same request seen from a game where the roles of Even and Odd are swapped.
    pub fn swapped(self) -> StrategyRequest {
        StrategyRequest { even: self.odd, odd: self.even }
    }
}

/// Positional strategy: for each node, the position of the chosen successor.
#[derive(Clone, Debug, PartialEq)]
pub struct Strategy {
    decisions: IndexedVec<NodeId, Option<usize>>,
}

impl Strategy {
    pub fn new(node_count: usize) -> Self {
        Self { decisions: IndexedVec::repeat(None, node_count) }
    }

    pub fn len(&self) -> usize {
        self.decisions.len()
    }

    pub fn get(&self, n: NodeId) -> Option<usize> {
        self.decisions[n]
    }

    pub fn set(&mut self, n: NodeId, decision: usize) {
        self.decisions[n] = Some(decision);
    }

    pub fn unset(&mut self, n: NodeId) {
        self.decisions[n] = None;
    }

    pub fn successor<G: ParityGame>(&self, game: &G, n: NodeId) -> Option<NodeId> {
        self.get(n).map(|i| game.successor(n, i))
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, usize)> + '_ {
        self.decisions.enumerate().filter_map(|(n, d)| Some((n, (*d)?)))
    }
}

/// Winning regions of a qualitative solve.
#[derive(Clone, Debug)]
pub struct QualitativeResult {
    /// Nodes won by Even.
    pub set0: NodeSet,
    /// Nodes won by Odd.
    pub set1: NodeSet,
    pub strategy: Option<Strategy>,
}

impl QualitativeResult {
    pub fn empty(node_count: usize) -> Self {
        Self { set0: NodeSet::new(node_count), set1: NodeSet::new(node_count), strategy: None }
    }

    pub fn winner(&self, n: NodeId) -> Option<Player> {
        if self.set0.contains(n) {
            Some(Player::Even)
        } else if self.set1.contains(n) {
            Some(Player::Odd)
        } else {
            None
        }
    }

    pub fn decision(&self, n: NodeId) -> Option<usize> {
        self.strategy.as_ref()?.get(n)
    }
}

/// Per-node probabilities that Even wins.
#[derive(Clone, Debug)]
pub struct QuantitativeResult {
    pub values: IndexedVec<NodeId, f64>,
    pub strategy: Option<Strategy>,
}

impl QuantitativeResult {
    pub fn decision(&self, n: NodeId) -> Option<usize> {
        self.strategy.as_ref()?.get(n)
    }
}
