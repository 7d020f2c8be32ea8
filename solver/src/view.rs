//! Read-only views over a game that hide edges or remap node properties
//! without copying the underlying graph.

use bitvec::vec::BitVec;

use crate::game::{NodeId, NodeSet, ParityGame, Player, INFINITE_PRIORITY};
use crate::index::{AsIndex, IndexedVec};
use crate::strategy::Strategy;

/// The game restricted to a subset of its nodes, renumbered densely.
///
/// Edges leaving the subset are hidden. Weights are kept as they are, so a
/// stochastic node may end up with less than full probability mass.
pub struct Subgame<'g, G> {
    game: &'g G,
    sub_to_orig: IndexedVec<NodeId, NodeId>,
    orig_to_sub: IndexedVec<NodeId, Option<NodeId>>,
    kept: IndexedVec<NodeId, Vec<usize>>,
}

impl<'g, G: ParityGame> Subgame<'g, G> {
    pub fn new(game: &'g G, nodes: &NodeSet) -> Self {
        let sub_to_orig = nodes.iter().collect::<IndexedVec<NodeId, _>>();
        let mut orig_to_sub = IndexedVec::repeat(None, game.node_count());
        for (sub, &orig) in sub_to_orig.enumerate() {
            orig_to_sub[orig] = Some(sub);
        }
        let kept = sub_to_orig
            .iter()
            .map(|&orig| {
                (0..game.successor_count(orig))
                    .filter(|&i| nodes.contains(game.successor(orig, i)))
                    .collect()
            })
            .collect();
        Self { game, sub_to_orig, orig_to_sub, kept }
    }

    pub fn to_orig(&self, n: NodeId) -> NodeId {
        self.sub_to_orig[n]
    }

    pub fn to_sub(&self, n: NodeId) -> Option<NodeId> {
        self.orig_to_sub[n]
    }

    /// Position in the underlying game of the `i`-th successor of `n`.
    pub fn orig_successor(&self, n: NodeId, i: usize) -> usize {
        self.kept[n][i]
    }

    /// Lifts a node set of the subgame to the node range of the underlying game.
    pub fn lift(&self, set: &NodeSet) -> NodeSet {
        NodeSet::from_nodes(self.game.node_count(), set.iter().map(|n| self.to_orig(n)))
    }
}

impl<G: ParityGame> ParityGame for Subgame<'_, G> {
    fn node_count(&self) -> usize {
        self.sub_to_orig.len()
    }

    fn player_of(&self, n: NodeId) -> Player {
        self.game.player_of(self.to_orig(n))
    }

    fn priority_of(&self, n: NodeId) -> usize {
        self.game.priority_of(self.to_orig(n))
    }

    fn successor_count(&self, n: NodeId) -> usize {
        self.kept[n].len()
    }

    fn successor(&self, n: NodeId, i: usize) -> NodeId {
        let succ = self.game.successor(self.to_orig(n), self.kept[n][i]);
        self.orig_to_sub[succ].unwrap_or_else(|| unreachable!("hidden edge {n:?} -> {succ:?}"))
    }

    fn weight(&self, n: NodeId, i: usize) -> f64 {
        self.game.weight(self.to_orig(n), self.kept[n][i])
    }
}

/// One bit per edge of a game.
pub struct EdgeMask {
    offsets: Vec<usize>,
    bits: BitVec,
}

impl EdgeMask {
    pub fn new<G: ParityGame>(game: &G) -> Self {
        let mut offsets = Vec::with_capacity(game.node_count() + 1);
        offsets.push(0);
        for n in game.nodes() {
            offsets.push(offsets[n.to_usize()] + game.successor_count(n));
        }
        let bits = BitVec::repeat(false, offsets[game.node_count()]);
        Self { offsets, bits }
    }

    pub fn set(&mut self, n: NodeId, i: usize) {
        self.bits.set(self.offsets[n.to_usize()] + i, true);
    }

    pub fn contains(&self, n: NodeId, i: usize) -> bool {
        self.bits[self.offsets[n.to_usize()] + i]
    }
}

/// The game with some successor edges hidden; node ids are unchanged.
pub struct Restricted<'g, G> {
    game: &'g G,
    kept: IndexedVec<NodeId, Vec<usize>>,
}

impl<'g, G: ParityGame> Restricted<'g, G> {
    pub fn new(game: &'g G, mask: &EdgeMask) -> Self {
        let kept = game
            .nodes()
            .map(|n| (0..game.successor_count(n)).filter(|&i| mask.contains(n, i)).collect())
            .collect();
        Self { game, kept }
    }

    /// Fixes the decisions of `player` to the ones of `strategy`. Nodes of
    /// `player` without a decision keep all their edges.
    pub fn induced(game: &'g G, strategy: &Strategy, player: Player) -> Self {
        let kept = game
            .nodes()
            .map(|n| match strategy.get(n) {
                Some(decision) if game.player_of(n) == player => vec![decision],
                _ => (0..game.successor_count(n)).collect(),
            })
            .collect();
        Self { game, kept }
    }

    pub fn orig_successor(&self, n: NodeId, i: usize) -> usize {
        self.kept[n][i]
    }
}

impl<G: ParityGame> ParityGame for Restricted<'_, G> {
    fn node_count(&self) -> usize {
        self.game.node_count()
    }

    fn player_of(&self, n: NodeId) -> Player {
        self.game.player_of(n)
    }

    fn priority_of(&self, n: NodeId) -> usize {
        self.game.priority_of(n)
    }

    fn successor_count(&self, n: NodeId) -> usize {
        self.kept[n].len()
    }

    fn successor(&self, n: NodeId, i: usize) -> NodeId {
        self.game.successor(n, self.kept[n][i])
    }

    fn weight(&self, n: NodeId, i: usize) -> f64 {
        self.game.weight(n, self.kept[n][i])
    }
}

/// The game seen from Odd: players swapped and every priority shifted by one,
/// so that Even's objective in the dual is Odd's objective in the original.
pub struct Dual<'g, G> {
    game: &'g G,
}

impl<'g, G: ParityGame> Dual<'g, G> {
    pub fn new(game: &'g G) -> Self {
        Self { game }
    }
}

impl<G: ParityGame> ParityGame for Dual<'_, G> {
    fn node_count(&self) -> usize {
        self.game.node_count()
    }

    fn player_of(&self, n: NodeId) -> Player {
        self.game.player_of(n).opponent()
    }

    fn priority_of(&self, n: NodeId) -> usize {
        match self.game.priority_of(n) {
            INFINITE_PRIORITY => INFINITE_PRIORITY,
            p => p + 1,
        }
    }

    fn successor_count(&self, n: NodeId) -> usize {
        self.game.successor_count(n)
    }

    fn successor(&self, n: NodeId, i: usize) -> NodeId {
        self.game.successor(n, i)
    }

    fn weight(&self, n: NodeId, i: usize) -> f64 {
        self.game.weight(n, i)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::game::Game;

    fn chain() -> Game {
        let mut game = Game::new();
        let a = game.add_node(Player::Even, 0);
        let b = game.add_node(Player::Odd, 1);
        let c = game.add_node(Player::Stochastic, 2);
        game.add_edge(a, b);
        game.add_edge(a, c);
        game.add_edge(b, a);
        game.add_weighted_edge(c, a, 0.25);
        game.add_weighted_edge(c, c, 0.75);
        game
    }

    #[test]
    fn subgame_renumbers_and_hides_edges() {
        let game = chain();
        let nodes = NodeSet::from_nodes(3, [NodeId(0), NodeId(2)]);
        let sub = Subgame::new(&game, &nodes);

        assert_eq!(sub.node_count(), 2);
        assert_eq!(sub.to_orig(NodeId(1)), NodeId(2));
        assert_eq!(sub.to_sub(NodeId(1)), None);
        assert_eq!(sub.successors_of(NodeId(0)).collect::<Vec<_>>(), [NodeId(1)]);
        assert_eq!(sub.orig_successor(NodeId(0), 0), 1);
        assert_eq!(sub.weight(NodeId(1), 1), 0.75);
        assert_eq!(sub.player_of(NodeId(1)), Player::Stochastic);
    }

    #[test]
    fn induced_keeps_only_decisions() {
        let game = chain();
        let mut strategy = Strategy::new(3);
        strategy.set(NodeId(0), 1);
        let induced = Restricted::induced(&game, &strategy, Player::Even);

        assert_eq!(induced.successors_of(NodeId(0)).collect::<Vec<_>>(), [NodeId(2)]);
        assert_eq!(induced.orig_successor(NodeId(0), 0), 1);
        assert_eq!(induced.successor_count(NodeId(2)), 2);
    }

    #[test]
    fn mask_restriction() {
        let game = chain();
        let mut mask = EdgeMask::new(&game);
        mask.set(NodeId(2), 1);
        mask.set(NodeId(0), 0);
        let restricted = Restricted::new(&game, &mask);

        assert_eq!(restricted.successors_of(NodeId(2)).collect::<Vec<_>>(), [NodeId(2)]);
        assert_eq!(restricted.orig_successor(NodeId(2), 0), 1);
        assert_eq!(restricted.successor_count(NodeId(1)), 0);
    }

    #[test]
    fn dual_swaps_players_and_shifts_priorities() {
        let mut game = chain();
        game.set_priority(NodeId(1), INFINITE_PRIORITY);
        let dual = Dual::new(&game);

        assert_eq!(dual.player_of(NodeId(0)), Player::Odd);
        assert_eq!(dual.player_of(NodeId(1)), Player::Even);
        assert_eq!(dual.player_of(NodeId(2)), Player::Stochastic);
        assert_eq!(dual.priority_of(NodeId(0)), 1);
        assert_eq!(dual.priority_of(NodeId(1)), INFINITE_PRIORITY);
    }
}
