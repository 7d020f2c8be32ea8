use std::collections::VecDeque;

use crate::game::{NodeId, NodeSet, ParityGame, Player, Predecessors};
use crate::index::{AsIndex, IndexedVec};
use crate::strategy::Strategy;

/// Nodes of `nodes` from which `player` reaches `target` with positive
/// probability whatever the opponent does. Stochastic nodes need a single
/// successor in the attractor, like the nodes of `player`.
pub fn strong_attractor<G: ParityGame>(
    game: &G,
    preds: &Predecessors,
    target: &NodeSet,
    nodes: &NodeSet,
    player: Player,
) -> NodeSet {
    attract(game, preds, target, nodes, None, player, None)
}

/// Nodes of `nodes` from which `player` reaches `target` with probability one.
///
/// Repeatedly removes the region from which the opponent can avoid `target`
/// with positive probability, until the strong attractor covers what is left.
/// Plays that reach `target` are over, so the opponent never attracts nodes of
/// `target`, and edges into `target` count as ways out of the opponent's
/// region.
pub fn weak_attractor<G: ParityGame>(
    game: &G,
    preds: &Predecessors,
    target: &NodeSet,
    nodes: &NodeSet,
    player: Player,
) -> NodeSet {
    let mut nodes = nodes.clone();
    let mut same = strong_attractor(game, preds, target, &nodes, player);
    while same != nodes {
        let outside = nodes.difference(&same);
        let other = attract(game, preds, &outside, &nodes, Some(target), player.opponent(), None);
        nodes.subtract(&other);
        same = strong_attractor(game, preds, target, &nodes, player);
    }
    same
}

/// Records, for every node of `player` in `attr` outside `target`, the
/// successor through which it was attracted.
///
/// `attr` must be an attractor of `target` for `player`, strong or weak.
pub(crate) fn record_strategy<G: ParityGame>(
    game: &G,
    preds: &Predecessors,
    target: &NodeSet,
    attr: &NodeSet,
    player: Player,
    strategy: &mut Strategy,
) {
    attract(game, preds, target, attr, None, player, Some(strategy));
}

/// Attractor of `target` inside `nodes`. Nodes of `blocked` stay part of the
/// arena but are never attracted.
fn attract<G: ParityGame>(
    game: &G,
    preds: &Predecessors,
    target: &NodeSet,
    nodes: &NodeSet,
    blocked: Option<&NodeSet>,
    player: Player,
    mut strategy: Option<&mut Strategy>,
) -> NodeSet {
    let mut remaining = IndexedVec::<NodeId, usize>::repeat(0, game.node_count());
    let mut attr = NodeSet::new(game.node_count());
    let mut queue = VecDeque::new();

    for n in nodes.iter() {
        if target.contains(n) {
            attr.insert(n);
            queue.push_back(n);
        } else if game.player_of(n) == player || game.player_of(n) == Player::Stochastic {
            remaining[n] = 1;
        } else {
            remaining[n] = game.successors_of(n).filter(|&succ| nodes.contains(succ)).count();
        }
    }

    while let Some(v) = queue.pop_front() {
        for &(u, i) in preds.of(v) {
            if !nodes.contains(u) || attr.contains(u) || blocked.is_some_and(|b| b.contains(u)) {
                continue;
            }

            debug_assert!(remaining[u] > 0, "node {} counted below zero", u.to_usize());
            remaining[u] -= 1;
            if remaining[u] == 0 {
                attr.insert(u);
                queue.push_back(u);
                if game.player_of(u) == player {
                    if let Some(strategy) = strategy.as_deref_mut() {
                        strategy.set(u, i);
                    }
                }
            }
        }
    }

    attr
}

#[cfg(test)]
mod test {
    use test_log::test;

    use super::*;
    use crate::game::Game;

    // 0 (Even) -> 1, 2
    // 1 (Odd) -> 2, 3
    // 2 (Even) -> 2
    // 3 (Stochastic) -> 2, 3
    // 4 (Odd) -> 4
    fn game() -> Game {
        let mut game = Game::new();
        let n0 = game.add_node(Player::Even, 0);
        let n1 = game.add_node(Player::Odd, 1);
        let n2 = game.add_node(Player::Even, 0);
        let n3 = game.add_node(Player::Stochastic, 2);
        let n4 = game.add_node(Player::Odd, 1);
        game.add_edge(n0, n1);
        game.add_edge(n0, n2);
        game.add_edge(n1, n2);
        game.add_edge(n1, n3);
        game.add_edge(n2, n2);
        game.add_weighted_edge(n3, n2, 0.5);
        game.add_weighted_edge(n3, n3, 0.5);
        game.add_edge(n4, n4);
        game
    }

    #[test]
    fn strong_attractor_for_both_players() {
        let game = game();
        let preds = Predecessors::new(&game);
        let all = NodeSet::full(5);

        let target = NodeSet::from_nodes(5, [NodeId(2)]);
        let even = strong_attractor(&game, &preds, &target, &all, Player::Even);
        assert_eq!(even, NodeSet::from_nodes(5, [0, 1, 2, 3].map(NodeId)));

        let target = NodeSet::from_nodes(5, [NodeId(3)]);
        let odd = strong_attractor(&game, &preds, &target, &all, Player::Odd);
        assert_eq!(odd, NodeSet::from_nodes(5, [1, 3].map(NodeId)));
    }

    #[test]
    fn attractor_respects_node_subset() {
        let game = game();
        let preds = Predecessors::new(&game);
        let nodes = NodeSet::from_nodes(5, [0, 1, 3].map(NodeId));
        let target = NodeSet::from_nodes(5, [NodeId(3)]);

        // Node 1 only has node 3 as successor inside the subset.
        let even = strong_attractor(&game, &preds, &target, &nodes, Player::Even);
        assert_eq!(even, NodeSet::from_nodes(5, [0, 1, 3].map(NodeId)));
    }

    #[test]
    fn strong_attractor_is_idempotent() {
        let game = game();
        let preds = Predecessors::new(&game);
        let all = NodeSet::full(5);
        for player in [Player::Even, Player::Odd] {
            for n in game.nodes() {
                let target = NodeSet::from_nodes(5, [n]);
                let once = strong_attractor(&game, &preds, &target, &all, player);
                let twice = strong_attractor(&game, &preds, &once, &all, player);
                assert_eq!(once, twice);
            }
        }
    }

    #[test]
    fn weak_attractor_excludes_positive_escape() {
        // 0 (Stochastic) -> 1, 2; 1 (Even) -> 1; 2 (Odd) -> 2
        let mut game = Game::new();
        let n0 = game.add_node(Player::Stochastic, 0);
        let n1 = game.add_node(Player::Even, 0);
        let n2 = game.add_node(Player::Odd, 0);
        game.add_weighted_edge(n0, n1, 0.5);
        game.add_weighted_edge(n0, n2, 0.5);
        game.add_edge(n1, n1);
        game.add_edge(n2, n2);
        let preds = Predecessors::new(&game);
        let all = NodeSet::full(3);
        let target = NodeSet::from_nodes(3, [n1]);

        let strong = strong_attractor(&game, &preds, &target, &all, Player::Even);
        assert_eq!(strong, NodeSet::from_nodes(3, [n0, n1]));
        let weak = weak_attractor(&game, &preds, &target, &all, Player::Even);
        assert_eq!(weak, NodeSet::from_nodes(3, [n1]));
    }

    #[test]
    fn weak_attractor_keeps_edges_into_the_target() {
        // 0 (Even) -> 1, 2; 1 (Even) -> 1; 2 (Odd) -> 2
        // 3 (Even) -> 4; 4 (Odd) -> 4, 2
        let mut game = Game::new();
        let n0 = game.add_node(Player::Even, 0);
        let n1 = game.add_node(Player::Even, 0);
        let n2 = game.add_node(Player::Odd, 0);
        let n3 = game.add_node(Player::Even, 0);
        let n4 = game.add_node(Player::Odd, 0);
        game.add_edge(n0, n1);
        game.add_edge(n0, n2);
        game.add_edge(n1, n1);
        game.add_edge(n2, n2);
        game.add_edge(n3, n4);
        game.add_edge(n4, n4);
        game.add_edge(n4, n2);
        let preds = Predecessors::new(&game);
        let all = NodeSet::full(5);
        let target = NodeSet::from_nodes(5, [n1, n4]);

        // Node 0 picks its edge into the target, node 4 is reached already.
        let strong = strong_attractor(&game, &preds, &target, &all, Player::Even);
        let weak = weak_attractor(&game, &preds, &target, &all, Player::Even);
        assert_eq!(weak, NodeSet::from_nodes(5, [n0, n1, n3, n4]));
        assert_eq!(weak, strong);
    }

    #[test]
    fn weak_attractor_matches_strong_attractor_without_stochastic_nodes() {
        // 0 (Odd) -> 0; 1 (Odd) -> 0, 2; 2 (Odd) -> 3, 1; 3 (Odd) -> 4
        // 4 (Even) -> 2, 5; 5 (Odd) -> 5
        let mut game = Game::new();
        let nodes = [
            (Player::Odd, &[0][..]),
            (Player::Odd, &[0, 2]),
            (Player::Odd, &[3, 1]),
            (Player::Odd, &[4]),
            (Player::Even, &[2, 5]),
            (Player::Odd, &[5]),
        ];
        for &(player, _) in &nodes {
            game.add_node(player, 0);
        }
        for (n, &(_, successors)) in nodes.iter().enumerate() {
            for &succ in successors {
                game.add_edge(NodeId(n), NodeId(succ));
            }
        }
        let preds = Predecessors::new(&game);
        let all = NodeSet::full(6);
        for player in [Player::Even, Player::Odd] {
            for target in [[0], [5], [2]].map(|t| NodeSet::from_nodes(6, t.map(NodeId))) {
                let strong = strong_attractor(&game, &preds, &target, &all, player);
                let weak = weak_attractor(&game, &preds, &target, &all, player);
                assert_eq!(weak, strong, "{player:?} {target:?}");
            }
        }
    }

    #[test]
    fn weak_attractor_keeps_almost_sure_loops() {
        let game = game();
        let preds = Predecessors::new(&game);
        let all = NodeSet::full(5);
        let target = NodeSet::from_nodes(5, [NodeId(2)]);

        // Node 3 reaches node 2 with probability one by retrying.
        let weak = weak_attractor(&game, &preds, &target, &all, Player::Even);
        assert_eq!(weak, NodeSet::from_nodes(5, [0, 1, 2, 3].map(NodeId)));
    }

    #[test]
    fn recorded_strategy_moves_towards_target() {
        let game = game();
        let preds = Predecessors::new(&game);
        let all = NodeSet::full(5);
        let target = NodeSet::from_nodes(5, [NodeId(3)]);
        let attr = strong_attractor(&game, &preds, &target, &all, Player::Odd);

        let mut strategy = Strategy::new(5);
        record_strategy(&game, &preds, &target, &attr, Player::Odd, &mut strategy);
        assert_eq!(strategy.get(NodeId(1)), Some(1));
        assert_eq!(strategy.get(NodeId(3)), None);
        assert_eq!(strategy.get(NodeId(0)), None);
    }
}
