//! Probabilities of reaching a target set, the building block of the
//! quantitative solver.

use std::collections::VecDeque;
use std::time::Instant;

use log::{debug, trace};

use crate::attractor::strong_attractor;
use crate::game::{NodeId, NodeSet, ParityGame, Player, Predecessors};
use crate::index::IndexedVec;
use crate::strategy::{QuantitativeResult, Strategy, StrategyRequest};

pub trait ReachabilitySolver {
    /// Maximal probability (Even maximizes, Odd minimizes) of reaching
    /// `target` from every node of `game`.
    fn solve<G: ParityGame>(
        &self,
        game: &G,
        target: &NodeSet,
        request: StrategyRequest,
    ) -> QuantitativeResult;
}

/// Gauss-Seidel value iteration with a graph based pre-pass for the nodes
/// that cannot reach the target at all.
#[derive(Clone, Copy, Debug)]
pub struct ValueIteration {
    /// Iteration stops once no value changes by this much in a sweep.
    pub precision: f64,
    /// Values closer than this are considered equal when choosing decisions.
    pub tolerance: f64,
}

impl Default for ValueIteration {
    fn default() -> Self {
        Self { precision: 1e-10, tolerance: 1e-6 }
    }
}

impl ReachabilitySolver for ValueIteration {
    fn solve<G: ParityGame>(
        &self,
        game: &G,
        target: &NodeSet,
        request: StrategyRequest,
    ) -> QuantitativeResult {
        let start = Instant::now();
        let node_count = game.node_count();
        let preds = Predecessors::new(game);
        let all = NodeSet::full(node_count);
        let positive = strong_attractor(game, &preds, target, &all, Player::Even);

        let mut values = IndexedVec::<NodeId, f64>::repeat(0.0, node_count);
        for n in target.iter() {
            values[n] = 1.0;
        }

        let unknown = positive.difference(target).iter().collect::<Vec<_>>();
        let mut sweeps = 0;
        loop {
            sweeps += 1;
            let mut max_change = 0f64;
            for &n in &unknown {
                let value = step(game, &values, n);
                max_change = max_change.max((value - values[n]).abs());
                values[n] = value;
            }
            trace!("value iteration: sweep {sweeps}, largest change {max_change:e}");
            if max_change < self.precision {
                break;
            }
        }
        debug!(
            "value iteration: {} of {node_count} nodes positive, {sweeps} sweeps in {:?}",
            positive.len(),
            start.elapsed()
        );

        let strategy = request.any().then(|| self.strategy(game, &preds, target, &values, request));
        QuantitativeResult { values, strategy }
    }
}

impl ValueIteration {
    fn strategy<G: ParityGame>(
        &self,
        game: &G,
        preds: &Predecessors,
        target: &NodeSet,
        values: &IndexedVec<NodeId, f64>,
        request: StrategyRequest,
    ) -> Strategy {
        let mut strategy = Strategy::new(game.node_count());

        if request.even {
            for n in target.iter().filter(|&n| game.player_of(n) == Player::Even) {
                let inside = game.successors_of(n).position(|succ| target.contains(succ));
                strategy.set(n, inside.unwrap_or(0));
            }

            // Attractor of the target in which Even only follows value
            // preserving edges. Odd nodes join once all their successors
            // did, so Odd cannot keep the play away from the target.
            let mut remaining = IndexedVec::<NodeId, usize>::repeat(1, game.node_count());
            for n in game.nodes().filter(|&n| game.player_of(n) == Player::Odd) {
                remaining[n] = game.successor_count(n);
            }
            let mut seen = target.clone();
            let mut queue = target.iter().collect::<VecDeque<_>>();
            while let Some(v) = queue.pop_front() {
                for &(u, i) in preds.of(v) {
                    if seen.contains(u) || values[u] <= 0.0 {
                        continue;
                    }
                    match game.player_of(u) {
                        Player::Even if (values[u] - values[v]).abs() > self.tolerance => continue,
                        Player::Even => strategy.set(u, i),
                        Player::Odd => {
                            remaining[u] -= 1;
                            if remaining[u] > 0 {
                                continue;
                            }
                        }
                        Player::Stochastic => {}
                    }
                    seen.insert(u);
                    queue.push_back(u);
                }
            }
        }

        for n in game.nodes() {
            match game.player_of(n) {
                Player::Even if request.even && strategy.get(n).is_none() => {
                    strategy.set(n, best_successor(game, values, n, |a, b| a > b));
                }
                Player::Odd if request.odd => {
                    strategy.set(n, best_successor(game, values, n, |a, b| a < b));
                }
                _ => {}
            }
        }

        strategy
    }
}

fn step<G: ParityGame>(game: &G, values: &IndexedVec<NodeId, f64>, n: NodeId) -> f64 {
    let successors = game.successors_of(n).map(|succ| values[succ]);
    match game.player_of(n) {
        Player::Even => successors.fold(0.0, f64::max),
        Player::Odd => successors.reduce(f64::min).unwrap_or(0.0),
        Player::Stochastic => {
            let count = game.successor_count(n);
            (0..count).map(|i| game.weight(n, i) * values[game.successor(n, i)]).sum()
        }
    }
}

/// First successor whose value is not beaten by a later one under `better`.
fn best_successor<G: ParityGame>(
    game: &G,
    values: &IndexedVec<NodeId, f64>,
    n: NodeId,
    better: impl Fn(f64, f64) -> bool,
) -> usize {
    let mut best = 0;
    for i in 1..game.successor_count(n) {
        if better(values[game.successor(n, i)], values[game.successor(n, best)]) {
            best = i;
        }
    }
    best
}
