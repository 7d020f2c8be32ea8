use std::time::Instant;

use log::{debug, info};

use crate::game::{validate_game, Game, NodeId, NodeSet, ParityGame, Player};
use crate::index::IndexedVec;
use crate::strategy::{QualitativeResult, Strategy, StrategyRequest};
use crate::view::Dual;

use super::{Jurdzinski, McNaughton, QualitativeSolver, SolveError};

/// A solver for games without stochastic nodes.
#[derive(Clone, Copy, Debug)]
pub enum NonStochasticSolver {
    McNaughton(McNaughton),
    Jurdzinski(Jurdzinski),
}

impl Default for NonStochasticSolver {
    fn default() -> Self {
        NonStochasticSolver::McNaughton(McNaughton::default())
    }
}

impl QualitativeSolver for NonStochasticSolver {
    fn solve<G: ParityGame>(
        &self,
        game: &G,
        strict_even: bool,
        request: StrategyRequest,
    ) -> Result<QualitativeResult, SolveError> {
        match self {
            NonStochasticSolver::McNaughton(solver) => solver.solve(game, strict_even, request),
            NonStochasticSolver::Jurdzinski(solver) => solver.solve(game, strict_even, request),
        }
    }
}

/// Solves stochastic games by replacing every stochastic node with a small
/// two player gadget and delegating to a non-stochastic solver.
#[derive(Clone, Copy, Debug, Default)]
pub struct Gadget {
    pub inner: NonStochasticSolver,
}

impl QualitativeSolver for Gadget {
    fn solve<G: ParityGame>(
        &self,
        game: &G,
        strict_even: bool,
        request: StrategyRequest,
    ) -> Result<QualitativeResult, SolveError> {
        if strict_even {
            return self.solve_strict(game, request);
        }

        // Odd winning almost surely is Even winning almost surely in the dual.
        let result = self.solve_strict(&Dual::new(game), request.swapped())?;
        Ok(QualitativeResult { set0: result.set1, set1: result.set0, strategy: result.strategy })
    }
}

impl Gadget {
    fn solve_strict<G: ParityGame>(
        &self,
        game: &G,
        request: StrategyRequest,
    ) -> Result<QualitativeResult, SolveError> {
        let start = Instant::now();
        let mut normalized = Game::from_game(game);
        normalized.normalize_priorities();
        validate_game(&normalized)?;

        let (transformed, mapping) = transform(&normalized);
        debug!(
            "gadget: {} nodes became {} nodes in {:?}",
            game.node_count(),
            transformed.node_count(),
            start.elapsed()
        );

        let result = self.inner.solve(&transformed, true, request)?;

        let node_count = game.node_count();
        let mut set0 = NodeSet::new(node_count);
        let mut set1 = NodeSet::new(node_count);
        let mut strategy = result.strategy.as_ref().map(|_| Strategy::new(node_count));
        for (n, &mapped) in mapping.enumerate() {
            if result.set0.contains(mapped) {
                set0.insert(n);
            } else if result.set1.contains(mapped) {
                set1.insert(n);
            }

            if let Some(strategy) = strategy.as_mut() {
                if request.wants(game.player_of(n)) {
                    if let Some(decision) = result.decision(mapped) {
                        strategy.set(n, decision);
                    }
                }
            }
        }

        info!("gadget: solved {node_count} nodes in {:?}", start.elapsed());
        Ok(QualitativeResult { set0, set1, strategy })
    }
}

/// Builds the two player game in which Even wins exactly where it wins the
/// original game almost surely. Returns it together with the node each
/// original node maps to; stochastic nodes map to the top of their gadget.
/// Priorities must be normalized.
///
/// Each gadget for a stochastic node of priority `p` has a top node owned by
/// Odd, one second layer node owned by Even for every even `k <= p + 1` and
/// one third layer node for every priority `j <= p`, owned by Odd if `j` is
/// even. Second layer node `k` leads to the third layer nodes of priority
/// `k - 1` and `k` where they exist, and third layer nodes reproduce the
/// edges of the stochastic node.
pub(crate) fn transform<G: ParityGame>(game: &G) -> (Game, IndexedVec<NodeId, NodeId>) {
    let mut mapping = IndexedVec::new();
    let mut next = 0;
    for n in game.nodes() {
        mapping.push(NodeId(next));
        next += match game.player_of(n) {
            Player::Stochastic => {
                let priority = game.priority_of(n);
                1 + (priority + 1) / 2 + 1 + priority + 1
            }
            _ => 1,
        };
    }

    let mut result = Game::new();
    for n in game.nodes() {
        let priority = game.priority_of(n);
        let successors = game.successors_of(n).map(|succ| mapping[succ]).collect::<Vec<_>>();

        if game.player_of(n) != Player::Stochastic {
            let node = result.add_node(game.player_of(n), priority);
            for &succ in &successors {
                result.add_edge(node, succ);
            }
            continue;
        }

        let top = result.add_node(Player::Odd, priority);
        let second_count = (priority + 1) / 2 + 1;
        let second = (0..second_count)
            .map(|_| result.add_node(Player::Even, priority))
            .collect::<Vec<_>>();
        let third = (0..=priority)
            .map(|j| result.add_node(Player::of_priority(j).opponent(), j))
            .collect::<Vec<_>>();

        for &node in &second {
            result.add_edge(top, node);
        }
        for (&node, k) in second.iter().zip((0..).step_by(2)) {
            if k > 0 {
                result.add_edge(node, third[k - 1]);
            }
            if k <= priority {
                result.add_edge(node, third[k]);
            }
        }
        for &node in &third {
            for &succ in &successors {
                result.add_edge(node, succ);
            }
        }
    }

    debug_assert_eq!(result.node_count(), next);
    (result, mapping)
}
