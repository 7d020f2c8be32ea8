use std::time::{Duration, Instant};

use log::{debug, info};

use crate::game::{validate_game, NodeId, NodeSet, ParityGame, Player};
use crate::index::IndexedVec;
use crate::qualitative::{QualitativeSolver, SolveError};
use crate::reach::ReachabilitySolver;
use crate::strategy::{QuantitativeResult, Strategy, StrategyRequest};
use crate::view::{Dual, EdgeMask, Restricted, Subgame};

use super::QuantitativeSolver;

/// Values below this are treated as exactly zero when looking for nodes whose
/// initial decisions need another attempt.
const ZERO: f64 = 1e-24;

/// Strategy iteration for stochastic parity games.
///
/// Even's strategy is improved against the best response of Odd until
/// neither a better valued successor nor the almost-sure region of the game
/// restricted to value-consistent edges suggests a change.
#[derive(Clone, Copy, Debug)]
pub struct Schewe<Q, R> {
    pub qualitative: Q,
    pub reach: R,
    /// Absolute difference under which two values count as equal.
    pub tolerance: f64,
}

#[derive(Default)]
struct Stats {
    init_calls: usize,
    direct: usize,
    indirect: usize,
    evaluation: Duration,
    restriction: Duration,
}

impl<Q: QualitativeSolver, R: ReachabilitySolver> QuantitativeSolver for Schewe<Q, R> {
    fn solve<G: ParityGame>(
        &self,
        game: &G,
        request: StrategyRequest,
    ) -> Result<QuantitativeResult, SolveError> {
        validate_game(game)?;

        let start = Instant::now();
        let mut stats = Stats::default();
        let mut strategy = Strategy::new(game.node_count());
        self.initialise(game, &NodeSet::full(game.node_count()), &mut strategy, &mut stats)?;
        debug!("schewe: {} initialisation calls in {:?}", stats.init_calls, start.elapsed());

        let mut result = self.improve(game, strategy, request, &mut stats)?;

        if !request.any() {
            result.strategy = None;
        } else if let Some(strategy) = result.strategy.as_mut().filter(|_| !request.even) {
            for n in game.nodes().filter(|&n| game.player_of(n) == Player::Even) {
                strategy.unset(n);
            }
        }

        debug!(
            "schewe: {} direct and {} indirect improvements, {:?} evaluating, {:?} restricting",
            stats.direct, stats.indirect, stats.evaluation, stats.restriction
        );
        info!("schewe: solved {} nodes in {:?}", game.node_count(), start.elapsed());
        Ok(result)
    }
}

impl<Q: QualitativeSolver, R: ReachabilitySolver> Schewe<Q, R> {
    /// Chooses initial decisions for the Even nodes of `nodes`: almost-sure
    /// winning decisions where possible, decisions maximizing the probability
    /// of reaching that region elsewhere. Nodes that cannot reach it at all
    /// are handled again on their own.
    fn initialise<G: ParityGame>(
        &self,
        game: &G,
        nodes: &NodeSet,
        strategy: &mut Strategy,
        stats: &mut Stats,
    ) -> Result<(), SolveError> {
        stats.init_calls += 1;
        let sub = Subgame::new(game, nodes);
        let even_nodes =
            sub.nodes().filter(|&s| sub.player_of(s) == Player::Even).collect::<Vec<_>>();

        let won = self.qualitative.solve(&sub, true, StrategyRequest::EVEN)?;
        if won.set0.is_empty() {
            for &s in &even_nodes {
                strategy.set(sub.to_orig(s), sub.orig_successor(s, 0));
            }
            return Ok(());
        }

        for &s in even_nodes.iter().filter(|&&s| won.set0.contains(s)) {
            if let Some(decision) = won.decision(s) {
                strategy.set(sub.to_orig(s), sub.orig_successor(s, decision));
            }
        }

        let reach = self.reach.solve(&sub, &won.set0, StrategyRequest::EVEN);
        for &s in even_nodes.iter().filter(|&&s| !won.set0.contains(s)) {
            if let Some(decision) = reach.decision(s) {
                strategy.set(sub.to_orig(s), sub.orig_successor(s, decision));
            }
        }

        let zero = NodeSet::from_nodes(
            game.node_count(),
            sub.nodes().filter(|&s| reach.values[s] < ZERO).map(|s| sub.to_orig(s)),
        );
        if !zero.is_empty() {
            self.initialise(game, &zero, strategy, stats)?;
        }
        Ok(())
    }

    fn improve<G: ParityGame>(
        &self,
        game: &G,
        mut strategy: Strategy,
        request: StrategyRequest,
        stats: &mut Stats,
    ) -> Result<QuantitativeResult, SolveError> {
        loop {
            let start = Instant::now();
            let evaluated = self.evaluate(game, &strategy, request.odd)?;
            stats.evaluation += start.elapsed();
            let values = &evaluated.values;

            let mut changed = false;
            for n in game.nodes().filter(|&n| game.player_of(n) == Player::Even) {
                let mut best = None;
                let mut best_value = values[n];
                for (i, succ) in game.successors_of(n).enumerate() {
                    if values[succ] > best_value {
                        best = Some(i);
                        best_value = values[succ];
                    }
                }
                if let Some(best) = best {
                    if best_value - values[n] >= self.tolerance {
                        strategy.set(n, best);
                        changed = true;
                    }
                }
            }

            if changed {
                stats.direct += 1;
                continue;
            }

            let start = Instant::now();
            changed = self.improve_restricted(game, values, &mut strategy)?;
            stats.restriction += start.elapsed();

            if changed {
                stats.indirect += 1;
                continue;
            }

            if request.odd {
                let odd = evaluated.strategy.as_ref();
                for n in game.nodes().filter(|&n| game.player_of(n) == Player::Odd) {
                    match odd.and_then(|odd| odd.get(n)) {
                        Some(decision) => strategy.set(n, decision),
                        None => strategy.unset(n),
                    }
                }
            }
            return Ok(QuantitativeResult { values: evaluated.values, strategy: Some(strategy) });
        }
    }

    /// Switches Even to the decisions winning almost surely when only edges
    /// consistent with `values` are allowed. Returns whether any decision changed.
    fn improve_restricted<G: ParityGame>(
        &self,
        game: &G,
        values: &IndexedVec<NodeId, f64>,
        strategy: &mut Strategy,
    ) -> Result<bool, SolveError> {
        let mut mask = EdgeMask::new(game);
        for n in game.nodes() {
            let value = values[n];
            for (i, succ) in game.successors_of(n).enumerate() {
                let succ_value = values[succ];
                let equal = (succ_value - value).abs() < self.tolerance;
                let keep = match game.player_of(n) {
                    Player::Stochastic => true,
                    Player::Even => succ_value >= value || equal,
                    Player::Odd => succ_value <= value || equal,
                };
                if keep {
                    mask.set(n, i);
                }
            }
        }

        let restricted = Restricted::new(game, &mask);
        let won = self.qualitative.solve(&restricted, true, StrategyRequest::EVEN)?;

        // Only worth switching if some node of the region is not yet won surely.
        if won.set0.iter().all(|n| values[n] >= 1.0 - self.tolerance) {
            return Ok(false);
        }

        let mut changed = false;
        for n in won.set0.iter().filter(|&n| game.player_of(n) == Player::Even) {
            let Some(decision) = won.decision(n) else { continue };
            let decision = restricted.orig_successor(n, decision);
            if strategy.get(n) != Some(decision) {
                strategy.set(n, decision);
                changed = true;
            }
        }
        Ok(changed)
    }

    /// Values of the Markov decision process left for Odd once Even's
    /// decisions are fixed, optionally with Odd's optimal decisions.
    fn evaluate<G: ParityGame>(
        &self,
        game: &G,
        strategy: &Strategy,
        want_odd: bool,
    ) -> Result<QuantitativeResult, SolveError> {
        let induced = Restricted::induced(game, strategy, Player::Even);
        let dual = Dual::new(&induced);
        let request = match want_odd {
            true => StrategyRequest::EVEN,
            false => StrategyRequest::NONE,
        };

        let won = self.qualitative.solve(&dual, true, request)?;
        let reach = self.reach.solve(&dual, &won.set0, request);

        let values = reach.values.iter().map(|value| 1.0 - value).collect();
        let odd = want_odd.then(|| {
            let mut odd = Strategy::new(game.node_count());
            for n in game.nodes().filter(|&n| game.player_of(n) == Player::Odd) {
                let decision = match won.set0.contains(n) {
                    true => won.decision(n),
                    false => reach.decision(n),
                };
                if let Some(decision) = decision {
                    odd.set(n, decision);
                }
            }
            odd
        });

        Ok(QuantitativeResult { values, strategy: odd })
    }
}
