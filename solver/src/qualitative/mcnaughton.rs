use std::time::Instant;

use log::{debug, info};

use crate::attractor::{record_strategy, strong_attractor, weak_attractor};
use crate::game::{validate_game, NodeId, NodeSet, ParityGame, Player, Predecessors};
use crate::strategy::{QualitativeResult, Strategy, StrategyRequest};

use super::{QualitativeSolver, SolveError};

/// Recursive attractor-based solver. Handles stochastic nodes directly.
#[derive(Clone, Copy, Debug)]
pub struct McNaughton {
    /// Whether a subgame whose priorities all have the same parity is
    /// immediately won by the favoured player.
    pub same_color_shortcut: bool,
}

impl Default for McNaughton {
    fn default() -> Self {
        Self { same_color_shortcut: true }
    }
}

impl QualitativeSolver for McNaughton {
    fn solve<G: ParityGame>(
        &self,
        game: &G,
        strict_even: bool,
        request: StrategyRequest,
    ) -> Result<QualitativeResult, SolveError> {
        validate_game(game)?;

        let start = Instant::now();
        let node_count = game.node_count();
        let mut solve = Solve {
            game,
            preds: Predecessors::new(game),
            strict_even,
            request,
            same_color_shortcut: self.same_color_shortcut,
            strategy: request.any().then(|| Strategy::new(node_count)),
            calls: 0,
        };
        let [set0, set1] = solve.recurse(NodeSet::full(node_count));

        debug!("mcnaughton: {} recursive calls", solve.calls);
        info!(
            "mcnaughton: solved {node_count} nodes in {:?}, even wins {}, odd wins {}",
            start.elapsed(),
            set0.len(),
            set1.len()
        );

        Ok(QualitativeResult { set0, set1, strategy: solve.strategy })
    }
}

/// Working state of one solver call.
struct Solve<'a, G> {
    game: &'a G,
    preds: Predecessors,
    strict_even: bool,
    request: StrategyRequest,
    same_color_shortcut: bool,
    strategy: Option<Strategy>,
    calls: usize,
}

impl<G: ParityGame> Solve<'_, G> {
    /// Returns the regions won by Even and Odd in the subgame induced by `p`.
    fn recurse(&mut self, mut p: NodeSet) -> [NodeSet; 2] {
        self.calls += 1;
        let node_count = self.game.node_count();
        let empty = || NodeSet::new(node_count);

        let Some(min) = p.iter().map(|n| self.game.priority_of(n)).min() else {
            return [empty(), empty()];
        };
        let this = min % 2;
        let other = 1 - this;

        if self.same_color_shortcut && p.iter().all(|n| self.game.priority_of(n) % 2 == this) {
            self.stay_inside(p.iter(), &p);
            let mut result = [empty(), empty()];
            result[this] = p;
            return result;
        }

        let player = Player::of_priority(min);
        let target = NodeSet::from_nodes(
            node_count,
            p.iter().filter(|&n| self.game.priority_of(n) == min),
        );
        let mut w_other = empty();

        loop {
            let satr = strong_attractor(self.game, &self.preds, &target, &p, player);
            let inner = self.recurse(p.difference(&satr));

            if inner[other].is_empty() {
                let targets = target.iter().filter(|&n| p.contains(n)).collect::<Vec<_>>();
                self.stay_inside(targets.iter().copied(), &p);
                let target_in_p = NodeSet::from_nodes(node_count, targets);
                self.record(&target_in_p, &satr, player);

                let mut result = [empty(), empty()];
                result[this] = p;
                result[other] = w_other;
                return result;
            }

            let opponent = player.opponent();
            let atr_other = if self.needs_almost_sure(opponent) {
                weak_attractor(self.game, &self.preds, &inner[other], &p, opponent)
            } else {
                strong_attractor(self.game, &self.preds, &inner[other], &p, opponent)
            };
            self.record(&inner[other], &atr_other, opponent);

            w_other.union_with(&atr_other);
            p.subtract(&atr_other);
        }
    }

    /// Whether the winning region of `player` must be won with probability one.
    fn needs_almost_sure(&self, player: Player) -> bool {
        match player {
            Player::Even => self.strict_even,
            Player::Odd => !self.strict_even,
            Player::Stochastic => false,
        }
    }

    /// Gives every requested node of `nodes` its first successor inside `p`.
    fn stay_inside(&mut self, nodes: impl Iterator<Item = NodeId>, p: &NodeSet) {
        let Some(strategy) = self.strategy.as_mut() else { return };
        for n in nodes {
            if !self.request.wants(self.game.player_of(n)) {
                continue;
            }
            if let Some(i) = self.game.successors_of(n).position(|succ| p.contains(succ)) {
                strategy.set(n, i);
            }
        }
    }

    fn record(&mut self, target: &NodeSet, attr: &NodeSet, player: Player) {
        if !self.request.wants(player) {
            return;
        }
        if let Some(strategy) = self.strategy.as_mut() {
            record_strategy(self.game, &self.preds, target, attr, player, strategy);
        }
    }
}
