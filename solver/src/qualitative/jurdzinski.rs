use std::cmp::Ordering;
use std::collections::VecDeque;
use std::time::Instant;

use bitvec::vec::BitVec;
use log::{debug, info};

use crate::game::{validate_game, NodeId, NodeSet, ParityGame, Player, Predecessors};
use crate::index::AsIndex;
use crate::strategy::{QualitativeResult, Strategy, StrategyRequest};

use super::{reject_stochastic, QualitativeSolver, SolveError};

/// Which nodes get lifted until the measures stabilize.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LiftMethod {
    /// Sweep over all nodes until a sweep changes nothing.
    All,
    /// Keep a worklist of nodes with a changed successor.
    #[default]
    SuccessorChanged,
}

/// Order in which the worklist of [`LiftMethod::SuccessorChanged`] is processed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LiftOrder {
    #[default]
    Fifo,
    Lifo,
}

/// Small progress measures solver for two player games.
#[derive(Clone, Copy, Debug, Default)]
pub struct Jurdzinski {
    pub lift_method: LiftMethod,
    pub lift_order: LiftOrder,
}

impl QualitativeSolver for Jurdzinski {
    fn solve<G: ParityGame>(
        &self,
        game: &G,
        _strict_even: bool,
        request: StrategyRequest,
    ) -> Result<QualitativeResult, SolveError> {
        validate_game(game)?;
        reject_stochastic(game)?;

        let start = Instant::now();
        let mut measures = Measures::new(game);
        let stats = match self.lift_method {
            LiftMethod::All => measures.lift_all(),
            LiftMethod::SuccessorChanged => measures.lift_successor_changed(self.lift_order),
        };
        debug!(
            "jurdzinski: {} rounds, {} lifts, {} changes",
            stats.rounds, stats.lifts, stats.changes
        );

        let node_count = game.node_count();
        let mut set0 = NodeSet::new(node_count);
        let mut set1 = NodeSet::new(node_count);
        for n in game.nodes() {
            if measures.is_top(n) {
                set1.insert(n);
            } else {
                set0.insert(n);
            }
        }

        let strategy = request.any().then(|| {
            let mut strategy = Strategy::new(node_count);
            for n in game.nodes().filter(|&n| request.wants(game.player_of(n))) {
                strategy.set(n, measures.best_successor(n));
            }
            strategy
        });

        info!(
            "jurdzinski: solved {node_count} nodes in {:?}, even wins {}, odd wins {}",
            start.elapsed(),
            set0.len(),
            set1.len()
        );

        Ok(QualitativeResult { set0, set1, strategy })
    }
}

#[derive(Default)]
struct LiftStats {
    rounds: u64,
    lifts: u64,
    changes: u64,
}

/// One counter per odd priority for every node, stored contiguously.
/// The counter of priority `p` sits at position `p / 2` and lower priorities
/// are more significant. A vector of `u32::MAX` is the top element.
struct Measures<'a, G> {
    game: &'a G,
    size: usize,
    bounds: Vec<u32>,
    vectors: Vec<u32>,
    scratch: Vec<u32>,
}

impl<'a, G: ParityGame> Measures<'a, G> {
    fn new(game: &'a G) -> Self {
        let max_priority = game.max_priority().unwrap_or(0);
        let size = (max_priority + 1) / 2;

        let mut bounds = vec![0; size];
        for n in game.nodes() {
            let priority = game.priority_of(n);
            if priority % 2 == 1 {
                bounds[priority / 2] += 1;
            }
        }

        Self {
            game,
            size,
            bounds,
            vectors: vec![0; game.node_count() * size],
            scratch: vec![0; size],
        }
    }

    fn of(&self, n: NodeId) -> &[u32] {
        let start = n.to_usize() * self.size;
        &self.vectors[start..start + self.size]
    }

    fn is_top(&self, n: NodeId) -> bool {
        self.of(n).first() == Some(&u32::MAX)
    }

    /// The successor with the least (Even) or greatest (Odd) measure.
    /// Ties go to the earliest successor.
    fn best_successor(&self, n: NodeId) -> usize {
        let wanted = match self.game.player_of(n) {
            Player::Even => Ordering::Less,
            _ => Ordering::Greater,
        };

        let mut best = 0;
        for i in 1..self.game.successor_count(n) {
            let candidate = self.of(self.game.successor(n, i));
            if candidate.cmp(self.of(self.game.successor(n, best))) == wanted {
                best = i;
            }
        }
        best
    }

    /// Recomputes the measure of `n` from its successors; returns whether it changed.
    fn lift(&mut self, n: NodeId) -> bool {
        let best = self.game.successor(n, self.best_successor(n));
        let mut scratch = std::mem::take(&mut self.scratch);
        scratch.copy_from_slice(self.of(best));

        if scratch.first() != Some(&u32::MAX) {
            let priority = self.game.priority_of(n);
            // Counters of priorities above `priority` are forgotten.
            let kept = priority / 2 + priority % 2;
            scratch[kept..].fill(0);

            if priority % 2 == 1 {
                let mut entry = priority / 2;
                loop {
                    scratch[entry] += 1;
                    if scratch[entry] <= self.bounds[entry] {
                        break;
                    }
                    scratch[entry] = 0;
                    if entry == 0 {
                        scratch.fill(u32::MAX);
                        break;
                    }
                    entry -= 1;
                }
            }
        }

        let start = n.to_usize() * self.size;
        let target = &mut self.vectors[start..start + self.size];
        let changed = *target != *scratch;
        target.copy_from_slice(&scratch);
        self.scratch = scratch;
        changed
    }

    fn lift_all(&mut self) -> LiftStats {
        let mut stats = LiftStats::default();
        let mut changed = true;
        while changed {
            stats.rounds += 1;
            changed = false;
            for n in self.game.nodes() {
                stats.lifts += 1;
                if self.lift(n) {
                    stats.changes += 1;
                    changed = true;
                }
            }
        }
        stats
    }

    fn lift_successor_changed(&mut self, order: LiftOrder) -> LiftStats {
        let preds = Predecessors::new(self.game);
        let mut stats = LiftStats::default();
        let mut queued = BitVec::<usize>::repeat(true, self.game.node_count());
        let mut queue = self.game.nodes().collect::<VecDeque<_>>();

        loop {
            let next = match order {
                LiftOrder::Fifo => queue.pop_front(),
                LiftOrder::Lifo => queue.pop_back(),
            };
            let Some(n) = next else { break };
            queued.set(n.to_usize(), false);

            stats.rounds += 1;
            stats.lifts += 1;
            if !self.lift(n) {
                continue;
            }

            stats.changes += 1;
            for &(pred, _) in preds.of(n) {
                if !queued.replace(pred.to_usize(), true) {
                    queue.push_back(pred);
                }
            }
        }
        stats
    }
}
