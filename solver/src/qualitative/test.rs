use itertools::iproduct;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use test_log::test;

use super::gadget::transform;
use super::*;
use crate::config::AnyQualitativeSolver;
use crate::game::{Game, NodeSet, INFINITE_PRIORITY};
use crate::strategy::QualitativeResult;

fn game(nodes: &[(Player, usize, &[usize])]) -> Game {
    let mut game = Game::new();
    for &(player, priority, _) in nodes {
        game.add_node(player, priority);
    }
    for (n, &(_, _, successors)) in nodes.iter().enumerate() {
        for &succ in successors {
            game.add_edge(NodeId(n), NodeId(succ));
        }
    }
    game
}

fn set(universe: usize, nodes: &[usize]) -> NodeSet {
    NodeSet::from_nodes(universe, nodes.iter().map(|&n| NodeId(n)))
}

fn solvers() -> Vec<AnyQualitativeSolver> {
    let jurdzinski = |lift_method, lift_order| Jurdzinski { lift_method, lift_order };
    vec![
        AnyQualitativeSolver::McNaughton(McNaughton { same_color_shortcut: true }),
        AnyQualitativeSolver::McNaughton(McNaughton { same_color_shortcut: false }),
        AnyQualitativeSolver::Jurdzinski(jurdzinski(LiftMethod::All, LiftOrder::Fifo)),
        AnyQualitativeSolver::Jurdzinski(jurdzinski(LiftMethod::SuccessorChanged, LiftOrder::Fifo)),
        AnyQualitativeSolver::Jurdzinski(jurdzinski(LiftMethod::SuccessorChanged, LiftOrder::Lifo)),
        AnyQualitativeSolver::Gadget(Gadget {
            inner: NonStochasticSolver::McNaughton(McNaughton::default()),
        }),
        AnyQualitativeSolver::Gadget(Gadget {
            inner: NonStochasticSolver::Jurdzinski(Jurdzinski::default()),
        }),
    ]
}

fn stochastic_solvers() -> Vec<AnyQualitativeSolver> {
    solvers()
        .into_iter()
        .filter(|solver| !matches!(solver, AnyQualitativeSolver::Jurdzinski(_)))
        .collect()
}

/// Every decision of a player inside its own winning region stays there, and
/// every requested node of a winning region has a decision.
fn check_strategy<G: ParityGame>(game: &G, result: &QualitativeResult, request: StrategyRequest) {
    let strategy = result.strategy.as_ref().expect("strategy was requested");
    for n in game.nodes() {
        let player = game.player_of(n);
        let Some(winner) = result.winner(n) else { continue };
        if winner != player || !request.wants(player) {
            continue;
        }
        let succ = strategy.successor(game, n).unwrap_or_else(|| panic!("{n:?} has no decision"));
        assert_eq!(result.winner(succ), Some(winner), "{n:?} leaves its region through {succ:?}");
    }
}

fn check_partition(result: &QualitativeResult, node_count: usize) {
    assert!(result.set0.is_disjoint(&result.set1));
    assert_eq!(result.set0.len() + result.set1.len(), node_count);
}

fn random_game(rng: &mut StdRng, stochastic: bool) -> Game {
    let node_count = rng.gen_range(1..=12);
    let mut game = Game::new();
    for _ in 0..node_count {
        let player = match rng.gen_range(0..if stochastic { 3 } else { 2 }) {
            0 => Player::Even,
            1 => Player::Odd,
            _ => Player::Stochastic,
        };
        game.add_node(player, rng.gen_range(0..6));
    }
    for n in 0..node_count {
        let count = rng.gen_range(1..=3);
        for _ in 0..count {
            let succ = rng.gen_range(0..node_count);
            game.add_weighted_edge(NodeId(n), NodeId(succ), 1.0 / count as f64);
        }
    }
    game
}

#[test]
fn single_even_self_loop() {
    let game = game(&[(Player::Even, 0, &[0])]);
    for solver in solvers() {
        let result = solver.solve(&game, false, StrategyRequest::BOTH).unwrap();
        assert_eq!(result.set0, set(1, &[0]));
        assert!(result.set1.is_empty());
        assert_eq!(result.decision(NodeId(0)), Some(0));
    }
}

#[test]
fn lowest_priority_seen_infinitely_often_decides() {
    // A (Even, 1) -> B, B (Odd, 0) -> A: the play sees 0 and 1 forever.
    let game = game(&[(Player::Even, 1, &[1]), (Player::Odd, 0, &[0])]);
    for solver in solvers() {
        let result = solver.solve(&game, false, StrategyRequest::NONE).unwrap();
        assert_eq!(result.set0, set(2, &[0, 1]));
        assert!(result.set1.is_empty());
        assert!(result.strategy.is_none());
    }
}

#[test]
fn players_escape_to_their_priorities() {
    // 0 (Even, 2) -> 1, 2
    // 1 (Odd, 1) -> 1
    // 2 (Odd, 1) -> 0, 3
    // 3 (Even, 0) -> 3
    let game = game(&[
        (Player::Even, 2, &[1, 2]),
        (Player::Odd, 1, &[1]),
        (Player::Odd, 1, &[0, 3]),
        (Player::Even, 0, &[3]),
    ]);
    for solver in solvers() {
        let result = solver.solve(&game, false, StrategyRequest::BOTH).unwrap();
        assert_eq!(result.set0, set(4, &[3]));
        assert_eq!(result.set1, set(4, &[0, 1, 2]));
        check_strategy(&game, &result, StrategyRequest::BOTH);
        assert_eq!(result.decision(NodeId(2)), Some(0));
    }
}

#[test]
fn solvers_agree_on_random_games() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    for _ in 0..200 {
        let game = random_game(&mut rng, false);
        let expected = McNaughton::default().solve(&game, false, StrategyRequest::NONE).unwrap();
        check_partition(&expected, game.node_count());

        for solver in solvers() {
            let result = solver.solve(&game, false, StrategyRequest::BOTH).unwrap();
            assert_eq!(result.set0, expected.set0, "{solver:?} on {game:?}");
            assert_eq!(result.set1, expected.set1, "{solver:?} on {game:?}");
            check_strategy(&game, &result, StrategyRequest::BOTH);
        }
    }
}

#[test]
fn strictness_is_irrelevant_without_stochastic_nodes() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..50 {
        let game = random_game(&mut rng, false);
        for solver in stochastic_solvers() {
            let lax = solver.solve(&game, false, StrategyRequest::NONE).unwrap();
            let strict = solver.solve(&game, true, StrategyRequest::NONE).unwrap();
            assert_eq!(lax.set0, strict.set0);
        }
    }
}

#[test]
fn stochastic_solvers_agree_on_random_games() {
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..100 {
        let game = random_game(&mut rng, true);
        for strict_even in [false, true] {
            let expected =
                McNaughton::default().solve(&game, strict_even, StrategyRequest::NONE).unwrap();
            check_partition(&expected, game.node_count());

            for solver in stochastic_solvers() {
                let result = solver.solve(&game, strict_even, StrategyRequest::BOTH).unwrap();
                assert_eq!(result.set0, expected.set0, "{solver:?} {strict_even} on {game:?}");
                assert_eq!(result.set1, expected.set1, "{solver:?} {strict_even} on {game:?}");
                check_strategy(&game, &result, StrategyRequest::BOTH);
            }
        }
    }
}

#[test]
fn almost_sure_attractor_keeps_edges_into_the_region() {
    // 0 (Even, 0) -> 0; 1 (Odd, 1) -> 1; 2 (Odd, 3) -> 1, 3
    // 3 (Even, 2) -> 3, 2; 4 (Odd, 4) -> 2, 3
    // Node 4 joins Odd's region through node 2 although it could also move
    // to Even's node 3.
    let game = game(&[
        (Player::Even, 0, &[0]),
        (Player::Odd, 1, &[1]),
        (Player::Odd, 3, &[1, 3]),
        (Player::Even, 2, &[3, 2]),
        (Player::Odd, 4, &[2, 3]),
    ]);
    for solver in solvers() {
        for strict_even in [false, true] {
            let result = solver.solve(&game, strict_even, StrategyRequest::BOTH).unwrap();
            assert_eq!(result.set0, set(5, &[0, 3]), "{solver:?} {strict_even}");
            assert_eq!(result.set1, set(5, &[1, 2, 4]), "{solver:?} {strict_even}");
            check_strategy(&game, &result, StrategyRequest::BOTH);
            assert_eq!(result.decision(NodeId(4)), Some(0), "{solver:?} {strict_even}");
        }
    }
}

#[test]
fn stochastic_split_between_sinks() {
    // 0 (Stochastic, 0) -> 1, 2; 1 (Even, 0) -> 1; 2 (Odd, 1) -> 2
    let game = game(&[
        (Player::Stochastic, 0, &[1, 2]),
        (Player::Even, 0, &[1]),
        (Player::Odd, 1, &[2]),
    ]);
    for solver in stochastic_solvers() {
        let strict = solver.solve(&game, true, StrategyRequest::BOTH).unwrap();
        assert_eq!(strict.set0, set(3, &[1]), "{solver:?}");
        assert_eq!(strict.set1, set(3, &[0, 2]), "{solver:?}");
        assert_eq!(strict.decision(NodeId(0)), None);

        let lax = solver.solve(&game, false, StrategyRequest::BOTH).unwrap();
        assert_eq!(lax.set0, set(3, &[0, 1]), "{solver:?}");
        assert_eq!(lax.set1, set(3, &[2]), "{solver:?}");
    }
}

#[test]
fn stochastic_retry_is_won_almost_surely() {
    // 0 (Stochastic, 1) -> 0, 1; 1 (Even, 0) -> 0
    let game = game(&[(Player::Stochastic, 1, &[0, 1]), (Player::Even, 0, &[0])]);
    for (solver, strict_even) in iproduct!(stochastic_solvers(), [false, true]) {
        let result = solver.solve(&game, strict_even, StrategyRequest::EVEN).unwrap();
        assert_eq!(result.set0, set(2, &[0, 1]), "{solver:?}");
        check_strategy(&game, &result, StrategyRequest::EVEN);
    }
}

#[test]
fn stochastic_trap_is_lost_almost_surely() {
    // 0 (Stochastic, 0) -> 0, 1; 1 (Odd, 1) -> 1, 0
    let game = game(&[(Player::Stochastic, 0, &[0, 1]), (Player::Odd, 1, &[1, 0])]);
    for (solver, strict_even) in iproduct!(stochastic_solvers(), [false, true]) {
        let result = solver.solve(&game, strict_even, StrategyRequest::ODD).unwrap();
        assert_eq!(result.set1, set(2, &[0, 1]), "{solver:?}");
        check_strategy(&game, &result, StrategyRequest::ODD);
    }
}

#[test]
fn gadget_layout() {
    let game = game(&[(Player::Stochastic, 2, &[1, 0]), (Player::Even, 0, &[1])]);
    let (transformed, mapping) = transform(&game);

    // top, second layer for 0 and 2, third layer for 0, 1 and 2
    assert_eq!(transformed.node_count(), 1 + 2 + 3 + 1);
    assert_eq!(mapping.to_vec(), [NodeId(0), NodeId(6)]);
    assert_eq!(transformed.player_of(NodeId(0)), Player::Odd);
    assert_eq!(transformed.successors_of(NodeId(0)).collect::<Vec<_>>(), [NodeId(1), NodeId(2)]);
    assert_eq!(transformed.successors_of(NodeId(1)).collect::<Vec<_>>(), [NodeId(3)]);
    assert_eq!(transformed.successors_of(NodeId(2)).collect::<Vec<_>>(), [NodeId(4), NodeId(5)]);
    for (j, node) in [3, 4, 5].map(NodeId).into_iter().enumerate() {
        assert_eq!(transformed.priority_of(node), j);
        assert_eq!(transformed.successors_of(node).collect::<Vec<_>>(), [NodeId(6), NodeId(0)]);
    }
    assert_eq!(transformed.player_of(NodeId(3)), Player::Odd);
    assert_eq!(transformed.player_of(NodeId(4)), Player::Even);
}

#[test]
fn gadget_normalizes_infinite_priorities() {
    let mut game = game(&[(Player::Stochastic, 0, &[1]), (Player::Even, 0, &[1])]);
    game.set_priority(NodeId(0), INFINITE_PRIORITY);
    let result = Gadget::default().solve(&game, true, StrategyRequest::NONE).unwrap();
    assert_eq!(result.set0, set(2, &[0, 1]));

    let err = McNaughton::default().solve(&game, true, StrategyRequest::NONE).unwrap_err();
    assert_eq!(err, SolveError::InvalidGame(GameError::InfinitePriority(NodeId(0))));
}

#[test]
fn jurdzinski_rejects_stochastic_nodes() {
    let game = game(&[(Player::Even, 0, &[1]), (Player::Stochastic, 0, &[0])]);
    let err = Jurdzinski::default().solve(&game, true, StrategyRequest::NONE).unwrap_err();
    assert_eq!(err, SolveError::StochasticNode(NodeId(1)));
}

#[test]
fn malformed_games_are_rejected() {
    let dead_end = game(&[(Player::Even, 0, &[1]), (Player::Odd, 1, &[])]);
    let mut out_of_range = game(&[(Player::Even, 0, &[0])]);
    out_of_range.add_edge(NodeId(0), NodeId(3));

    for solver in solvers() {
        assert_eq!(
            solver.solve(&dead_end, false, StrategyRequest::NONE).unwrap_err(),
            SolveError::InvalidGame(GameError::DeadEnd(NodeId(1)))
        );
        assert_eq!(
            solver.solve(&out_of_range, false, StrategyRequest::NONE).unwrap_err(),
            SolveError::InvalidGame(GameError::SuccessorOutOfRange {
                node: NodeId(0),
                successor: 3
            })
        );
    }
}
