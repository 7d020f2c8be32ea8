use itertools::Itertools;
use solver::config::{QualitativeKind, SolverConfig};
use solver::game::{ParityGame as _, Player};
use solver::qualitative::QualitativeSolver;
use solver::strategy::StrategyRequest;

use crate::{parse_parity_game, parse_parity_solution, to_game, ConvError};

/// Every solver configuration worth cross-checking on two player games.
fn configs() -> Vec<SolverConfig> {
    let mut configs = Vec::new();
    for solver in QualitativeKind::NAMES {
        for (option, value) in [
            ("non-stochastic-solver", "mcnaughton"),
            ("non-stochastic-solver", "jurdzinski"),
            ("lift-method", "all"),
            ("lift-order", "lifo"),
            ("same-color-shortcut", "false"),
        ] {
            let mut config = SolverConfig::default();
            config.set("solver", solver).unwrap();
            config.set(option, value).unwrap();
            configs.push(config);
        }
    }
    configs
}

fn run_test(input: &str, sol: &str) {
    let game = parse_parity_game(input).unwrap();
    let converted = to_game(&game).unwrap();
    let sol = parse_parity_solution(sol).unwrap();
    assert_eq!(sol.len(), converted.game.node_count());

    for config in configs() {
        let result = config
            .qualitative()
            .solve(&converted.game, false, StrategyRequest::NONE)
            .unwrap();
        let mismatches = sol
            .iter()
            .filter(|&&(id, winner)| result.winner(converted.node_of[&id]) != Some(winner))
            .map(|&(id, _)| id)
            .sorted()
            .collect::<Vec<_>>();
        assert!(mismatches.is_empty(), "{config:?} disagrees on nodes {mismatches:?}");
    }
}

macro_rules! declare_test {
    ($($name:ident),* $(,)?) => {
        $(
            #[test]
            fn $name() {
                let input = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/", stringify!($name)));
                let sol = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/", stringify!($name), ".sol"));
                run_test(input, sol)
            }
        )*
    };
}

#[test]
fn all() {
    let dir = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/");
    for e in std::fs::read_dir(dir).unwrap() {
        let e = e.unwrap();

        let name = e.file_name().into_string().unwrap();
        let path = e.path();
        if name == ".gitignore" || path.extension() == Some("sol".as_ref()) {
            continue;
        }

        let input = std::fs::read_to_string(&path).unwrap();
        let sol = std::fs::read_to_string(path.with_extension("sol")).unwrap();

        if let Err(e) = std::panic::catch_unwind(|| run_test(&input, &sol)) {
            eprintln!("Test {name} failed");
            std::panic::resume_unwind(e);
        }
    }
}

declare_test! {
    small,
    choices,
    cycles,
    sparse,
}

#[test]
fn parse_header_rows_and_names() {
    let game = parse_parity_game("parity 2;\nstart 1;\n0 3 0 1,2 \"zero\";\n1 0 1 0 ;\n2 2 1 2 \"two\" trailing;\n")
        .unwrap();
    assert_eq!(game.max_id, 2);
    assert_eq!(game.start, Some(1));
    assert_eq!(game.nodes.len(), 3);
    assert_eq!(game.nodes[0].successors, vec![1, 2]);
    assert_eq!(game.nodes[0].name.as_deref(), Some("zero"));
    assert_eq!(game.nodes[1].owner, Player::Odd);
    assert_eq!(game.nodes[1].name, None);
    assert_eq!(game.nodes[2].priority, 2);

    assert!(parse_parity_game("parity 1;\n0 1 2 0;\n").is_err());
    assert!(parse_parity_game("0 1 0 0;\n").is_err());
}

#[test]
fn priorities_are_mirrored() {
    let game = parse_parity_game("parity 2;\n0 3 0 1;\n1 0 1 2;\n2 2 0 0;\n").unwrap();
    let converted = to_game(&game).unwrap();
    let priorities =
        converted.game.nodes().map(|n| converted.game.priority_of(n)).collect::<Vec<_>>();
    assert_eq!(priorities, vec![1, 4, 2]);
    assert_eq!(converted.game.player_of(converted.node_of[&1]), Player::Odd);
}

#[test]
fn unknown_and_duplicate_nodes_are_rejected() {
    let game = parse_parity_game("parity 1;\n0 0 0 5;\n").unwrap();
    assert_eq!(to_game(&game).unwrap_err(), ConvError::UnknownSuccessor { node: 0, successor: 5 });

    let game = parse_parity_game("parity 1;\n0 0 0 0;\n0 1 1 0;\n").unwrap();
    assert_eq!(to_game(&game).unwrap_err(), ConvError::DuplicateNode(0));
}

#[test]
fn solutions_ignore_strategies() {
    let sol = parse_parity_solution("paritysol 2;\n0 0 1;\n1 1;\n2 0 2;\n").unwrap();
    assert_eq!(sol, vec![(0, Player::Even), (1, Player::Odd), (2, Player::Even)]);
}
