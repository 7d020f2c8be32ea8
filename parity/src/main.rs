use std::path::PathBuf;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use log::info;
use parity::{parse_parity_game, to_game};
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};
use solver::config::SolverConfig;
use solver::game::NodeSet;
use solver::qualitative::QualitativeSolver;
use solver::strategy::StrategyRequest;

/// Solves a parity game in PGSolver format.
#[derive(Parser)]
struct Args {
    /// The parity game file.
    path: PathBuf,

    /// Qualitative solver to use.
    #[arg(long)]
    solver: Option<String>,

    /// Sets a solver option, may be repeated.
    #[arg(long = "option", value_name = "KEY=VALUE")]
    options: Vec<String>,

    /// Logs solver progress.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose { LevelFilter::Debug } else { LevelFilter::Warn };
    TermLogger::init(level, Config::default(), TerminalMode::Stderr, ColorChoice::Auto)?;

    let mut config = SolverConfig::default();
    if let Some(solver) = &args.solver {
        config.set("solver", solver)?;
    }
    for option in &args.options {
        let (key, value) =
            option.split_once('=').with_context(|| format!("Expected KEY=VALUE, got `{option}`"))?;
        config.set(key, value).with_context(|| format!("Invalid option `{option}`"))?;
    }

    let now = Instant::now();

    let source = std::fs::read_to_string(&args.path)
        .with_context(|| format!("Failed to read {}", args.path.display()))?;
    let pg = parse_parity_game(&source).map_err(|errors| match errors.first() {
        Some(error) => anyhow!("Failed to parse parity game file: {error}"),
        None => anyhow!("Failed to parse parity game file"),
    })?;
    let converted = to_game(&pg)?;

    println!("Preprocessing took {:?}", now.elapsed());

    let solver = config.qualitative();
    info!("Solving {} nodes with {solver:?}", pg.nodes.len());

    let now = Instant::now();

    let result = solver.solve(&converted.game, false, StrategyRequest::NONE)?;

    println!("Solve took {:?}", now.elapsed());

    let region = |set: &NodeSet| {
        let mut ids = set.iter().map(|n| converted.ids[n]).collect::<Vec<_>>();
        ids.sort_unstable();
        ids.iter().map(|id| id.to_string()).collect::<Vec<_>>().join(" ")
    };
    println!("Player 0 wins: {}", region(&result.set0));
    println!("Player 1 wins: {}", region(&result.set1));

    if let Some(start) = pg.start {
        let n = converted
            .node_of
            .get(&start)
            .with_context(|| format!("Unknown start node {start}"))?;
        let winner = if result.set0.contains(*n) { 0 } else { 1 };
        println!("Winner of node {start}: player {winner}");
    }

    Ok(())
}
