use std::time::Instant;

use automaton::{
    Automaton, AutomatonError, ExplicitAutomaton, Formula, Priority, SynthesisError, Synthesizer,
};
use log::info;
use solver::config::SolverConfig;
use solver::qualitative::{QualitativeSolver, SolveError};
use solver::quantitative::QuantitativeSolver;
use solver::strategy::StrategyRequest;
use thiserror::Error;

use crate::game::{build_game, ProductGame};
use crate::graph::ProductGraph;
use crate::model::Model;
use crate::{ModelNode, ProductError};

#[derive(Debug, Error)]
pub enum CheckError {
    #[error("failed to build the product")]
    Product(#[from] ProductError),
    #[error("failed to solve the product game")]
    Solve(#[from] SolveError),
    #[error("unusable automaton")]
    Automaton(#[from] AutomatonError),
    #[error("failed to build an automaton for the formula")]
    Synthesis(#[from] SynthesisError),
}

fn product_game<M: Model, A: Automaton<Label = Priority>>(
    model: &M,
    automaton: A,
    coalition: &[usize],
) -> Result<ProductGame, ProductError> {
    let mut graph = ProductGraph::new(model, automaton);
    build_game(&mut graph, coalition)
}

/// Whether the players of `coalition` can make the automaton accept from
/// every initial model node. With `strict_even` they have to win with
/// probability one, otherwise it suffices that the other players cannot
/// make them lose with probability one.
pub fn check_qualitative<M: Model, A: Automaton<Label = Priority>>(
    model: &M,
    automaton: A,
    coalition: &[usize],
    strict_even: bool,
    config: &SolverConfig,
) -> Result<Vec<(ModelNode, bool)>, CheckError> {
    let start = Instant::now();
    let product = product_game(model, automaton, coalition)?;
    let result = config.qualitative().solve(&product.game, strict_even, StrategyRequest::NONE)?;
    info!("qualitative check done in {:?}", start.elapsed());

    Ok(product
        .initial
        .iter()
        .map(|&n| (product.states[n].model, result.set0.contains(n)))
        .collect())
}

/// The probability with which the players of `coalition` can make the
/// automaton accept, from every initial model node.
pub fn check_quantitative<M: Model, A: Automaton<Label = Priority>>(
    model: &M,
    automaton: A,
    coalition: &[usize],
    config: &SolverConfig,
) -> Result<Vec<(ModelNode, f64)>, CheckError> {
    let start = Instant::now();
    let product = product_game(model, automaton, coalition)?;
    let result = config.quantitative().solve(&product.game, StrategyRequest::NONE)?;
    info!("quantitative check done in {:?}", start.elapsed());

    Ok(product
        .initial
        .iter()
        .map(|&n| (product.states[n].model, result.values[n]))
        .collect())
}

/// Synthesizes an automaton for `formula` and checks it quantitatively.
pub fn check_formula<M: Model>(
    model: &M,
    formula: &Formula,
    synthesizer: &impl Synthesizer,
    coalition: &[usize],
    config: &SolverConfig,
) -> Result<Vec<(ModelNode, f64)>, CheckError> {
    let hoa = synthesizer.synthesize(formula)?;
    let automaton = ExplicitAutomaton::parity(&hoa)?;
    check_quantitative(model, automaton, coalition, config)
}
