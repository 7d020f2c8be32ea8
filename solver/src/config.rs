//! Named solver options and the registry resolving solver names.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::game::ParityGame;
use crate::qualitative::{
    Gadget, Jurdzinski, LiftMethod, LiftOrder, McNaughton, NonStochasticSolver,
    QualitativeSolver, SolveError,
};
use crate::quantitative::{QuantitativeSolver, Schewe};
use crate::reach::ValueIteration;
use crate::strategy::{QualitativeResult, QuantitativeResult, StrategyRequest};

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("unknown option `{0}`")]
    UnknownOption(String),
    #[error("unknown name `{name}`, expected one of: {}", .expected.join(", "))]
    UnknownName { name: String, expected: &'static [&'static str] },
    #[error("invalid value `{value}` for option `{option}`")]
    InvalidValue { option: String, value: String },
}

/// Declares an enum whose variants are looked up by name.
macro_rules! registry {
    ($(#[$meta:meta])* $vis:vis enum $ty:ident { $($variant:ident => $name:literal),* $(,)? }) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq)]
        $vis enum $ty {
            $($variant),*
        }

        impl $ty {
            pub const NAMES: &'static [&'static str] = &[$($name),*];

            pub fn name(self) -> &'static str {
                match self {
                    $($ty::$variant => $name),*
                }
            }
        }

        impl FromStr for $ty {
            type Err = ConfigError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($name => Ok($ty::$variant),)*
                    _ => Err(ConfigError::UnknownName {
                        name: s.to_string(),
                        expected: Self::NAMES,
                    }),
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}

registry! {
    /// Solvers for the qualitative checks. `mcnaughton` and `gadget` handle
    /// stochastic nodes, `jurdzinski` only solves two player games and fails
    /// with [`SolveError::StochasticNode`] otherwise, also when it backs the
    /// quantitative solver.
    pub enum QualitativeKind {
        McNaughton => "mcnaughton",
        Jurdzinski => "jurdzinski",
        Gadget => "gadget",
    }
}

registry! {
    pub enum NonStochasticKind {
        McNaughton => "mcnaughton",
        Jurdzinski => "jurdzinski",
    }
}

registry! {
    pub enum QuantitativeKind {
        Schewe => "schewe",
    }
}

registry! {
    enum LiftMethodName {
        All => "all",
        SuccessorChanged => "successor-changed",
    }
}

registry! {
    enum LiftOrderName {
        Fifo => "fifo",
        Lifo => "lifo",
    }
}

impl FromStr for LiftMethod {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.parse()? {
            LiftMethodName::All => LiftMethod::All,
            LiftMethodName::SuccessorChanged => LiftMethod::SuccessorChanged,
        })
    }
}

impl FromStr for LiftOrder {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.parse()? {
            LiftOrderName::Fifo => LiftOrder::Fifo,
            LiftOrderName::Lifo => LiftOrder::Lifo,
        })
    }
}

/// Every option understood by the solvers, with its default.
#[derive(Clone, Debug, PartialEq)]
pub struct SolverConfig {
    pub solver: QualitativeKind,
    pub non_stochastic_solver: NonStochasticKind,
    pub quantitative_solver: QuantitativeKind,
    pub lift_method: LiftMethod,
    pub lift_order: LiftOrder,
    pub same_color_shortcut: bool,
    pub compare_tolerance: f64,
    pub precision: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            solver: QualitativeKind::McNaughton,
            non_stochastic_solver: NonStochasticKind::McNaughton,
            quantitative_solver: QuantitativeKind::Schewe,
            lift_method: LiftMethod::SuccessorChanged,
            lift_order: LiftOrder::Fifo,
            same_color_shortcut: true,
            compare_tolerance: 1e-6,
            precision: 1e-10,
        }
    }
}

impl SolverConfig {
    pub const OPTIONS: &'static [&'static str] = &[
        "solver",
        "non-stochastic-solver",
        "quantitative-solver",
        "lift-method",
        "lift-order",
        "same-color-shortcut",
        "compare-tolerance",
        "precision",
    ];

    /// Sets an option from its textual name and value.
    pub fn set(&mut self, option: &str, value: &str) -> Result<(), ConfigError> {
        let invalid =
            || ConfigError::InvalidValue { option: option.to_string(), value: value.to_string() };
        let positive = |value: &str| match value.parse::<f64>() {
            Ok(v) if v.is_finite() && v > 0.0 => Ok(v),
            _ => Err(invalid()),
        };

        match option {
            "solver" => self.solver = value.parse()?,
            "non-stochastic-solver" => self.non_stochastic_solver = value.parse()?,
            "quantitative-solver" => self.quantitative_solver = value.parse()?,
            "lift-method" => self.lift_method = value.parse()?,
            "lift-order" => self.lift_order = value.parse()?,
            "same-color-shortcut" => {
                self.same_color_shortcut = value.parse().map_err(|_| invalid())?
            }
            "compare-tolerance" => self.compare_tolerance = positive(value)?,
            "precision" => self.precision = positive(value)?,
            _ => return Err(ConfigError::UnknownOption(option.to_string())),
        }
        Ok(())
    }

    pub fn mcnaughton(&self) -> McNaughton {
        McNaughton { same_color_shortcut: self.same_color_shortcut }
    }

    pub fn jurdzinski(&self) -> Jurdzinski {
        Jurdzinski { lift_method: self.lift_method, lift_order: self.lift_order }
    }

    pub fn non_stochastic(&self) -> NonStochasticSolver {
        match self.non_stochastic_solver {
            NonStochasticKind::McNaughton => NonStochasticSolver::McNaughton(self.mcnaughton()),
            NonStochasticKind::Jurdzinski => NonStochasticSolver::Jurdzinski(self.jurdzinski()),
        }
    }

    pub fn qualitative(&self) -> AnyQualitativeSolver {
        match self.solver {
            QualitativeKind::McNaughton => AnyQualitativeSolver::McNaughton(self.mcnaughton()),
            QualitativeKind::Jurdzinski => AnyQualitativeSolver::Jurdzinski(self.jurdzinski()),
            QualitativeKind::Gadget => {
                AnyQualitativeSolver::Gadget(Gadget { inner: self.non_stochastic() })
            }
        }
    }

    pub fn reachability(&self) -> ValueIteration {
        ValueIteration { precision: self.precision, tolerance: self.compare_tolerance }
    }

    pub fn quantitative(&self) -> AnyQuantitativeSolver {
        match self.quantitative_solver {
            QuantitativeKind::Schewe => AnyQuantitativeSolver::Schewe(Schewe {
                qualitative: self.qualitative(),
                reach: self.reachability(),
                tolerance: self.compare_tolerance,
            }),
        }
    }
}

/// The qualitative solver selected by a [`SolverConfig`].
#[derive(Clone, Copy, Debug)]
pub enum AnyQualitativeSolver {
    McNaughton(McNaughton),
    Jurdzinski(Jurdzinski),
    Gadget(Gadget),
}

impl QualitativeSolver for AnyQualitativeSolver {
    fn solve<G: ParityGame>(
        &self,
        game: &G,
        strict_even: bool,
        request: StrategyRequest,
    ) -> Result<QualitativeResult, SolveError> {
        match self {
            AnyQualitativeSolver::McNaughton(solver) => solver.solve(game, strict_even, request),
            AnyQualitativeSolver::Jurdzinski(solver) => solver.solve(game, strict_even, request),
            AnyQualitativeSolver::Gadget(solver) => solver.solve(game, strict_even, request),
        }
    }
}

/// The quantitative solver selected by a [`SolverConfig`].
#[derive(Clone, Copy, Debug)]
pub enum AnyQuantitativeSolver {
    Schewe(Schewe<AnyQualitativeSolver, ValueIteration>),
}

impl QuantitativeSolver for AnyQuantitativeSolver {
    fn solve<G: ParityGame>(
        &self,
        game: &G,
        request: StrategyRequest,
    ) -> Result<QuantitativeResult, SolveError> {
        match self {
            AnyQuantitativeSolver::Schewe(solver) => solver.solve(game, request),
        }
    }
}
