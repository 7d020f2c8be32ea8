use std::io;
use std::process::Command;

use log::debug;
use thiserror::Error;

use crate::formula::{render, Formula, Rendered};
use crate::hoa::{parse_hoa, Hoa, HoaError};

#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("failed to run `{command}`")]
    Io {
        command: String,
        #[source]
        source: io::Error,
    },
    #[error("`{command}` exited with {status}: {stderr}")]
    Failed { command: String, status: String, stderr: String },
    #[error("`{command}` produced an unreadable automaton")]
    Parse {
        command: String,
        #[source]
        source: HoaError,
    },
    #[error("`{command}` produced an automaton over unknown proposition `{name}`")]
    UnknownProposition { command: String, name: String },
}

/// Turns a formula into an automaton over the formula's propositions.
pub trait Synthesizer {
    fn synthesize(&self, formula: &Formula) -> Result<Hoa, SynthesisError>;
}

/// Runs Spot's `ltl2tgba` and reads the HOA automaton it prints.
///
/// The default arguments ask for a deterministic automaton with a
/// `parity min even` condition on transitions, the only kind of automaton a
/// product game can be built from.
#[derive(Clone, Debug)]
pub struct Ltl2Tgba {
    pub program: String,
    pub args: Vec<String>,
}

impl Default for Ltl2Tgba {
    fn default() -> Self {
        let args = ["--low", "-Ht", "--deterministic", "--parity=min even"];
        Self { program: "ltl2tgba".to_string(), args: args.map(str::to_string).to_vec() }
    }
}

impl Ltl2Tgba {
    fn command_line(&self, rendered: &Rendered) -> String {
        let mut line = format!("{} -f '{}'", self.program, rendered.text);
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

impl Synthesizer for Ltl2Tgba {
    fn synthesize(&self, formula: &Formula) -> Result<Hoa, SynthesisError> {
        let rendered = render(formula);
        let command = self.command_line(&rendered);
        debug!("running {command}");

        let output = Command::new(&self.program)
            .arg("-f")
            .arg(&rendered.text)
            .args(&self.args)
            .output()
            .map_err(|source| SynthesisError::Io { command: command.clone(), source })?;
        if !output.status.success() {
            return Err(SynthesisError::Failed {
                command,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let mut hoa = parse_hoa(&stdout)
            .map_err(|source| SynthesisError::Parse { command: command.clone(), source })?;

        for ap in &mut hoa.aps {
            let name = ap
                .strip_prefix("ap")
                .and_then(|index| index.parse::<usize>().ok())
                .and_then(|index| rendered.propositions.get(index))
                .ok_or_else(|| SynthesisError::UnknownProposition {
                    command: command.clone(),
                    name: ap.clone(),
                })?;
            *ap = name.clone();
        }
        debug!("synthesized {} states over {:?}", hoa.state_count, hoa.aps);

        Ok(hoa)
    }
}
