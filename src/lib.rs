/*
 *  Perftdiff, a move generation checker for chess engines.
 *  Copyright (C) 2024 ToTheAnd
 *
 *  Perftdiff is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  Perftdiff is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 *  GNU General Public License for more details.
 *
 *  You should have received a copy of the GNU General Public License
 *  along with Perftdiff. If not, see <https://www.gnu.org/licenses/>.
 */

//! Finds positions where a chess engine's legal move generation disagrees with a trusted reference.
//!
//! The checker is grouped in a few modules:
//! - The `Sampler`, which reaches random positions by playing random legal moves
//! - The `ReferenceMoveGen`, which knows the correct legal moves of every position
//! - The `EngineProcess`, which asks the engine under test for its moves through `go perft`
//! - The `Checker`, which compares both and reports the first mismatch
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::engine::{EngineConfig, EngineProcess};
use crate::general::common::Res;
use crate::output::Reporter;
use crate::run::{
    Checker, CheckerConfig, RunStatus, DEFAULT_PROGRESS_INTERVAL, DEFAULT_RECORD_FILE,
};
use crate::sampler::DEFAULT_MAX_PLIES;

pub mod compare;
pub mod engine;
pub mod general;
pub mod output;
pub mod position;
pub mod reference;
pub mod run;
pub mod sampler;

/// Compares the legal moves reported by a chess engine with a reference move generator
/// in randomly sampled positions until the first disagreement.
#[derive(Parser, Debug)]
#[command(name = "perftdiff", author = "ToTheAnd", version, about, long_about = None)]
pub struct CommandLineArgs {
    /// The engine executable. It receives `position fen <FEN>` and `go perft` on stdin
    /// and must print all legal moves in UCI notation, then exit.
    pub engine: PathBuf,

    /// Command line arguments to pass to the engine, e.g. "--debug". Can be given multiple times.
    #[arg(long = "engine-arg", allow_hyphen_values = true)]
    pub engine_args: Vec<String>,

    /// Sampled positions are reached by playing between 0 and this many random moves.
    #[arg(long, default_value_t = DEFAULT_MAX_PLIES)]
    pub max_plies: usize,

    /// Seed for the random position sampler. Chosen randomly if not given.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Abort if the engine takes longer than this to answer a single query.
    #[arg(long, default_value_t = 10_000)]
    pub timeout_ms: u64,

    /// Print the iteration number every this many positions, 0 to disable.
    #[arg(long, default_value_t = DEFAULT_PROGRESS_INTERVAL)]
    pub progress_interval: u64,

    /// Stop after this many positions without a mismatch.
    #[arg(long)]
    pub iterations: Option<u64>,

    /// Print the legal moves of every sampled position.
    #[arg(long)]
    pub trace_required: bool,

    /// Append mismatching positions to this file.
    #[arg(long, default_value = DEFAULT_RECORD_FILE)]
    pub record: PathBuf,

    /// Don't save mismatching positions.
    #[arg(long)]
    pub no_record: bool,

    /// Additionally log all output to this file.
    #[arg(long)]
    pub log: Option<PathBuf>,

    /// Print the text sent to the engine.
    #[arg(long)]
    pub debug: bool,
}

impl CommandLineArgs {
    pub fn checker_config(&self) -> CheckerConfig {
        let engine = EngineConfig {
            path: self.engine.clone(),
            args: self.engine_args.clone(),
            timeout: Duration::from_millis(self.timeout_ms),
        };
        let seed = self.seed.unwrap_or_else(rand::random);
        let mut config = CheckerConfig::new(engine, seed);
        config.max_plies = self.max_plies;
        config.progress_interval = self.progress_interval;
        config.max_iterations = self.iterations;
        config.trace_required = self.trace_required;
        config.record = (!self.no_record).then(|| self.record.clone());
        config.debug = self.debug;
        config
    }
}

pub fn run_checker(config: CheckerConfig, mut reporter: Reporter) -> Res<RunStatus> {
    reporter.info(&format!(
        "Checking '{}' with seed {}",
        config.engine.path.display(),
        config.seed
    ));
    let engine = EngineProcess::new(config.engine.clone())?;
    let mut checker = Checker::new(config, engine, reporter);
    match checker.run() {
        Ok(outcome) => {
            if outcome.context.status == RunStatus::Exhausted {
                let msg = format!(
                    "No mismatch in {} positions, run {}",
                    outcome.context.iteration, outcome.context.status
                );
                checker.reporter_mut().info(&msg);
            }
            Ok(outcome.context.status)
        }
        Err(err) => {
            let err = anyhow::Error::new(err);
            // the terminal output is left to the caller, but the log file should contain the error
            checker
                .reporter_mut()
                .display_message(output::Message::Error, &format!("{err:#}"));
            Err(err)
        }
    }
}

pub fn run_program() -> Res<RunStatus> {
    let args = CommandLineArgs::parse();
    let mut reporter = Reporter::terminal();
    if let Some(path) = &args.log {
        reporter.add_log_file(path)?;
    }
    run_checker(args.checker_config(), reporter)
}
