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

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use itertools::Itertools;
use rand::rngs::StdRng;
use rand::SeedableRng;
use strum_macros::Display;

use crate::compare::{compare, Discrepancy};
use crate::engine::{perft_request, EngineConfig};
use crate::general::common::CheckerError;
use crate::general::moves::plain_move_list;
use crate::output::Reporter;
use crate::reference::{MoveGenerator, ReferenceMoveGen};
use crate::sampler::{Sample, Sampler, DEFAULT_MAX_PLIES};

pub const DEFAULT_PROGRESS_INTERVAL: u64 = 100;
pub const DEFAULT_RECORD_FILE: &str = "mismatches.txt";

#[derive(Debug, Clone)]
pub struct CheckerConfig {
    pub engine: EngineConfig,
    pub max_plies: usize,
    pub seed: u64,
    /// Print the iteration number every `progress_interval` iterations, 0 disables progress output.
    pub progress_interval: u64,
    /// Stop after this many iterations without a mismatch. `None` runs until a mismatch is found.
    pub max_iterations: Option<u64>,
    /// Print the reference moves of every sampled position
    pub trace_required: bool,
    /// Append mismatching positions to this file
    pub record: Option<PathBuf>,
    /// Print the text sent to the engine
    pub debug: bool,
}

impl CheckerConfig {
    pub fn new(engine: EngineConfig, seed: u64) -> Self {
        Self {
            engine,
            max_plies: DEFAULT_MAX_PLIES,
            seed,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            max_iterations: None,
            trace_required: false,
            record: Some(PathBuf::from(DEFAULT_RECORD_FILE)),
            debug: false,
        }
    }
}

#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Display)]
pub enum RunStatus {
    #[default]
    Running,
    #[strum(serialize = "halted on mismatch")]
    HaltedOnMismatch,
    /// The iteration limit was reached without finding a mismatch
    #[strum(serialize = "exhausted")]
    Exhausted,
}

/// The state of a run, passed to each step instead of living in the loop.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub struct RunContext {
    /// The number of iterations that passed so far, which is also the number of the current iteration
    pub iteration: u64,
    pub status: RunStatus,
}

impl RunContext {
    pub fn is_running(&self) -> bool {
        self.status == RunStatus::Running
    }
}

#[derive(Debug, Clone)]
pub struct Mismatch {
    pub sample: Sample,
    pub discrepancy: Discrepancy,
    pub iteration: u64,
}

#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub context: RunContext,
    pub mismatch: Option<Mismatch>,
}

/// Repeatedly samples a position and compares the engine's moves against the reference moves,
/// until the first mismatch.
#[derive(Debug)]
pub struct Checker<E: MoveGenerator> {
    config: CheckerConfig,
    sampler: Sampler<StdRng>,
    reference: ReferenceMoveGen,
    engine: E,
    reporter: Reporter,
}

impl<E: MoveGenerator> Checker<E> {
    pub fn new(config: CheckerConfig, engine: E, reporter: Reporter) -> Self {
        let sampler = Sampler::new(StdRng::seed_from_u64(config.seed), config.max_plies);
        Self {
            config,
            sampler,
            reference: ReferenceMoveGen,
            engine,
            reporter,
        }
    }

    pub fn reporter(&self) -> &Reporter {
        &self.reporter
    }

    pub fn reporter_mut(&mut self) -> &mut Reporter {
        &mut self.reporter
    }

    /// Runs a single iteration and updates the context.
    pub fn step(&mut self, ctx: &mut RunContext) -> Result<Option<Mismatch>, CheckerError> {
        debug_assert!(ctx.is_running());
        let interval = self.config.progress_interval;
        if interval > 0 && ctx.iteration % interval == 0 {
            self.reporter.progress(ctx.iteration);
        }
        let sample = self.sampler.sample();
        let fen = sample.position.fen();
        let required = self.reference.moves(&sample.position);
        if self.config.debug {
            let request = perft_request(&sample.position);
            let message = format!("({}) > {}", self.engine.name(), request.lines().join(" | "));
            self.reporter.debug(&message);
        }
        let generated = self.engine.legal_moves(&sample.position)?;
        if let Some(diagnostic) = self.engine.take_diagnostic() {
            self.reporter.warning(&diagnostic);
        }
        if self.config.trace_required {
            self.reporter.required_moves(&required);
        }
        let discrepancy = compare(&required, &generated);
        if discrepancy.is_empty() {
            ctx.iteration += 1;
            if self.config.max_iterations.is_some_and(|max| ctx.iteration >= max) {
                ctx.status = RunStatus::Exhausted;
            }
            return Ok(None);
        }
        self.reporter.mismatch(&fen, &discrepancy);
        ctx.status = RunStatus::HaltedOnMismatch;
        let mismatch = Mismatch {
            sample,
            discrepancy,
            iteration: ctx.iteration,
        };
        if let Err(err) = self.record(&mismatch) {
            // the mismatch is still the result of the run
            self.reporter.warning(&format!("{:#}", anyhow::Error::new(err)));
        }
        Ok(Some(mismatch))
    }

    pub fn run(&mut self) -> Result<RunOutcome, CheckerError> {
        let mut context = RunContext::default();
        if self.config.max_iterations == Some(0) {
            context.status = RunStatus::Exhausted;
        }
        let mut mismatch = None;
        while context.is_running() {
            mismatch = self.step(&mut context)?;
        }
        Ok(RunOutcome { context, mismatch })
    }

    /// Appends the mismatch to the record file, so that the position can be examined without re-running the checker.
    fn record(&mut self, mismatch: &Mismatch) -> Result<(), CheckerError> {
        let Some(path) = &self.config.record else {
            return Ok(());
        };
        let to_err = |source| CheckerError::Output {
            path: path.clone(),
            source,
        };
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(to_err)?;
        let text = record_text(mismatch, &self.config);
        file.write_all(text.as_bytes()).map_err(to_err)?;
        self.reporter
            .info(&format!("The position has been saved to '{}'", path.display()));
        Ok(())
    }
}

fn record_text(mismatch: &Mismatch, config: &CheckerConfig) -> String {
    let mut text = format!(
        "[{}] engine '{}', seed {}, iteration {}\n",
        chrono::offset::Local::now().to_rfc3339(),
        config.engine.path.display(),
        config.seed,
        mismatch.iteration
    );
    text += &format!("fen {}\n", mismatch.sample.position.fen());
    text += &format!("{}\n", mismatch.sample.position_command());
    if !mismatch.discrepancy.extra.is_empty() {
        text += &format!("extra {}\n", plain_move_list(&mismatch.discrepancy.extra));
    }
    if !mismatch.discrepancy.missing.is_empty() {
        text += &format!("missing {}\n", plain_move_list(&mismatch.discrepancy.missing));
    }
    text + "\n"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::general::moves::{move_set, MoveSet, UciMove};
    use crate::position::Position;

    /// Generates the correct moves, except in positions with more than `limit` moves
    struct CappedGenerator {
        limit: usize,
    }

    impl MoveGenerator for CappedGenerator {
        fn legal_moves(&mut self, pos: &Position) -> Result<MoveSet, CheckerError> {
            let moves = ReferenceMoveGen.moves(pos);
            Ok(moves.into_iter().take(self.limit).collect())
        }

        fn name(&self) -> &str {
            "capped"
        }
    }

    fn capped_checker(config: CheckerConfig, limit: usize) -> Checker<CappedGenerator> {
        Checker::new(config, CappedGenerator { limit }, Reporter::in_memory())
    }

    fn config(seed: u64) -> CheckerConfig {
        let mut config = CheckerConfig::new(EngineConfig::new("capped"), seed);
        config.record = None;
        config
    }

    #[test]
    fn step_test() {
        let mut config = config(3);
        config.max_plies = 0;
        let mut checker = capped_checker(config, 100);
        let mut ctx = RunContext::default();
        assert!(checker.step(&mut ctx).unwrap().is_none());
        assert_eq!(ctx.iteration, 1);
        assert_eq!(ctx.status, RunStatus::Running);
        assert_eq!(checker.reporter().captured(), "0\n");
    }

    #[test]
    fn capped_generator_mismatch_test() {
        let mut checker = capped_checker(config(11), 25);
        let outcome = checker.run().unwrap();
        assert_eq!(outcome.context.status, RunStatus::HaltedOnMismatch);
        let mismatch = outcome.mismatch.unwrap();
        assert_eq!(mismatch.iteration, outcome.context.iteration);
        assert!(mismatch.discrepancy.extra.is_empty());
        let reference = ReferenceMoveGen.moves(&mismatch.sample.position);
        assert!(reference.len() > 25);
        assert_eq!(mismatch.discrepancy.missing.len(), reference.len() - 25);
        let out = checker.reporter().captured();
        let fen = mismatch.sample.position.fen();
        assert!(out.contains(&format!("Mismatch found in FEN: {fen}\n")));
        assert!(out.contains("Engine missing moves: "));
        assert!(!out.contains("Engine has extra moves"));
    }

    #[test]
    fn iteration_limit_test() {
        let mut config = config(5);
        config.max_iterations = Some(250);
        let mut checker = capped_checker(config, 1000);
        let outcome = checker.run().unwrap();
        assert_eq!(outcome.context.status, RunStatus::Exhausted);
        assert_eq!(outcome.context.iteration, 250);
        assert!(outcome.mismatch.is_none());
        assert_eq!(checker.reporter().captured(), "0\n100\n200\n");
    }

    #[test]
    fn zero_iterations_test() {
        let mut config = config(5);
        config.max_iterations = Some(0);
        let mut checker = capped_checker(config, 0);
        let outcome = checker.run().unwrap();
        assert_eq!(outcome.context.status, RunStatus::Exhausted);
        assert_eq!(checker.reporter().captured(), "");
    }

    #[test]
    fn trace_and_debug_output_test() {
        let mut config = config(9);
        config.max_plies = 0;
        config.max_iterations = Some(1);
        config.progress_interval = 0;
        config.trace_required = true;
        config.debug = true;
        let mut checker = capped_checker(config, 100);
        checker.run().unwrap();
        let out = checker.reporter().captured();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0],
            "Debug: (capped) > position fen rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1 | go perft"
        );
        assert!(lines[1].starts_with("Required moves: {\"a2a3\", \"a2a4\", "));
        assert!(lines[1].ends_with("\"h2h3\", \"h2h4\"}"));
    }

    struct FailingGenerator;

    impl MoveGenerator for FailingGenerator {
        fn legal_moves(&mut self, _pos: &Position) -> Result<MoveSet, CheckerError> {
            Err(CheckerError::Communication("broken".to_string()))
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    #[test]
    fn engine_error_aborts_run_test() {
        let mut checker = Checker::new(config(1), FailingGenerator, Reporter::in_memory());
        let err = checker.run().unwrap_err();
        assert!(matches!(err, CheckerError::Communication(_)));
    }

    #[test]
    fn record_test() {
        let path =
            std::env::temp_dir().join(format!("perftdiff_record_test_{}.txt", std::process::id()));
        _ = std::fs::remove_file(&path);
        let mut config = config(17);
        config.record = Some(path.clone());
        let mut checker = capped_checker(config, 3);
        let mismatch = checker.run().unwrap().mismatch.unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        let lines: Vec<&str> = content.lines().collect();
        let header = format!("engine 'capped', seed 17, iteration {}", mismatch.iteration);
        assert!(lines[0].ends_with(&header), "{}", lines[0]);
        let fen = mismatch.sample.position.fen();
        assert_eq!(lines[1], format!("fen {fen}"));
        assert!(lines[2].starts_with("position startpos"));
        // the recorded moves lead to the same position
        let plies: Vec<UciMove> = lines[2]
            .split_whitespace()
            .skip(3)
            .map(UciMove::new)
            .collect();
        assert_eq!(Position::replay(&plies).unwrap().fen(), fen);
        assert!(lines[3].starts_with("missing "));
        assert!(checker.reporter().captured().contains("has been saved to"));
    }

    #[test]
    fn unwritable_record_keeps_mismatch_test() {
        let mut config = config(17);
        config.record = Some(
            std::env::temp_dir()
                .join("perftdiff_no_such_dir")
                .join("mismatches.txt"),
        );
        let mut checker = capped_checker(config, 3);
        let outcome = checker.run().unwrap();
        assert_eq!(outcome.context.status, RunStatus::HaltedOnMismatch);
        assert!(outcome.mismatch.is_some());
        let out = checker.reporter().captured();
        assert!(out.contains("Mismatch found in FEN: "));
        assert!(out.contains("Warning: Couldn't write to '"), "{out}");
        assert!(!out.contains("has been saved to"));
    }

    #[test]
    fn record_formatting_test() {
        let sample = Sample {
            position: Position::startpos(),
            plies: vec![],
        };
        let mismatch = Mismatch {
            sample,
            discrepancy: compare(&move_set(["e2e4", "d2d4"]), &move_set(["e2e4", "e1e2"])),
            iteration: 42,
        };
        let text = record_text(&mismatch, &config(1));
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].ends_with("] engine 'capped', seed 1, iteration 42"));
        assert_eq!(
            &lines[1..],
            &[
                "fen rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
                "position startpos",
                "extra e1e2",
                "missing d2d4",
                "",
            ]
        );
        assert!(text.ends_with("\n\n"));
    }
}
