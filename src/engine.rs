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

use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::{Output, Stdio};
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::runtime::{Builder, Runtime};
use tokio::time::timeout;

use crate::general::common::CheckerError;
use crate::general::moves::{MoveSet, UciMove};
use crate::position::Position;
use crate::reference::MoveGenerator;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(10_000);

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// The path to the executable, e.g. "./bin/Release/Uci"
    pub path: PathBuf,
    /// Command line arguments passed to the engine on every start
    pub args: Vec<String>,
    /// Every query must finish within this duration, otherwise the engine is killed
    pub timeout: Duration,
}

impl EngineConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            args: vec![],
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn display_name(&self) -> String {
        self.path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("engine")
            .to_string()
    }
}

/// Every whitespace-separated token is treated as a move.
/// There is no filtering, so stray output shows up as extra moves.
pub fn parse_engine_output(output: &str) -> MoveSet {
    output.split_whitespace().map(UciMove::new).collect()
}

/// The text sent to the engine's stdin for one query.
pub fn perft_request(pos: &Position) -> String {
    format!("position fen {}\ngo perft\n", pos.fen())
}

/// The engine under test. A fresh process is started for every query, so no state can leak between positions.
#[derive(Debug)]
pub struct EngineProcess {
    config: EngineConfig,
    name: String,
    runtime: Runtime,
    diagnostic: Option<String>,
}

impl EngineProcess {
    pub fn new(config: EngineConfig) -> Result<Self, CheckerError> {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        let name = config.display_name();
        Ok(Self {
            config,
            name,
            runtime,
            diagnostic: None,
        })
    }

    async fn run(config: &EngineConfig, request: &str) -> Result<Output, CheckerError> {
        let mut cmd = Command::new(&config.path);
        cmd.kill_on_drop(true)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .args(&config.args);
        let mut child = cmd.spawn().map_err(|source| CheckerError::Spawn {
            path: config.path.clone(),
            source,
        })?;
        let mut to_engine = child.stdin.take().ok_or_else(|| {
            CheckerError::Communication("Couldn't open the engine's stdin".to_string())
        })?;
        match to_engine.write_all(request.as_bytes()).await {
            // The engine may exit without reading its input. Whatever it printed is still its answer.
            Err(err) if err.kind() == ErrorKind::BrokenPipe => {}
            res => res?,
        }
        // closing stdin signals the end of the request
        drop(to_engine);
        Ok(child.wait_with_output().await?)
    }

    /// Dropping the unfinished `run` future kills the child.
    async fn run_with_deadline(
        config: &EngineConfig,
        request: &str,
    ) -> Result<Output, CheckerError> {
        timeout(config.timeout, Self::run(config, request))
            .await
            .map_err(|_| CheckerError::Timeout(config.timeout))?
    }

    /// Sends the position and `go perft`, then waits until the engine exits or the time limit is reached.
    pub fn query(&mut self, pos: &Position) -> Result<MoveSet, CheckerError> {
        let request = perft_request(pos);
        let output = self
            .runtime
            .block_on(Self::run_with_deadline(&self.config, &request))?;
        if !output.status.success() {
            self.diagnostic = Some(format!(
                "Engine '{}' exited with {} for FEN '{}'",
                self.name,
                output.status,
                pos.fen()
            ));
        }
        let text = String::from_utf8(output.stdout).map_err(|err| {
            CheckerError::Communication(format!("The output is not valid UTF-8: {err}"))
        })?;
        Ok(parse_engine_output(&text))
    }
}

impl MoveGenerator for EngineProcess {
    fn legal_moves(&mut self, pos: &Position) -> Result<MoveSet, CheckerError> {
        self.query(pos)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn take_diagnostic(&mut self) -> Option<String> {
        self.diagnostic.take()
    }
}
