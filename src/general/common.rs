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

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub type Res<T> = anyhow::Result<T>;

#[derive(Debug, Error)]
pub enum CheckerError {
    /// The engine couldn't be started at all, e.g. because the path is wrong or the file isn't executable.
    #[error("Couldn't start the engine '{path}'")]
    Spawn {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("I/O error while talking to the engine")]
    Io(#[from] io::Error),
    #[error("The engine didn't finish within {}ms", .0.as_millis())]
    Timeout(Duration),
    #[error("The engine produced unusable output: {0}")]
    Communication(String),
    #[error("Invalid FEN '{fen}': {reason}")]
    InvalidFen { fen: String, reason: String },
    #[error("Couldn't write to '{path}'")]
    Output {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl CheckerError {
    /// Fatal errors mean that the checker itself is misconfigured, so there is no point in continuing the run.
    /// Currently, every error is fatal, there are no retries.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            CheckerError::Spawn { .. } | CheckerError::Timeout(_) | CheckerError::Output { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_test() {
        let err = CheckerError::Timeout(Duration::from_millis(1500));
        assert_eq!(err.to_string(), "The engine didn't finish within 1500ms");
        assert!(err.is_configuration_error());
        let err = CheckerError::InvalidFen {
            fen: "8/8 w".to_string(),
            reason: "invalid board".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid FEN '8/8 w': invalid board");
        assert!(!err.is_configuration_error());
    }

    #[test]
    fn io_cause_is_printed_once_test() {
        let err = CheckerError::Spawn {
            path: PathBuf::from("./nope"),
            source: io::Error::new(io::ErrorKind::NotFound, "No such file or directory"),
        };
        let text = format!("{:#}", anyhow::Error::new(err));
        assert_eq!(text, "Couldn't start the engine './nope': No such file or directory");
        let err = CheckerError::Io(io::Error::new(io::ErrorKind::BrokenPipe, "broken pipe"));
        let text = format!("{:#}", anyhow::Error::new(err));
        assert_eq!(text.matches("broken pipe").count(), 1, "{text}");
    }
}
