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

use std::fs::File;
use std::io::{stderr, stdout, Stderr, Stdout, Write};
use std::path::Path;

use colored::{ColoredString, Colorize};
use strum::IntoEnumIterator;
use strum_macros::EnumIter;

use crate::compare::Discrepancy;
use crate::general::common::CheckerError;
use crate::general::moves::{plain_move_list, quoted_move_list, MoveSet};

#[derive(Debug, Copy, Clone, Eq, PartialEq, EnumIter)]
pub enum Message {
    Info,
    Warning,
    /// Errors end the run. They are printed by the caller, so the terminal reporter only writes them to the log file.
    Error,
    Debug,
}

impl Message {
    fn message_prefix(self) -> &'static str {
        match self {
            Message::Info => "",
            Message::Warning => "Warning:",
            Message::Error => "Error:",
            Message::Debug => "Debug:",
        }
    }

    fn colored_prefix(self) -> ColoredString {
        let prefix = self.message_prefix();
        match self {
            Message::Info => prefix.normal(),
            Message::Warning => prefix.yellow(),
            Message::Error => prefix.red(),
            Message::Debug => prefix.dimmed(),
        }
    }
}

#[derive(Debug)]
pub enum TextStream {
    File(File), // Don't use a BufWriter to ensure the log is always up-to-date.
    Stdout(Stdout),
    Stderr(Stderr),
    Buffer(Vec<u8>),
}

impl TextStream {
    pub fn write(&mut self, typ: Message, msg: &str) {
        let is_terminal = matches!(self, TextStream::Stdout(_) | TextStream::Stderr(_));
        let stream = self.stream();
        if typ == Message::Info {
            _ = writeln!(stream, "{msg}");
        } else if is_terminal {
            _ = writeln!(stream, "{} {msg}", typ.colored_prefix());
        } else {
            _ = writeln!(stream, "{} {msg}", typ.message_prefix());
        }
    }

    pub fn stream(&mut self) -> &mut dyn Write {
        match self {
            TextStream::File(f) => f,
            TextStream::Stdout(out) => out,
            TextStream::Stderr(err) => err,
            TextStream::Buffer(buf) => buf,
        }
    }

    pub fn from_filename(name: &Path) -> Result<Self, CheckerError> {
        let file = File::create(name).map_err(|source| CheckerError::Output {
            path: name.to_path_buf(),
            source,
        })?;
        Ok(TextStream::File(file))
    }
}

#[derive(Debug)]
#[must_use]
pub struct TextWriter {
    pub stream: TextStream,
    pub accepted: Vec<Message>,
}

impl TextWriter {
    pub fn display_message(&mut self, typ: Message, message: &str) {
        if self.accepted.contains(&typ) {
            self.stream.write(typ, message);
        }
    }

    pub fn new_for(stream: TextStream, accepted: Vec<Message>) -> Self {
        Self { stream, accepted }
    }
}

/// Everything the checker prints goes through this.
#[derive(Debug)]
pub struct Reporter {
    writers: Vec<TextWriter>,
}

impl Reporter {
    /// Info on stdout, warnings and debug output on stderr.
    pub fn terminal() -> Self {
        Self {
            writers: vec![
                TextWriter::new_for(TextStream::Stdout(stdout()), vec![Message::Info]),
                TextWriter::new_for(
                    TextStream::Stderr(stderr()),
                    vec![Message::Warning, Message::Debug],
                ),
            ],
        }
    }

    /// Collects all messages in memory, see [`Reporter::captured`].
    pub fn in_memory() -> Self {
        Self {
            writers: vec![TextWriter::new_for(
                TextStream::Buffer(vec![]),
                Message::iter().collect(),
            )],
        }
    }

    /// Additionally writes every message to the given file.
    pub fn add_log_file(&mut self, path: &Path) -> Result<(), CheckerError> {
        let mut writer = TextWriter::new_for(
            TextStream::from_filename(path)?,
            Message::iter().collect(),
        );
        writer.display_message(
            Message::Info,
            &format!("[Starting logging at {}]", chrono::offset::Utc::now().to_rfc2822()),
        );
        self.writers.push(writer);
        Ok(())
    }

    /// The text written to the first in-memory stream.
    pub fn captured(&self) -> String {
        self.writers
            .iter()
            .find_map(|w| match &w.stream {
                TextStream::Buffer(buf) => Some(String::from_utf8_lossy(buf).into_owned()),
                _ => None,
            })
            .unwrap_or_default()
    }

    pub fn display_message(&mut self, typ: Message, message: &str) {
        for writer in &mut self.writers {
            writer.display_message(typ, message);
        }
    }

    pub fn info(&mut self, message: &str) {
        self.display_message(Message::Info, message);
    }

    pub fn warning(&mut self, message: &str) {
        self.display_message(Message::Warning, message);
    }

    pub fn debug(&mut self, message: &str) {
        self.display_message(Message::Debug, message);
    }

    pub fn progress(&mut self, iteration: u64) {
        self.info(&iteration.to_string());
    }

    pub fn required_moves(&mut self, moves: &MoveSet) {
        self.info(&format!("Required moves: {}", quoted_move_list(moves)));
    }

    pub fn mismatch(&mut self, fen: &str, discrepancy: &Discrepancy) {
        self.info(&format!("Mismatch found in FEN: {fen}"));
        if !discrepancy.extra.is_empty() {
            self.info(&format!(
                "Engine has extra moves: {}",
                plain_move_list(&discrepancy.extra)
            ));
        }
        if !discrepancy.missing.is_empty() {
            self.info(&format!(
                "Engine missing moves: {}",
                plain_move_list(&discrepancy.missing)
            ));
        }
        let malformed = plain_move_list(discrepancy.malformed_extra());
        if !malformed.is_empty() {
            self.warning(&format!(
                "Some extra tokens aren't moves ({malformed}), the engine may print more than just its moves"
            ));
        }
    }
}
