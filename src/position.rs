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

use std::fmt;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use shakmaty::fen::Fen;
use shakmaty::uci::Uci;
use shakmaty::{CastlingMode, Chess, EnPassantMode, Move, MoveList, Position as _};

use crate::general::common::CheckerError;
use crate::general::moves::{MoveSet, UciMove};

pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// An immutable chess position. Playing a move returns a new position.
#[derive(Debug, Clone, Default)]
pub struct Position {
    board: Chess,
}

impl Position {
    pub fn startpos() -> Self {
        Self::default()
    }

    pub fn from_fen(fen: &str) -> Result<Self, CheckerError> {
        let invalid = |reason: String| CheckerError::InvalidFen {
            fen: fen.to_string(),
            reason,
        };
        let setup = Fen::from_str(fen.trim()).map_err(|err| invalid(err.to_string()))?;
        let board = setup
            .into_position::<Chess>(CastlingMode::Standard)
            .map_err(|err| invalid(err.to_string()))?;
        Ok(Self { board })
    }

    /// The en passant square is only included if an en passant capture is actually legal.
    pub fn fen(&self) -> String {
        Fen::from_position(self.board.clone(), EnPassantMode::Legal).to_string()
    }

    pub(crate) fn rules_moves(&self) -> MoveList {
        self.board.legal_moves()
    }

    pub fn is_terminal(&self) -> bool {
        self.rules_moves().is_empty()
    }

    pub(crate) fn play(&self, mov: &Move) -> Self {
        let mut board = self.board.clone();
        board.play_unchecked(mov);
        Self { board }
    }

    /// Plays a move given in UCI notation, which must be legal in this position.
    pub fn play_uci(&self, mov: &UciMove) -> Result<Self, CheckerError> {
        let illegal = |reason: String| CheckerError::InvalidFen {
            fen: self.fen(),
            reason: format!("can't play '{mov}': {reason}"),
        };
        let parsed =
            Uci::from_ascii(mov.as_str().as_bytes()).map_err(|err| illegal(err.to_string()))?;
        let mov = parsed
            .to_move(&self.board)
            .map_err(|err| illegal(err.to_string()))?;
        Ok(self.play(&mov))
    }

    /// Reconstructs the position reached by playing `plies` from the start position.
    pub fn replay<'a, I: IntoIterator<Item = &'a UciMove>>(
        plies: I,
    ) -> Result<Self, CheckerError> {
        plies
            .into_iter()
            .try_fold(Self::startpos(), |pos, mov| pos.play_uci(mov))
    }

    pub(crate) fn encode_move(mov: &Move) -> UciMove {
        UciMove::from(mov.to_uci(CastlingMode::Standard).to_string())
    }

    pub(crate) fn legal_move_set(&self) -> MoveSet {
        self.rules_moves().iter().map(Self::encode_move).collect()
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.fen())
    }
}

impl FromStr for Position {
    type Err = CheckerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_fen(s)
    }
}
