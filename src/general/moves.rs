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

use std::collections::BTreeSet;

use derive_more::{Display, From};
use itertools::Itertools;

/// A move in UCI notation, such as `e2e4` or `e7e8q`.
///
/// Two moves are equal iff their text is equal. Moves produced by the reference are always canonical
/// (lowercase promotion piece, castling written as king source and destination square),
/// but engine output is kept exactly as it was received, so that anything unexpected shows up in the report.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Display, From)]
pub struct UciMove(String);

impl UciMove {
    pub fn new(text: &str) -> Self {
        Self(text.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the text has the shape of a UCI move. This is purely informative,
    /// tokens that fail this check are still compared like any other move.
    pub fn is_well_formed(&self) -> bool {
        let bytes = self.0.as_bytes();
        let is_square =
            |file: u8, rank: u8| (b'a'..=b'h').contains(&file) && (b'1'..=b'8').contains(&rank);
        match bytes {
            [f1, r1, f2, r2] => is_square(*f1, *r1) && is_square(*f2, *r2),
            [f1, r1, f2, r2, promo] => {
                is_square(*f1, *r1) && is_square(*f2, *r2) && b"nbrq".contains(promo)
            }
            _ => false,
        }
    }
}

impl From<&str> for UciMove {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Sorted, so iterating gives the display order.
pub type MoveSet = BTreeSet<UciMove>;

pub fn move_set<'a, I: IntoIterator<Item = &'a str>>(moves: I) -> MoveSet {
    moves.into_iter().map(UciMove::new).collect()
}

/// `{"a2a3", "a2a4"}`
pub fn quoted_move_list(moves: &MoveSet) -> String {
    format!("{{{}}}", moves.iter().map(|mov| format!("\"{mov}\"")).join(", "))
}

/// `a2a3, a2a4`
pub fn plain_move_list<'a, I: IntoIterator<Item = &'a UciMove>>(moves: I) -> String {
    moves.into_iter().join(", ")
}
