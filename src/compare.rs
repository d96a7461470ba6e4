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

use crate::general::moves::{MoveSet, UciMove};

/// The symmetric difference between the reference moves and the engine moves.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Discrepancy {
    /// Moves the engine generated that aren't legal
    pub extra: MoveSet,
    /// Legal moves the engine didn't generate
    pub missing: MoveSet,
}

impl Discrepancy {
    pub fn is_empty(&self) -> bool {
        self.extra.is_empty() && self.missing.is_empty()
    }

    /// Extra tokens that don't even look like moves usually mean that the engine printed something else
    /// in addition to its moves, which can't be distinguished from a move generation bug.
    pub fn malformed_extra(&self) -> impl Iterator<Item = &UciMove> {
        self.extra.iter().filter(|mov| !mov.is_well_formed())
    }
}

pub fn compare(reference: &MoveSet, engine: &MoveSet) -> Discrepancy {
    Discrepancy {
        extra: engine.difference(reference).cloned().collect(),
        missing: reference.difference(engine).cloned().collect(),
    }
}
