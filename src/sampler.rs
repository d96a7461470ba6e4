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

use itertools::Itertools;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::general::moves::UciMove;
use crate::position::Position;

pub const DEFAULT_MAX_PLIES: usize = 40;

/// A randomly reached position, together with the moves that lead there from the start position.
#[derive(Debug, Clone)]
pub struct Sample {
    pub position: Position,
    pub plies: Vec<UciMove>,
}

impl Sample {
    /// The UCI command that sets up this position without relying on the FEN.
    pub fn position_command(&self) -> String {
        if self.plies.is_empty() {
            "position startpos".to_string()
        } else {
            format!("position startpos moves {}", self.plies.iter().join(" "))
        }
    }
}

/// Produces positions by playing a random number of uniformly chosen legal moves from the start position.
#[derive(Debug)]
pub struct Sampler<R: Rng> {
    rng: R,
    max_plies: usize,
}

impl<R: Rng> Sampler<R> {
    pub fn new(rng: R, max_plies: usize) -> Self {
        Self { rng, max_plies }
    }

    fn random_legal_move(&mut self, pos: &Position) -> Option<shakmaty::Move> {
        pos.rules_moves().choose(&mut self.rng).cloned()
    }

    pub fn sample(&mut self) -> Sample {
        let num_plies = self.rng.gen_range(0..=self.max_plies);
        let mut position = Position::startpos();
        let mut plies = Vec::with_capacity(num_plies);
        for _ in 0..num_plies {
            // stop early on checkmate or stalemate
            let Some(mov) = self.random_legal_move(&position) else {
                break;
            };
            plies.push(Position::encode_move(&mov));
            position = position.play(&mov);
        }
        Sample { position, plies }
    }
}
