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

use crate::general::common::CheckerError;
use crate::general::moves::MoveSet;
use crate::position::Position;

/// Anything that can list the legal moves of a position in UCI notation.
///
/// The reference implementation and the engine under test both implement this,
/// so the checker can compare any two generators.
pub trait MoveGenerator {
    fn legal_moves(&mut self, pos: &Position) -> Result<MoveSet, CheckerError>;

    fn name(&self) -> &str;

    /// Something noteworthy about the last query that isn't an error, such as a non-zero exit code.
    fn take_diagnostic(&mut self) -> Option<String> {
        None
    }
}

/// The trusted move generator backed by `shakmaty`.
/// It is assumed to be correct and is not under test.
#[derive(Debug, Default, Copy, Clone)]
pub struct ReferenceMoveGen;

impl ReferenceMoveGen {
    /// Unlike the trait method, this can't fail and doesn't need mutable access.
    pub fn moves(&self, pos: &Position) -> MoveSet {
        pos.legal_move_set()
    }
}

impl MoveGenerator for ReferenceMoveGen {
    fn legal_moves(&mut self, pos: &Position) -> Result<MoveSet, CheckerError> {
        Ok(self.moves(pos))
    }

    fn name(&self) -> &str {
        "reference"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::general::moves::{move_set, UciMove};

    const KIWIPETE: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";

    #[test]
    fn startpos_test() {
        let moves = ReferenceMoveGen.moves(&Position::startpos());
        assert_eq!(moves.len(), 20);
        let expected = move_set([
            "a2a3", "a2a4", "b2b3", "b2b4", "c2c3", "c2c4", "d2d3", "d2d4", "e2e3", "e2e4", "f2f3",
            "f2f4", "g2g3", "g2g4", "h2h3", "h2h4", "b1a3", "b1c3", "g1f3", "g1h3",
        ]);
        assert_eq!(moves, expected);
    }

    #[test]
    fn perft_1_counts_test() {
        let cases = [
            (KIWIPETE, 48),
            ("8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1", 14),
            ("r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1", 6),
            ("rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8", 44),
            ("r4rk1/1pp1qppp/p1np1n2/2b1p1B1/2B1P1b1/P1NP1N2/1PP1QPPP/R4RK1 w - - 0 10", 46),
        ];
        for (fen, count) in cases {
            let pos = Position::from_fen(fen).unwrap();
            assert_eq!(ReferenceMoveGen.moves(&pos).len(), count, "{fen}");
        }
    }

    #[test]
    fn special_move_encoding_test() {
        let moves = ReferenceMoveGen.moves(&Position::from_fen(KIWIPETE).unwrap());
        // castling is written as the king's move
        assert!(moves.contains(&UciMove::new("e1g1")));
        assert!(moves.contains(&UciMove::new("e1c1")));
        assert!(!moves.contains(&UciMove::new("e1h1")));

        let promo = Position::from_fen("8/P6k/8/8/8/8/8/K7 w - - 0 1").unwrap();
        let moves = ReferenceMoveGen.moves(&promo);
        for piece in ["q", "r", "b", "n"] {
            assert!(moves.contains(&UciMove::new(&format!("a7a8{piece}"))));
        }
        assert!(!moves.contains(&UciMove::new("a7a8")));

        let en_passant =
            Position::from_fen("rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3")
                .unwrap();
        assert!(ReferenceMoveGen.moves(&en_passant).contains(&UciMove::new("e5f6")));
    }

    #[test]
    fn no_moves_test() {
        let mate =
            Position::from_fen("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3")
                .unwrap();
        assert!(ReferenceMoveGen.legal_moves(&mate).unwrap().is_empty());
    }

    #[test]
    fn repeated_query_test() {
        let pos = Position::from_fen(KIWIPETE).unwrap();
        let mut generator = ReferenceMoveGen;
        let first = generator.legal_moves(&pos).unwrap();
        let second = generator.legal_moves(&pos).unwrap();
        assert_eq!(first, second);
        assert_eq!(pos.fen(), KIWIPETE);
    }
}
