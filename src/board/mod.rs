// Copyright 2023 Tobin Edwards
//
//    Licensed under the Apache License, Version 2.0 (the "License");
//    you may not use this file except in compliance with the License.
//    You may obtain a copy of the License at
//
//        http://www.apache.org/licenses/LICENSE-2.0
//
//    Unless required by applicable law or agreed to in writing, software
//    distributed under the License is distributed on an "AS IS" BASIS,
//    WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//    See the License for the specific language governing permissions and
//    limitations under the License.

//! Chess board and move legality
//!
//! A _board_ owns every piece of a game and knows how each one may
//! move. It does not know whose turn it is; that belongs to the game.
//!
//! Some of the key abstractions include:
//!
//! * A `Square` represents the coordinates for a single square on an
//!   8-by-8 board, built from a `File` (`FileA` .. `FileH`) and a
//!   `Rank` (`Rank1` .. `Rank8`). `Square::at(file, rank)` accepts
//!   zero-based coordinates where rank 0 is white's back rank.
//!
//! * A `Mask` is a 64-bit set of squares, used for attack sets,
//!   castling lanes and legal destinations.
//!
//! * `Material` is a `Piece` kind of a given `Color`. A `PieceRecord`
//!   is a piece as the board stores it: a stable `PieceId`, its material
//!   and whether it has moved. Records live in an arena that is never
//!   shrunk during play; the grid maps each square to the id standing
//!   on it. A captured piece leaves the grid but keeps its record.
//!
//! * A `Move` names a piece, its origin and destination. Once applied it
//!   also carries everything needed to take it back (captured piece,
//!   castling or promotion flag, prior `has_moved`), so that
//!   `Board::undo_move` is the exact inverse of `Board::apply_move`.
//!   Legality checks and mate detection rely on this: they apply a
//!   candidate move, look at the king, then undo it.

use serde::{Deserialize, Serialize};
use std::fmt;
use strum::IntoEnumIterator;
use thiserror::Error;

mod apply;
mod attacks;
mod castling;
mod material;
mod moves;
mod square;

pub use attacks::*;
pub use castling::*;
pub use material::*;
pub use moves::*;
pub use square::*;

use Piece::*;

pub trait Turn {
    fn turn(&self) -> Color;
}

/// Conditions that mean the board no longer matches the moves applied to
/// it. These are programming errors, never the result of an illegal move.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BoardError {
    #[error("no piece at {0}")]
    EmptySquare(Square),
    #[error("expected piece {expected} at {square}")]
    PieceMismatch { square: Square, expected: PieceId },
    #[error("unknown piece {0}")]
    UnknownPiece(PieceId),
    #[error("square {0} is already occupied")]
    Occupied(Square),
    #[error("move names piece {piece} as {claimed}, but it is {actual}")]
    MaterialMismatch {
        piece: PieceId,
        claimed: Material,
        actual: Material,
    },
    #[error("move {from}-{to} does not match any movement pattern")]
    Unresolved { from: Square, to: Square },
    #[error("expected exactly one {color} king, found {count}")]
    KingCount { color: Color, count: usize },
    #[error("piece {0} stands on more than one square")]
    Duplicate(PieceId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    grid: [Option<PieceId>; 64],
    pieces: Vec<PieceRecord>,
}

impl Default for Board {
    fn default() -> Self {
        Self::standard()
    }
}

impl Board {
    pub fn empty() -> Self {
        Self {
            grid: [None; 64],
            pieces: Vec::with_capacity(32),
        }
    }

    pub fn standard() -> Self {
        let mut board = Self::empty();
        board.set_starting_position();
        board
    }

    /// Removes every piece, including captured ones, from the board.
    pub fn clear(&mut self) {
        self.grid = [None; 64];
        self.pieces.clear();
    }

    /// Clears the board and sets up the 32 pieces of a new game.
    pub fn set_starting_position(&mut self) {
        const BACK_RANK: [Piece; 8] = [Rook, Knight, Bishop, Queen, King, Bishop, Knight, Rook];
        self.clear();
        for color in Color::iter() {
            for (file, piece) in File::iter().zip(BACK_RANK) {
                self.put(Square::new(file, Rank::back_rank(color)), Material::new(color, piece));
            }
            for file in File::iter() {
                self.put(Square::new(file, Rank::pawn_rank(color)), Material::new(color, Pawn));
            }
        }
    }

    /// Adds a new piece on an empty square.
    pub fn place(&mut self, square: Square, material: Material) -> Result<PieceId, BoardError> {
        if self.grid[square].is_some() {
            return Err(BoardError::Occupied(square));
        }
        Ok(self.put(square, material))
    }

    fn put(&mut self, square: Square, material: Material) -> PieceId {
        debug_assert!(self.pieces.len() < u8::MAX as usize);
        let id = PieceId::new(self.pieces.len() as u8);
        self.pieces.push(PieceRecord::new(id, material));
        self.grid[square] = Some(id);
        id
    }

    #[inline]
    pub fn piece_at(&self, square: Square) -> Option<&PieceRecord> {
        self.grid[square].and_then(|id| self.pieces.get(id.to_index()))
    }

    #[inline]
    pub fn piece(&self, id: PieceId) -> Option<&PieceRecord> {
        self.pieces.get(id.to_index())
    }

    pub(crate) fn piece_mut(&mut self, id: PieceId) -> Result<&mut PieceRecord, BoardError> {
        self.pieces
            .get_mut(id.to_index())
            .ok_or(BoardError::UnknownPiece(id))
    }

    /// Square the piece stands on, or `None` once it has been captured.
    pub fn square_of(&self, id: PieceId) -> Option<Square> {
        Square::iter().find(|square| self.grid[*square] == Some(id))
    }

    #[inline]
    pub fn is_occupied(&self, square: Square) -> bool {
        self.grid[square].is_some()
    }

    pub fn occupied(&self) -> Mask {
        Mask::from_squares(Square::iter().filter(|square| self.is_occupied(*square)))
    }

    /// Pieces of `color` still on the board, in square order.
    pub fn pieces(&self, color: Color) -> impl Iterator<Item = (Square, &PieceRecord)> + '_ {
        Square::iter().filter_map(move |square| {
            self.piece_at(square)
                .filter(|record| record.color() == color)
                .map(|record| (square, record))
        })
    }

    pub fn king_square(&self, color: Color) -> Option<Square> {
        self.pieces(color)
            .find(|(_, record)| record.piece().is_king())
            .map(|(square, _)| square)
    }

    /// Checks that the grid and the arena agree and that each side has
    /// exactly one king.
    pub fn validate(&self) -> Result<(), BoardError> {
        let mut seen = vec![false; self.pieces.len()];
        for id in self.grid.iter().flatten() {
            let slot = seen
                .get_mut(id.to_index())
                .ok_or(BoardError::UnknownPiece(*id))?;
            if *slot {
                return Err(BoardError::Duplicate(*id));
            }
            *slot = true;
        }
        for color in Color::iter() {
            let count = self
                .pieces(color)
                .filter(|(_, record)| record.piece().is_king())
                .count();
            if count != 1 {
                return Err(BoardError::KingCount { color, count });
            }
        }
        Ok(())
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        BoardSnapshot(
            Square::iter()
                .map(|square| self.piece_at(square).map(|record| record.material()))
                .collect(),
        )
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in Rank::iter().rev() {
            write!(f, "{} ", rank)?;
            for file in File::iter() {
                let c = self
                    .piece_at(Square::new(file, rank))
                    .map_or('.', |record| record.material().to_char());
                write!(f, "{}", c)?;
            }
            writeln!(f)?;
        }
        write!(f, "  abcdefgh")
    }
}

/// Contents of all 64 squares, indexed like `Square::to_index`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct BoardSnapshot(Vec<Option<Material>>);

impl BoardSnapshot {
    pub fn get(&self, square: Square) -> Option<Material> {
        self.0.get(square.to_index()).copied().flatten()
    }
    pub fn squares(&self) -> &[Option<Material>] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use crate::*;
    use Square::*;

    #[test]
    fn test_starting_position() {
        let board = Board::standard();
        assert_eq!(board.piece_at(E1).map(|r| r.material()), Some(Material::WK));
        assert_eq!(board.piece_at(D8).map(|r| r.material()), Some(Material::BQ));
        assert_eq!(board.piece_at(A2).map(|r| r.material()), Some(Material::WP));
        assert_eq!(board.piece_at(H7).map(|r| r.material()), Some(Material::BP));
        assert!(board.piece_at(E4).is_none());
        assert_eq!(board.pieces(Color::White).count(), 16);
        assert_eq!(board.pieces(Color::Black).count(), 16);
        assert!(board.validate().is_ok());
    }
    #[test]
    fn test_set_starting_position_is_idempotent() {
        let mut board = Board::standard();
        board.set_starting_position();
        board.set_starting_position();
        assert_eq!(board, Board::standard());
    }
    #[test]
    fn test_square_of_follows_grid() {
        let board = Board::standard();
        let id = board.piece_at(G1).map(|r| r.id()).unwrap();
        assert_eq!(board.square_of(id), Some(G1));
        assert_eq!(board.piece(id).map(|r| r.material()), Some(Material::WN));
    }
    #[test]
    fn test_place_rejects_occupied_square() {
        let mut board = Board::standard();
        assert_eq!(board.place(E2, Material::WQ), Err(BoardError::Occupied(E2)));
    }
    #[test]
    fn test_validate_king_count() {
        let mut board = Board::empty();
        board.place(E1, Material::WK).unwrap();
        assert_eq!(
            board.validate(),
            Err(BoardError::KingCount { color: Color::Black, count: 0 })
        );
        board.place(E8, Material::BK).unwrap();
        board.place(A8, Material::BK).unwrap();
        assert_eq!(
            board.validate(),
            Err(BoardError::KingCount { color: Color::Black, count: 2 })
        );
    }
    #[test]
    fn test_snapshot() {
        let snapshot = Board::standard().snapshot();
        assert_eq!(snapshot.squares().len(), 64);
        assert_eq!(snapshot.get(E1), Some(Material::WK));
        assert_eq!(snapshot.get(E5), None);
    }
    #[test]
    fn test_display() {
        let text = Board::standard().to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "8 rnbqkbnr");
        assert_eq!(lines[7], "1 RNBQKBNR");
        assert_eq!(lines[8], "  abcdefgh");
    }
}
