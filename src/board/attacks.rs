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

use once_cell::sync::Lazy;
use strum::IntoEnumIterator;

use super::material::{Color, Pair, Piece};
use super::square::{Mask, Offset, Square};
use super::Board;

use Color::*;
use Piece::*;

const KING_OFFSETS: [Offset; 8] = [
    Offset::new(-1, -1),
    Offset::new(0, -1),
    Offset::new(1, -1),
    Offset::new(-1, 0),
    Offset::new(1, 0),
    Offset::new(-1, 1),
    Offset::new(0, 1),
    Offset::new(1, 1),
];

const KNIGHT_OFFSETS: [Offset; 8] = [
    Offset::new(-2, -1),
    Offset::new(-2, 1),
    Offset::new(2, -1),
    Offset::new(2, 1),
    Offset::new(-1, -2),
    Offset::new(-1, 2),
    Offset::new(1, -2),
    Offset::new(1, 2),
];

const STRAIGHTS: [Offset; 4] = [
    Offset::new(0, 1),
    Offset::new(0, -1),
    Offset::new(1, 0),
    Offset::new(-1, 0),
];

const DIAGONALS: [Offset; 4] = [
    Offset::new(1, 1),
    Offset::new(1, -1),
    Offset::new(-1, 1),
    Offset::new(-1, -1),
];

/// Squares strictly between `from` and `to` when they share a rank,
/// file or diagonal; empty otherwise.
#[inline]
pub fn between(from: Square, to: Square) -> Mask {
    SQUARES_BETWEEN[from.to_index() * 64 + to.to_index()]
}

#[inline]
pub fn king_moves(from: Square) -> Mask {
    KING_MOVES[from]
}

#[inline]
pub fn knight_moves(from: Square) -> Mask {
    KNIGHT_MOVES[from]
}

/// Squares a pawn of `color` on `from` attacks diagonally.
#[inline]
pub fn pawn_attacks(color: Color, from: Square) -> Mask {
    PAWN_ATTACKS[color][from]
}

static SQUARES_BETWEEN: Lazy<Vec<Mask>> = Lazy::new(|| {
    let mut table = vec![Mask::empty(); 64 * 64];
    for start in Square::iter() {
        for end in Square::iter() {
            let Some(step) = (end - start).to_unit() else {
                continue;
            };
            let mut mask = Mask::empty();
            let mut next = start + step;
            while let Some(square) = next {
                if square == end {
                    break;
                }
                mask.set(square);
                next = square + step;
            }
            table[start.to_index() * 64 + end.to_index()] = mask;
        }
    }
    table
});

static KING_MOVES: Lazy<[Mask; 64]> = Lazy::new(|| offset_table(&KING_OFFSETS));

static KNIGHT_MOVES: Lazy<[Mask; 64]> = Lazy::new(|| offset_table(&KNIGHT_OFFSETS));

static PAWN_ATTACKS: Lazy<Pair<[Mask; 64]>> = Lazy::new(|| {
    let table = |color: Color| {
        let forward = color.forward();
        offset_table(&[Offset::new(-1, forward), Offset::new(1, forward)])
    };
    Pair::new(table(White), table(Black))
});

fn offset_table(offsets: &[Offset]) -> [Mask; 64] {
    let mut array = [Mask::default(); 64];
    for square in Square::iter() {
        array[square] = Mask::from_squares(offsets.iter().filter_map(|offset| square + *offset));
    }
    array
}

impl Board {
    /// Squares the piece on `from` attacks, ignoring whose turn it is and
    /// whether the move would expose its own king. Sliding attacks stop at
    /// (and include) the first occupied square.
    pub fn attacks_from(&self, from: Square) -> Mask {
        let Some(record) = self.piece_at(from) else {
            return Mask::empty();
        };
        match record.piece() {
            King => king_moves(from),
            Knight => knight_moves(from),
            Pawn => pawn_attacks(record.color(), from),
            Rook => self.rays(from, &STRAIGHTS),
            Bishop => self.rays(from, &DIAGONALS),
            Queen => self.rays(from, &STRAIGHTS) | self.rays(from, &DIAGONALS),
        }
    }

    fn rays(&self, from: Square, directions: &[Offset]) -> Mask {
        let mut mask = Mask::empty();
        for step in directions {
            let mut next = from + *step;
            while let Some(square) = next {
                mask.set(square);
                if self.is_occupied(square) {
                    break;
                }
                next = square + *step;
            }
        }
        mask
    }

    pub fn is_square_attacked(&self, square: Square, by: Color) -> bool {
        self.pieces(by)
            .any(|(from, _)| self.attacks_from(from).contains(square))
    }

    /// True iff some piece of the other color reaches the king of `color`.
    /// A board without a king of `color` is never in check; `validate`
    /// reports that condition.
    pub fn is_king_in_check(&self, color: Color) -> bool {
        match self.king_square(color) {
            Some(king) => self.is_square_attacked(king, !color),
            None => false,
        }
    }
}
