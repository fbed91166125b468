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

use serde::{Deserialize, Serialize};
use strum_macros::EnumIter;

use super::attacks::between;
use super::material::Color;
use super::square::{File, Mask, Rank, Square};

use File::*;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
#[serde(rename_all = "snake_case")]
pub enum CastleSide {
    Kingside,
    Queenside,
}

use CastleSide::*;

impl CastleSide {
    /// Side a king move from `from` to `to` would castle towards, if the
    /// move has the two-file king step shape on its own back rank.
    pub fn from_king_step(color: Color, from: Square, to: Square) -> Option<Self> {
        if from != Self::king_src(color) || to.rank() != from.rank() {
            return None;
        }
        match to.file() {
            FileG => Some(Kingside),
            FileC => Some(Queenside),
            _ => None,
        }
    }

    #[inline]
    pub fn king_src(color: Color) -> Square {
        Square::new(FileE, Rank::back_rank(color))
    }
    #[inline]
    pub fn king_dest(self, color: Color) -> Square {
        let file = match self {
            Kingside => FileG,
            Queenside => FileC,
        };
        Square::new(file, Rank::back_rank(color))
    }
    #[inline]
    pub fn rook_src(self, color: Color) -> Square {
        let file = match self {
            Kingside => FileH,
            Queenside => FileA,
        };
        Square::new(file, Rank::back_rank(color))
    }
    #[inline]
    pub fn rook_dest(self, color: Color) -> Square {
        let file = match self {
            Kingside => FileF,
            Queenside => FileD,
        };
        Square::new(file, Rank::back_rank(color))
    }

    /// Squares that must be empty: everything between king and rook.
    pub fn blocking_lane(self, color: Color) -> Mask {
        between(Self::king_src(color), self.rook_src(color))
    }

    /// Squares the king stands on, crosses or lands on. None of them may be
    /// attacked. On the queen side the square next to the rook is only
    /// blocking, never attacking.
    pub fn attacking_lane(self, color: Color) -> Mask {
        let king_src = Self::king_src(color);
        let king_dest = self.king_dest(color);
        between(king_src, king_dest) | king_src | king_dest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Color::*;
    use Square::*;

    #[test]
    fn test_castle_squares() {
        assert_eq!(Kingside.king_dest(White), G1);
        assert_eq!(Kingside.rook_dest(White), F1);
        assert_eq!(Queenside.king_dest(Black), C8);
        assert_eq!(Queenside.rook_src(Black), A8);
    }
    #[test]
    fn test_from_king_step() {
        assert_eq!(CastleSide::from_king_step(White, E1, G1), Some(Kingside));
        assert_eq!(CastleSide::from_king_step(Black, E8, C8), Some(Queenside));
        assert_eq!(CastleSide::from_king_step(White, E1, F1), None);
        assert_eq!(CastleSide::from_king_step(White, E8, G8), None);
    }
    #[test]
    fn test_lanes() {
        assert_eq!(Queenside.blocking_lane(White), Mask::from_squares([B1, C1, D1]));
        assert_eq!(Queenside.attacking_lane(White), Mask::from_squares([C1, D1, E1]));
        assert_eq!(Kingside.blocking_lane(Black), Mask::from_squares([F8, G8]));
        assert_eq!(Kingside.attacking_lane(Black), Mask::from_squares([E8, F8, G8]));
    }
}
