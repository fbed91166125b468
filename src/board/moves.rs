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

use log::{error, trace};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::attacks::{between, king_moves, knight_moves, pawn_attacks};
use super::castling::CastleSide;
use super::material::{Color, Material, Piece, PieceId, PieceRecord};
use super::square::{Mask, Offset, Rank, Square};
use super::{Board, BoardError};

use Piece::*;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Promotion {
    Queen,
    Rook,
    Bishop,
    Knight,
}

impl From<Promotion> for Piece {
    fn from(value: Promotion) -> Self {
        match value {
            Promotion::Queen => Piece::Queen,
            Promotion::Rook => Piece::Rook,
            Promotion::Bishop => Piece::Bishop,
            Promotion::Knight => Piece::Knight,
        }
    }
}

impl TryFrom<Piece> for Promotion {
    type Error = Piece;

    fn try_from(value: Piece) -> Result<Self, Self::Error> {
        match value {
            Piece::Queen => Ok(Promotion::Queen),
            Piece::Rook => Ok(Promotion::Rook),
            Piece::Bishop => Ok(Promotion::Bishop),
            Piece::Knight => Ok(Promotion::Knight),
            other => Err(other),
        }
    }
}

impl fmt::Display for Promotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match *self {
            Promotion::Queen => "q",
            Promotion::Rook => "r",
            Promotion::Bishop => "b",
            Promotion::Knight => "n",
        };
        write!(f, "{}", s)
    }
}

/// Side effects of a move beyond relocating one piece.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Special {
    EnPassant,
    CastleKingside,
    CastleQueenside,
    Promotion(Promotion),
}

impl Special {
    pub fn castle_side(&self) -> Option<CastleSide> {
        match self {
            Special::CastleKingside => Some(CastleSide::Kingside),
            Special::CastleQueenside => Some(CastleSide::Queenside),
            _ => None,
        }
    }
}

impl From<CastleSide> for Special {
    fn from(value: CastleSide) -> Self {
        match value {
            CastleSide::Kingside => Special::CastleKingside,
            CastleSide::Queenside => Special::CastleQueenside,
        }
    }
}

/// A piece taken by a move, and the square it was taken on. For en
/// passant that square is not the move's destination.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Capture {
    piece: PieceRecord,
    square: Square,
}

impl Capture {
    pub(crate) const fn new(piece: PieceRecord, square: Square) -> Self {
        Self { piece, square }
    }
    pub fn piece(&self) -> &PieceRecord {
        &self.piece
    }
    pub fn square(&self) -> Square {
        self.square
    }
}

/// A request to move one piece, and once applied, the record of what the
/// move did.
///
/// Callers build a move with `Move::new` from a piece currently on the
/// board. `Board::apply_move` returns a copy with `captured`, `special`
/// and `moved_before` filled in; that copy is what history stores and
/// what `Board::undo_move` and `Board::redo_move` expect.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    piece: PieceId,
    material: Material,
    from: Square,
    to: Square,
    promotion: Option<Promotion>,
    captured: Option<Capture>,
    special: Option<Special>,
    moved_before: bool,
}

/// What the movement rules say a move does on the current board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Resolution {
    pub(crate) special: Option<Special>,
    pub(crate) capture: Option<Square>,
}

impl Resolution {
    const fn plain(capture: Option<Square>) -> Self {
        Self {
            special: None,
            capture,
        }
    }
}

impl Move {
    pub fn new(piece: &PieceRecord, from: Square, to: Square) -> Self {
        Self {
            piece: piece.id(),
            material: piece.material(),
            from,
            to,
            promotion: None,
            captured: None,
            special: None,
            moved_before: piece.has_moved(),
        }
    }

    /// Piece a pawn turns into on the last rank. Queen when not given.
    pub fn with_promotion(mut self, promotion: Promotion) -> Self {
        self.promotion = Some(promotion);
        self
    }

    #[inline]
    pub fn piece(&self) -> PieceId {
        self.piece
    }
    #[inline]
    pub fn material(&self) -> Material {
        self.material
    }
    #[inline]
    pub fn color(&self) -> Color {
        self.material.color()
    }
    #[inline]
    pub fn from(&self) -> Square {
        self.from
    }
    #[inline]
    pub fn to(&self) -> Square {
        self.to
    }
    #[inline]
    pub fn promotion(&self) -> Option<Promotion> {
        self.promotion
    }
    #[inline]
    pub fn captured(&self) -> Option<&Capture> {
        self.captured.as_ref()
    }
    #[inline]
    pub fn special(&self) -> Option<Special> {
        self.special
    }
    /// Whether the piece had moved before this move was applied.
    #[inline]
    pub fn moved_before(&self) -> bool {
        self.moved_before
    }

    #[inline]
    pub fn is_double_advance(&self) -> bool {
        self.material.piece().is_pawn() && (self.to - self.from).y.abs() == 2
    }

    pub(crate) fn resolved(&self, resolution: Resolution, captured: Option<Capture>, moved_before: bool) -> Self {
        Self {
            special: resolution.special,
            captured,
            moved_before,
            ..*self
        }
    }

    /// True iff the move can be played now: the piece stands on `from`,
    /// its movement pattern reaches `to`, the destination holds no friendly
    /// piece, and the mover's king is not left in check.
    ///
    /// Turn order is not considered here; see `Game::make_move`. The board
    /// is borrowed mutably to try the move, and is always restored before
    /// returning.
    pub fn is_valid(&self, board: &mut Board, last_move: Option<&Move>) -> bool {
        logged(self.check_valid(board, last_move), false)
    }

    /// `is_valid`, but reports a board the trial move could not restore.
    pub(crate) fn check_valid(&self, board: &mut Board, last_move: Option<&Move>) -> Result<bool, BoardError> {
        if self.resolve(board, last_move).is_none() {
            trace!("{}: no movement pattern matches", self);
            return Ok(false);
        }
        if !board.leaves_king_safe(self, last_move)? {
            trace!("{}: leaves own king in check", self);
            return Ok(false);
        }
        Ok(true)
    }

    /// Matches the move against the movement pattern of the piece on
    /// `from`, without looking at the mover's own king.
    pub(crate) fn resolve(&self, board: &Board, last_move: Option<&Move>) -> Option<Resolution> {
        let record = board.piece_at(self.from)?;
        if record.id() != self.piece || record.material() != self.material || self.from == self.to {
            return None;
        }
        let color = record.color();
        let target = board.piece_at(self.to);
        if target.is_some_and(|target| target.color() == color) {
            return None;
        }
        let capture = target.map(|_| self.to);
        let offset = self.to - self.from;
        let resolution = match record.piece() {
            Pawn => return self.resolve_pawn(board, color, capture, last_move),
            Knight => knight_moves(self.from)
                .contains(self.to)
                .then_some(Resolution::plain(capture)),
            Bishop => (offset.is_diagonal() && self.is_path_clear(board))
                .then_some(Resolution::plain(capture)),
            Rook => (offset.is_straight() && self.is_path_clear(board))
                .then_some(Resolution::plain(capture)),
            Queen => ((offset.is_straight() || offset.is_diagonal()) && self.is_path_clear(board))
                .then_some(Resolution::plain(capture)),
            King if king_moves(self.from).contains(self.to) => Some(Resolution::plain(capture)),
            King => self.resolve_castle(board, record),
        }?;
        // only pawns promote
        self.promotion.is_none().then_some(resolution)
    }

    fn is_path_clear(&self, board: &Board) -> bool {
        (between(self.from, self.to) & board.occupied()).is_empty()
    }

    fn resolve_pawn(
        &self,
        board: &Board,
        color: Color,
        capture: Option<Square>,
        last_move: Option<&Move>,
    ) -> Option<Resolution> {
        let forward = color.forward();
        let offset = self.to - self.from;
        let attacks = pawn_attacks(color, self.from).contains(self.to);
        let capture = match (offset.x, capture) {
            (0, Some(_)) => return None,
            (0, None) if offset.y == forward => None,
            (0, None) if offset.y == 2 * forward && self.from.rank() == Rank::pawn_rank(color) => {
                let step = (self.from + Offset::new(0, forward))?;
                if board.is_occupied(step) {
                    return None;
                }
                None
            }
            (_, Some(square)) if attacks => Some(square),
            (_, None) if attacks => {
                let victim = Square::new(self.to.file(), self.from.rank());
                if !Self::allows_en_passant(last_move, victim) {
                    return None;
                }
                return Some(Resolution {
                    special: Some(Special::EnPassant),
                    capture: Some(victim),
                });
            }
            _ => return None,
        };

        let promotes = self.to.rank() == Rank::promotion_rank(color);
        match (promotes, self.promotion) {
            (true, promotion) => Some(Resolution {
                special: Some(Special::Promotion(promotion.unwrap_or(Promotion::Queen))),
                capture,
            }),
            (false, None) => Some(Resolution::plain(capture)),
            (false, Some(_)) => None,
        }
    }

    /// En passant is only open straight after the victim's double advance.
    fn allows_en_passant(last_move: Option<&Move>, victim: Square) -> bool {
        last_move.is_some_and(|last| last.is_double_advance() && last.to == victim)
    }

    fn resolve_castle(&self, board: &Board, king: &PieceRecord) -> Option<Resolution> {
        let color = king.color();
        let side = CastleSide::from_king_step(color, self.from, self.to)?;
        if king.has_moved() {
            return None;
        }
        let rook = board.piece_at(side.rook_src(color))?;
        if rook.material() != Material::new(color, Rook) || rook.has_moved() {
            return None;
        }
        if !(side.blocking_lane(color) & board.occupied()).is_empty() {
            return None;
        }
        let attacked = side
            .attacking_lane(color)
            .iter()
            .any(|square| board.is_square_attacked(square, !color));
        if attacked {
            return None;
        }
        Some(Resolution {
            special: Some(side.into()),
            capture: None,
        })
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}{}", self.material, self.from, self.to)?;
        if let Some(promotion) = self.promotion {
            write!(f, "={}", promotion)?;
        }
        Ok(())
    }
}

impl Board {
    /// Tries the move and reports whether the mover's king is safe
    /// afterwards. The board is left exactly as it was found.
    pub(crate) fn leaves_king_safe(&mut self, mv: &Move, last_move: Option<&Move>) -> Result<bool, BoardError> {
        let applied = match self.apply_move(mv, last_move) {
            Ok(applied) => applied,
            Err(BoardError::Unresolved { .. }) => return Ok(false),
            Err(err) => return Err(err),
        };
        let safe = !self.is_king_in_check(applied.color());
        self.undo_move(&applied)?;
        Ok(safe)
    }

    /// Squares the movement rules could possibly accept for the piece on
    /// `from`, before friendly-piece and self-check filtering.
    fn candidates(&self, from: Square, record: &PieceRecord) -> Mask {
        let color = record.color();
        match record.piece() {
            Pawn => {
                let mut mask = pawn_attacks(color, from);
                for step in [1, 2] {
                    if let Some(square) = from + Offset::new(0, step * color.forward()) {
                        mask.set(square);
                    }
                }
                mask
            }
            King => {
                let mut mask = king_moves(from);
                if from == CastleSide::king_src(color) {
                    mask.set(CastleSide::Kingside.king_dest(color));
                    mask.set(CastleSide::Queenside.king_dest(color));
                }
                mask
            }
            _ => self.attacks_from(from),
        }
    }

    /// Every destination `Move::is_valid` accepts for the piece on `from`.
    pub fn legal_destinations(&mut self, from: Square, last_move: Option<&Move>) -> Mask {
        logged(self.try_legal_destinations(from, last_move), Mask::empty())
    }

    pub(crate) fn try_legal_destinations(
        &mut self,
        from: Square,
        last_move: Option<&Move>,
    ) -> Result<Mask, BoardError> {
        let Some(record) = self.piece_at(from).copied() else {
            return Ok(Mask::empty());
        };
        let mut result = Mask::empty();
        for to in self.candidates(from, &record).iter() {
            if Move::new(&record, from, to).check_valid(self, last_move)? {
                result.set(to);
            }
        }
        Ok(result)
    }

    pub fn has_legal_move(&mut self, color: Color, last_move: Option<&Move>) -> bool {
        logged(self.try_has_legal_move(color, last_move), false)
    }

    pub(crate) fn try_has_legal_move(&mut self, color: Color, last_move: Option<&Move>) -> Result<bool, BoardError> {
        let movers: Vec<Square> = self.pieces(color).map(|(square, _)| square).collect();
        for from in movers {
            if !self.try_legal_destinations(from, last_move)?.is_empty() {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// True iff `color` has no legal move at all. Combined with
    /// `is_king_in_check` this tells checkmate from stalemate.
    pub fn is_mate(&mut self, color: Color, last_move: Option<&Move>) -> bool {
        logged(self.try_is_mate(color, last_move), false)
    }

    pub(crate) fn try_is_mate(&mut self, color: Color, last_move: Option<&Move>) -> Result<bool, BoardError> {
        Ok(!self.try_has_legal_move(color, last_move)?)
    }
}

/// Unwraps the result of a trial move search. An error there means a trial
/// move was not taken back, so the board can no longer be trusted.
fn logged<T>(result: Result<T, BoardError>, fallback: T) -> T {
    match result {
        Ok(value) => value,
        Err(err) => {
            error!("trial move left the board inconsistent: {}", err);
            debug_assert!(false, "trial move left the board inconsistent: {}", err);
            fallback
        }
    }
}
