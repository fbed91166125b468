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

use super::material::{Piece, PieceId, PieceRecord};
use super::moves::{Capture, Move, Special};
use super::square::Square;
use super::{Board, BoardError};

impl Board {
    /// The piece `mv` names, as it stands on the board. An error means the
    /// move was not built from this board: the piece is unknown, is no
    /// longer on `from`, or is not the material the move claims.
    pub fn mover(&self, mv: &Move) -> Result<&PieceRecord, BoardError> {
        let record = self.piece(mv.piece()).ok_or(BoardError::UnknownPiece(mv.piece()))?;
        self.expect_at(mv.from(), mv.piece())?;
        if record.material() != mv.material() {
            return Err(BoardError::MaterialMismatch {
                piece: mv.piece(),
                claimed: mv.material(),
                actual: record.material(),
            });
        }
        Ok(record)
    }

    /// Plays `mv` on the board and returns it with everything needed to
    /// take it back. Legality is assumed to have been checked with
    /// `Move::is_valid`; `last_move` is only consulted to recognise an en
    /// passant capture.
    pub fn apply_move(&mut self, mv: &Move, last_move: Option<&Move>) -> Result<Move, BoardError> {
        let resolution = mv.resolve(self, last_move).ok_or(BoardError::Unresolved {
            from: mv.from(),
            to: mv.to(),
        })?;
        let record = *self.piece(mv.piece()).ok_or(BoardError::UnknownPiece(mv.piece()))?;
        let captured = match resolution.capture {
            Some(square) => {
                let piece = *self.piece_at(square).ok_or(BoardError::EmptySquare(square))?;
                Some(Capture::new(piece, square))
            }
            None => None,
        };
        let applied = mv.resolved(resolution, captured, record.has_moved());
        self.execute(&applied)?;
        Ok(applied)
    }

    /// Plays a move previously returned by `apply_move` again, after it
    /// has been taken back with `undo_move`.
    pub fn redo_move(&mut self, mv: &Move) -> Result<(), BoardError> {
        self.execute(mv)
    }

    /// Takes back a move returned by `apply_move`. The board ends up equal
    /// to the board the move was applied to.
    pub fn undo_move(&mut self, mv: &Move) -> Result<(), BoardError> {
        let color = mv.color();
        self.expect_at(mv.to(), mv.piece())?;
        match mv.special() {
            Some(Special::Promotion(_)) => self.piece_mut(mv.piece())?.set_piece(Piece::Pawn),
            Some(special) => {
                if let Some(side) = special.castle_side() {
                    let rook = self.lift(side.rook_dest(color))?;
                    self.set_down(side.rook_src(color), rook)?;
                    self.piece_mut(rook)?.set_has_moved(false);
                }
            }
            None => {}
        }
        let piece = self.lift(mv.to())?;
        self.set_down(mv.from(), piece)?;
        self.piece_mut(piece)?.set_has_moved(mv.moved_before());
        if let Some(capture) = mv.captured() {
            self.set_down(capture.square(), capture.piece().id())?;
        }
        Ok(())
    }

    fn execute(&mut self, mv: &Move) -> Result<(), BoardError> {
        let color = mv.color();
        self.expect_at(mv.from(), mv.piece())?;
        if let Some(capture) = mv.captured() {
            self.expect_at(capture.square(), capture.piece().id())?;
            self.lift(capture.square())?;
        }
        let piece = self.lift(mv.from())?;
        self.set_down(mv.to(), piece)?;
        self.piece_mut(piece)?.set_has_moved(true);
        match mv.special() {
            Some(Special::Promotion(promotion)) => {
                self.piece_mut(piece)?.set_piece(promotion.into());
            }
            Some(special) => {
                if let Some(side) = special.castle_side() {
                    let rook = self.lift(side.rook_src(color))?;
                    self.set_down(side.rook_dest(color), rook)?;
                    self.piece_mut(rook)?.set_has_moved(true);
                }
            }
            None => {}
        }
        Ok(())
    }

    fn expect_at(&self, square: Square, expected: PieceId) -> Result<(), BoardError> {
        match self.grid[square] {
            Some(id) if id == expected => Ok(()),
            Some(_) => Err(BoardError::PieceMismatch { square, expected }),
            None => Err(BoardError::EmptySquare(square)),
        }
    }

    fn lift(&mut self, square: Square) -> Result<PieceId, BoardError> {
        self.grid[square].take().ok_or(BoardError::EmptySquare(square))
    }

    fn set_down(&mut self, square: Square, id: PieceId) -> Result<(), BoardError> {
        if self.grid[square].is_some() {
            return Err(BoardError::Occupied(square));
        }
        self.grid[square] = Some(id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::*;
    use Square::*;

    fn round_trip(board: &mut Board, from: Square, to: Square, last: Option<&Move>) -> Move {
        let before = board.clone();
        let record = *board.piece_at(from).unwrap();
        let mv = Move::new(&record, from, to);
        assert!(mv.is_valid(board, last));
        let applied = board.apply_move(&mv, last).unwrap();
        let after = board.clone();
        board.undo_move(&applied).unwrap();
        assert_eq!(*board, before, "undo of {} did not restore the board", applied);
        board.redo_move(&applied).unwrap();
        assert_eq!(*board, after, "redo of {} did not replay the move", applied);
        applied
    }

    #[test]
    fn test_undo_plain_moves() {
        let mut board = Board::standard();
        let a = round_trip(&mut board, E2, E4, None);
        assert!(!a.moved_before());
        let b = round_trip(&mut board, G8, F6, Some(&a));
        let c = round_trip(&mut board, E4, E5, Some(&b));
        assert!(c.moved_before());
        assert!(board.piece_at(E5).unwrap().has_moved());
    }
    #[test]
    fn test_undo_capture_restores_victim() {
        let mut board = Board::standard();
        let a = round_trip(&mut board, E2, E4, None);
        let b = round_trip(&mut board, D7, D5, Some(&a));
        let c = round_trip(&mut board, E4, D5, Some(&b));
        let victim = c.captured().unwrap();
        assert_eq!(victim.square(), D5);
        assert_eq!(victim.piece().material(), Material::BP);
        board.undo_move(&c).unwrap();
        assert_eq!(board.piece_at(D5).map(|r| r.id()), Some(victim.piece().id()));
    }
    #[test]
    fn test_undo_en_passant() {
        let mut board = Board::standard();
        let a = round_trip(&mut board, E2, E4, None);
        let b = round_trip(&mut board, A7, A6, Some(&a));
        let c = round_trip(&mut board, E4, E5, Some(&b));
        let d = round_trip(&mut board, D7, D5, Some(&c));
        let ep = round_trip(&mut board, E5, D6, Some(&d));
        assert_eq!(ep.special(), Some(Special::EnPassant));
        board.undo_move(&ep).unwrap();
        assert_eq!(board.piece_at(D5).map(|r| r.material()), Some(Material::BP));
        assert!(board.piece_at(D6).is_none());
    }
    #[test]
    fn test_undo_promotion_restores_pawn() {
        let mut board = Board::empty();
        board.place(E1, Material::WK).unwrap();
        board.place(E8, Material::BK).unwrap();
        board.place(A7, Material::WP).unwrap();
        let promo = round_trip(&mut board, A7, A8, None);
        assert_eq!(board.piece_at(A8).map(|r| r.material()), Some(Material::WQ));
        board.undo_move(&promo).unwrap();
        assert_eq!(board.piece_at(A7).map(|r| r.material()), Some(Material::WP));
    }
    #[test]
    fn test_undo_castle_restores_rook() {
        let mut board = Board::empty();
        board.place(E1, Material::WK).unwrap();
        board.place(H1, Material::WR).unwrap();
        board.place(A1, Material::WR).unwrap();
        board.place(E8, Material::BK).unwrap();
        let castle = round_trip(&mut board, E1, C1, None);
        assert_eq!(castle.special(), Some(Special::CastleQueenside));
        assert!(board.piece_at(D1).unwrap().has_moved());
        board.undo_move(&castle).unwrap();
        assert!(!board.piece_at(A1).unwrap().has_moved());
        assert!(!board.piece_at(E1).unwrap().has_moved());
    }
    #[test]
    fn test_undo_rejects_foreign_move() {
        let mut board = Board::standard();
        let record = *board.piece_at(E2).unwrap();
        let applied = board.apply_move(&Move::new(&record, E2, E4), None).unwrap();
        board.undo_move(&applied).unwrap();
        assert_eq!(
            board.undo_move(&applied),
            Err(BoardError::EmptySquare(E4))
        );
    }
    #[test]
    fn test_mover_checks_move_against_board() {
        let mut board = Board::standard();
        let pawn = *board.piece_at(E7).unwrap();
        let push = Move::new(&pawn, E7, E5);
        assert_eq!(board.mover(&push), Ok(&pawn));

        let knight = *board.piece_at(G1).unwrap();
        let wrong_square = Move::new(&knight, B1, C3);
        assert_eq!(
            board.mover(&wrong_square),
            Err(BoardError::PieceMismatch { square: B1, expected: knight.id() })
        );

        let mut json = serde_json::to_value(push).unwrap();
        json["material"]["color"] = "white".into();
        let forged: Move = serde_json::from_value(json).unwrap();
        assert_eq!(forged.color(), Color::White);
        assert_eq!(
            board.mover(&forged),
            Err(BoardError::MaterialMismatch {
                piece: pawn.id(),
                claimed: Material::WP,
                actual: Material::BP,
            })
        );

        let unknown: Move = {
            let mut json = serde_json::to_value(push).unwrap();
            json["piece"] = 200.into();
            serde_json::from_value(json).unwrap()
        };
        assert_eq!(board.mover(&unknown), Err(BoardError::UnknownPiece(PieceId::new(200))));

        board.apply_move(&push, None).unwrap();
        assert_eq!(board.mover(&push), Err(BoardError::EmptySquare(E7)));
    }
    #[test]
    fn test_apply_rejects_unresolvable_move() {
        let mut board = Board::standard();
        let record = *board.piece_at(E2).unwrap();
        assert_eq!(
            board.apply_move(&Move::new(&record, E2, E5), None),
            Err(BoardError::Unresolved { from: E2, to: E5 })
        );
        assert_eq!(board, Board::standard());
    }
}
