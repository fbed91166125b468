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

use crate::{Color, Material, Move, Piece, PieceId, PieceRecord, Special, Square};

/// Applied moves and the moves taken back from them.
///
/// This is bookkeeping only. The board is changed by `Game`, which keeps
/// both in step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MoveHistory {
    applied: Vec<Move>,
    cancelled: Vec<Move>,
}

impl MoveHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a freshly played move. Anything that could have been
    /// redone is forgotten.
    pub fn add_move(&mut self, mv: Move) {
        self.applied.push(mv);
        self.cancelled.clear();
    }

    pub fn last_move(&self) -> Option<&Move> {
        self.applied.last()
    }

    pub fn undo_move(&mut self) -> Option<Move> {
        let mv = self.applied.pop()?;
        self.cancelled.push(mv);
        Some(mv)
    }

    pub fn last_cancelled_move(&self) -> Option<&Move> {
        self.cancelled.last()
    }

    pub fn redo_move(&mut self) -> Option<Move> {
        let mv = self.cancelled.pop()?;
        self.applied.push(mv);
        Some(mv)
    }

    /// Pieces taken so far, oldest capture first.
    pub fn captured_pieces(&self) -> impl Iterator<Item = &PieceRecord> + '_ {
        self.applied
            .iter()
            .filter_map(|mv| mv.captured().map(|capture| capture.piece()))
    }

    pub fn moves(&self) -> &[Move] {
        &self.applied
    }

    pub fn len(&self) -> usize {
        self.applied.len()
    }

    pub fn is_empty(&self) -> bool {
        self.applied.is_empty()
    }

    pub fn records(&self) -> Vec<MoveRecord> {
        self.applied.iter().map(MoveRecord::from).collect()
    }
}

/// Storage form of an applied move.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct MoveRecord {
    pub piece: PieceId,
    pub kind: Piece,
    pub color: Color,
    pub from: Square,
    pub to: Square,
    pub captured: Option<Material>,
    pub special: Option<Special>,
}

impl From<&Move> for MoveRecord {
    fn from(mv: &Move) -> Self {
        Self {
            piece: mv.piece(),
            kind: mv.material().piece(),
            color: mv.color(),
            from: mv.from(),
            to: mv.to(),
            captured: mv.captured().map(|capture| capture.piece().material()),
            special: mv.special(),
        }
    }
}
