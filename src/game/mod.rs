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

//! Turn order and game status
//!
//! A `Game` owns a board, the two players, the move history and the
//! current `GameStatus`. Every change goes through `make_move`,
//! `undo_move` or `redo_move`, each of which updates board, history,
//! turn and status together before returning.

use anyhow::Result;
use log::{debug, info, warn};
#[cfg(feature = "random")]
use rand::{thread_rng, Rng};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::{Board, BoardError, Color, Material, Move, Pair, PieceRecord, Turn};

mod config;
mod history;
mod player;
mod sync;

pub use config::*;
pub use history::*;
pub use player::*;
pub use sync::*;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GameId(u64);

impl GameId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }
    #[cfg(feature = "random")]
    pub fn random() -> Self {
        Self(thread_rng().gen())
    }

    #[cfg(feature = "random")]
    fn fresh() -> Self {
        Self::random()
    }
    #[cfg(not(feature = "random"))]
    fn fresh() -> Self {
        Self(0)
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    #[default]
    NotStarted,
    Ongoing,
    Check,
    Checkmate,
    Stalemate,
}

impl GameStatus {
    pub fn is_game_over(&self) -> bool {
        matches!(self, GameStatus::Checkmate | GameStatus::Stalemate)
    }
}

pub struct Game {
    id: GameId,
    board: Board,
    players: Pair<Player>,
    turn: Color,
    status: GameStatus,
    history: MoveHistory,
    sync: Option<SyncWorker>,
}

impl Game {
    /// A game with the pieces set up, waiting for `start_game` or
    /// `initialize_game`. Moves are refused until then.
    pub fn new(config: GameConfig) -> Self {
        Self {
            id: config.game_id.unwrap_or_else(GameId::fresh),
            board: Board::standard(),
            players: Pair::new(
                Player::from_config(Color::White, &config.white),
                Player::from_config(Color::Black, &config.black),
            ),
            turn: Color::White,
            status: GameStatus::NotStarted,
            history: MoveHistory::new(),
            sync: None,
        }
    }

    /// A game that reports its start and every committed move to `sync`.
    /// If the background thread cannot be started, the game runs without
    /// it.
    pub fn with_sync(config: GameConfig, sync: Arc<dyn SyncService>) -> Self {
        let sync = match SyncWorker::spawn(sync) {
            Ok(worker) => Some(worker),
            Err(err) => {
                warn!("could not start sync thread: {}", err);
                None
            }
        };
        Self {
            sync,
            ..Self::new(config)
        }
    }

    /// Resets board and history, then starts the game.
    pub fn initialize_game(&mut self) {
        self.board.set_starting_position();
        self.history = MoveHistory::new();
        self.status = GameStatus::NotStarted;
        self.start_game();
    }

    /// Hands the move to white and opens the game for play.
    pub fn start_game(&mut self) {
        self.turn = Color::White;
        self.status = GameStatus::Ongoing;
        info!("game {} started: {} vs {}", self.id, self.players.white().name(), self.players.black().name());
        if let Some(sync) = &self.sync {
            sync.send(Notification::GameStarted(self.id, self.status));
        }
    }

    /// Plays `mv` if it is legal right now.
    ///
    /// Returns `Ok(false)` without touching anything when the game is not
    /// in play, the piece belongs to the side not on move, or the move is
    /// illegal. An error means the move was not built from this board
    /// (see `Board::mover`), or board and history no longer agree.
    pub fn make_move(&mut self, mv: &Move) -> Result<bool> {
        let color = self.board.mover(mv)?.color();
        if color != self.turn {
            debug!("{}: not {}'s turn", mv, color);
            return Ok(false);
        }
        match self.status {
            GameStatus::NotStarted => {
                debug!("{}: game {} has not started", mv, self.id);
                return Ok(false);
            }
            status if status.is_game_over() => {
                debug!("{}: game {} is over", mv, self.id);
                return Ok(false);
            }
            _ => {}
        }
        let last = self.history.last_move().copied();
        if !mv.check_valid(&mut self.board, last.as_ref())? {
            debug!("{}: illegal", mv);
            return Ok(false);
        }
        let applied = self.board.apply_move(mv, last.as_ref())?;
        self.history.add_move(applied);
        self.switch_player();
        self.update_status()?;
        self.board.validate()?;
        info!("game {}: {} played, {:?}", self.id, applied, self.status);
        self.notify_move_applied();
        Ok(true)
    }

    /// Takes back the last move. `Ok(false)` when there is none.
    pub fn undo_move(&mut self) -> Result<bool> {
        let Some(last) = self.history.last_move().copied() else {
            debug!("game {}: nothing to undo", self.id);
            return Ok(false);
        };
        self.board.undo_move(&last)?;
        self.history.undo_move();
        self.switch_player();
        self.update_status()?;
        self.board.validate()?;
        info!("game {}: {} taken back", self.id, last);
        Ok(true)
    }

    /// Plays the last move taken back again. `Ok(false)` when there is
    /// none.
    pub fn redo_move(&mut self) -> Result<bool> {
        let Some(next) = self.history.last_cancelled_move().copied() else {
            debug!("game {}: nothing to redo", self.id);
            return Ok(false);
        };
        self.board.redo_move(&next)?;
        self.history.redo_move();
        self.switch_player();
        self.update_status()?;
        self.board.validate()?;
        info!("game {}: {} replayed", self.id, next);
        Ok(true)
    }

    pub fn id(&self) -> GameId {
        self.id
    }
    pub fn board(&self) -> &Board {
        &self.board
    }
    pub fn players(&self) -> &Pair<Player> {
        &self.players
    }
    pub fn player(&self, color: Color) -> &Player {
        &self.players[color]
    }
    pub fn current_player(&self) -> &Player {
        &self.players[self.turn]
    }
    pub fn status(&self) -> GameStatus {
        self.status
    }
    pub fn move_history(&self) -> &MoveHistory {
        &self.history
    }
    pub fn is_game_over(&self) -> bool {
        self.status.is_game_over()
    }

    pub fn captured_pieces(&self) -> Vec<PieceRecord> {
        self.history.captured_pieces().copied().collect()
    }

    /// The side that delivered checkmate, which is never the side to move.
    pub fn winner(&self) -> Option<&Player> {
        (self.status == GameStatus::Checkmate).then(|| &self.players[!self.turn])
    }

    pub fn snapshot(&self) -> GameUpdate {
        GameUpdate {
            game_id: self.id,
            board: self.board.snapshot(),
            captured_pieces: self
                .history
                .captured_pieces()
                .map(PieceRecord::material)
                .collect::<Vec<Material>>(),
            move_history: self.history.records(),
            current_player: self.current_player().id().clone(),
            status: self.status,
            winner: self.winner().map(|player| player.id().clone()),
        }
    }

    fn switch_player(&mut self) {
        self.turn = !self.turn;
    }

    fn update_status(&mut self) -> Result<(), BoardError> {
        let last = self.history.last_move().copied();
        let check = self.board.is_king_in_check(self.turn);
        let mate = self.board.try_is_mate(self.turn, last.as_ref())?;
        let status = match (mate, check) {
            (true, true) => GameStatus::Checkmate,
            (true, false) => GameStatus::Stalemate,
            (false, true) => GameStatus::Check,
            (false, false) => GameStatus::Ongoing,
        };
        if status != self.status && status != GameStatus::Ongoing {
            info!("game {}: {} is in {:?}", self.id, self.turn, status);
        }
        self.status = status;
        Ok(())
    }

    fn notify_move_applied(&self) {
        if let Some(sync) = &self.sync {
            sync.send(Notification::MoveApplied(self.snapshot()));
        }
    }
}

impl Turn for Game {
    fn turn(&self) -> Color {
        self.turn
    }
}

impl fmt::Debug for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Game")
            .field("id", &self.id)
            .field("board", &self.board)
            .field("players", &self.players)
            .field("turn", &self.turn)
            .field("status", &self.status)
            .field("history", &self.history)
            .field("sync", &self.sync.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::*;
    use Square::*;

    fn started() -> Game {
        let mut game = Game::new(GameConfig::default());
        game.initialize_game();
        game
    }

    fn play(game: &mut Game, from: Square, to: Square) -> bool {
        let record = *game.board().piece_at(from).expect("no piece on origin square");
        game.make_move(&Move::new(&record, from, to)).unwrap()
    }

    #[test]
    fn test_moves_refused_before_start() {
        let mut game = Game::new(GameConfig::default());
        assert_eq!(game.status(), GameStatus::NotStarted);
        assert!(!play(&mut game, E2, E4));
        game.start_game();
        assert_eq!(game.status(), GameStatus::Ongoing);
        assert!(play(&mut game, E2, E4));
    }
    #[test]
    fn test_turns_alternate() {
        let mut game = started();
        assert_eq!(game.current_player().color(), Color::White);
        assert!(play(&mut game, E2, E4));
        assert_eq!(game.current_player().color(), Color::Black);
        assert!(!play(&mut game, D2, D4));
        assert!(play(&mut game, E7, E5));
        assert_eq!(game.turn(), Color::White);
    }
    #[test]
    fn test_illegal_move_changes_nothing() {
        let mut game = started();
        let board = game.board().clone();
        assert!(!play(&mut game, E2, E5));
        assert_eq!(*game.board(), board);
        assert!(game.move_history().is_empty());
        assert_eq!(game.turn(), Color::White);
    }
    #[test]
    fn test_forged_color_is_not_trusted() {
        let mut game = started();
        let pawn = *game.board().piece_at(E7).unwrap();
        let mut json = serde_json::to_value(Move::new(&pawn, E7, E5)).unwrap();
        json["material"]["color"] = "white".into();
        let forged: Move = serde_json::from_value(json).unwrap();
        assert_eq!(forged.color(), Color::White);

        let err = game.make_move(&forged).unwrap_err();
        assert_eq!(
            err.downcast_ref::<BoardError>(),
            Some(&BoardError::MaterialMismatch {
                piece: pawn.id(),
                claimed: Material::WP,
                actual: Material::BP,
            })
        );
        assert_eq!(*game.board(), Board::standard());
        assert_eq!(game.turn(), Color::White);
        assert!(game.move_history().is_empty());
    }
    #[test]
    fn test_stale_move_is_an_error() {
        let mut game = started();
        let knight = *game.board().piece_at(G1).unwrap();
        let jump = Move::new(&knight, G1, F3);
        assert!(game.make_move(&jump).unwrap());
        assert!(play(&mut game, E7, E5));
        let err = game.make_move(&jump).unwrap_err();
        assert_eq!(err.downcast_ref::<BoardError>(), Some(&BoardError::EmptySquare(G1)));

        let wrong_square = Move::new(&knight, B1, C3);
        let err = game.make_move(&wrong_square).unwrap_err();
        assert_eq!(
            err.downcast_ref::<BoardError>(),
            Some(&BoardError::PieceMismatch { square: B1, expected: knight.id() })
        );
        assert_eq!(game.move_history().len(), 2);
        assert_eq!(game.turn(), Color::White);
    }
    #[test]
    fn test_illegal_geometry_is_not_an_error() {
        let mut game = started();
        let pawn = *game.board().piece_at(E2).unwrap();
        assert!(!game.make_move(&Move::new(&pawn, E2, E5)).unwrap());
        let black = *game.board().piece_at(E7).unwrap();
        assert!(!game.make_move(&Move::new(&black, E7, E5)).unwrap());
    }
    #[test]
    fn test_check_status() {
        let mut game = started();
        for (from, to) in [(E2, E4), (F7, F6), (D1, H5)] {
            assert!(play(&mut game, from, to));
        }
        assert_eq!(game.status(), GameStatus::Check);
        assert!(game.winner().is_none());
        assert!(!play(&mut game, A7, A6));
        assert!(play(&mut game, G7, G6));
        assert_eq!(game.status(), GameStatus::Ongoing);
    }
    #[test]
    fn test_fools_mate_winner() {
        let mut game = started();
        for (from, to) in [(F2, F3), (E7, E5), (G2, G4), (D8, H4)] {
            assert!(play(&mut game, from, to));
        }
        assert_eq!(game.status(), GameStatus::Checkmate);
        assert!(game.is_game_over());
        assert_eq!(game.winner().map(|p| p.color()), Some(Color::Black));
        assert!(!play(&mut game, A2, A3));
    }
    #[test]
    fn test_undo_redo() {
        let mut game = started();
        assert!(!game.undo_move().unwrap());
        assert!(!game.redo_move().unwrap());
        assert!(play(&mut game, E2, E4));
        assert!(play(&mut game, D7, D5));
        assert!(play(&mut game, E4, D5));
        assert_eq!(game.captured_pieces().len(), 1);

        assert!(game.undo_move().unwrap());
        assert_eq!(game.turn(), Color::White);
        assert!(game.captured_pieces().is_empty());
        assert_eq!(game.board().piece_at(D5).map(|r| r.material()), Some(Material::BP));

        assert!(game.redo_move().unwrap());
        assert_eq!(game.turn(), Color::Black);
        assert_eq!(game.board().piece_at(D5).map(|r| r.material()), Some(Material::WP));
        assert!(!game.redo_move().unwrap());
    }
    #[test]
    fn test_undo_out_of_checkmate() {
        let mut game = started();
        for (from, to) in [(F2, F3), (E7, E5), (G2, G4), (D8, H4)] {
            assert!(play(&mut game, from, to));
        }
        assert!(game.undo_move().unwrap());
        assert_eq!(game.status(), GameStatus::Ongoing);
        assert_eq!(game.turn(), Color::Black);
        assert!(game.redo_move().unwrap());
        assert_eq!(game.status(), GameStatus::Checkmate);
    }
    #[test]
    fn test_initialize_resets() {
        let mut game = started();
        assert!(play(&mut game, E2, E4));
        game.initialize_game();
        assert_eq!(*game.board(), Board::standard());
        assert!(game.move_history().is_empty());
        assert_eq!(game.turn(), Color::White);
        assert_eq!(game.status(), GameStatus::Ongoing);
    }
    #[test]
    fn test_snapshot_serializes() {
        let mut game = Game::new(GameConfig {
            game_id: Some(GameId::new(9)),
            ..GameConfig::default()
        });
        game.initialize_game();
        assert!(play(&mut game, E2, E4));
        let update = game.snapshot();
        assert_eq!(update.game_id, GameId::new(9));
        assert_eq!(update.move_history.len(), 1);
        assert_eq!(update.current_player, *game.player(Color::Black).id());
        assert!(update.winner.is_none());

        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json["status"], "ongoing");
        assert_eq!(json["board"].as_array().map(|a| a.len()), Some(64));
    }
}
