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

use log::{trace, warn};
use serde::{Deserialize, Serialize};
use std::sync::mpsc::{channel, Sender};
use std::sync::Arc;
use std::thread;
use thiserror::Error;

use super::history::MoveRecord;
use super::player::PlayerId;
use super::{GameId, GameStatus};
use crate::{BoardSnapshot, Material};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    #[error("sync service rejected the update: {0}")]
    Rejected(String),
    #[error("sync service unavailable: {0}")]
    Unavailable(String),
}

/// State of a game after a committed move, as handed to a `SyncService`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct GameUpdate {
    pub game_id: GameId,
    pub board: BoardSnapshot,
    pub captured_pieces: Vec<Material>,
    pub move_history: Vec<MoveRecord>,
    pub current_player: PlayerId,
    pub status: GameStatus,
    pub winner: Option<PlayerId>,
}

/// Somewhere outside the engine that wants to hear about a game, such as
/// a multiplayer backend.
///
/// Calls are made from one background thread, in the order the game sent
/// them, after the game has already moved on. Their outcome is logged and
/// never reaches the player who made the move.
pub trait SyncService: Send + Sync {
    fn notify_move_applied(&self, update: &GameUpdate) -> Result<(), SyncError>;
    fn notify_game_started(&self, game_id: GameId, status: GameStatus) -> Result<(), SyncError>;
}

/// A notification waiting to be delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Notification {
    GameStarted(GameId, GameStatus),
    MoveApplied(GameUpdate),
}

impl Notification {
    fn name(&self) -> &'static str {
        match self {
            Notification::GameStarted(..) => "game started",
            Notification::MoveApplied(_) => "move applied",
        }
    }
}

/// Hands notifications to a single background thread, which delivers
/// them to the service one at a time in the order they were sent. The
/// thread ends once the worker is dropped and the queue is drained.
pub(crate) struct SyncWorker {
    queue: Sender<Notification>,
}

impl SyncWorker {
    pub(crate) fn spawn(service: Arc<dyn SyncService>) -> std::io::Result<Self> {
        let (queue, notifications) = channel::<Notification>();
        thread::Builder::new()
            .name("sync".to_string())
            .spawn(move || {
                for notification in notifications {
                    let result = match &notification {
                        Notification::GameStarted(id, status) => service.notify_game_started(*id, *status),
                        Notification::MoveApplied(update) => service.notify_move_applied(update),
                    };
                    match result {
                        Ok(()) => trace!("{} notification delivered", notification.name()),
                        Err(err) => warn!("{} notification failed: {}", notification.name(), err),
                    }
                }
            })?;
        Ok(Self { queue })
    }

    pub(crate) fn send(&self, notification: Notification) {
        let name = notification.name();
        if self.queue.send(notification).is_err() {
            warn!("sync thread has stopped, {} notification dropped", name);
        }
    }
}
