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

use anyhow::Result;
use log::debug;
#[cfg(feature = "random")]
use rand::{thread_rng, Rng};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::config::PlayerConfig;
use super::Game;
use crate::{Color, Move};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Hash)]
pub struct PlayerId(String);

impl PlayerId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }
    #[cfg(feature = "random")]
    pub fn random() -> Self {
        Self(format!("{:016x}", thread_rng().gen::<u64>()))
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[cfg(feature = "random")]
    fn fresh(_color: Color) -> Self {
        Self::random()
    }
    #[cfg(not(feature = "random"))]
    fn fresh(color: Color) -> Self {
        Self(color.to_string())
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One side of a game.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Player {
    color: Color,
    name: String,
    id: PlayerId,
    is_human: bool,
}

impl Player {
    pub fn new(color: Color, name: impl Into<String>, id: PlayerId, is_human: bool) -> Self {
        Self {
            color,
            name: name.into(),
            id,
            is_human,
        }
    }

    /// Builds a player from configuration, filling in a default name
    /// ("player 1" for white, "player 2" for black) and a fresh id.
    pub fn from_config(color: Color, config: &PlayerConfig) -> Self {
        let name = match config.name.as_deref() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("player {}", color.to_index() + 1),
        };
        let id = config.id.clone().unwrap_or_else(|| PlayerId::fresh(color));
        Self::new(color, name, id, config.is_human)
    }

    pub fn color(&self) -> Color {
        self.color
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn id(&self) -> &PlayerId {
        &self.id
    }
    pub fn is_human(&self) -> bool {
        self.is_human
    }

    /// Plays `mv` in `game` on this player's behalf. Moves of the other
    /// side's pieces, as the board records them, are refused before the
    /// game is consulted.
    pub fn make_move(&self, mv: &Move, game: &mut Game) -> Result<bool> {
        if game.board().mover(mv)?.color() != self.color {
            debug!("{} ({}) may not move {}", self.name, self.color, mv);
            return Ok(false);
        }
        game.make_move(mv)
    }
}
