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

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::player::PlayerId;
use super::GameId;

/// How to set up a `Game`. Every field may be left out.
///
/// ```yaml
/// game_id: 42
/// white:
///   name: ada
/// black:
///   name: engine
///   is_human: false
/// ```
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct GameConfig {
    pub game_id: Option<GameId>,
    pub white: PlayerConfig,
    pub black: PlayerConfig,
}

impl GameConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).context("invalid game configuration")
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct PlayerConfig {
    /// Empty or missing picks "player 1" or "player 2" by color.
    pub name: Option<String>,
    pub id: Option<PlayerId>,
    pub is_human: bool,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            name: None,
            id: None,
            is_human: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::*;

    #[test]
    fn test_empty_config() {
        let config = GameConfig::from_yaml_str("{}").unwrap();
        assert_eq!(config, GameConfig::default());
        assert!(config.white.is_human);
    }
    #[test]
    fn test_yaml_config() {
        let yaml = "game_id: 42\nwhite:\n  name: ada\n  id: u-1\nblack:\n  is_human: false\n";
        let config = GameConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.game_id, Some(GameId::new(42)));
        assert_eq!(config.white.name.as_deref(), Some("ada"));
        assert_eq!(config.white.id, Some(PlayerId::new("u-1")));
        assert!(!config.black.is_human);
        assert!(config.black.name.is_none());
    }
    #[test]
    fn test_bad_yaml() {
        assert!(GameConfig::from_yaml_str("white: [1, 2").is_err());
    }
}
