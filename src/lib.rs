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

//! Rule engine for two-player chess.
//!
//! `board` knows how pieces move and can take any move back exactly.
//! `game` drives a board through the turns of one game: whose move it
//! is, the undo and redo stacks, the check/mate status and an optional
//! `SyncService` told about every committed move.

mod board;
mod game;

pub use board::*;
pub use game::*;
