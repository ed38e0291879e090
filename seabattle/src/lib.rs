// Copyright 2020 Zachary Stewart
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Client side of a two-player game of Battleship played against a remote,
//! authoritative server.
//!
//! The server is only visible through periodic state [snapshots][wire::Snapshot] and
//! the synchronous responses to the shots this player fires. This crate turns those
//! into local board state:
//!
//! * [`board`] holds the 10x10 grids and the connectivity search used to find ships.
//! * [`placement`] builds a valid fleet under the no-touch rule, by hand or randomly.
//! * [`engine`] merges snapshots and shot results into the own and observed-enemy
//!   boards, derives statistics, and decides when the game is over.
//! * [`session`] is the boundary to the transport: a [`GameService`][session::GameService]
//!   trait, a [`Session`][session::Session] that serializes access to the engine, and a
//!   background [`Poller`][session::Poller].

pub mod board;
pub mod engine;
pub mod errors;
pub mod events;
pub mod placement;
pub mod session;
pub mod ships;
pub mod wire;

pub use crate::{
    board::{Board, CellState, Coordinate},
    engine::{Engine, EngineConfig, Outcome, Phase, ShotAttribution, Statistics},
    placement::FleetPlacement,
    ships::{Fleet, Orientation, Ship, FLEET},
};
