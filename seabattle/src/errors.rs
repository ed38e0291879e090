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

//! Errors used by fleet placement and the reconciliation engine.
//!
//! Coordinates from a snapshot that are off the board, or that are already reflected
//! in the board state, are not errors. They are skipped silently and only show up in
//! the [`MergeReport`][crate::engine::MergeReport].

use thiserror::Error;

use crate::{board::Coordinate, ships::Orientation};

/// Reason why a ship could not be placed at a given position.
#[derive(Debug, Error, Copy, Clone, Eq, PartialEq)]
pub enum CannotPlaceReason {
    /// Part of the ship would fall off the board.
    #[error("insufficient space for the ship at the specified position")]
    OutOfBounds,
    /// The space selected overlaps a ship that was already placed.
    #[error("the specified position was already occupied")]
    Occupied,
    /// The ship would touch another ship, orthogonally or diagonally.
    #[error("the ship would touch another ship")]
    Adjacent,
    /// Every ship of the fleet has already been placed.
    #[error("all ships are already placed")]
    Locked,
}

/// Error returned when a single placement attempt is refused. Recoverable: try another
/// cell or orientation.
#[derive(Debug, Error, Copy, Clone, Eq, PartialEq)]
#[error("could not place ship at {origin} ({orientation:?}): {reason}")]
pub struct PlacementRejected {
    reason: CannotPlaceReason,
    origin: Coordinate,
    orientation: Orientation,
}

impl PlacementRejected {
    pub(crate) fn new(reason: CannotPlaceReason, origin: Coordinate, orientation: Orientation) -> Self {
        Self {
            reason,
            origin,
            orientation,
        }
    }

    /// Get the reason placement was refused.
    pub fn reason(&self) -> CannotPlaceReason {
        self.reason
    }

    /// The cell where placement was attempted.
    pub fn origin(&self) -> Coordinate {
        self.origin
    }

    /// The orientation that was attempted.
    pub fn orientation(&self) -> Orientation {
        self.orientation
    }
}

/// Error returned when random placement runs out of attempts for one ship. The
/// placement is rolled back to empty, so the caller can simply try again.
#[derive(Debug, Error, Copy, Clone, Eq, PartialEq)]
#[error("gave up placing ship #{ship} (length {len}) after {attempts} attempts")]
pub struct PlacementExhausted {
    /// Index of the ship in the fleet order.
    pub ship: usize,
    /// Length of that ship.
    pub len: usize,
    /// Attempts made for that ship.
    pub attempts: usize,
}

/// What is wrong with a fleet handed to the engine.
#[derive(Debug, Error, Copy, Clone, Eq, PartialEq)]
pub enum FleetDefect {
    /// The fleet does not have the required number of ships.
    #[error("expected {expected} ships, found {found}")]
    ShipCount { expected: usize, found: usize },
    /// The ships do not occupy the required number of cells in total.
    #[error("expected {expected} occupied cells, found {found}")]
    CellCount { expected: usize, found: usize },
    /// The multiset of ship lengths differs from the standard fleet.
    #[error("ship lengths do not match the standard fleet")]
    Composition,
    /// The ship at this index is not a straight, contiguous run.
    #[error("ship #{0} is not a straight line")]
    NotStraight(usize),
    /// The ship at this index leaves the board.
    #[error("ship #{0} is out of bounds")]
    OutOfBounds(usize),
    /// The ship at this index overlaps an earlier ship.
    #[error("ship #{0} overlaps another ship")]
    Overlap(usize),
    /// The two ships at these indexes touch.
    #[error("ships #{0} and #{1} touch")]
    Touching(usize, usize),
    /// The engine already has a fleet.
    #[error("a fleet was already provided")]
    AlreadyInitialized,
}

/// Error returned when a fleet cannot be used. Fatal to the current session attempt:
/// placement has to start over.
#[derive(Debug, Error, Copy, Clone, Eq, PartialEq)]
#[error("invalid fleet: {defect}")]
pub struct InvalidFleet {
    #[source]
    defect: FleetDefect,
}

impl InvalidFleet {
    pub(crate) fn new(defect: FleetDefect) -> Self {
        Self { defect }
    }

    /// Get what is wrong with the fleet.
    pub fn defect(&self) -> FleetDefect {
        self.defect
    }
}

impl From<FleetDefect> for InvalidFleet {
    fn from(defect: FleetDefect) -> Self {
        Self::new(defect)
    }
}

/// Failure reported by a [`GameService`][crate::session::GameService].
#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum ServiceError {
    /// Another player already uses this name.
    #[error("the name {0:?} is already taken")]
    NameTaken(String),
    /// Two players are already connected.
    #[error("the game is full")]
    GameFull,
    /// The server could not be reached or answered with garbage.
    #[error("connection problem: {0}")]
    Connectivity(String),
    /// The server refused the request.
    #[error("request refused: {0}")]
    Rejected(String),
}

/// Error returned when this player's shot could not be fired or resolved.
#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum FireError {
    /// The engine does not allow a shot at this cell now: not this player's turn, the
    /// cell is already known or pending, or the game is not in battle.
    #[error("cannot fire at {0} now")]
    NotAllowed(Coordinate),
    /// The server refused the shot. `result` is the server's refusal code, if any.
    #[error("shot at {coord} refused: {message}")]
    Rejected {
        coord: Coordinate,
        result: Option<String>,
        message: String,
    },
    /// The request failed in transport.
    #[error("shot could not be delivered")]
    Service(#[from] ServiceError),
}

/// Error returned when a fleet could not be handed to the server and the engine.
#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum SubmitError {
    #[error(transparent)]
    Fleet(#[from] InvalidFleet),
    #[error("fleet was not accepted by the server")]
    Service(#[from] ServiceError),
}
