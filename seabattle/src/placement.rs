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

//! Implements the placement phase: building a fleet one ship at a time.
//!
//! Ships are placed in the fixed fleet order (`4, 3, 3, 2, 2, 2, 1, 1, 1, 1`). A ship may
//! not leave the board, overlap another ship, or touch another ship orthogonally or
//! diagonally. Once the tenth ship is down the placement is locked and can be handed off
//! with [`FleetPlacement::into_fleet`].

use log::{debug, error};

use crate::{
    board::{neighbors8, Board, CellState, Coordinate, Grid},
    errors::{CannotPlaceReason, PlacementRejected},
    events::{ListenerId, Listeners},
    ships::{Fleet, Line, Orientation, Ship, FLEET},
};

#[cfg(feature = "rng_gen")]
use crate::{board::BOARD_SIZE, errors::PlacementExhausted};

/// Default number of random tries per ship in [`FleetPlacement::auto_place`].
pub const AUTO_PLACE_ATTEMPTS: usize = 1000;

/// Notification sent to placement listeners whenever the set of placed ships changes.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct PlacementChanged {
    /// Number of ships currently placed.
    pub placed: usize,
    /// Whether the whole fleet is placed.
    pub locked: bool,
}

/// Working state of the placement phase.
#[derive(Debug)]
pub struct FleetPlacement {
    /// Ships placed so far, in fleet order.
    placed: Vec<Ship>,

    /// Index into `placed` of the ship occupying each cell.
    occupied: Grid<Option<usize>>,

    /// Orientation selected for the next ship. Only a convenience for interactive use.
    orientation: Orientation,

    /// Random tries per ship before `auto_place` gives up.
    attempt_budget: usize,

    listeners: Listeners<PlacementChanged>,
}

impl FleetPlacement {
    /// Begin placement with no ships placed.
    pub fn new() -> Self {
        Self {
            placed: Vec::with_capacity(FLEET.len()),
            occupied: Grid::new(),
            orientation: Orientation::default(),
            attempt_budget: AUTO_PLACE_ATTEMPTS,
            listeners: Listeners::new(),
        }
    }

    /// Change the number of random tries per ship used by `auto_place`.
    pub fn with_attempt_budget(mut self, attempts: usize) -> Self {
        self.attempt_budget = attempts;
        self
    }

    /// Length of the next ship to place, or `None` once the fleet is complete.
    pub fn next_length(&self) -> Option<usize> {
        FLEET.get(self.placed.len()).copied()
    }

    /// Ships placed so far.
    pub fn placed(&self) -> &[Ship] {
        &self.placed
    }

    /// True once every ship of the fleet is placed. A locked placement ignores further
    /// `place` and `clear` calls.
    pub fn is_locked(&self) -> bool {
        self.placed.len() >= FLEET.len()
    }

    /// The orientation currently selected for interactive placement.
    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Select the orientation for interactive placement.
    pub fn set_orientation(&mut self, orientation: Orientation) {
        self.orientation = orientation;
    }

    /// Switch between horizontal and vertical.
    pub fn rotate(&mut self) {
        self.orientation = self.orientation.rotated();
    }

    /// The cells the next ship would occupy from `origin`. Empty if any cell would fall
    /// off the board or if the fleet is already complete. Occupancy is not considered.
    pub fn preview(&self, origin: Coordinate, orientation: Orientation) -> Vec<Coordinate> {
        self.next_length()
            .and_then(|len| Line::new(len).project(origin, orientation))
            .map_or_else(Vec::new, Ship::into_cells)
    }

    /// Check whether the next ship fits at `origin`, returning the projected ship.
    pub fn check(
        &self,
        origin: Coordinate,
        orientation: Orientation,
    ) -> Result<Ship, CannotPlaceReason> {
        let len = self.next_length().ok_or(CannotPlaceReason::Locked)?;
        let ship = Line::new(len)
            .project(origin, orientation)
            .ok_or(CannotPlaceReason::OutOfBounds)?;
        if ship.iter().any(|&cell| self.occupied[cell].is_some()) {
            return Err(CannotPlaceReason::Occupied);
        }
        // The ship's own cells are not in `occupied` yet, so touching them is fine.
        let touches = ship
            .iter()
            .flat_map(|&cell| neighbors8(cell))
            .any(|neighbor| self.occupied[neighbor].is_some());
        if touches {
            return Err(CannotPlaceReason::Adjacent);
        }
        Ok(ship)
    }

    /// True if the next ship can be placed at `origin` with the given orientation.
    pub fn can_place(&self, origin: Coordinate, orientation: Orientation) -> bool {
        self.check(origin, orientation).is_ok()
    }

    /// Place the next ship. On failure nothing changes and the reason is returned.
    pub fn place(
        &mut self,
        origin: Coordinate,
        orientation: Orientation,
    ) -> Result<(), PlacementRejected> {
        let ship = self
            .check(origin, orientation)
            .map_err(|reason| PlacementRejected::new(reason, origin, orientation))?;
        debug!("placed ship of length {} at {:?}", ship.len(), &ship[..]);
        self.commit(ship);
        self.notify();
        Ok(())
    }

    /// Remove every placed ship. Returns false, changing nothing, once locked.
    pub fn clear(&mut self) -> bool {
        if self.is_locked() {
            return false;
        }
        self.reset();
        self.orientation = Orientation::default();
        self.notify();
        true
    }

    /// Place the whole fleet at random, starting from empty. Each ship gets up to the
    /// attempt budget of uniformly random origins and orientations. If any ship runs out
    /// of tries everything is rolled back to empty and the error is returned; calling
    /// again starts over. Does nothing once locked.
    #[cfg(feature = "rng_gen")]
    pub fn auto_place<R: rand::Rng + ?Sized>(
        &mut self,
        rng: &mut R,
    ) -> Result<(), PlacementExhausted> {
        if self.is_locked() {
            return Ok(());
        }
        self.reset();
        for (idx, &len) in FLEET.iter().enumerate() {
            let mut placed = false;
            for _ in 0..self.attempt_budget {
                let origin = Coordinate::new(
                    rng.gen_range(0, BOARD_SIZE),
                    rng.gen_range(0, BOARD_SIZE),
                );
                if let Ok(ship) = self.check(origin, rng.gen()) {
                    self.commit(ship);
                    placed = true;
                    break;
                }
            }
            if !placed {
                debug!("auto placement gave up on ship #{} (length {})", idx, len);
                self.reset();
                self.notify();
                return Err(PlacementExhausted {
                    ship: idx,
                    len,
                    attempts: self.attempt_budget,
                });
            }
        }
        self.notify();
        Ok(())
    }

    /// A board with the placed ships drawn as [`CellState::Ship`].
    pub fn board(&self) -> Board {
        let mut board = Board::new();
        for &cell in self.placed.iter().flat_map(|ship| ship.iter()) {
            board.set(cell, CellState::Ship);
        }
        board
    }

    /// Finish placement. If the fleet is complete, returns it, otherwise returns self.
    pub fn into_fleet(self) -> Result<Fleet, Self> {
        if !self.is_locked() {
            return Err(self);
        }
        match Fleet::new(self.placed.clone()) {
            Ok(fleet) => Ok(fleet),
            Err(err) => {
                error!("placement produced an unusable fleet: {}", err);
                Err(self)
            }
        }
    }

    /// Register a listener for placement changes.
    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&PlacementChanged) + Send + 'static,
    {
        self.listeners.subscribe(listener)
    }

    /// Remove a placement listener.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.listeners.unsubscribe(id)
    }

    fn commit(&mut self, ship: Ship) {
        let idx = self.placed.len();
        for &cell in ship.iter() {
            self.occupied[cell] = Some(idx);
        }
        self.placed.push(ship);
    }

    fn reset(&mut self) {
        self.placed.clear();
        self.occupied = Grid::new();
    }

    fn notify(&mut self) {
        let event = PlacementChanged {
            placed: self.placed.len(),
            locked: self.is_locked(),
        };
        self.listeners.emit(&event);
    }
}

impl Default for FleetPlacement {
    fn default() -> Self {
        Self::new()
    }
}
