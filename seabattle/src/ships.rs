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

//! Types used for defining ships and the fleet.
use std::ops::Deref;

use serde::{Deserialize, Serialize};

use crate::{
    board::{neighbors8, Coordinate, Grid},
    errors::{FleetDefect, InvalidFleet},
};

pub use self::linear::Line;

mod linear;

/// Lengths of the ships in a fleet, in placement order: one 4-length, two 3-length,
/// three 2-length and four 1-length ships.
pub const FLEET: [usize; 10] = [4, 3, 3, 2, 2, 2, 1, 1, 1, 1];

/// Number of cells occupied by a complete fleet.
pub const FLEET_CELLS: usize = 20;

/// Placement orientation of a ship.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// Extends towards increasing `x`.
    Horizontal,
    /// Extends towards increasing `y`.
    Vertical,
}

impl Orientation {
    /// The other orientation.
    pub fn rotated(self) -> Self {
        match self {
            Orientation::Horizontal => Orientation::Vertical,
            Orientation::Vertical => Orientation::Horizontal,
        }
    }

    /// Unit step along this orientation as `(dx, dy)`.
    pub(crate) fn step(self) -> (usize, usize) {
        match self {
            Orientation::Horizontal => (1, 0),
            Orientation::Vertical => (0, 1),
        }
    }
}

impl Default for Orientation {
    fn default() -> Self {
        Orientation::Horizontal
    }
}

#[cfg(feature = "rng_gen")]
impl rand::distributions::Distribution<Orientation> for rand::distributions::Standard {
    fn sample<R: rand::Rng + ?Sized>(&self, rng: &mut R) -> Orientation {
        if rng.gen() {
            Orientation::Horizontal
        } else {
            Orientation::Vertical
        }
    }
}

/// The cells occupied by one vessel. Serialized as a list of `[x, y]` pairs.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ship(Vec<Coordinate>);

impl Ship {
    /// Wrap a list of cells. The cells are not checked until the ship is part of a
    /// [`Fleet`].
    pub fn from_cells(cells: Vec<Coordinate>) -> Self {
        Ship(cells)
    }

    /// Extract the cells of this ship.
    pub fn into_cells(self) -> Vec<Coordinate> {
        self.0
    }
}

impl Deref for Ship {
    type Target = [Coordinate];

    fn deref(&self) -> &[Coordinate] {
        &self.0
    }
}

impl From<Vec<(usize, usize)>> for Ship {
    fn from(cells: Vec<(usize, usize)>) -> Self {
        Ship(cells.into_iter().map(Into::into).collect())
    }
}

/// A complete fleet that satisfies the standard composition and the no-touch rule.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Fleet(Vec<Ship>);

impl Fleet {
    /// Check the given ships and wrap them as a fleet. Fails if the ships are not
    /// exactly the standard fleet, if any ship is bent, broken or off the board, or if
    /// any two ships overlap or touch.
    pub fn new(ships: Vec<Ship>) -> Result<Self, InvalidFleet> {
        validate(&ships)?;
        Ok(Fleet(ships))
    }

    /// The ships of this fleet, in the order they were given.
    pub fn ships(&self) -> &[Ship] {
        &self.0
    }

    /// Extract the ships of this fleet.
    pub fn into_ships(self) -> Vec<Ship> {
        self.0
    }

    /// The fleet as sent to the server: one list of `(x, y)` pairs per ship.
    pub fn submission(&self) -> Vec<Vec<(usize, usize)>> {
        self.0
            .iter()
            .map(|ship| ship.iter().map(|&cell| cell.into()).collect())
            .collect()
    }

    /// Iterate every occupied cell.
    pub fn cells(&self) -> impl '_ + Iterator<Item = Coordinate> {
        self.0.iter().flat_map(|ship| ship.iter().copied())
    }
}

impl Deref for Fleet {
    type Target = [Ship];

    fn deref(&self) -> &[Ship] {
        &self.0
    }
}

fn validate(ships: &[Ship]) -> Result<(), FleetDefect> {
    if ships.len() != FLEET.len() {
        return Err(FleetDefect::ShipCount {
            expected: FLEET.len(),
            found: ships.len(),
        });
    }
    let cells: usize = ships.iter().map(|ship| ship.len()).sum();
    if cells != FLEET_CELLS {
        return Err(FleetDefect::CellCount {
            expected: FLEET_CELLS,
            found: cells,
        });
    }
    let mut lengths: Vec<usize> = ships.iter().map(|ship| ship.len()).collect();
    lengths.sort_unstable_by(|a, b| b.cmp(a));
    if lengths[..] != FLEET[..] {
        return Err(FleetDefect::Composition);
    }

    // Owner index of each occupied cell.
    let mut owners: Grid<Option<usize>> = Grid::new();
    for (idx, ship) in ships.iter().enumerate() {
        if ship.iter().any(|c| !c.is_valid()) {
            return Err(FleetDefect::OutOfBounds(idx));
        }
        if !Line::new(ship.len()).is_valid_placement(ship) {
            return Err(FleetDefect::NotStraight(idx));
        }
        for &cell in ship.iter() {
            if owners[cell].is_some() {
                return Err(FleetDefect::Overlap(idx));
            }
            owners[cell] = Some(idx);
        }
    }
    for (idx, ship) in ships.iter().enumerate() {
        for &cell in ship.iter() {
            for neighbor in neighbors8(cell) {
                match owners[neighbor] {
                    Some(other) if other != idx => {
                        return Err(FleetDefect::Touching(idx.min(other), idx.max(other)))
                    }
                    _ => {}
                }
            }
        }
    }
    Ok(())
}
