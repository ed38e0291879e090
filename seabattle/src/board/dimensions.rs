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
use enumflags2::BitFlags;

use crate::board::Coordinate;

/// Width and height of every board.
pub const BOARD_SIZE: usize = 10;

/// Total number of cells on a board.
pub const CELL_COUNT: usize = BOARD_SIZE * BOARD_SIZE;

/// Which kinds of neighbor to visit around a cell.
#[derive(BitFlags, Debug, Copy, Clone, Eq, PartialEq)]
#[repr(u8)]
pub enum Neighborhood {
    /// Up, down, left and right.
    Orthogonal = 0b01,
    /// The four corners.
    Diagonal = 0b10,
}

/// Iterate the on-board neighbors of `coord` that belong to the given neighborhood.
/// Yields nothing if `coord` itself is off the board.
pub fn neighbors<B: Into<BitFlags<Neighborhood>>>(coord: Coordinate, kinds: B) -> Neighbors {
    let kinds = kinds.into();
    let step = if !coord.is_valid() {
        Step::End
    } else if kinds.contains(Neighborhood::Orthogonal) {
        Step::Up
    } else if kinds.contains(Neighborhood::Diagonal) {
        Step::UpLeft
    } else {
        Step::End
    };
    Neighbors { coord, kinds, step }
}

/// The up/down/left/right neighbors of a cell. Used for ship connectivity.
pub fn neighbors4(coord: Coordinate) -> Neighbors {
    neighbors(coord, Neighborhood::Orthogonal)
}

/// All up-to-8 neighbors of a cell, diagonals included. Used for the no-touch rule.
pub fn neighbors8(coord: Coordinate) -> Neighbors {
    neighbors(coord, BitFlags::all())
}

/// Iterator over the neighbors of a coordinate.
#[derive(Debug, Clone)]
pub struct Neighbors {
    coord: Coordinate,
    kinds: BitFlags<Neighborhood>,
    step: Step,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum Step {
    Up,
    Down,
    Left,
    Right,
    UpLeft,
    UpRight,
    DownLeft,
    DownRight,
    End,
}

impl Iterator for Neighbors {
    type Item = Coordinate;

    fn next(&mut self) -> Option<Coordinate> {
        loop {
            let (dx, dy, next) = match self.step {
                Step::Up => (0, -1, Step::Down),
                Step::Down => (0, 1, Step::Left),
                Step::Left => (-1, 0, Step::Right),
                Step::Right if self.kinds.contains(Neighborhood::Diagonal) => {
                    (1, 0, Step::UpLeft)
                }
                Step::Right => (1, 0, Step::End),
                Step::UpLeft => (-1, -1, Step::UpRight),
                Step::UpRight => (1, -1, Step::DownLeft),
                Step::DownLeft => (-1, 1, Step::DownRight),
                Step::DownRight => (1, 1, Step::End),
                Step::End => return None,
            };
            self.step = next;
            if let Some(neighbor) = self.coord.offset(dx, dy) {
                return Some(neighbor);
            }
        }
    }
}
