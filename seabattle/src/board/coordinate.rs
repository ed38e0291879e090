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
use std::{convert::TryFrom, fmt};

use serde::{Deserialize, Serialize};

use crate::board::dimensions::BOARD_SIZE;

/// The coordinates of a cell in the board. Serialized as an `[x, y]` pair.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize,
)]
#[serde(from = "(usize, usize)", into = "(usize, usize)")]
pub struct Coordinate {
    /// Horizontal position of the cell.
    pub x: usize,
    /// Vertical position of the cell.
    pub y: usize,
}

impl Coordinate {
    /// Construct a [`Coordinate`] from the given `x` and `y`. The result is not
    /// necessarily on the board, see [`Coordinate::is_valid`].
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// Build a coordinate from untrusted signed values, such as the ones found in a
    /// snapshot. Returns `None` if the pair lies outside the board.
    pub fn checked(x: i64, y: i64) -> Option<Self> {
        if is_valid(x, y) {
            Some(Self::new(x as usize, y as usize))
        } else {
            None
        }
    }

    /// True if this coordinate lies on the board.
    pub fn is_valid(&self) -> bool {
        self.x < BOARD_SIZE && self.y < BOARD_SIZE
    }

    /// Offset this coordinate by the given signed amounts. Returns `None` if the result
    /// would leave the board.
    pub fn offset(&self, dx: isize, dy: isize) -> Option<Self> {
        let x = isize::try_from(self.x).ok()?.checked_add(dx)?;
        let y = isize::try_from(self.y).ok()?.checked_add(dy)?;
        Self::checked(x as i64, y as i64)
    }
}

/// True iff `0 <= x < 10` and `0 <= y < 10`.
pub fn is_valid(x: i64, y: i64) -> bool {
    let size = BOARD_SIZE as i64;
    (0..size).contains(&x) && (0..size).contains(&y)
}

impl From<(usize, usize)> for Coordinate {
    /// Construct a [`Coordinate`] from the given `(x, y)` pair.
    fn from((x, y): (usize, usize)) -> Self {
        Self::new(x, y)
    }
}

impl From<Coordinate> for (usize, usize) {
    /// Convert the [`Coordinate`] into an `(x, y)` pair.
    fn from(coord: Coordinate) -> Self {
        (coord.x, coord.y)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds() {
        assert!(is_valid(0, 0));
        assert!(is_valid(9, 9));
        assert!(!is_valid(10, 0));
        assert!(!is_valid(0, -1));
        assert_eq!(Coordinate::checked(-3, 4), None);
        assert_eq!(Coordinate::checked(3, 4), Some(Coordinate::new(3, 4)));
    }

    #[test]
    fn offset_stays_on_board() {
        let corner = Coordinate::new(0, 9);
        assert_eq!(corner.offset(-1, 0), None);
        assert_eq!(corner.offset(0, 1), None);
        assert_eq!(corner.offset(1, -1), Some(Coordinate::new(1, 8)));
    }

    #[test]
    fn serializes_as_pair() {
        let json = serde_json::to_string(&Coordinate::new(2, 7)).unwrap();
        assert_eq!(json, "[2,7]");
        let back: Coordinate = serde_json::from_str("[4,1]").unwrap();
        assert_eq!(back, Coordinate::new(4, 1));
    }
}
