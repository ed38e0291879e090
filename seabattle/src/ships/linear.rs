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
use crate::{
    board::Coordinate,
    ships::{Orientation, Ship},
};

/// A linear ship shape, with a given length.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Line(usize);

impl Line {
    /// Construct a linear ship with the specified length. Panics if len is 0.
    pub fn new(len: usize) -> Self {
        assert!(len > 0);
        Line(len)
    }

    /// Get the length of this ship.
    pub fn len(&self) -> usize {
        self.0
    }

    /// Project this shape from `origin` towards increasing `x` (horizontal) or
    /// increasing `y` (vertical). Returns `None` if any cell would leave the board.
    pub fn project(&self, origin: Coordinate, orientation: Orientation) -> Option<Ship> {
        let (dx, dy) = orientation.step();
        let mut cells = Vec::with_capacity(self.len());
        for i in 0..self.len() {
            let x = origin.x.checked_add(dx * i)?;
            let y = origin.y.checked_add(dy * i)?;
            let cell = Coordinate::new(x, y);
            if !cell.is_valid() {
                return None;
            }
            cells.push(cell);
        }
        Some(Ship::from_cells(cells))
    }

    /// Return true if the given cells are a valid placement of this shape: the right
    /// number of on-board cells forming one straight, gapless run. The cells may be
    /// listed in any order.
    pub fn is_valid_placement(&self, cells: &[Coordinate]) -> bool {
        if cells.len() != self.len() || cells.iter().any(|c| !c.is_valid()) {
            return false;
        }
        let mut sorted = cells.to_vec();
        sorted.sort_by_key(|c| (c.y, c.x));
        let start = sorted[0];
        let along_x = sorted.iter().all(|c| c.y == start.y);
        let along_y = sorted.iter().all(|c| c.x == start.x);
        sorted.iter().enumerate().all(|(i, c)| {
            (along_x && c.x == start.x + i) || (along_y && c.y == start.y + i)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn projection_runs_right_and_down() {
        let ship = Line::new(3)
            .project(Coordinate::new(7, 2), Orientation::Horizontal)
            .unwrap();
        assert_eq!(
            &ship[..],
            &[
                Coordinate::new(7, 2),
                Coordinate::new(8, 2),
                Coordinate::new(9, 2)
            ]
        );
        let ship = Line::new(2)
            .project(Coordinate::new(0, 8), Orientation::Vertical)
            .unwrap();
        assert_eq!(&ship[..], &[Coordinate::new(0, 8), Coordinate::new(0, 9)]);
    }

    #[test]
    fn projection_off_the_edge_is_none() {
        assert!(Line::new(4)
            .project(Coordinate::new(7, 0), Orientation::Horizontal)
            .is_none());
        assert!(Line::new(2)
            .project(Coordinate::new(3, 9), Orientation::Vertical)
            .is_none());
    }

    #[test]
    fn placement_shapes() {
        let line = Line::new(3);
        let straight = [(1, 4), (3, 4), (2, 4)];
        let gap = [(1, 4), (2, 4), (4, 4)];
        let bent = [(1, 4), (2, 4), (2, 5)];
        let to_coords =
            |cells: &[(usize, usize)]| cells.iter().map(|&c| c.into()).collect::<Vec<_>>();
        assert!(line.is_valid_placement(&to_coords(&straight)));
        assert!(!line.is_valid_placement(&to_coords(&gap)));
        assert!(!line.is_valid_placement(&to_coords(&bent)));
        assert!(!line.is_valid_placement(&to_coords(&straight[..2])));
        assert!(Line::new(1).is_valid_placement(&[Coordinate::new(9, 9)]));
    }
}
