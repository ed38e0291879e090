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

//! Types that make up the game board.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

pub(crate) use self::grid::Grid;
pub use self::{
    coordinate::{is_valid, Coordinate},
    dimensions::{
        neighbors, neighbors4, neighbors8, Neighborhood, Neighbors, BOARD_SIZE, CELL_COUNT,
    },
};

mod coordinate;
mod dimensions;
mod grid;

/// State of a single cell.
///
/// Cells only move forward: `Empty -> Ship` during placement, then
/// `Ship | Empty -> Hit | Miss`, and finally `Hit -> Sunk`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellState {
    /// Nothing known (observed board) or open water (own board).
    Empty,
    /// Part of one of this player's ships. Never appears on the observed-enemy board.
    Ship,
    /// A ship cell that has been shot.
    Hit,
    /// A water cell that has been shot.
    Miss,
    /// Part of a ship that has been shot in every cell.
    Sunk,
}

impl CellState {
    /// True if this cell has received a shot.
    pub fn is_shot(self) -> bool {
        match self {
            CellState::Hit | CellState::Miss | CellState::Sunk => true,
            CellState::Empty | CellState::Ship => false,
        }
    }

    /// True for the cells that make up a ship which is still afloat.
    fn is_afloat(self) -> bool {
        match self {
            CellState::Ship | CellState::Hit => true,
            _ => false,
        }
    }
}

impl Default for CellState {
    fn default() -> Self {
        CellState::Empty
    }
}

/// A 10x10 grid of [`CellState`]s.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Board {
    grid: Grid<CellState>,
}

impl Board {
    /// Construct a board where every cell is [`CellState::Empty`].
    pub fn new() -> Self {
        Self { grid: Grid::new() }
    }

    /// Get the state of the cell at the given coordinate, or `None` if the coordinate
    /// is off the board.
    pub fn get(&self, coord: Coordinate) -> Option<CellState> {
        self.grid.get(coord).copied()
    }

    /// Get the state of the cell at the given coordinate. Off-board coordinates read as
    /// [`CellState::Empty`].
    pub fn state(&self, coord: Coordinate) -> CellState {
        self.get(coord).unwrap_or_default()
    }

    /// Overwrite a cell. Returns false (and does nothing) for off-board coordinates.
    pub(crate) fn set(&mut self, coord: Coordinate, state: CellState) -> bool {
        match self.grid.get_mut(coord) {
            Some(cell) => {
                *cell = state;
                true
            }
            None => false,
        }
    }

    /// Count the cells in the given state.
    pub fn count(&self, state: CellState) -> usize {
        self.grid.iter().filter(|(_, cell)| **cell == state).count()
    }

    /// Iterate every cell in row-major order.
    pub fn cells(&self) -> impl '_ + Iterator<Item = (Coordinate, CellState)> {
        self.grid.iter().map(|(coord, cell)| (coord, *cell))
    }

    /// Get an iterator over rows of this board. Each row is an iterator over the states
    /// of that row, left to right.
    pub fn rows(&self) -> impl '_ + Iterator<Item = impl '_ + Iterator<Item = CellState>> {
        (0..BOARD_SIZE)
            .map(move |y| (0..BOARD_SIZE).map(move |x| self.state(Coordinate::new(x, y))))
    }

    /// Collect the connected region of cells reachable from `start` through orthogonal
    /// neighbors in the given states. `start` is always included, whatever its state.
    pub fn region_where<F>(&self, start: Coordinate, mut include: F) -> Vec<Coordinate>
    where
        F: FnMut(CellState) -> bool,
    {
        let mut region = Vec::new();
        if !start.is_valid() {
            return region;
        }
        let mut visited: Grid<bool> = Grid::new();
        let mut queue = VecDeque::new();
        visited[start] = true;
        queue.push_back(start);
        while let Some(current) = queue.pop_front() {
            region.push(current);
            for next in neighbors4(current) {
                if !visited[next] && include(self.grid[next]) {
                    visited[next] = true;
                    queue.push_back(next);
                }
            }
        }
        region
    }

    /// The full set of cells belonging to the ship through `start`: every cell reachable
    /// orthogonally through `Ship` or `Hit` cells. Because ships never touch, this is
    /// exactly one vessel.
    pub fn ship_region(&self, start: Coordinate) -> Vec<Coordinate> {
        self.region_where(start, CellState::is_afloat)
    }

    /// True if every cell of the region has been hit.
    pub fn all_hit(&self, region: &[Coordinate]) -> bool {
        !region.is_empty() && region.iter().all(|&c| self.state(c) == CellState::Hit)
    }

    /// All regions of `Ship`/`Hit` cells, i.e. the ships that are still afloat.
    pub fn afloat_regions(&self) -> Vec<Vec<Coordinate>> {
        self.regions_of(CellState::is_afloat)
    }

    /// Number of ships still afloat. Recomputed from scratch on every call.
    pub fn count_afloat(&self) -> usize {
        self.afloat_regions().len()
    }

    /// Every orthogonally connected region whose cells satisfy `include`, seeded from
    /// each unvisited matching cell in row-major order.
    pub fn regions_of<F>(&self, mut include: F) -> Vec<Vec<Coordinate>>
    where
        F: FnMut(CellState) -> bool,
    {
        let mut seen: Grid<bool> = Grid::new();
        let mut regions = Vec::new();
        for (coord, &cell) in self.grid.iter() {
            if seen[coord] || !include(cell) {
                continue;
            }
            let region = self.region_where(coord, &mut include);
            for &member in &region {
                seen[member] = true;
            }
            regions.push(region);
        }
        regions
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board_with(cells: &[((usize, usize), CellState)]) -> Board {
        let mut board = Board::new();
        for &(coord, state) in cells {
            assert!(board.set(coord.into(), state));
        }
        board
    }

    #[test]
    fn off_board_reads_empty_and_ignores_writes() {
        let mut board = Board::new();
        assert_eq!(board.get(Coordinate::new(10, 0)), None);
        assert_eq!(board.state(Coordinate::new(10, 0)), CellState::Empty);
        assert!(!board.set(Coordinate::new(0, 10), CellState::Ship));
        assert_eq!(board.count(CellState::Empty), CELL_COUNT);
    }

    #[test]
    fn ship_region_follows_orthogonal_cells_only() {
        let board = board_with(&[
            ((2, 2), CellState::Ship),
            ((3, 2), CellState::Hit),
            ((4, 2), CellState::Ship),
            // Diagonal, not part of the same region.
            ((5, 3), CellState::Ship),
        ]);
        let mut region = board.ship_region(Coordinate::new(3, 2));
        region.sort();
        assert_eq!(
            region,
            vec![
                Coordinate::new(2, 2),
                Coordinate::new(3, 2),
                Coordinate::new(4, 2)
            ]
        );
        assert!(!board.all_hit(&region));
    }

    #[test]
    fn sunk_cells_do_not_count_as_afloat() {
        let board = board_with(&[
            ((0, 0), CellState::Sunk),
            ((0, 1), CellState::Sunk),
            ((5, 5), CellState::Ship),
            ((9, 9), CellState::Hit),
            ((3, 7), CellState::Miss),
        ]);
        assert_eq!(board.count_afloat(), 2);
    }

    #[test]
    fn rows_are_row_major() {
        let board = board_with(&[((3, 1), CellState::Miss)]);
        let row: Vec<_> = board.rows().nth(1).unwrap().collect();
        assert_eq!(row[3], CellState::Miss);
        assert_eq!(row.iter().filter(|c| **c == CellState::Miss).count(), 1);
    }
}
