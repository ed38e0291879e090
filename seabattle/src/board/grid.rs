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

//! Fixed-size storage for per-cell values. Shared by the boards and the scratch
//! matrices used during connectivity searches.

use std::{
    borrow::Borrow,
    ops::{Index, IndexMut},
};

use crate::board::{
    dimensions::{BOARD_SIZE, CELL_COUNT},
    Coordinate,
};

/// One value per cell of a 10x10 board.
#[derive(Debug, Clone, Eq, PartialEq)]
pub(crate) struct Grid<T> {
    cells: Box<[T]>,
}

impl<T: Default> Grid<T> {
    pub(crate) fn new() -> Self {
        let cells = (0..CELL_COUNT).map(|_| Default::default()).collect();
        Self { cells }
    }
}

impl<T> Grid<T> {
    fn linearize(coord: &Coordinate) -> Option<usize> {
        if coord.is_valid() {
            Some(coord.y * BOARD_SIZE + coord.x)
        } else {
            None
        }
    }

    /// Get a reference to the cell at the given [`Coordinate`].
    pub(crate) fn get<B: Borrow<Coordinate>>(&self, coord: B) -> Option<&T> {
        Self::linearize(coord.borrow()).and_then(|i| self.cells.get(i))
    }

    /// Get a mutable reference to the cell at the given [`Coordinate`].
    pub(crate) fn get_mut<B: Borrow<Coordinate>>(&mut self, coord: B) -> Option<&mut T> {
        Self::linearize(coord.borrow()).and_then(move |i| self.cells.get_mut(i))
    }

    /// Iterate every coordinate in row-major order along with its value.
    pub(crate) fn iter(&self) -> impl Iterator<Item = (Coordinate, &T)> {
        self.cells
            .iter()
            .enumerate()
            .map(|(i, cell)| (Coordinate::new(i % BOARD_SIZE, i / BOARD_SIZE), cell))
    }
}

impl<T, B: Borrow<Coordinate>> Index<B> for Grid<T> {
    type Output = T;

    fn index(&self, coord: B) -> &T {
        self.get(coord).expect("coordinate out of bounds")
    }
}

impl<T, B: Borrow<Coordinate>> IndexMut<B> for Grid<T> {
    fn index_mut(&mut self, coord: B) -> &mut T {
        self.get_mut(coord).expect("coordinate out of bounds")
    }
}
