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

//! Deductions about the opponent's fleet from the observed-enemy board.
//!
//! The observed board never holds `Ship` cells, so a run of hits cannot be checked
//! against the ship's full extent. A run is only called sunk once nothing else can
//! belong to it.

use crate::{
    board::{neighbors4, Board, CellState, Coordinate, Grid},
    ships::FLEET,
};

/// Lengths of the opponent's ships that are not yet accounted for by a sunk region.
pub(super) fn unsunk_lengths(board: &Board) -> Vec<usize> {
    let mut remaining = FLEET.to_vec();
    for region in board.regions_of(|cell| cell == CellState::Sunk) {
        if let Some(pos) = remaining.iter().position(|&len| len == region.len()) {
            remaining.swap_remove(pos);
        }
    }
    remaining
}

/// Number of opponent ships not yet seen sunk.
pub(super) fn ships_remaining(board: &Board) -> usize {
    FLEET
        .len()
        .saturating_sub(board.regions_of(|cell| cell == CellState::Sunk).len())
}

/// True if the run of hits in `region` must be a whole ship: either it is as long as
/// the longest ship still unaccounted for, or every cell orthogonally next to it is a
/// confirmed miss or off the board.
pub(super) fn is_complete(board: &Board, resolved: &Grid<bool>, region: &[Coordinate]) -> bool {
    if !board.all_hit(region) {
        return false;
    }
    let longest = unsunk_lengths(board).into_iter().max().unwrap_or(0);
    if region.len() >= longest {
        return true;
    }
    region
        .iter()
        .flat_map(|&cell| neighbors4(cell))
        .filter(|neighbor| !region.contains(neighbor))
        .all(|neighbor| match board.state(neighbor) {
            CellState::Miss => resolved[neighbor],
            CellState::Sunk => true,
            _ => false,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board_with(cells: &[((usize, usize), CellState)]) -> (Board, Grid<bool>) {
        let mut board = Board::new();
        let mut resolved = Grid::new();
        for &(coord, state) in cells {
            board.set(coord.into(), state);
            resolved[Coordinate::from(coord)] = true;
        }
        (board, resolved)
    }

    #[test]
    fn open_single_hit_is_not_complete() {
        let (board, resolved) = board_with(&[((4, 4), CellState::Hit)]);
        assert!(!is_complete(&board, &resolved, &[Coordinate::new(4, 4)]));
    }

    #[test]
    fn boxed_in_hit_is_complete() {
        let (board, resolved) = board_with(&[
            ((0, 0), CellState::Hit),
            ((1, 0), CellState::Miss),
            ((0, 1), CellState::Miss),
        ]);
        assert!(is_complete(&board, &resolved, &[Coordinate::new(0, 0)]));
    }

    #[test]
    fn unresolved_miss_does_not_close_a_region() {
        let (mut board, resolved) = board_with(&[
            ((0, 0), CellState::Hit),
            ((1, 0), CellState::Miss),
        ]);
        // Marked by snapshot replay only.
        board.set(Coordinate::new(0, 1), CellState::Miss);
        assert!(!is_complete(&board, &resolved, &[Coordinate::new(0, 0)]));
    }

    #[test]
    fn longest_remaining_length_completes_a_run() {
        let cells: Vec<_> = (2..6).map(|x| ((x, 5), CellState::Hit)).collect();
        let (board, resolved) = board_with(&cells);
        let region: Vec<_> = (2..6).map(|x| Coordinate::new(x, 5)).collect();
        assert!(is_complete(&board, &resolved, &region));
        assert!(!is_complete(&board, &resolved, &region[..3]));
    }

    #[test]
    fn sunk_regions_reduce_the_remaining_fleet() {
        let (board, _) = board_with(&[
            ((0, 0), CellState::Sunk),
            ((1, 0), CellState::Sunk),
            ((2, 0), CellState::Sunk),
            ((3, 0), CellState::Sunk),
            ((9, 9), CellState::Sunk),
        ]);
        assert_eq!(ships_remaining(&board), 8);
        let mut lengths = unsunk_lengths(&board);
        lengths.sort();
        assert_eq!(lengths, vec![1, 1, 1, 2, 2, 2, 3, 3]);
    }
}
