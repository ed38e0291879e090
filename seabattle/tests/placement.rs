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

use rand::{rngs::StdRng, SeedableRng};

use seabattle::{
    board::neighbors8, errors::PlacementExhausted, CellState, Coordinate, Engine, EngineConfig,
    Fleet, FleetPlacement, Orientation, FLEET,
};

/// Every ship cell's 8 neighbors are either part of the same ship or open water.
fn assert_no_touch(fleet: &Fleet) {
    for (idx, ship) in fleet.iter().enumerate() {
        for &cell in ship.iter() {
            for neighbor in neighbors8(cell) {
                let owner = fleet.iter().position(|other| other.contains(&neighbor));
                assert!(
                    owner.is_none() || owner == Some(idx),
                    "ship #{} touches ship #{:?} at {}",
                    idx,
                    owner,
                    neighbor
                );
            }
        }
    }
}

#[test]
fn auto_place_always_yields_a_valid_fleet() {
    for seed in 0..100 {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut placement = FleetPlacement::new();
        placement.auto_place(&mut rng).unwrap();
        assert!(placement.is_locked());

        let fleet = placement.into_fleet().unwrap();
        let lengths: Vec<usize> = fleet.iter().map(|ship| ship.len()).collect();
        assert_eq!(lengths, FLEET.to_vec());
        assert_no_touch(&fleet);

        let mut engine = Engine::new("me", EngineConfig::default());
        engine.initialize(fleet.into_ships()).unwrap();
        assert_eq!(engine.statistics().remaining_ships, 10);
    }
}

#[test]
fn auto_place_is_deterministic_for_a_seed() {
    let place = |seed| {
        let mut placement = FleetPlacement::new();
        placement
            .auto_place(&mut StdRng::seed_from_u64(seed))
            .unwrap();
        placement.board()
    };
    assert_eq!(place(7), place(7));
}

#[test]
fn auto_place_replaces_a_partial_placement() {
    let mut placement = FleetPlacement::new();
    placement
        .place(Coordinate::new(3, 3), Orientation::Vertical)
        .unwrap();
    placement
        .auto_place(&mut StdRng::seed_from_u64(42))
        .unwrap();
    assert_eq!(placement.placed().len(), 10);
    assert_eq!(placement.board().count(CellState::Ship), 20);
}

#[test]
fn exhausted_budget_rolls_back() {
    let mut placement = FleetPlacement::new().with_attempt_budget(0);
    placement
        .place(Coordinate::new(0, 0), Orientation::Horizontal)
        .unwrap();
    let err = placement
        .auto_place(&mut StdRng::seed_from_u64(1))
        .unwrap_err();
    assert_eq!(
        err,
        PlacementExhausted {
            ship: 0,
            len: 4,
            attempts: 0
        }
    );
    assert!(placement.placed().is_empty());
    assert_eq!(placement.board().count(CellState::Ship), 0);
}

#[test]
fn manual_placement_matches_the_submission_shape() {
    let mut placement = FleetPlacement::new();
    let origins = [
        (0, 0, Orientation::Vertical),
        (2, 0, Orientation::Vertical),
        (4, 0, Orientation::Vertical),
        (6, 0, Orientation::Vertical),
        (8, 0, Orientation::Vertical),
        (6, 3, Orientation::Vertical),
        (0, 9, Orientation::Horizontal),
        (2, 9, Orientation::Horizontal),
        (4, 9, Orientation::Horizontal),
        (9, 9, Orientation::Horizontal),
    ];
    for &(x, y, orientation) in origins.iter() {
        placement
            .place(Coordinate::new(x, y), orientation)
            .unwrap_or_else(|err| panic!("{}", err));
    }
    let fleet = placement.into_fleet().unwrap();
    let submission = fleet.submission();
    assert_eq!(submission[0], vec![(0, 0), (0, 1), (0, 2), (0, 3)]);
    assert_eq!(submission[9], vec![(9, 9)]);
    assert_eq!(
        serde_json::to_string(&fleet).unwrap(),
        serde_json::to_string(&submission).unwrap()
    );
}
