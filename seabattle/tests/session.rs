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

//! A session driven against a scripted server that keys shot lists by target.

use std::collections::BTreeMap;

use seabattle::{
    errors::{FireError, ServiceError},
    session::{GameService, Session},
    wire::{PlayerStatus, ShotOutcome, ShotResponse, Snapshot},
    CellState, Coordinate, EngineConfig, Fleet, Outcome, Ship, ShotAttribution,
};

/// Holds the opponent's fleet and records shots the way the game server does: under
/// the name of the player that was shot at.
struct ScriptedServer {
    enemy_cells: Vec<Coordinate>,
    shots: BTreeMap<String, Vec<(i64, i64)>>,
    turn: String,
    status: BTreeMap<String, PlayerStatus>,
}

impl ScriptedServer {
    fn new(enemy_cells: Vec<Coordinate>) -> Self {
        let mut status = BTreeMap::new();
        status.insert("me".to_owned(), PlayerStatus::Battle);
        status.insert("enemy".to_owned(), PlayerStatus::Battle);
        Self {
            enemy_cells,
            shots: BTreeMap::new(),
            turn: "me".into(),
            status,
        }
    }

    /// The opponent fires at this player.
    fn enemy_fires(&mut self, x: i64, y: i64) {
        self.shots.entry("me".into()).or_default().push((x, y));
    }
}

impl GameService for ScriptedServer {
    fn connect(&mut self, name: &str) -> Result<String, ServiceError> {
        if name == "enemy" {
            return Err(ServiceError::NameTaken(name.into()));
        }
        Ok(format!("Welcome, {}!", name))
    }

    fn send_ships(&mut self, _: &str, fleet: &Fleet) -> Result<(), ServiceError> {
        assert_eq!(fleet.submission().len(), 10);
        Ok(())
    }

    fn get_state(&mut self) -> Result<Snapshot, ServiceError> {
        let mut snapshot = Snapshot::default();
        snapshot.players = vec!["me".into(), "enemy".into()];
        snapshot.connected = 2;
        snapshot.game_ready = true;
        snapshot.game_started = true;
        snapshot.current_turn = Some(self.turn.clone());
        snapshot.shots = self.shots.clone();
        snapshot.player_status = self.status.clone();
        Ok(snapshot)
    }

    fn shoot(&mut self, name: &str, coord: Coordinate) -> Result<ShotResponse, ServiceError> {
        if self.turn != name {
            return Ok(ShotResponse::refused("not_your_turn", "Not your turn"));
        }
        let target = self.shots.entry("enemy".into()).or_default();
        let raw = (coord.x as i64, coord.y as i64);
        if target.contains(&raw) {
            return Ok(ShotResponse::refused("repeat", "Already shot there"));
        }
        target.push(raw);
        if !self.enemy_cells.contains(&coord) {
            self.turn = "enemy".into();
            return Ok(ShotResponse::accepted(ShotOutcome::Miss, "Miss"));
        }
        let remaining = self
            .enemy_cells
            .iter()
            .filter(|cell| !target.contains(&(cell.x as i64, cell.y as i64)))
            .count();
        if remaining == 0 {
            self.status.insert("me".into(), PlayerStatus::Win);
            self.status.insert("enemy".into(), PlayerStatus::Lose);
            Ok(ShotResponse::accepted(ShotOutcome::Win, "You win!"))
        } else {
            Ok(ShotResponse::accepted(ShotOutcome::Hit, "Hit!"))
        }
    }
}

fn my_fleet() -> Fleet {
    let ships: Vec<Ship> = vec![
        vec![(0, 0), (1, 0), (2, 0), (3, 0)].into(),
        vec![(5, 0), (6, 0), (7, 0)].into(),
        vec![(0, 2), (1, 2), (2, 2)].into(),
        vec![(4, 2), (5, 2)].into(),
        vec![(7, 2), (8, 2)].into(),
        vec![(0, 4), (1, 4)].into(),
        vec![(3, 4)].into(),
        vec![(5, 4)].into(),
        vec![(7, 4)].into(),
        vec![(9, 4)].into(),
    ];
    Fleet::new(ships).unwrap()
}

fn session(enemy_cells: Vec<Coordinate>) -> Session<ScriptedServer> {
    let session = Session::new(
        "me",
        ScriptedServer::new(enemy_cells),
        EngineConfig {
            attribution: ShotAttribution::ByTarget,
        },
    );
    session.connect().unwrap();
    session.submit_fleet(my_fleet()).unwrap();
    session.poll_once().unwrap();
    session
}

#[test]
fn name_clash_is_reported() {
    let session = Session::new("enemy", ScriptedServer::new(vec![]), EngineConfig::default());
    assert_eq!(
        session.connect().unwrap_err(),
        ServiceError::NameTaken("enemy".into())
    );
}

#[test]
fn a_game_played_to_the_end() {
    let session = session(vec![Coordinate::new(5, 5), Coordinate::new(5, 6)]);
    assert!(session.is_my_turn());

    assert_eq!(session.fire(Coordinate::new(5, 5)).unwrap(), ShotOutcome::Hit);
    assert_eq!(session.fire(Coordinate::new(0, 9)).unwrap(), ShotOutcome::Miss);
    // The turn moved to the opponent with the miss, but the engine only learns that
    // from the next snapshot; the server refuses in the meantime.
    assert!(matches!(
        session.fire(Coordinate::new(9, 9)),
        Err(FireError::Rejected { .. })
    ));
    assert!(session.can_shoot_at(Coordinate::new(9, 9)));

    session.with_engine(|engine| assert_eq!(engine.enemy_board().count(CellState::Hit), 1));
    session.poll_once().unwrap();
    assert!(!session.is_my_turn());
    assert!(!session.can_shoot_at(Coordinate::new(9, 9)));

    // Stored under this player's name: shots against this player.
    session.with_service(|server| {
        server.enemy_fires(3, 4);
        server.turn = "me".into();
    });
    session.poll_once().unwrap();
    assert_eq!(session.own_board().state(Coordinate::new(3, 4)), CellState::Sunk);
    assert_eq!(session.statistics().remaining_ships, 9);
    assert_eq!(
        session.enemy_board().state(Coordinate::new(0, 9)),
        CellState::Miss
    );

    assert_eq!(session.fire(Coordinate::new(5, 6)).unwrap(), ShotOutcome::Win);
    assert_eq!(session.outcome(), Some(Outcome::Won));
    assert_eq!(
        session.enemy_board().state(Coordinate::new(5, 5)),
        CellState::Sunk
    );
    assert_eq!(session.statistics().enemy_remaining_ships, 0);
}
