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

//! An in-process game server with a computer opponent.
//!
//! Follows the rules of the networked server: the first player to connect fires first,
//! a hit keeps the turn, a miss passes it, repeated shots are refused, and the shot that
//! takes the target's last ship cell wins.

use std::collections::BTreeMap;

use log::{debug, info};
use rand::{seq::SliceRandom, Rng};

use seabattle::{
    board::BOARD_SIZE,
    errors::ServiceError,
    session::GameService,
    wire::{PlayerStatus, ShotOutcome, ShotResponse, Snapshot},
    Coordinate, Fleet, FleetPlacement, ShotAttribution,
};

/// Game server hosting one human player against a bot.
pub struct LocalServer<R> {
    bot: String,
    rng: R,
    attribution: ShotAttribution,

    players: Vec<String>,
    status: BTreeMap<String, PlayerStatus>,
    /// Ship cells of each player not yet hit.
    afloat: BTreeMap<String, Vec<Coordinate>>,
    /// Shots taken at each player, keyed by target.
    received: BTreeMap<String, Vec<Coordinate>>,
    current_turn: Option<String>,
}

impl<R: Rng> LocalServer<R> {
    /// Host a game against a bot called `bot`, which places and fires using `rng`. The
    /// snapshot's shot lists are keyed as `attribution` says.
    pub fn new<S: Into<String>>(bot: S, rng: R, attribution: ShotAttribution) -> Self {
        Self {
            bot: bot.into(),
            rng,
            attribution,
            players: Vec::new(),
            status: BTreeMap::new(),
            afloat: BTreeMap::new(),
            received: BTreeMap::new(),
            current_turn: None,
        }
    }

    fn join(&mut self, name: &str) -> Result<(), ServiceError> {
        if self.players.iter().any(|p| p == name) {
            return Err(ServiceError::NameTaken(name.to_owned()));
        }
        if self.players.len() >= 2 {
            return Err(ServiceError::GameFull);
        }
        self.players.push(name.to_owned());
        self.status
            .insert(name.to_owned(), PlayerStatus::Connecting);
        if self.players.len() == 2 {
            for player in &self.players {
                self.status
                    .insert(player.clone(), PlayerStatus::PlacingShips);
            }
        }
        Ok(())
    }

    fn accept_fleet(&mut self, name: &str, cells: Vec<Coordinate>) -> Result<(), ServiceError> {
        if !self.players.iter().any(|p| p == name) {
            return Err(ServiceError::Rejected(format!("unknown player {}", name)));
        }
        debug!("{} submitted {} ship cells", name, cells.len());
        self.afloat.insert(name.to_owned(), cells);
        self.received.insert(name.to_owned(), Vec::new());
        self.status.insert(name.to_owned(), PlayerStatus::Ready);

        let all_ready = self.players.len() == 2
            && self
                .players
                .iter()
                .all(|p| self.status.get(p) == Some(&PlayerStatus::Ready));
        if all_ready {
            self.current_turn = self.players.first().cloned();
            for player in &self.players {
                self.status.insert(player.clone(), PlayerStatus::Battle);
            }
            info!("battle started, {:?} fires first", self.current_turn);
        }
        Ok(())
    }

    fn place_bot_fleet(&mut self) -> Result<(), ServiceError> {
        let mut placement = FleetPlacement::new();
        while let Err(err) = placement.auto_place(&mut self.rng) {
            debug!("bot placement failed, retrying: {}", err);
        }
        let fleet = placement
            .into_fleet()
            .map_err(|_| ServiceError::Rejected("bot fleet is incomplete".into()))?;
        let bot = self.bot.clone();
        self.accept_fleet(&bot, fleet.cells().collect())
    }

    fn opponent_of(&self, name: &str) -> Option<String> {
        self.players.iter().find(|p| *p != name).cloned()
    }

    /// Resolve a shot by `shooter` at `coord` on the opponent's board.
    fn resolve(&mut self, shooter: &str, coord: Coordinate) -> ShotResponse {
        if self.current_turn.is_none() {
            return ShotResponse::refused("not_started", "The game has not started yet");
        }
        if self.current_turn.as_deref() != Some(shooter) {
            return ShotResponse::refused("not_your_turn", "It is your opponent's turn");
        }
        let target = match self.opponent_of(shooter) {
            Some(target) => target,
            None => return ShotResponse::refused("no_opponent", "No opponent found"),
        };
        if !coord.is_valid() {
            return ShotResponse::refused("out_of_range", "That cell is not on the board");
        }
        let received = self.received.entry(target.clone()).or_default();
        if received.contains(&coord) {
            return ShotResponse::refused("repeat", "You already fired at that cell");
        }
        received.push(coord);

        let afloat = self.afloat.entry(target.clone()).or_default();
        match afloat.iter().position(|&cell| cell == coord) {
            Some(idx) => {
                afloat.swap_remove(idx);
                if afloat.is_empty() {
                    info!("{} sank the last ship of {}", shooter, target);
                    self.status.insert(shooter.to_owned(), PlayerStatus::Win);
                    self.status.insert(target, PlayerStatus::Lose);
                    ShotResponse::accepted(ShotOutcome::Win, "You win!")
                } else {
                    ShotResponse::accepted(ShotOutcome::Hit, "Hit! Fire again")
                }
            }
            None => {
                self.current_turn = Some(target);
                ShotResponse::accepted(ShotOutcome::Miss, "Miss. Your opponent's turn")
            }
        }
    }

    fn is_over(&self) -> bool {
        self.status
            .values()
            .any(|s| *s == PlayerStatus::Win || *s == PlayerStatus::Lose)
    }

    /// Let the bot take one shot if it holds the turn.
    fn bot_move(&mut self) {
        if self.is_over() || self.current_turn.as_deref() != Some(self.bot.as_str()) {
            return;
        }
        let target = match self.opponent_of(&self.bot) {
            Some(target) => target,
            None => return,
        };
        let received = self.received.get(&target);
        let open: Vec<Coordinate> = (0..BOARD_SIZE)
            .flat_map(|y| (0..BOARD_SIZE).map(move |x| Coordinate::new(x, y)))
            .filter(|c| received.map_or(true, |shots| !shots.contains(c)))
            .collect();
        if let Some(&coord) = open.choose(&mut self.rng) {
            let bot = self.bot.clone();
            let response = self.resolve(&bot, coord);
            debug!("{} fires at {}: {:?}", bot, coord, response.result);
        }
    }

    fn snapshot(&self) -> Snapshot {
        let mut shots = BTreeMap::new();
        for player in &self.players {
            let against = self
                .received
                .get(player)
                .map(|list| list.iter().map(|c| (c.x as i64, c.y as i64)).collect())
                .unwrap_or_else(Vec::new);
            let key = match self.attribution {
                ShotAttribution::ByTarget => player.clone(),
                ShotAttribution::ByShooter => match self.opponent_of(player) {
                    Some(shooter) => shooter,
                    None => continue,
                },
            };
            shots.insert(key, against);
        }
        Snapshot {
            players: self.players.clone(),
            connected: self.players.len(),
            game_ready: self.players.len() == 2,
            game_started: self.current_turn.is_some(),
            player_status: self.status.clone(),
            shots,
            current_turn: self.current_turn.clone(),
        }
    }
}

impl<R: Rng> GameService for LocalServer<R> {
    fn connect(&mut self, name: &str) -> Result<String, ServiceError> {
        if name == self.bot {
            return Err(ServiceError::NameTaken(name.to_owned()));
        }
        self.join(name)?;
        let bot = self.bot.clone();
        self.join(&bot)?;
        self.place_bot_fleet()?;
        Ok(format!("Welcome, {}! You are playing against {}.", name, bot))
    }

    fn send_ships(&mut self, name: &str, fleet: &Fleet) -> Result<(), ServiceError> {
        self.accept_fleet(name, fleet.cells().collect())
    }

    fn get_state(&mut self) -> Result<Snapshot, ServiceError> {
        self.bot_move();
        Ok(self.snapshot())
    }

    fn shoot(&mut self, name: &str, coord: Coordinate) -> Result<ShotResponse, ServiceError> {
        Ok(self.resolve(name, coord))
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;

    fn fleet() -> Fleet {
        let mut placement = FleetPlacement::new();
        placement
            .auto_place(&mut StdRng::seed_from_u64(3))
            .unwrap();
        placement.into_fleet().unwrap()
    }

    fn started() -> LocalServer<StdRng> {
        let mut server =
            LocalServer::new("bot", StdRng::seed_from_u64(9), ShotAttribution::ByShooter);
        server.connect("me").unwrap();
        server.send_ships("me", &fleet()).unwrap();
        server
    }

    #[test]
    fn first_player_fires_first() {
        let mut server = started();
        let state = server.get_state().unwrap();
        assert_eq!(state.current_turn.as_deref(), Some("me"));
        assert_eq!(state.status_of("bot"), PlayerStatus::Battle);
        assert!(state.can_shoot("me"));
    }

    #[test]
    fn names_and_seats_are_limited() {
        let mut server = started();
        assert_eq!(
            server.connect("me").unwrap_err(),
            ServiceError::NameTaken("me".into())
        );
        assert_eq!(server.connect("carol").unwrap_err(), ServiceError::GameFull);
    }

    #[test]
    fn repeats_and_out_of_turn_shots_are_refused() {
        let mut server = started();
        let bot_cells: Vec<Coordinate> = server.afloat["bot"].clone();
        let water = (0..BOARD_SIZE)
            .flat_map(|y| (0..BOARD_SIZE).map(move |x| Coordinate::new(x, y)))
            .find(|c| !bot_cells.contains(c))
            .unwrap();

        let hit = server.shoot("me", bot_cells[0]).unwrap();
        assert_eq!(hit.outcome(), Some(ShotOutcome::Hit));
        let repeat = server.shoot("me", bot_cells[0]).unwrap();
        assert_eq!(repeat.result.as_deref(), Some("repeat"));

        let miss = server.shoot("me", water).unwrap();
        assert_eq!(miss.outcome(), Some(ShotOutcome::Miss));
        let refused = server.shoot("me", bot_cells[1]).unwrap();
        assert_eq!(refused.result.as_deref(), Some("not_your_turn"));

        // The bot fires once per state fetch; shots by the bot are listed under its
        // name.
        let state = server.get_state().unwrap();
        assert_eq!(state.shots_of("bot").len(), 1);
        assert_eq!(state.shots_of("me").len(), 2);
    }

    #[test]
    fn sinking_every_cell_wins() {
        let mut server = started();
        let bot_cells: Vec<Coordinate> = server.afloat["bot"].clone();
        let (last, rest) = bot_cells.split_last().unwrap();
        for &cell in rest {
            assert_eq!(
                server.shoot("me", cell).unwrap().outcome(),
                Some(ShotOutcome::Hit)
            );
        }
        assert_eq!(
            server.shoot("me", *last).unwrap().outcome(),
            Some(ShotOutcome::Win)
        );
        let state = server.get_state().unwrap();
        assert_eq!(state.status_of("me"), PlayerStatus::Win);
        assert_eq!(state.status_of("bot"), PlayerStatus::Lose);
    }
}
