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

//! Reconciliation of server state into the local boards.
//!
//! The [`Engine`] owns this player's two boards. The own board starts from the placed
//! fleet and receives the opponent's shots; the observed-enemy board only learns what
//! this player's own shots revealed. Snapshots are merged idempotently: a coordinate
//! that is already reflected on a board is skipped, so a snapshot may be delivered any
//! number of times.
//!
//! The engine does no I/O and is not meant to be shared between threads directly. The
//! owner has to serialize calls, see [`Session`][crate::session::Session].

use std::{fmt, str::FromStr};

use log::{debug, info, trace};
use serde::{Deserialize, Serialize};

use crate::{
    board::{neighbors4, Board, CellState, Coordinate, Grid},
    errors::{FleetDefect, InvalidFleet},
    events::{ListenerId, Listeners},
    ships::{Fleet, Ship},
    wire::{PlayerStatus, ShotOutcome, Snapshot},
};

mod observed;

/// How the snapshot's `shots` map is keyed.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShotAttribution {
    /// `shots[name]` lists the shots fired by `name`.
    ByShooter,
    /// `shots[name]` lists the shots fired at `name`.
    ByTarget,
}

impl Default for ShotAttribution {
    fn default() -> Self {
        ShotAttribution::ByShooter
    }
}

impl FromStr for ShotAttribution {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "by-shooter" | "shooter" => Ok(ShotAttribution::ByShooter),
            "by-target" | "target" => Ok(ShotAttribution::ByTarget),
            other => Err(format!("unknown shot attribution {:?}", other)),
        }
    }
}

/// Engine settings.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub attribution: ShotAttribution,
}

/// How the game ended for this player.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Won,
    Lost,
}

/// Lifecycle of the engine. `Terminal` is absorbing.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Phase {
    /// Waiting for the fleet.
    Placing,
    /// Battle in progress.
    Active,
    /// The game is over.
    Terminal(Outcome),
}

/// Which of the two boards a notification is about.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BoardSide {
    /// This player's fleet and the opponent's shots.
    Own,
    /// What this player knows of the opponent's fleet.
    Enemy,
}

/// Derived figures, recomputed from the boards after every change.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    /// Shots fired by both players.
    pub total_shots: usize,
    /// Percentage of this player's resolved shots that hit, rounded down.
    pub accuracy_percent: usize,
    /// This player's ships still afloat.
    pub remaining_ships: usize,
    /// Opponent ships not yet seen sunk.
    pub enemy_remaining_ships: usize,
    pub my_hits: usize,
    pub my_misses: usize,
    pub enemy_hits: usize,
    pub enemy_misses: usize,
}

/// Notifications sent to engine listeners.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum EngineEvent {
    /// A cell changed state.
    CellUpdated {
        side: BoardSide,
        coord: Coordinate,
        state: CellState,
    },
    /// The player holding the turn changed.
    TurnChanged(Option<String>),
    /// Statistics were recomputed.
    StatisticsUpdated(Statistics),
    /// The game ended. `winner` is the opponent's name if known when this player lost.
    GameOver {
        outcome: Outcome,
        winner: Option<String>,
    },
}

/// What one call to [`Engine::apply_snapshot`] did.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct MergeReport {
    /// The snapshot was not merged because the engine is not in battle.
    pub ignored: bool,
    /// The turn holder differed from the last snapshot.
    pub turn_changed: bool,
    /// Cells written, not counting promotions to `Sunk`.
    pub cells_changed: usize,
    /// Coordinates already reflected on the board.
    pub stale: usize,
    /// Coordinates off the board.
    pub out_of_range: usize,
}

/// Client-side game state for one player.
pub struct Engine {
    player: String,
    config: EngineConfig,
    phase: Phase,

    own: Board,
    enemy: Board,
    fleet: Option<Fleet>,

    current_turn: Option<String>,
    /// Last opponent name seen in a snapshot.
    opponent: Option<String>,

    /// Observed-enemy cells fired at locally whose result has not arrived yet.
    pending: Grid<bool>,
    /// Observed-enemy cells whose outcome came from a shot response.
    resolved: Grid<bool>,
    /// A `win` response was received: every enemy ship is down.
    enemy_defeated: bool,

    my_hits: usize,
    my_misses: usize,
    enemy_hits: usize,
    enemy_misses: usize,
    stats: Statistics,

    listeners: Listeners<EngineEvent>,
}

impl Engine {
    /// Create the engine for the named player. The engine waits for the fleet.
    pub fn new<S: Into<String>>(player: S, config: EngineConfig) -> Self {
        Self {
            player: player.into(),
            config,
            phase: Phase::Placing,
            own: Board::new(),
            enemy: Board::new(),
            fleet: None,
            current_turn: None,
            opponent: None,
            pending: Grid::new(),
            resolved: Grid::new(),
            enemy_defeated: false,
            my_hits: 0,
            my_misses: 0,
            enemy_hits: 0,
            enemy_misses: 0,
            stats: Statistics::default(),
            listeners: Listeners::new(),
        }
    }

    /// Name of this player.
    pub fn player(&self) -> &str {
        &self.player
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// How the game ended, or `None` while it is still going.
    pub fn outcome(&self) -> Option<Outcome> {
        match self.phase {
            Phase::Terminal(outcome) => Some(outcome),
            _ => None,
        }
    }

    pub fn is_game_over(&self) -> bool {
        self.outcome().is_some()
    }

    /// Player whose turn it was in the last merged snapshot.
    pub fn current_turn(&self) -> Option<&str> {
        self.current_turn.as_deref()
    }

    pub fn is_my_turn(&self) -> bool {
        self.current_turn() == Some(self.player.as_str())
    }

    /// Opponent name, once a snapshot revealed it.
    pub fn opponent(&self) -> Option<&str> {
        self.opponent.as_deref()
    }

    /// The fleet this engine was initialized with.
    pub fn fleet(&self) -> Option<&Fleet> {
        self.fleet.as_ref()
    }

    /// A copy of this player's board.
    pub fn own_board(&self) -> Board {
        self.own.clone()
    }

    /// A copy of the observed-enemy board.
    pub fn enemy_board(&self) -> Board {
        self.enemy.clone()
    }

    /// State of a cell on this player's board. Off-board reads as `Empty`.
    pub fn own_cell(&self, coord: Coordinate) -> CellState {
        self.own.state(coord)
    }

    /// State of a cell on the observed-enemy board. Off-board reads as `Empty`.
    pub fn enemy_cell(&self, coord: Coordinate) -> CellState {
        self.enemy.state(coord)
    }

    /// The statistics as of the last change.
    pub fn statistics(&self) -> Statistics {
        self.stats
    }

    /// Register a listener for engine notifications.
    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&EngineEvent) + Send + 'static,
    {
        self.listeners.subscribe(listener)
    }

    /// Remove an engine listener.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.listeners.unsubscribe(id)
    }

    /// Seed the own board with the placed fleet and start the battle. The fleet must be
    /// exactly the standard fleet, with straight ships that neither overlap nor touch.
    pub fn initialize(&mut self, ships: Vec<Ship>) -> Result<(), InvalidFleet> {
        if self.phase != Phase::Placing {
            return Err(FleetDefect::AlreadyInitialized.into());
        }
        let fleet = Fleet::new(ships)?;
        let cells: Vec<Coordinate> = fleet.cells().collect();
        for cell in cells {
            self.mark(BoardSide::Own, cell, CellState::Ship);
        }
        debug!("{}: fleet of {} ships seeded", self.player, fleet.len());
        self.fleet = Some(fleet);
        self.phase = Phase::Active;
        self.refresh_statistics();
        Ok(())
    }

    /// Merge an authoritative snapshot. Safe to call repeatedly with the same or an
    /// older snapshot. Does nothing before the fleet is seeded or after the game ended.
    ///
    /// Order: turn change, the opponent's shots, this player's shots, statistics, then
    /// the game-over check.
    pub fn apply_snapshot(&mut self, snapshot: &Snapshot) -> MergeReport {
        let mut report = MergeReport::default();
        if self.phase != Phase::Active {
            trace!("{}: snapshot ignored in {:?}", self.player, self.phase);
            report.ignored = true;
            return report;
        }

        if let Some(opponent) = snapshot.opponent_of(&self.player) {
            if self.opponent.as_deref() != Some(opponent) {
                self.opponent = Some(opponent.to_owned());
            }
        }

        if snapshot.current_turn != self.current_turn {
            debug!(
                "{}: turn {:?} -> {:?}",
                self.player, self.current_turn, snapshot.current_turn
            );
            self.current_turn = snapshot.current_turn.clone();
            report.turn_changed = true;
            self.listeners
                .emit(&EngineEvent::TurnChanged(self.current_turn.clone()));
        }

        let (incoming, outgoing) = self.split_shots(snapshot);
        for &(x, y) in incoming {
            match Coordinate::checked(x, y) {
                Some(coord) => self.receive_shot(coord, &mut report),
                None => {
                    trace!("{}: dropping off-board shot ({}, {})", self.player, x, y);
                    report.out_of_range += 1;
                }
            }
        }
        for &(x, y) in outgoing {
            match Coordinate::checked(x, y) {
                Some(coord) => self.replay_own_shot(coord, &mut report),
                None => {
                    trace!("{}: dropping off-board shot ({}, {})", self.player, x, y);
                    report.out_of_range += 1;
                }
            }
        }

        self.refresh_statistics();
        self.check_game_over(snapshot.status_of(&self.player));
        if report.cells_changed > 0 {
            debug!("{}: merged snapshot {:?}", self.player, report);
        }
        report
    }

    /// True if this player may fire at `coord` now: the battle is on, it is this
    /// player's turn, and nothing is known about that cell yet.
    pub fn can_shoot_at(&self, coord: Coordinate) -> bool {
        self.phase == Phase::Active
            && coord.is_valid()
            && self.is_my_turn()
            && self.enemy.state(coord) == CellState::Empty
            && !self.pending[coord]
    }

    /// Mark `coord` as fired at before the result is known, so it cannot be fired at
    /// again in the meantime. Returns false if the shot is not allowed.
    pub fn record_local_shot(&mut self, coord: Coordinate) -> bool {
        if !self.can_shoot_at(coord) {
            return false;
        }
        self.pending[coord] = true;
        true
    }

    /// Release a provisional shot whose request failed. Returns false if `coord` was
    /// not pending.
    pub fn cancel_local_shot(&mut self, coord: Coordinate) -> bool {
        match self.pending.get_mut(coord) {
            Some(pending) if *pending => {
                *pending = false;
                true
            }
            _ => false,
        }
    }

    /// Apply the server's direct response to one of this player's shots. A cell is
    /// resolved at most once; repeating a result changes nothing. Returns true if the
    /// result was applied.
    pub fn apply_shot_result(&mut self, coord: Coordinate, outcome: ShotOutcome) -> bool {
        if self.phase != Phase::Active || !coord.is_valid() {
            trace!("{}: shot result at {} ignored", self.player, coord);
            return false;
        }
        self.pending[coord] = false;
        if self.resolved[coord] {
            trace!("{}: shot result at {} already applied", self.player, coord);
            return false;
        }
        self.resolved[coord] = true;

        match (self.enemy.state(coord), outcome) {
            // A snapshot can't put these here, only a shot response can.
            (CellState::Hit, _) | (CellState::Sunk, _) => return false,
            (_, ShotOutcome::Hit) => {
                self.my_hits += 1;
                self.mark(BoardSide::Enemy, coord, CellState::Hit);
                self.settle_enemy_region(coord);
            }
            (_, ShotOutcome::Win) => {
                self.my_hits += 1;
                self.enemy_defeated = true;
                self.mark(BoardSide::Enemy, coord, CellState::Hit);
                for region in self.enemy.afloat_regions() {
                    self.sink(BoardSide::Enemy, &region);
                }
            }
            (current, ShotOutcome::Miss) => {
                self.my_misses += 1;
                if current != CellState::Miss {
                    self.mark(BoardSide::Enemy, coord, CellState::Miss);
                }
                // A confirmed miss may close off a neighboring run of hits.
                for neighbor in neighbors4(coord) {
                    if self.enemy.state(neighbor) == CellState::Hit {
                        self.settle_enemy_region(neighbor);
                    }
                }
            }
        }

        self.refresh_statistics();
        self.check_game_over(PlayerStatus::Unknown);
        true
    }

    /// The lists of shots fired at this player and by this player.
    fn split_shots<'s>(&self, snapshot: &'s Snapshot) -> (&'s [(i64, i64)], &'s [(i64, i64)]) {
        let mine = snapshot.shots_of(&self.player);
        let theirs = snapshot
            .opponent_of(&self.player)
            .map_or(&[][..], |opponent| snapshot.shots_of(opponent));
        match self.config.attribution {
            ShotAttribution::ByShooter => (theirs, mine),
            ShotAttribution::ByTarget => (mine, theirs),
        }
    }

    /// Apply one of the opponent's shots to the own board.
    fn receive_shot(&mut self, coord: Coordinate, report: &mut MergeReport) {
        match self.own.state(coord) {
            CellState::Hit | CellState::Miss | CellState::Sunk => report.stale += 1,
            CellState::Ship => {
                report.cells_changed += 1;
                self.enemy_hits += 1;
                self.mark(BoardSide::Own, coord, CellState::Hit);
                let region = self.own.ship_region(coord);
                if self.own.all_hit(&region) {
                    self.sink(BoardSide::Own, &region);
                }
            }
            CellState::Empty => {
                report.cells_changed += 1;
                self.enemy_misses += 1;
                self.mark(BoardSide::Own, coord, CellState::Miss);
            }
        }
    }

    /// Record one of this player's own shots seen in a snapshot. The snapshot does not
    /// say whether it hit, so an unknown cell becomes a `Miss` until a shot response
    /// says otherwise.
    fn replay_own_shot(&mut self, coord: Coordinate, report: &mut MergeReport) {
        if self.enemy.state(coord) == CellState::Empty {
            report.cells_changed += 1;
            self.mark(BoardSide::Enemy, coord, CellState::Miss);
        } else {
            report.stale += 1;
        }
    }

    /// Promote the run of hits through `coord` on the observed board to `Sunk` if it
    /// must be a whole ship.
    fn settle_enemy_region(&mut self, coord: Coordinate) {
        let region = self.enemy.ship_region(coord);
        if observed::is_complete(&self.enemy, &self.resolved, &region) {
            self.sink(BoardSide::Enemy, &region);
            self.settle_open_runs();
        }
    }

    /// Each sunk ship shortens the longest one still unaccounted for, which can complete
    /// other runs of hits. Sink those too until none is left.
    fn settle_open_runs(&mut self) {
        loop {
            let complete = self
                .enemy
                .regions_of(|cell| cell == CellState::Hit)
                .into_iter()
                .find(|region| observed::is_complete(&self.enemy, &self.resolved, region));
            match complete {
                Some(region) => self.sink(BoardSide::Enemy, &region),
                None => break,
            }
        }
    }

    fn sink(&mut self, side: BoardSide, region: &[Coordinate]) {
        debug!(
            "{}: {:?} ship of length {} sunk at {:?}",
            self.player,
            side,
            region.len(),
            region
        );
        for &cell in region {
            self.mark(side, cell, CellState::Sunk);
        }
    }

    fn mark(&mut self, side: BoardSide, coord: Coordinate, state: CellState) {
        let board = match side {
            BoardSide::Own => &mut self.own,
            BoardSide::Enemy => &mut self.enemy,
        };
        if board.set(coord, state) {
            self.listeners
                .emit(&EngineEvent::CellUpdated { side, coord, state });
        }
    }

    fn refresh_statistics(&mut self) {
        let resolved = self.my_hits + self.my_misses;
        self.stats = Statistics {
            total_shots: resolved + self.enemy_hits + self.enemy_misses,
            accuracy_percent: if resolved > 0 {
                self.my_hits * 100 / resolved
            } else {
                0
            },
            remaining_ships: self.own.count_afloat(),
            enemy_remaining_ships: if self.enemy_defeated {
                0
            } else {
                observed::ships_remaining(&self.enemy)
            },
            my_hits: self.my_hits,
            my_misses: self.my_misses,
            enemy_hits: self.enemy_hits,
            enemy_misses: self.enemy_misses,
        };
        self.listeners
            .emit(&EngineEvent::StatisticsUpdated(self.stats));
    }

    /// End the game if either fleet is gone or the server gave a verdict. Losing takes
    /// precedence when both sides are finished at once.
    fn check_game_over(&mut self, status: PlayerStatus) {
        if self.phase != Phase::Active {
            return;
        }
        let own_destroyed = self.stats.remaining_ships == 0 || status == PlayerStatus::Lose;
        let enemy_destroyed =
            self.stats.enemy_remaining_ships == 0 || status == PlayerStatus::Win;
        let outcome = if own_destroyed {
            Outcome::Lost
        } else if enemy_destroyed {
            Outcome::Won
        } else {
            return;
        };
        self.phase = Phase::Terminal(outcome);
        let winner = match outcome {
            Outcome::Won => Some(self.player.clone()),
            Outcome::Lost => self.opponent.clone(),
        };
        info!("{}: game over, {:?}", self.player, outcome);
        self.listeners
            .emit(&EngineEvent::GameOver { outcome, winner });
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Engine")
            .field("player", &self.player)
            .field("phase", &self.phase)
            .field("current_turn", &self.current_turn)
            .field("stats", &self.stats)
            .finish()
    }
}
