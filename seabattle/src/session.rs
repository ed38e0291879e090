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

//! Boundary between the engine and the transport that talks to the server.
//!
//! A [`Session`] is the single point through which snapshots and shot results reach
//! the [`Engine`]. The periodic [`Poller`] and the code that fires shots may run on
//! different threads; both go through the session, which applies their updates one
//! at a time.

use std::{
    sync::{
        mpsc::{self, RecvTimeoutError, Sender},
        Arc, Mutex, MutexGuard, PoisonError,
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use log::{debug, error, warn};

use crate::{
    board::{Board, Coordinate},
    engine::{Engine, EngineConfig, EngineEvent, MergeReport, Outcome, Phase, Statistics},
    errors::{FireError, FleetDefect, InvalidFleet, ServiceError, SubmitError},
    events::ListenerId,
    ships::Fleet,
    wire::{ShotOutcome, ShotResponse, Snapshot},
};

/// Requests this client makes to the game server.
pub trait GameService {
    /// Join the game under `name`. Returns the server's welcome message.
    fn connect(&mut self, name: &str) -> Result<String, ServiceError>;

    /// Submit the placed fleet.
    fn send_ships(&mut self, name: &str, fleet: &Fleet) -> Result<(), ServiceError>;

    /// Fetch the current state of the whole game.
    fn get_state(&mut self) -> Result<Snapshot, ServiceError>;

    /// Fire at `coord` on the opponent's board.
    fn shoot(&mut self, name: &str, coord: Coordinate) -> Result<ShotResponse, ServiceError>;
}

/// Polling settings.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct PollConfig {
    /// Time between two state fetches.
    pub interval: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
        }
    }
}

/// One player's connection to a game: the service used to reach the server and the
/// engine holding the local view.
///
/// The service and the engine sit behind separate locks and are never locked at the
/// same time, so a slow request does not block readers of the boards.
pub struct Session<S> {
    player: String,
    service: Mutex<S>,
    engine: Mutex<Engine>,
}

impl<S: GameService> Session<S> {
    /// Create a session for the named player.
    pub fn new<N: Into<String>>(player: N, service: S, config: EngineConfig) -> Self {
        let player = player.into();
        Self {
            engine: Mutex::new(Engine::new(player.clone(), config)),
            service: Mutex::new(service),
            player,
        }
    }

    pub fn player(&self) -> &str {
        &self.player
    }

    /// Join the game.
    pub fn connect(&self) -> Result<String, ServiceError> {
        let welcome = self.lock_service().connect(&self.player)?;
        debug!("{}: connected: {}", self.player, welcome);
        Ok(welcome)
    }

    /// Send the fleet to the server, then seed the own board with it.
    pub fn submit_fleet(&self, fleet: Fleet) -> Result<(), SubmitError> {
        if self.phase() != Phase::Placing {
            return Err(InvalidFleet::from(FleetDefect::AlreadyInitialized).into());
        }
        self.lock_service().send_ships(&self.player, &fleet)?;
        self.lock_engine().initialize(fleet.into_ships())?;
        Ok(())
    }

    /// Fetch one snapshot and merge it. A failed fetch leaves the engine untouched.
    pub fn poll_once(&self) -> Result<MergeReport, ServiceError> {
        let fetched = self.lock_service().get_state();
        let snapshot = match fetched {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!("{}: failed to fetch game state: {}", self.player, err);
                return Err(err);
            }
        };
        Ok(self.lock_engine().apply_snapshot(&snapshot))
    }

    /// Fire at `coord`. The cell is marked as pending while the request is in flight,
    /// then resolved with the server's answer or released if the shot failed.
    pub fn fire(&self, coord: Coordinate) -> Result<ShotOutcome, FireError> {
        if !self.lock_engine().record_local_shot(coord) {
            return Err(FireError::NotAllowed(coord));
        }
        let response = self.lock_service().shoot(&self.player, coord);

        let mut engine = self.lock_engine();
        let response = match response {
            Ok(response) => response,
            Err(err) => {
                warn!("{}: shot at {} failed: {}", self.player, coord, err);
                engine.cancel_local_shot(coord);
                return Err(err.into());
            }
        };
        match response.outcome() {
            Some(outcome) => {
                debug!("{}: shot at {}: {}", self.player, coord, outcome);
                engine.apply_shot_result(coord, outcome);
                Ok(outcome)
            }
            None => {
                warn!(
                    "{}: shot at {} refused ({:?}): {}",
                    self.player, coord, response.result, response.message
                );
                engine.cancel_local_shot(coord);
                Err(FireError::Rejected {
                    coord,
                    result: response.result,
                    message: response.message,
                })
            }
        }
    }

    /// Register a listener for engine notifications.
    pub fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: FnMut(&EngineEvent) + Send + 'static,
    {
        self.lock_engine().subscribe(listener)
    }

    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.lock_engine().unsubscribe(id)
    }

    /// Run `f` with exclusive access to the engine.
    pub fn with_engine<R>(&self, f: impl FnOnce(&mut Engine) -> R) -> R {
        f(&mut self.lock_engine())
    }

    /// Run `f` with exclusive access to the service.
    pub fn with_service<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        f(&mut self.lock_service())
    }

    pub fn phase(&self) -> Phase {
        self.lock_engine().phase()
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.lock_engine().outcome()
    }

    pub fn is_game_over(&self) -> bool {
        self.lock_engine().is_game_over()
    }

    pub fn is_my_turn(&self) -> bool {
        self.lock_engine().is_my_turn()
    }

    pub fn can_shoot_at(&self, coord: Coordinate) -> bool {
        self.lock_engine().can_shoot_at(coord)
    }

    pub fn own_board(&self) -> Board {
        self.lock_engine().own_board()
    }

    pub fn enemy_board(&self) -> Board {
        self.lock_engine().enemy_board()
    }

    pub fn statistics(&self) -> Statistics {
        self.lock_engine().statistics()
    }

    fn lock_engine(&self) -> MutexGuard<'_, Engine> {
        self.engine.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_service(&self) -> MutexGuard<'_, S> {
        self.service.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Background thread that polls a [`Session`] until stopped, dropped, or the game
/// ends.
pub struct Poller {
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Poller {
    /// Start polling. The first fetch happens immediately.
    pub fn start<S>(session: Arc<Session<S>>, config: PollConfig) -> Self
    where
        S: GameService + Send + 'static,
    {
        let (stop, stopped) = mpsc::channel::<()>();
        let handle = thread::spawn(move || loop {
            // Failures are logged by the session; the next tick retries.
            let _ = session.poll_once();
            if session.is_game_over() {
                debug!("{}: game over, polling stopped", session.player());
                break;
            }
            match stopped.recv_timeout(config.interval) {
                Err(RecvTimeoutError::Timeout) => {}
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        });
        Self {
            stop: Some(stop),
            handle: Some(handle),
        }
    }

    /// Stop polling and wait for the thread to finish.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(stop) = self.stop.take() {
            // The thread may already have exited on game over.
            let _ = stop.send(());
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("polling thread panicked");
            }
        }
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.shutdown();
    }
}
