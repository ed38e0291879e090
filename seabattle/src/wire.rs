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

//! Shapes exchanged with the game server.
use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize};

use crate::board::Coordinate;

/// Status of a player as reported by the server.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerStatus {
    /// Connected and waiting for an opponent.
    #[serde(alias = "waiting")]
    Connecting,
    /// Both players are present and placing ships.
    PlacingShips,
    /// Fleet submitted.
    Ready,
    /// Battle in progress.
    Battle,
    /// This player won.
    Win,
    /// This player lost.
    Lose,
    /// Anything this client does not understand.
    #[serde(other)]
    Unknown,
}

/// One authoritative view of the whole game, delivered by polling.
///
/// Snapshots may arrive more than once and shot lists only ever grow, so applying the
/// same snapshot again must be harmless.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    /// Names of the connected players, in connection order.
    #[serde(deserialize_with = "nullable")]
    pub players: Vec<String>,
    /// Number of connected players.
    pub connected: usize,
    /// True once two players are connected.
    pub game_ready: bool,
    /// True once the battle has started.
    pub game_started: bool,
    /// Status of each player.
    #[serde(deserialize_with = "nullable")]
    pub player_status: BTreeMap<String, PlayerStatus>,
    /// Cumulative, append-only shot lists keyed by player name. Coordinates are raw
    /// `[x, y]` pairs and may be off the board.
    #[serde(deserialize_with = "nullable")]
    pub shots: BTreeMap<String, Vec<(i64, i64)>>,
    /// Player whose turn it is, if the battle has started.
    pub current_turn: Option<String>,
}

impl Snapshot {
    /// The opponent of `me`: the first roster entry that is not `me`, or failing that
    /// the first other name with a shot list.
    pub fn opponent_of(&self, me: &str) -> Option<&str> {
        self.players
            .iter()
            .map(String::as_str)
            .find(|&p| p != me)
            .or_else(|| self.shots.keys().map(String::as_str).find(|&p| p != me))
    }

    /// The status of the given player, [`PlayerStatus::Unknown`] if not reported.
    pub fn status_of(&self, player: &str) -> PlayerStatus {
        self.player_status
            .get(player)
            .copied()
            .unwrap_or(PlayerStatus::Unknown)
    }

    /// The shot list stored under the given player name.
    pub fn shots_of(&self, player: &str) -> &[(i64, i64)] {
        self.shots.get(player).map(Vec::as_slice).unwrap_or(&[])
    }

    /// True if the server considers it `player`'s turn to fire.
    pub fn can_shoot(&self, player: &str) -> bool {
        self.game_ready
            && self.status_of(player) == PlayerStatus::Battle
            && self.current_turn.as_deref() == Some(player)
    }
}

/// Treat an explicit `null` like a missing field.
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Outcome of one fired shot, as reported by the server.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShotOutcome {
    /// A ship was hit. The shooter keeps the turn.
    Hit,
    /// Nothing was hit. The turn passes.
    Miss,
    /// The last remaining ship cell was hit.
    Win,
}

impl ShotOutcome {
    /// True for outcomes that struck a ship.
    pub fn is_hit(self) -> bool {
        self != ShotOutcome::Miss
    }
}

impl FromStr for ShotOutcome {
    type Err = UnknownOutcome;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hit" => Ok(ShotOutcome::Hit),
            "miss" => Ok(ShotOutcome::Miss),
            "win" => Ok(ShotOutcome::Win),
            other => Err(UnknownOutcome(other.to_owned())),
        }
    }
}

impl fmt::Display for ShotOutcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.pad(match self {
            ShotOutcome::Hit => "hit",
            ShotOutcome::Miss => "miss",
            ShotOutcome::Win => "win",
        })
    }
}

/// A shot result string this client does not understand.
#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
#[error("unknown shot result {0:?}")]
pub struct UnknownOutcome(pub String);

/// Outbound request to fire at a cell of the opponent's board.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct ShotRequest {
    pub name: String,
    pub x: usize,
    pub y: usize,
}

impl ShotRequest {
    pub fn new(name: &str, coord: Coordinate) -> Self {
        Self {
            name: name.to_owned(),
            x: coord.x,
            y: coord.y,
        }
    }
}

/// Synchronous response to a [`ShotRequest`].
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShotResponse {
    pub success: bool,
    /// `"hit"`, `"miss"` or `"win"` on success, something else (or nothing) when the
    /// shot was refused.
    pub result: Option<String>,
    pub message: String,
}

impl ShotResponse {
    /// Build a successful response.
    pub fn accepted(outcome: ShotOutcome, message: &str) -> Self {
        Self {
            success: true,
            result: Some(outcome.to_string()),
            message: message.to_owned(),
        }
    }

    /// Build a refusal.
    pub fn refused(result: &str, message: &str) -> Self {
        Self {
            success: false,
            result: Some(result.to_owned()),
            message: message.to_owned(),
        }
    }

    /// The outcome of the shot, if it was accepted and the result is understood.
    pub fn outcome(&self) -> Option<ShotOutcome> {
        if !self.success {
            return None;
        }
        self.result.as_deref().and_then(|r| r.parse().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_server_state() {
        let json = r#"{
            "success": true,
            "game_id": "1",
            "players": ["alice", "bob"],
            "connected": 2,
            "game_ready": true,
            "game_started": true,
            "player_status": {"alice": "battle", "bob": "placing_ships"},
            "current_turn": "alice",
            "shots": {"alice": [[1, 2], [-1, 40]], "bob": []}
        }"#;
        let snapshot: Snapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.players, vec!["alice", "bob"]);
        assert_eq!(snapshot.status_of("bob"), PlayerStatus::PlacingShips);
        assert_eq!(snapshot.shots_of("alice"), &[(1, 2), (-1, 40)]);
        assert_eq!(snapshot.opponent_of("alice"), Some("bob"));
        assert!(snapshot.can_shoot("alice"));
        assert!(!snapshot.can_shoot("bob"));
    }

    #[test]
    fn nulls_and_unknown_statuses() {
        let json = r#"{
            "players": null,
            "shots": null,
            "current_turn": null,
            "player_status": {"alice": "waiting", "bob": "spectating"}
        }"#;
        let snapshot: Snapshot = serde_json::from_str(json).unwrap();
        assert!(snapshot.players.is_empty());
        assert!(snapshot.shots.is_empty());
        assert_eq!(snapshot.current_turn, None);
        assert_eq!(snapshot.status_of("alice"), PlayerStatus::Connecting);
        assert_eq!(snapshot.status_of("bob"), PlayerStatus::Unknown);
        assert_eq!(snapshot.status_of("carol"), PlayerStatus::Unknown);
    }

    #[test]
    fn opponent_falls_back_to_shot_keys() {
        let mut snapshot = Snapshot::default();
        snapshot.shots.insert("me".into(), vec![]);
        snapshot.shots.insert("enemy".into(), vec![(0, 0)]);
        assert_eq!(snapshot.opponent_of("me"), Some("enemy"));
    }

    #[test]
    fn shot_responses() {
        let hit: ShotResponse =
            serde_json::from_str(r#"{"success": true, "result": "hit", "message": "Hit!"}"#)
                .unwrap();
        assert_eq!(hit.outcome(), Some(ShotOutcome::Hit));

        let refused: ShotResponse = serde_json::from_str(
            r#"{"success": false, "result": "not_your_turn", "message": "wait"}"#,
        )
        .unwrap();
        assert_eq!(refused.outcome(), None);

        let bare: ShotResponse = serde_json::from_str(r#"{"success": false}"#).unwrap();
        assert_eq!(bare.outcome(), None);
        assert!("sunk".parse::<ShotOutcome>().is_err());
    }
}
