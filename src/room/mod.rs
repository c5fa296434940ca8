//! Multiplayer Rooms
//!
//! Room lifecycle from lobby to finished game: join by code, ready up, vote
//! each round, advance against the resolved consensus. Every player in a
//! room answers the same seeded scenario queue, so scores are comparable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::game::round::Verdict;
use crate::game::score::points_per_round;

/// Maximum players per room.
pub const MAX_ROOM_PLAYERS: usize = 10;

/// Room code length.
pub const ROOM_CODE_LEN: usize = 6;

/// Code alphabet without the confusable characters I, O, 0, 1.
const ROOM_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Seconds per round in multiplayer rooms.
pub const MULTIPLAYER_ROUND_TIMER_SECS: u32 = 45;

/// Errors from room operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoomError {
    /// The room is at capacity.
    #[error("room is full")]
    RoomFull,

    /// The game already started (or finished).
    #[error("game in progress")]
    GameInProgress,

    /// Another player already uses this name.
    #[error("username already taken in this room")]
    UsernameTaken,

    /// Start requires at least two ready players.
    #[error("players not ready")]
    PlayersNotReady,

    /// No such player in this room.
    #[error("player not found")]
    PlayerNotFound,

    /// The operation requires an active game.
    #[error("game not in progress")]
    NotPlaying,
}

/// Room lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomStatus {
    /// Lobby: players joining and readying up.
    Waiting,
    /// Rounds in progress.
    Playing,
    /// All rounds played.
    Finished,
}

/// A player inside a room.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlayerInRoom {
    /// Player id, unique within the room.
    pub id: Uuid,
    /// Display name.
    pub username: String,
    /// Created the room.
    pub is_host: bool,
    /// Ready to start.
    pub is_ready: bool,
    /// Accumulated score.
    pub score: u32,
    /// Rounds answered correctly.
    pub correct_answers: u32,
    /// Vote for the current round, cleared on advance.
    pub current_vote: Option<Verdict>,
    /// When the player joined (leaderboard tie-break).
    pub joined_at: DateTime<Utc>,
}

/// A multiplayer room.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Room {
    /// Six-character join code.
    pub room_code: String,
    /// The host's player id.
    pub host_id: Uuid,
    /// Players, in join order.
    pub players: Vec<PlayerInRoom>,
    /// Capacity.
    pub max_players: usize,
    /// Lifecycle status.
    pub status: RoomStatus,
    /// Current round, 1-based; 0 while waiting.
    pub current_round: u32,
    /// Rounds in the game.
    pub total_rounds: u32,
    /// Seconds allowed per round.
    pub round_time_limit_secs: u32,
    /// Seed every player's queue is dealt from.
    pub scenario_seed: String,
    /// When the room was created.
    pub created_at: DateTime<Utc>,
    /// When the game started.
    pub game_started_at: Option<DateTime<Utc>>,
    /// When the game ended.
    pub game_ended_at: Option<DateTime<Utc>>,
}

/// Generate a random room code from the unambiguous alphabet.
pub fn generate_room_code() -> String {
    Uuid::new_v4()
        .as_bytes()
        .iter()
        .take(ROOM_CODE_LEN)
        .map(|b| ROOM_CODE_ALPHABET[*b as usize % ROOM_CODE_ALPHABET.len()] as char)
        .collect()
}

impl Room {
    /// Create a room with the given host. The host is ready by default.
    pub fn create(host_username: &str, total_rounds: u32, now: DateTime<Utc>) -> Self {
        let host_id = Uuid::new_v4();
        let room_code = generate_room_code();
        let scenario_seed = format!("room-{}-{}", room_code, now.timestamp_millis());

        Self {
            room_code,
            host_id,
            players: vec![PlayerInRoom {
                id: host_id,
                username: host_username.to_string(),
                is_host: true,
                is_ready: true,
                score: 0,
                correct_answers: 0,
                current_vote: None,
                joined_at: now,
            }],
            max_players: MAX_ROOM_PLAYERS,
            status: RoomStatus::Waiting,
            current_round: 0,
            total_rounds,
            round_time_limit_secs: MULTIPLAYER_ROUND_TIMER_SECS,
            scenario_seed,
            created_at: now,
            game_started_at: None,
            game_ended_at: None,
        }
    }

    /// Join the lobby. Usernames are unique per room, case-insensitive.
    pub fn join(&mut self, username: &str, now: DateTime<Utc>) -> Result<Uuid, RoomError> {
        if self.status != RoomStatus::Waiting {
            return Err(RoomError::GameInProgress);
        }
        if self.players.len() >= self.max_players {
            return Err(RoomError::RoomFull);
        }
        if self
            .players
            .iter()
            .any(|p| p.username.eq_ignore_ascii_case(username))
        {
            return Err(RoomError::UsernameTaken);
        }

        let player_id = Uuid::new_v4();
        self.players.push(PlayerInRoom {
            id: player_id,
            username: username.to_string(),
            is_host: false,
            is_ready: false,
            score: 0,
            correct_answers: 0,
            current_vote: None,
            joined_at: now,
        });
        Ok(player_id)
    }

    /// Flip a player's ready flag.
    pub fn toggle_ready(&mut self, player_id: Uuid) -> Result<(), RoomError> {
        let player = self
            .players
            .iter_mut()
            .find(|p| p.id == player_id)
            .ok_or(RoomError::PlayerNotFound)?;
        player.is_ready = !player.is_ready;
        Ok(())
    }

    /// Ready to start: at least two players, all ready.
    pub fn all_ready(&self) -> bool {
        self.players.len() >= 2 && self.players.iter().all(|p| p.is_ready)
    }

    /// Start the game, resetting per-player tallies.
    pub fn start(&mut self, now: DateTime<Utc>) -> Result<(), RoomError> {
        if !self.all_ready() {
            return Err(RoomError::PlayersNotReady);
        }
        self.status = RoomStatus::Playing;
        self.current_round = 1;
        self.game_started_at = Some(now);
        for player in &mut self.players {
            player.score = 0;
            player.correct_answers = 0;
            player.current_vote = None;
        }
        Ok(())
    }

    /// Record a player's vote for the current round.
    pub fn record_vote(&mut self, player_id: Uuid, vote: Verdict) -> Result<(), RoomError> {
        if self.status != RoomStatus::Playing {
            return Err(RoomError::NotPlaying);
        }
        let player = self
            .players
            .iter_mut()
            .find(|p| p.id == player_id)
            .ok_or(RoomError::PlayerNotFound)?;
        player.current_vote = Some(vote);
        Ok(())
    }

    /// Has every player voted this round?
    pub fn all_voted(&self) -> bool {
        self.players.iter().all(|p| p.current_vote.is_some())
    }

    /// Score the current round against the resolved consensus and move on.
    ///
    /// Each player whose vote matched earns `round(100 / total_rounds)`
    /// points; votes are cleared for the next round. After the last round
    /// the room flips to `Finished`.
    pub fn advance_round(&mut self, consensus: Verdict, now: DateTime<Utc>) -> Result<(), RoomError> {
        if self.status != RoomStatus::Playing {
            return Err(RoomError::NotPlaying);
        }

        let points = points_per_round(self.total_rounds);
        for player in &mut self.players {
            if player.current_vote == Some(consensus) {
                player.score += points;
                player.correct_answers += 1;
            }
            player.current_vote = None;
        }

        if self.current_round >= self.total_rounds {
            self.status = RoomStatus::Finished;
            self.game_ended_at = Some(now);
        } else {
            self.current_round += 1;
        }
        Ok(())
    }

    /// Players ranked for the room leaderboard: score desc, then correct
    /// answers desc, then earliest join.
    pub fn leaderboard(&self) -> Vec<&PlayerInRoom> {
        let mut ranked: Vec<&PlayerInRoom> = self.players.iter().collect();
        ranked.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then(b.correct_answers.cmp(&a.correct_answers))
                .then(a.joined_at.cmp(&b.joined_at))
        });
        ranked
    }

    /// XP earned by a player: base score, plus placement bonus (50/30/15
    /// for the podium), plus 10 for finishing the game, plus an accuracy
    /// bonus (25/15/5 at 80/60/50 percent).
    pub fn xp_for(&self, player_id: Uuid) -> u32 {
        let ranked = self.leaderboard();
        let Some(position) = ranked.iter().position(|p| p.id == player_id) else {
            return 0;
        };
        let player = ranked[position];

        let mut xp = player.score;
        xp += match position {
            0 => 50,
            1 => 30,
            2 => 15,
            _ => 0,
        };
        if self.status == RoomStatus::Finished {
            xp += 10;
        }

        if self.total_rounds > 0 {
            let accuracy = player.correct_answers as f64 / self.total_rounds as f64;
            xp += if accuracy >= 0.8 {
                25
            } else if accuracy >= 0.6 {
                15
            } else if accuracy >= 0.5 {
                5
            } else {
                0
            };
        }
        xp
    }
}

/// A recommended room configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoomPreset {
    /// Preset name.
    pub name: &'static str,
    /// Rounds per game.
    pub rounds: u32,
    /// Seconds per round.
    pub timer_secs: u32,
}

/// Recommended configurations for target game lengths.
pub const ROOM_PRESETS: [RoomPreset; 3] = [
    RoomPreset { name: "quick", rounds: 5, timer_secs: 30 },
    RoomPreset { name: "standard", rounds: 10, timer_secs: 45 },
    RoomPreset { name: "extended", rounds: 15, timer_secs: 45 },
];

/// Estimated game duration in minutes.
///
/// Accounts for voting time plus consensus resolution and transition
/// overhead (~8s per round).
pub fn estimate_duration_minutes(total_rounds: u32, secs_per_round: u32) -> u32 {
    let total_secs = total_rounds * (secs_per_round + 8);
    total_secs.div_ceil(60)
}

// =============================================================================
// TESTS
// =============================================================================
