use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::room::models::RoomId;

/// Final standings of one finished game
#[derive(Debug, Clone)]
pub struct GameResult {
    pub room_id: RoomId,
    pub game_number: u32,
    pub players: Vec<PlayerGameResult>,
    pub completed_at: DateTime<Utc>,
}

impl GameResult {
    pub fn winners(&self) -> impl Iterator<Item = &PlayerGameResult> {
        self.players.iter().filter(|p| p.won)
    }
}

#[derive(Debug, Clone)]
pub struct PlayerGameResult {
    pub identity: String,
    pub username: String,
    pub final_score: i32,
    pub won: bool,
    pub correct_guesses: u32,
    pub best_guess_seconds: Option<f64>,
}

/// Lifetime stats of one identity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub identity: String,
    pub username: String,
    pub total_score: i64,
    pub games_played: u32,
    pub games_won: u32,
    pub correct_guesses: u32,
    pub best_guess_seconds: Option<f64>,
    pub last_played_at: Option<DateTime<Utc>>,
}

/// Leaderboard row as served over HTTP, without the private identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntryResponse {
    pub rank: usize,
    pub username: String,
    pub total_score: i64,
    pub games_played: u32,
    pub games_won: u32,
    pub correct_guesses: u32,
    pub best_guess_seconds: Option<f64>,
}

impl LeaderboardEntryResponse {
    pub fn from_entry(rank: usize, entry: &LeaderboardEntry) -> Self {
        Self {
            rank,
            username: entry.username.clone(),
            total_score: entry.total_score,
            games_played: entry.games_played,
            games_won: entry.games_won,
            correct_guesses: entry.correct_guesses,
            best_guess_seconds: entry.best_guess_seconds,
        }
    }
}
