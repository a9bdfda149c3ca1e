use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

use crate::{
    game::{ledger::ScoreLedger, locks::KeyedLocks},
    room::models::{RoomId, RoomModel},
};

use super::{
    repository::LeaderboardRepository, GameResult, LeaderboardEntry, LeaderboardRecorder,
    PlayerGameResult, StatsError,
};

/// Folds finished games into lifetime leaderboard stats
pub struct LeaderboardService {
    repository: Arc<dyn LeaderboardRepository>,
    ledger: Arc<dyn ScoreLedger>,
    room_locks: KeyedLocks<RoomId>,
    recorded_games: RwLock<HashSet<(RoomId, u32)>>,
}

impl LeaderboardService {
    pub fn new(repository: Arc<dyn LeaderboardRepository>, ledger: Arc<dyn ScoreLedger>) -> Self {
        Self {
            repository,
            ledger,
            room_locks: KeyedLocks::new(),
            recorded_games: RwLock::new(HashSet::new()),
        }
    }

    /// Builds the game result for `room` and records it.
    /// Returns `None` if this game was already recorded.
    #[instrument(skip(self, room), fields(room_id = room.id, game_number = room.game_number))]
    pub async fn process_finished_game(
        &self,
        room: &RoomModel,
    ) -> Result<Option<GameResult>, StatsError> {
        if room.players.is_empty() {
            return Err(StatsError::Validation(
                "Cannot record a game without players".to_string(),
            ));
        }

        let room_lock = self.room_locks.get(&room.id).await;
        let _guard = room_lock.lock().await;

        let key = (room.id, room.game_number);
        if self.recorded_games.read().await.contains(&key) {
            debug!("Game already recorded, skipping");
            return Ok(None);
        }

        let entries = self
            .ledger
            .entries_for_game(room.id, room.game_number)
            .await?;

        let top_score = room.players.iter().map(|p| p.score).max().unwrap_or(0);

        let players = room
            .players
            .iter()
            .map(|player| {
                let guesses: Vec<f64> = entries
                    .iter()
                    .filter(|e| e.player_id == player.id && e.is_correct_guess())
                    .map(|e| e.elapsed_seconds)
                    .collect();

                PlayerGameResult {
                    identity: player.identity.clone(),
                    username: player.username.clone(),
                    final_score: player.score,
                    won: top_score > 0 && player.score == top_score,
                    correct_guesses: guesses.len() as u32,
                    best_guess_seconds: guesses.into_iter().reduce(f64::min),
                }
            })
            .collect();

        let game_result = GameResult {
            room_id: room.id,
            game_number: room.game_number,
            players,
            completed_at: chrono::Utc::now(),
        };

        self.repository.record_game(&game_result).await?;
        self.recorded_games.write().await.insert(key);

        info!(
            players = game_result.players.len(),
            winners = game_result.winners().count(),
            "Game recorded on leaderboard"
        );

        Ok(Some(game_result))
    }

    pub async fn top(&self, count: usize) -> Result<Vec<LeaderboardEntry>, StatsError> {
        self.repository.top(count).await
    }

    pub async fn entry_for(&self, identity: &str) -> Result<Option<LeaderboardEntry>, StatsError> {
        self.repository.get_entry(identity).await
    }

    /// Rooms whose recorded games are still tracked for dedupe
    pub async fn tracked_rooms(&self) -> usize {
        let rooms: HashSet<RoomId> = self
            .recorded_games
            .read()
            .await
            .iter()
            .map(|(id, _)| *id)
            .collect();
        rooms.len()
    }
}

#[async_trait]
impl LeaderboardRecorder for LeaderboardService {
    async fn record_game_end(&self, room: &RoomModel) -> Result<(), StatsError> {
        self.process_finished_game(room).await.map(|_| ())
    }

    /// Drops the dedupe state kept for a room that will not finish another game
    async fn forget_room(&self, room_id: RoomId) {
        self.recorded_games
            .write()
            .await
            .retain(|(id, _)| *id != room_id);
        self.room_locks.release_if_idle(&room_id).await;
        debug!(room_id, "Leaderboard state for room released");
    }
}
