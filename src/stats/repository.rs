use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::{models::LeaderboardEntry, GameResult, StatsError};

#[async_trait]
pub trait LeaderboardRepository: Send + Sync {
    async fn record_game(&self, game_result: &GameResult) -> Result<(), StatsError>;
    async fn get_entry(&self, identity: &str) -> Result<Option<LeaderboardEntry>, StatsError>;
    /// Highest total scores first
    async fn top(&self, count: usize) -> Result<Vec<LeaderboardEntry>, StatsError>;
}

#[derive(Debug, Default)]
pub struct InMemoryLeaderboardRepository {
    entries: Arc<RwLock<HashMap<String, LeaderboardEntry>>>,
}

impl InMemoryLeaderboardRepository {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl LeaderboardRepository for InMemoryLeaderboardRepository {
    async fn record_game(&self, game_result: &GameResult) -> Result<(), StatsError> {
        let mut entries = self.entries.write().await;

        for player in &game_result.players {
            let entry = entries
                .entry(player.identity.clone())
                .or_insert_with(|| LeaderboardEntry {
                    identity: player.identity.clone(),
                    ..LeaderboardEntry::default()
                });

            entry.username = player.username.clone();
            entry.games_played += 1;
            entry.total_score += i64::from(player.final_score);
            entry.correct_guesses += player.correct_guesses;
            if player.won {
                entry.games_won += 1;
            }
            if let Some(best) = player.best_guess_seconds {
                entry.best_guess_seconds = Some(match entry.best_guess_seconds {
                    Some(current) => current.min(best),
                    None => best,
                });
            }
            entry.last_played_at = Some(game_result.completed_at);
        }

        Ok(())
    }

    async fn get_entry(&self, identity: &str) -> Result<Option<LeaderboardEntry>, StatsError> {
        let entries = self.entries.read().await;
        Ok(entries.get(identity).cloned())
    }

    async fn top(&self, count: usize) -> Result<Vec<LeaderboardEntry>, StatsError> {
        let entries = self.entries.read().await;
        let mut ranked: Vec<LeaderboardEntry> = entries.values().cloned().collect();
        ranked.sort_by(|a, b| {
            b.total_score
                .cmp(&a.total_score)
                .then(b.games_won.cmp(&a.games_won))
                .then(a.username.cmp(&b.username))
        });
        ranked.truncate(count);
        Ok(ranked)
    }
}
