use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::room::models::{PlayerId, RoomId};
use crate::shared::AppError;

/// One scoring event within a game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameScore {
    pub room_id: RoomId,
    pub game_number: u32,
    pub round: u32,
    pub player_id: PlayerId,
    pub identity: String,
    pub points: i32,
    /// Set for guesser entries, empty for drawer bonuses
    pub guessed_word: Option<String>,
    pub elapsed_seconds: f64,
    pub recorded_at: DateTime<Utc>,
}

impl GameScore {
    pub fn is_correct_guess(&self) -> bool {
        self.guessed_word.is_some()
    }
}

/// Per-game score ledger
#[async_trait]
pub trait ScoreLedger: Send + Sync {
    async fn record(&self, score: GameScore) -> Result<(), AppError>;

    async fn entries_for_game(
        &self,
        room_id: RoomId,
        game_number: u32,
    ) -> Result<Vec<GameScore>, AppError>;
}

#[derive(Default)]
pub struct InMemoryScoreLedger {
    entries: Arc<RwLock<Vec<GameScore>>>,
}

impl InMemoryScoreLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ScoreLedger for InMemoryScoreLedger {
    async fn record(&self, score: GameScore) -> Result<(), AppError> {
        self.entries.write().await.push(score);
        Ok(())
    }

    async fn entries_for_game(
        &self,
        room_id: RoomId,
        game_number: u32,
    ) -> Result<Vec<GameScore>, AppError> {
        let entries = self.entries.read().await;
        Ok(entries
            .iter()
            .filter(|e| e.room_id == room_id && e.game_number == game_number)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(room_id: RoomId, game_number: u32, guessed: Option<&str>) -> GameScore {
        GameScore {
            room_id,
            game_number,
            round: 1,
            player_id: 1,
            identity: "id-alice".to_string(),
            points: 150,
            guessed_word: guessed.map(str::to_string),
            elapsed_seconds: 12.5,
            recorded_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_entries_scoped_to_room_and_game() {
        let ledger = InMemoryScoreLedger::new();
        ledger.record(score(1, 1, Some("cat"))).await.unwrap();
        ledger.record(score(1, 1, None)).await.unwrap();
        ledger.record(score(1, 2, Some("dog"))).await.unwrap();
        ledger.record(score(2, 1, Some("owl"))).await.unwrap();

        let entries = ledger.entries_for_game(1, 1).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries.iter().filter(|e| e.is_correct_guess()).count(), 1);
        assert!(ledger.entries_for_game(3, 1).await.unwrap().is_empty());
    }
}
