pub mod handlers;
pub mod service;

mod errors;
pub mod models;
pub mod repository;

pub use errors::StatsError;
pub use models::*;
pub use repository::{InMemoryLeaderboardRepository, LeaderboardRepository};
pub use service::LeaderboardService;

use async_trait::async_trait;

use crate::room::models::{RoomId, RoomModel};

/// Notified once for every game that runs to completion
#[async_trait]
pub trait LeaderboardRecorder: Send + Sync {
    async fn record_game_end(&self, room: &RoomModel) -> Result<(), StatsError>;

    /// Called once a room is finished and empty
    async fn forget_room(&self, room_id: RoomId);
}
