use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::{
    models::{
        generate_room_code, normalize_room_code, PlayerId, PlayerModel, RoomId, RoomModel,
        RoomSettings, RoomType,
    },
    repository::{JoinRoomResult, LeaveRoomResult, NewPlayer, RoomRepository},
    types::{scores_of, PlayerScore, RoomResponse},
};
use crate::shared::AppError;

const MAX_CODE_ATTEMPTS: usize = 64;

/// Service for room business logic on top of the repository
pub struct RoomService {
    repository: Arc<dyn RoomRepository + Send + Sync>,
}

impl RoomService {
    pub fn new(repository: Arc<dyn RoomRepository + Send + Sync>) -> Self {
        Self { repository }
    }

    /// Creates a room under a fresh unique code, retrying on collision
    #[instrument(skip(self, settings))]
    pub async fn create_room(
        &self,
        room_type: RoomType,
        settings: RoomSettings,
    ) -> Result<RoomModel, AppError> {
        settings.validate()?;

        for attempt in 0..MAX_CODE_ATTEMPTS {
            let code = generate_room_code();
            if self.repository.code_exists(&code).await? {
                debug!(attempt, code = %code, "Room code collision, retrying");
                continue;
            }

            match self
                .repository
                .create_room(RoomModel::new(code, room_type, settings.clone()))
                .await
            {
                Ok(room) => {
                    info!(room_id = room.id, code = %room.code, room_type = %room_type, "Room created");
                    return Ok(room);
                }
                // Lost a race for the same code
                Err(AppError::Conflict(_)) => continue,
                Err(e) => return Err(e),
            }
        }

        warn!("Exhausted room code attempts");
        Err(AppError::Internal)
    }

    /// Oldest waiting public room with space, or a new one.
    /// Callers serialize this with the matchmaking lock.
    pub async fn find_or_create_public_room(&self) -> Result<RoomModel, AppError> {
        if let Some(room) = self.repository.find_joinable_public_room().await? {
            debug!(room_id = room.id, "Found joinable public room");
            return Ok(room);
        }
        self.create_room(RoomType::Public, RoomSettings::public_defaults())
            .await
    }

    pub async fn get_room(&self, room_id: RoomId) -> Result<Option<RoomModel>, AppError> {
        self.repository.get_room(room_id).await
    }

    /// Looks a room up by a user supplied code
    pub async fn get_room_by_code(&self, code: &str) -> Result<Option<RoomModel>, AppError> {
        let code = normalize_room_code(code)?;
        self.repository.get_room_by_code(&code).await
    }

    pub async fn require_room(&self, room_id: RoomId) -> Result<RoomModel, AppError> {
        self.repository
            .get_room(room_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Room not found".to_string()))
    }

    pub async fn room_details(&self, room_id: RoomId) -> Result<RoomResponse, AppError> {
        let room = self.require_room(room_id).await?;
        Ok(RoomResponse::from(&room))
    }

    pub async fn scores(&self, room_id: RoomId) -> Result<Vec<PlayerScore>, AppError> {
        let room = self.require_room(room_id).await?;
        Ok(scores_of(&room))
    }

    pub async fn list_rooms(&self) -> Result<Vec<RoomModel>, AppError> {
        self.repository.list_rooms().await
    }

    pub async fn update_room(&self, room: &RoomModel) -> Result<(), AppError> {
        self.repository.update_room(room).await
    }

    pub async fn try_join_room(
        &self,
        room_id: RoomId,
        new_player: NewPlayer,
    ) -> Result<JoinRoomResult, AppError> {
        self.repository.try_join_room(room_id, new_player).await
    }

    pub async fn remove_player(
        &self,
        room_id: RoomId,
        player_id: PlayerId,
    ) -> Result<LeaveRoomResult, AppError> {
        self.repository.remove_player(room_id, player_id).await
    }

    pub async fn find_player_by_identity(
        &self,
        identity: &str,
    ) -> Result<Option<(RoomId, PlayerModel)>, AppError> {
        self.repository.find_player_by_identity(identity).await
    }

    pub async fn find_player_by_connection(
        &self,
        connection_id: &str,
    ) -> Result<Option<(RoomId, PlayerModel)>, AppError> {
        self.repository.find_player_by_connection(connection_id).await
    }
}
