use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use super::models::{PlayerId, PlayerModel, RoomId, RoomModel, RoomStatus, RoomType};
use crate::shared::AppError;

/// Data needed to seat a new player
#[derive(Debug, Clone)]
pub struct NewPlayer {
    pub identity: String,
    pub username: String,
    pub connection_id: String,
    pub is_host: bool,
}

/// Result of attempting to join a room
#[derive(Debug, Clone)]
pub enum JoinRoomResult {
    /// Player was seated, returns the updated room and the new player row
    Success { room: RoomModel, player: PlayerModel },
    /// Room is at capacity
    RoomFull,
    /// Room does not exist
    RoomNotFound,
    /// Room has already started its game
    GameInProgress,
    /// Room has ended
    RoomFinished,
    /// The identity already holds a seat here; nothing was inserted
    AlreadySeated { room: RoomModel, player: PlayerModel },
}

/// Result of attempting to remove a player
#[derive(Debug, Clone)]
pub enum LeaveRoomResult {
    /// Player was removed. `was_drawer` is set when they held the current turn.
    Success {
        room: RoomModel,
        removed: PlayerModel,
        was_drawer: bool,
    },
    PlayerNotInRoom,
    RoomNotFound,
}

/// Trait for room and player persistence
#[async_trait]
pub trait RoomRepository: Send + Sync {
    /// Stores a new room and assigns its id. Fails with `Conflict` if the code is taken.
    async fn create_room(&self, room: RoomModel) -> Result<RoomModel, AppError>;
    async fn get_room(&self, room_id: RoomId) -> Result<Option<RoomModel>, AppError>;
    async fn get_room_by_code(&self, code: &str) -> Result<Option<RoomModel>, AppError>;
    async fn code_exists(&self, code: &str) -> Result<bool, AppError>;
    async fn list_rooms(&self) -> Result<Vec<RoomModel>, AppError>;

    /// Oldest waiting public room with a free seat
    async fn find_joinable_public_room(&self) -> Result<Option<RoomModel>, AppError>;

    /// Replaces the stored room with `room`
    async fn update_room(&self, room: &RoomModel) -> Result<(), AppError>;

    /// Atomically checks status and capacity, then seats the player.
    /// Concurrent joiners can never push a room past its capacity.
    async fn try_join_room(
        &self,
        room_id: RoomId,
        new_player: NewPlayer,
    ) -> Result<JoinRoomResult, AppError>;

    /// Atomically removes a player, finishing the room if it becomes empty
    async fn remove_player(
        &self,
        room_id: RoomId,
        player_id: PlayerId,
    ) -> Result<LeaveRoomResult, AppError>;

    async fn find_player_by_identity(
        &self,
        identity: &str,
    ) -> Result<Option<(RoomId, PlayerModel)>, AppError>;

    async fn find_player_by_connection(
        &self,
        connection_id: &str,
    ) -> Result<Option<(RoomId, PlayerModel)>, AppError>;
}

/// In-memory implementation of RoomRepository for development and testing
pub struct InMemoryRoomRepository {
    rooms: Arc<RwLock<HashMap<RoomId, RoomModel>>>,
    next_room_id: AtomicI64,
    next_player_id: AtomicI64,
}

impl Default for InMemoryRoomRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRoomRepository {
    pub fn new() -> Self {
        Self {
            rooms: Arc::new(RwLock::new(HashMap::new())),
            next_room_id: AtomicI64::new(1),
            next_player_id: AtomicI64::new(1),
        }
    }
}

#[async_trait]
impl RoomRepository for InMemoryRoomRepository {
    #[instrument(skip(self, room), fields(code = %room.code))]
    async fn create_room(&self, mut room: RoomModel) -> Result<RoomModel, AppError> {
        let mut rooms = self.rooms.write().await;
        if rooms.values().any(|r| r.code == room.code) {
            warn!(code = %room.code, "Room code already in use");
            return Err(AppError::Conflict("Room code already exists".to_string()));
        }

        room.id = self.next_room_id.fetch_add(1, Ordering::Relaxed);
        rooms.insert(room.id, room.clone());

        debug!(room_id = room.id, code = %room.code, "Room created in memory");
        Ok(room)
    }

    async fn get_room(&self, room_id: RoomId) -> Result<Option<RoomModel>, AppError> {
        let rooms = self.rooms.read().await;
        Ok(rooms.get(&room_id).cloned())
    }

    async fn get_room_by_code(&self, code: &str) -> Result<Option<RoomModel>, AppError> {
        let code = code.to_uppercase();
        let rooms = self.rooms.read().await;
        Ok(rooms.values().find(|r| r.code == code).cloned())
    }

    async fn code_exists(&self, code: &str) -> Result<bool, AppError> {
        let rooms = self.rooms.read().await;
        Ok(rooms.values().any(|r| r.code == code))
    }

    async fn list_rooms(&self) -> Result<Vec<RoomModel>, AppError> {
        let rooms = self.rooms.read().await;
        Ok(rooms.values().cloned().collect())
    }

    async fn find_joinable_public_room(&self) -> Result<Option<RoomModel>, AppError> {
        let rooms = self.rooms.read().await;
        let room = rooms
            .values()
            .filter(|r| {
                r.room_type == RoomType::Public && r.status == RoomStatus::Waiting && !r.is_full()
            })
            .min_by_key(|r| (r.created_at, r.id))
            .cloned();
        Ok(room)
    }

    async fn update_room(&self, room: &RoomModel) -> Result<(), AppError> {
        let mut rooms = self.rooms.write().await;
        match rooms.get_mut(&room.id) {
            Some(stored) => {
                *stored = room.clone();
                Ok(())
            }
            None => Err(AppError::NotFound("Room not found".to_string())),
        }
    }

    #[instrument(skip(self, new_player), fields(identity = %new_player.identity))]
    async fn try_join_room(
        &self,
        room_id: RoomId,
        new_player: NewPlayer,
    ) -> Result<JoinRoomResult, AppError> {
        let mut rooms = self.rooms.write().await;

        let room = match rooms.get_mut(&room_id) {
            Some(room) => room,
            None => {
                debug!(room_id, "Room not found");
                return Ok(JoinRoomResult::RoomNotFound);
            }
        };

        if room.status == RoomStatus::Finished {
            return Ok(JoinRoomResult::RoomFinished);
        }

        if let Some(player) = room.player_by_identity(&new_player.identity) {
            debug!(room_id, player_id = player.id, "Identity already seated");
            return Ok(JoinRoomResult::AlreadySeated {
                player: player.clone(),
                room: room.clone(),
            });
        }

        if room.status == RoomStatus::Playing {
            return Ok(JoinRoomResult::GameInProgress);
        }

        if room.is_full() {
            debug!(room_id, current_count = room.player_count(), "Room is full");
            return Ok(JoinRoomResult::RoomFull);
        }

        let player = PlayerModel {
            id: self.next_player_id.fetch_add(1, Ordering::Relaxed),
            identity: new_player.identity,
            username: new_player.username,
            connection_id: new_player.connection_id,
            score: 0,
            is_drawing: false,
            has_guessed_correctly: false,
            guess_time: None,
            is_host: new_player.is_host,
            joined_at: Utc::now(),
        };
        room.players.push(player.clone());

        info!(
            room_id,
            player_id = player.id,
            new_player_count = room.player_count(),
            "Player joined room (atomic)"
        );

        Ok(JoinRoomResult::Success {
            room: room.clone(),
            player,
        })
    }

    #[instrument(skip(self))]
    async fn remove_player(
        &self,
        room_id: RoomId,
        player_id: PlayerId,
    ) -> Result<LeaveRoomResult, AppError> {
        let mut rooms = self.rooms.write().await;

        let room = match rooms.get_mut(&room_id) {
            Some(room) => room,
            None => return Ok(LeaveRoomResult::RoomNotFound),
        };

        let Some((removed, was_drawer)) = room.remove_player(player_id) else {
            debug!(room_id, player_id, "Player not in room");
            return Ok(LeaveRoomResult::PlayerNotInRoom);
        };

        info!(
            room_id,
            player_id,
            remaining = room.player_count(),
            was_drawer,
            "Player removed from room (atomic)"
        );

        Ok(LeaveRoomResult::Success {
            room: room.clone(),
            removed,
            was_drawer,
        })
    }

    async fn find_player_by_identity(
        &self,
        identity: &str,
    ) -> Result<Option<(RoomId, PlayerModel)>, AppError> {
        let rooms = self.rooms.read().await;
        Ok(rooms
            .values()
            .find_map(|r| r.player_by_identity(identity).map(|p| (r.id, p.clone()))))
    }

    async fn find_player_by_connection(
        &self,
        connection_id: &str,
    ) -> Result<Option<(RoomId, PlayerModel)>, AppError> {
        let rooms = self.rooms.read().await;
        Ok(rooms.values().find_map(|r| {
            r.players
                .iter()
                .find(|p| p.connection_id == connection_id)
                .map(|p| (r.id, p.clone()))
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::room::models::RoomSettings;

    /// Test helper functions for creating test data
    mod helpers {
        use super::*;

        pub fn public_room(code: &str) -> RoomModel {
            RoomModel::new(
                code.to_string(),
                RoomType::Public,
                RoomSettings::public_defaults(),
            )
        }

        pub fn new_player(name: &str) -> NewPlayer {
            NewPlayer {
                identity: format!("id-{}", name),
                username: name.to_string(),
                connection_id: format!("conn-{}", name),
                is_host: false,
            }
        }
    }

    use helpers::*;

    async fn join(repo: &InMemoryRoomRepository, room_id: RoomId, name: &str) -> JoinRoomResult {
        repo.try_join_room(room_id, new_player(name)).await.unwrap()
    }

    #[tokio::test]
    async fn test_create_and_get_room() {
        let repo = InMemoryRoomRepository::new();
        let room = repo.create_room(public_room("ABC123")).await.unwrap();
        assert!(room.id > 0);

        let by_id = repo.get_room(room.id).await.unwrap().unwrap();
        assert_eq!(by_id.code, "ABC123");

        let by_code = repo.get_room_by_code("abc123").await.unwrap().unwrap();
        assert_eq!(by_code.id, room.id);
    }

    #[tokio::test]
    async fn test_create_duplicate_code_conflicts() {
        let repo = InMemoryRoomRepository::new();
        repo.create_room(public_room("ABC123")).await.unwrap();

        let result = repo.create_room(public_room("ABC123")).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
        assert_eq!(repo.list_rooms().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_join_until_full() {
        let repo = InMemoryRoomRepository::new();
        let room = repo.create_room(public_room("ABC123")).await.unwrap();

        for name in ["alice", "bob", "carol"] {
            assert!(matches!(
                join(&repo, room.id, name).await,
                JoinRoomResult::Success { .. }
            ));
        }
        assert!(matches!(
            join(&repo, room.id, "dave").await,
            JoinRoomResult::RoomFull
        ));
    }

    #[tokio::test]
    async fn test_join_rejected_when_playing_or_missing() {
        let repo = InMemoryRoomRepository::new();
        let mut room = repo.create_room(public_room("ABC123")).await.unwrap();
        room.status = RoomStatus::Playing;
        repo.update_room(&room).await.unwrap();

        assert!(matches!(
            join(&repo, room.id, "alice").await,
            JoinRoomResult::GameInProgress
        ));
        assert!(matches!(
            join(&repo, 999, "alice").await,
            JoinRoomResult::RoomNotFound
        ));
    }

    #[tokio::test]
    async fn test_concurrent_joins_never_exceed_capacity() {
        let repo = Arc::new(InMemoryRoomRepository::new());
        let room = repo.create_room(public_room("ABC123")).await.unwrap();

        let mut handles = Vec::new();
        for i in 0..10 {
            let repo = Arc::clone(&repo);
            handles.push(tokio::spawn(async move {
                repo.try_join_room(room.id, new_player(&format!("p{}", i)))
                    .await
                    .unwrap()
            }));
        }

        let mut joined = 0;
        for handle in handles {
            if matches!(handle.await.unwrap(), JoinRoomResult::Success { .. }) {
                joined += 1;
            }
        }
        assert_eq!(joined, 3);
        assert_eq!(repo.get_room(room.id).await.unwrap().unwrap().player_count(), 3);
    }

    #[tokio::test]
    async fn test_join_same_identity_twice_keeps_one_seat() {
        let repo = InMemoryRoomRepository::new();
        let room = repo.create_room(public_room("ABC123")).await.unwrap();
        let JoinRoomResult::Success { player: first, .. } = join(&repo, room.id, "alice").await
        else {
            panic!("join failed");
        };

        let second = NewPlayer {
            connection_id: "conn-alice-2".to_string(),
            ..new_player("alice")
        };
        match repo.try_join_room(room.id, second).await.unwrap() {
            JoinRoomResult::AlreadySeated { room, player } => {
                assert_eq!(player.id, first.id);
                assert_eq!(player.connection_id, "conn-alice");
                assert_eq!(room.player_count(), 1);
            }
            other => panic!("expected AlreadySeated, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_remove_last_player_finishes_room() {
        let repo = InMemoryRoomRepository::new();
        let room = repo.create_room(public_room("ABC123")).await.unwrap();
        let JoinRoomResult::Success { player, .. } = join(&repo, room.id, "alice").await else {
            panic!("join failed");
        };

        match repo.remove_player(room.id, player.id).await.unwrap() {
            LeaveRoomResult::Success { room, removed, .. } => {
                assert_eq!(removed.username, "alice");
                assert_eq!(room.status, RoomStatus::Finished);
            }
            other => panic!("unexpected result: {:?}", other),
        }

        assert!(matches!(
            repo.remove_player(room.id, player.id).await.unwrap(),
            LeaveRoomResult::PlayerNotInRoom
        ));
    }

    #[tokio::test]
    async fn test_find_joinable_public_room_prefers_oldest() {
        let repo = InMemoryRoomRepository::new();
        let mut older = public_room("AAAAAA");
        older.created_at = Utc::now() - chrono::Duration::minutes(5);
        let older = repo.create_room(older).await.unwrap();
        repo.create_room(public_room("BBBBBB")).await.unwrap();

        let mut private = public_room("CCCCCC");
        private.room_type = RoomType::Private;
        private.created_at = Utc::now() - chrono::Duration::minutes(10);
        repo.create_room(private).await.unwrap();

        let found = repo.find_joinable_public_room().await.unwrap().unwrap();
        assert_eq!(found.id, older.id);
    }

    #[tokio::test]
    async fn test_find_player_lookups() {
        let repo = InMemoryRoomRepository::new();
        let room = repo.create_room(public_room("ABC123")).await.unwrap();
        join(&repo, room.id, "alice").await;

        let (room_id, player) = repo
            .find_player_by_identity("id-alice")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(room_id, room.id);
        assert_eq!(player.username, "alice");

        let (_, by_conn) = repo
            .find_player_by_connection("conn-alice")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_conn.id, player.id);

        assert!(repo.find_player_by_identity("nobody").await.unwrap().is_none());
    }
}
