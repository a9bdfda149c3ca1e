use std::future::Future;
use std::sync::Arc;

use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info, instrument, warn};

use super::{
    ledger::{InMemoryScoreLedger, ScoreLedger},
    locks::KeyedLocks,
    timer::TurnTimerManager,
};
use crate::{
    config::GameConfig,
    reconnect::{InMemoryPlayerRoomCache, PlayerRoomCache, PlayerRoomInfo},
    room::{
        models::{PlayerId, PlayerModel, RoomId, RoomModel, RoomStatus, RoomType, TurnPhase},
        repository::{JoinRoomResult, LeaveRoomResult, NewPlayer},
        service::RoomService,
        types::{
            scores_of, CreateRoomRequest, JoinRoomResponse, RoomResponse,
            RoomStatusResponse,
        },
    },
    shared::AppError,
    stats::LeaderboardRecorder,
    websockets::{ConnectionManager, MessageBroadcaster, WebSocketMessage},
    words::WordBank,
};

/// Who is calling: the socket handle plus the authenticated identity behind it
#[derive(Debug, Clone)]
pub struct ClientContext {
    pub connection_id: String,
    pub identity: String,
    pub username: String,
}

/// A successful seat in a room
#[derive(Debug, Clone)]
pub struct JoinOutcome {
    pub room: RoomModel,
    pub player: PlayerModel,
}

impl JoinOutcome {
    pub fn response(&self) -> JoinRoomResponse {
        JoinRoomResponse {
            room_id: self.room.id,
            room_code: self.room.code.clone(),
            player_id: self.player.id,
            is_host: self.player.is_host,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum RemovalReason {
    Left,
    Disconnected,
    Kicked,
    /// Joined a different room
    Evicted,
}

const PUBLIC_JOIN_ATTEMPTS: usize = 3;

/// Drives room lifecycle and turns. Every mutation of a room happens under that
/// room's lock; public matchmaking additionally holds the matchmaking lock.
///
/// Joins hold the caller's identity lock for the whole evict-then-seat step.
/// Lock order: identity, matchmaking, room, timers.
pub struct RoomOrchestrator {
    pub(super) rooms: Arc<RoomService>,
    pub(super) cache: Arc<dyn PlayerRoomCache>,
    pub(super) ledger: Arc<dyn ScoreLedger>,
    pub(super) leaderboard: Option<Arc<dyn LeaderboardRecorder>>,
    pub(super) words: Arc<WordBank>,
    pub(super) timers: TurnTimerManager,
    pub(super) broadcaster: MessageBroadcaster,
    pub(super) config: GameConfig,
    room_locks: KeyedLocks<RoomId>,
    identity_locks: KeyedLocks<String>,
    matchmaking: AsyncMutex<()>,
}

pub struct RoomOrchestratorBuilder {
    rooms: Arc<RoomService>,
    connection_manager: Arc<dyn ConnectionManager>,
    cache: Option<Arc<dyn PlayerRoomCache>>,
    ledger: Option<Arc<dyn ScoreLedger>>,
    leaderboard: Option<Arc<dyn LeaderboardRecorder>>,
    words: Option<Arc<WordBank>>,
    config: GameConfig,
}

impl RoomOrchestratorBuilder {
    pub fn with_cache(mut self, cache: Arc<dyn PlayerRoomCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_ledger(mut self, ledger: Arc<dyn ScoreLedger>) -> Self {
        self.ledger = Some(ledger);
        self
    }

    pub fn with_leaderboard(mut self, leaderboard: Arc<dyn LeaderboardRecorder>) -> Self {
        self.leaderboard = Some(leaderboard);
        self
    }

    pub fn with_words(mut self, words: Arc<WordBank>) -> Self {
        self.words = Some(words);
        self
    }

    pub fn with_config(mut self, config: GameConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Arc<RoomOrchestrator> {
        let cache = self.cache.unwrap_or_else(|| {
            Arc::new(InMemoryPlayerRoomCache::from_std_ttl(self.config.reconnect_ttl))
        });

        Arc::new(RoomOrchestrator {
            rooms: self.rooms,
            cache,
            ledger: self
                .ledger
                .unwrap_or_else(|| Arc::new(InMemoryScoreLedger::new())),
            leaderboard: self.leaderboard,
            words: self.words.unwrap_or_else(|| Arc::new(WordBank::new())),
            timers: TurnTimerManager::new(),
            broadcaster: MessageBroadcaster::new(self.connection_manager),
            config: self.config,
            room_locks: KeyedLocks::new(),
            identity_locks: KeyedLocks::new(),
            matchmaking: AsyncMutex::new(()),
        })
    }
}

impl RoomOrchestrator {
    pub fn builder(
        rooms: Arc<RoomService>,
        connection_manager: Arc<dyn ConnectionManager>,
    ) -> RoomOrchestratorBuilder {
        RoomOrchestratorBuilder {
            rooms,
            connection_manager,
            cache: None,
            ledger: None,
            leaderboard: None,
            words: None,
            config: GameConfig::default(),
        }
    }

    pub fn broadcaster(&self) -> &MessageBroadcaster {
        &self.broadcaster
    }

    pub fn timers(&self) -> &TurnTimerManager {
        &self.timers
    }

    pub fn cache(&self) -> &Arc<dyn PlayerRoomCache> {
        &self.cache
    }

    pub(super) async fn room_lock(&self, room_id: RoomId) -> Arc<AsyncMutex<()>> {
        self.room_locks.get(&room_id).await
    }

    /// Number of per-room locks currently allocated
    pub async fn tracked_room_locks(&self) -> usize {
        self.room_locks.len().await
    }

    /// Runs `op` while holding the identity's lock, so one identity never has
    /// two joins interleaving their eviction and seating.
    async fn with_identity_lock<T, F, Fut>(&self, identity: &str, op: F) -> Result<T, AppError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, AppError>>,
    {
        let key = identity.to_string();
        let lock = self.identity_locks.get(&key).await;
        let result = {
            let _guard = lock.lock().await;
            op().await
        };
        drop(lock);
        self.identity_locks.release_if_idle(&key).await;
        result
    }

    /// Seats the caller in the oldest joinable public room, creating one if needed.
    /// A public room that fills up starts on its own.
    #[instrument(skip(self, client), fields(identity = %client.identity))]
    pub async fn join_public_queue(
        self: &Arc<Self>,
        client: &ClientContext,
        username: String,
    ) -> Result<JoinOutcome, AppError> {
        self.with_identity_lock(&client.identity, || self.join_public_queue_locked(client, username))
            .await
    }

    async fn join_public_queue_locked(
        self: &Arc<Self>,
        client: &ClientContext,
        username: String,
    ) -> Result<JoinOutcome, AppError> {
        let outcome = {
            let _matchmaking = self.matchmaking.lock().await;
            self.evict_identity(&client.identity).await?;

            let mut attempt = 0;
            loop {
                attempt += 1;
                let room = self.rooms.find_or_create_public_room().await?;
                match self
                    .seat_player(room.id, client, username.clone(), false)
                    .await
                {
                    Err(AppError::Conflict(reason)) if attempt < PUBLIC_JOIN_ATTEMPTS => {
                        debug!(room_id = room.id, %reason, "Public room no longer joinable, retrying");
                    }
                    result => break result?,
                }
            }
        };

        self.start_if_full(&outcome.room).await;
        Ok(outcome)
    }

    /// Creates a private room with the caller as host
    #[instrument(skip(self, client, request), fields(identity = %client.identity))]
    pub async fn create_private_room(
        self: &Arc<Self>,
        client: &ClientContext,
        username: String,
        request: &CreateRoomRequest,
    ) -> Result<JoinOutcome, AppError> {
        let settings = request.settings();
        settings.validate()?;

        self.with_identity_lock(&client.identity, || async move {
            self.evict_identity(&client.identity).await?;
            let room = self.rooms.create_room(RoomType::Private, settings).await?;
            info!(room_id = room.id, code = %room.code, "Private room created");

            self.seat_player(room.id, client, username, true).await
        })
        .await
    }

    /// Joins a room by its share code. Joining a room the caller is already in
    /// rebinds their connection instead.
    #[instrument(skip(self, client), fields(identity = %client.identity))]
    pub async fn join_by_code(
        self: &Arc<Self>,
        client: &ClientContext,
        username: String,
        code: &str,
    ) -> Result<JoinOutcome, AppError> {
        self.with_identity_lock(&client.identity, || self.join_by_code_locked(client, username, code))
            .await
    }

    async fn join_by_code_locked(
        self: &Arc<Self>,
        client: &ClientContext,
        username: String,
        code: &str,
    ) -> Result<JoinOutcome, AppError> {
        let room = self
            .rooms
            .get_room_by_code(code)
            .await?
            .ok_or_else(|| AppError::NotFound("Room not found".to_string()))?;

        if room.status != RoomStatus::Finished
            && room.player_by_identity(&client.identity).is_some()
        {
            debug!(room_id = room.id, "Caller already seated, rebinding connection");
            return self.rebind_connection(room.id, client).await;
        }

        match room.status {
            RoomStatus::Finished => {
                return Err(AppError::Conflict("Room has already finished".to_string()))
            }
            RoomStatus::Playing => {
                return Err(AppError::Conflict("Game already in progress".to_string()))
            }
            RoomStatus::Waiting if room.is_full() => {
                return Err(AppError::Conflict("Room is full".to_string()))
            }
            RoomStatus::Waiting => {}
        }

        self.evict_identity(&client.identity).await?;
        let outcome = self.seat_player(room.id, client, username, false).await?;
        self.start_if_full(&outcome.room).await;
        Ok(outcome)
    }

    async fn seat_player(
        &self,
        room_id: RoomId,
        client: &ClientContext,
        username: String,
        is_host: bool,
    ) -> Result<JoinOutcome, AppError> {
        let room_lock = self.room_lock(room_id).await;
        let _guard = room_lock.lock().await;

        let new_player = NewPlayer {
            identity: client.identity.clone(),
            username,
            connection_id: client.connection_id.clone(),
            is_host,
        };

        let (room, player) = match self.rooms.try_join_room(room_id, new_player).await? {
            JoinRoomResult::Success { room, player } => (room, player),
            JoinRoomResult::AlreadySeated { room, .. } => {
                debug!(room_id, "Caller already seated, rebinding connection");
                return self.rebind_locked(room, client).await;
            }
            JoinRoomResult::RoomFull => return Err(AppError::Conflict("Room is full".to_string())),
            JoinRoomResult::RoomNotFound => {
                return Err(AppError::NotFound("Room not found".to_string()))
            }
            JoinRoomResult::GameInProgress => {
                return Err(AppError::Conflict("Game already in progress".to_string()))
            }
            JoinRoomResult::RoomFinished => {
                return Err(AppError::Conflict("Room has already finished".to_string()))
            }
        };

        self.cache
            .set(
                &player.identity,
                PlayerRoomInfo {
                    room_id: room.id,
                    room_code: room.code.clone(),
                    username: player.username.clone(),
                    connection_id: player.connection_id.clone(),
                    joined_at: player.joined_at,
                },
            )
            .await?;

        let snapshot = RoomResponse::from(&room);
        self.broadcaster
            .to_connection(
                &player.connection_id,
                &WebSocketMessage::player_joined(player.id, player.username.clone(), snapshot.clone()),
            )
            .await;
        self.broadcaster
            .to_room(&room, &WebSocketMessage::room_updated(snapshot))
            .await;

        info!(
            room_id = room.id,
            player_id = player.id,
            username = %player.username,
            players = room.player_count(),
            "Player joined room"
        );

        Ok(JoinOutcome { room, player })
    }

    async fn start_if_full(self: &Arc<Self>, room: &RoomModel) {
        if room.room_type != RoomType::Public || !room.is_full() {
            return;
        }
        if let Err(e) = self.start_game(room.id).await {
            // A concurrent start already won
            debug!(room_id = room.id, error = %e, "Auto-start skipped");
        }
    }

    /// Removes every stale seat held by `identity` so it sits in at most one room
    async fn evict_identity(self: &Arc<Self>, identity: &str) -> Result<(), AppError> {
        while let Some((room_id, player)) = self.rooms.find_player_by_identity(identity).await? {
            debug!(room_id, player_id = player.id, "Evicting previous seat");
            if self
                .remove_player(room_id, player.id, RemovalReason::Evicted)
                .await?
                .is_none()
            {
                break;
            }
        }
        Ok(())
    }

    async fn rebind_connection(
        &self,
        room_id: RoomId,
        client: &ClientContext,
    ) -> Result<JoinOutcome, AppError> {
        let room_lock = self.room_lock(room_id).await;
        let _guard = room_lock.lock().await;

        let room = self.rooms.require_room(room_id).await?;
        self.rebind_locked(room, client).await
    }

    /// Points the caller's existing seat at their current connection.
    /// The room lock must be held.
    async fn rebind_locked(
        &self,
        mut room: RoomModel,
        client: &ClientContext,
    ) -> Result<JoinOutcome, AppError> {
        let room_id = room.id;
        let player = room
            .players
            .iter_mut()
            .find(|p| p.identity == client.identity)
            .ok_or_else(|| AppError::NotFound("Player not found in room".to_string()))?;
        player.connection_id = client.connection_id.clone();
        let player = player.clone();

        self.rooms.update_room(&room).await?;
        if !self
            .cache
            .update_connection(&player.identity, &player.connection_id)
            .await?
        {
            self.cache
                .set(
                    &player.identity,
                    PlayerRoomInfo {
                        room_id,
                        room_code: room.code.clone(),
                        username: player.username.clone(),
                        connection_id: player.connection_id.clone(),
                        joined_at: player.joined_at,
                    },
                )
                .await?;
        }

        self.broadcaster
            .to_connection(
                &player.connection_id,
                &WebSocketMessage::rejoined_room(
                    player.id,
                    player.username.clone(),
                    RoomResponse::from(&room),
                ),
            )
            .await;
        self.resend_turn_state(&room, &player).await;

        Ok(JoinOutcome { room, player })
    }

    /// Removes a player and repairs the turn if they mattered to it.
    /// Returns `None` if the player was not in the room.
    pub(super) async fn remove_player(
        self: &Arc<Self>,
        room_id: RoomId,
        player_id: PlayerId,
        reason: RemovalReason,
    ) -> Result<Option<PlayerModel>, AppError> {
        let room_lock = self.room_lock(room_id).await;
        let _guard = room_lock.lock().await;

        let (mut room, removed, was_drawer) =
            match self.rooms.remove_player(room_id, player_id).await? {
                LeaveRoomResult::Success {
                    room,
                    removed,
                    was_drawer,
                } => (room, removed, was_drawer),
                LeaveRoomResult::PlayerNotInRoom | LeaveRoomResult::RoomNotFound => {
                    return Ok(None)
                }
            };

        if let Err(e) = self.cache.remove(&removed.identity).await {
            warn!(identity = %removed.identity, error = %e, "Failed to clear room cache entry");
        }

        info!(
            room_id,
            player_id,
            reason = ?reason,
            remaining = room.player_count(),
            "Player removed from room"
        );

        if room.players.is_empty() {
            self.timers.cancel(room_id).await;
            if let Some(leaderboard) = &self.leaderboard {
                leaderboard.forget_room(room_id).await;
            }
            drop(_guard);
            drop(room_lock);
            // A finished room is never joined or started again
            self.room_locks.release_if_idle(&room_id).await;
            info!(room_id, "Room empty, marked finished");
            return Ok(Some(removed));
        }

        let players = scores_of(&room);
        let notice = match reason {
            RemovalReason::Kicked => {
                WebSocketMessage::player_kicked(removed.id, removed.username.clone(), players)
            }
            _ => WebSocketMessage::player_left(removed.username.clone(), players),
        };
        self.broadcaster.to_room(&room, &notice).await;

        if room.status == RoomStatus::Playing {
            if was_drawer {
                self.timers.cancel(room_id).await;
                self.advance_turn(&mut room, true).await?;
            } else if room.phase == TurnPhase::RoundActive && room.non_drawers_all_guessed() {
                self.resolve_round_locked(&mut room, true).await?;
            }
        }

        Ok(Some(removed))
    }

    /// Voluntary leave from the socket bound to `connection_id`
    #[instrument(skip(self))]
    pub async fn leave(self: &Arc<Self>, connection_id: &str) -> Result<bool, AppError> {
        let Some((room_id, player)) = self.rooms.find_player_by_connection(connection_id).await?
        else {
            return Ok(false);
        };

        let removed = self
            .remove_player(room_id, player.id, RemovalReason::Left)
            .await?
            .is_some();
        self.broadcaster
            .to_connection(connection_id, &WebSocketMessage::left_room())
            .await;
        Ok(removed)
    }

    /// Leave on behalf of an identity, whatever socket it is on
    #[instrument(skip(self))]
    pub async fn remove_player_by_identity(self: &Arc<Self>, identity: &str) -> Result<bool, AppError> {
        let Some((room_id, player)) = self.rooms.find_player_by_identity(identity).await? else {
            return Ok(false);
        };

        let connection_id = player.connection_id.clone();
        let removed = self
            .remove_player(room_id, player.id, RemovalReason::Left)
            .await?
            .is_some();
        if removed {
            self.broadcaster
                .to_connection(&connection_id, &WebSocketMessage::left_room())
                .await;
        }
        Ok(removed)
    }

    /// Host removes another player from the room
    #[instrument(skip(self, client), fields(identity = %client.identity))]
    pub async fn kick(
        self: &Arc<Self>,
        client: &ClientContext,
        target_id: PlayerId,
    ) -> Result<(), AppError> {
        let (room, host) = self.require_membership(&client.identity).await?;
        if !host.is_host {
            return Err(AppError::Forbidden("Only the host can kick players".to_string()));
        }
        if host.id == target_id {
            return Err(AppError::BadRequest("You cannot kick yourself".to_string()));
        }

        let target = room
            .player(target_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound("Player not found in room".to_string()))?;

        if self
            .remove_player(room.id, target_id, RemovalReason::Kicked)
            .await?
            .is_none()
        {
            return Err(AppError::NotFound("Player not found in room".to_string()));
        }

        self.broadcaster
            .to_connection(&target.connection_id, &WebSocketMessage::kicked_from_room())
            .await;
        info!(room_id = room.id, target_id, "Player kicked by host");
        Ok(())
    }

    /// Starts the first turn of a new game if the room can start
    #[instrument(skip(self))]
    pub async fn start_game(self: &Arc<Self>, room_id: RoomId) -> Result<(), AppError> {
        let room_lock = self.room_lock(room_id).await;
        let _guard = room_lock.lock().await;

        let mut room = self.rooms.require_room(room_id).await?;
        if !room.can_start() {
            let reason = match room.status {
                RoomStatus::Waiting => "Not enough players to start",
                RoomStatus::Playing => "Game already in progress",
                RoomStatus::Finished => "Room has already finished",
            };
            return Err(AppError::Conflict(reason.to_string()));
        }

        self.timers.cancel(room_id).await;
        room.start_game(self.words.random_words(self.config.word_options));
        self.rooms.update_room(&room).await?;

        info!(
            room_id,
            game_number = room.game_number,
            players = room.player_count(),
            "Game started"
        );
        self.announce_turn(&room, true).await;
        Ok(())
    }

    pub async fn start_game_as_host(self: &Arc<Self>, client: &ClientContext) -> Result<(), AppError> {
        let (room, player) = self.require_membership(&client.identity).await?;
        if !player.is_host {
            return Err(AppError::Forbidden("Only the host can start the game".to_string()));
        }
        self.start_game(room.id).await
    }

    /// Host sends a room back to the waiting state with scores cleared
    #[instrument(skip(self, client), fields(identity = %client.identity))]
    pub async fn restart_game(self: &Arc<Self>, client: &ClientContext) -> Result<(), AppError> {
        let (room, player) = self.require_membership(&client.identity).await?;
        if !player.is_host {
            return Err(AppError::Forbidden("Only the host can restart the game".to_string()));
        }

        let room_lock = self.room_lock(room.id).await;
        let _guard = room_lock.lock().await;

        let mut room = self.rooms.require_room(room.id).await?;
        self.timers.cancel(room.id).await;
        room.reset_to_waiting();
        self.rooms.update_room(&room).await?;

        info!(room_id = room.id, "Game restarted");
        self.broadcaster
            .to_room(
                &room,
                &WebSocketMessage::game_restarted(room.id, room.code.clone(), scores_of(&room)),
            )
            .await;
        self.broadcaster
            .to_room(&room, &WebSocketMessage::room_updated(RoomResponse::from(&room)))
            .await;
        Ok(())
    }

    /// Restores a returning identity to its room, if it still has one.
    /// Returns the room the connection was rebound to.
    #[instrument(skip(self, client), fields(identity = %client.identity))]
    pub async fn on_connected(
        self: &Arc<Self>,
        client: &ClientContext,
    ) -> Result<Option<RoomModel>, AppError> {
        let Some(info) = self.cache.get(&client.identity).await? else {
            return Ok(None);
        };
        if self.live_cached_room(&client.identity, &info).await?.is_none() {
            return Ok(None);
        }

        let outcome = self.rebind_connection(info.room_id, client).await?;
        info!(room_id = info.room_id, "Player reconnected");
        Ok(Some(outcome.room))
    }

    /// Socket closed. A socket that was already replaced by a newer one finds no player.
    #[instrument(skip(self))]
    pub async fn on_disconnected(self: &Arc<Self>, connection_id: &str) -> Result<(), AppError> {
        let Some((room_id, player)) = self.rooms.find_player_by_connection(connection_id).await?
        else {
            debug!("No player bound to closed connection");
            return Ok(());
        };

        self.remove_player(room_id, player.id, RemovalReason::Disconnected)
            .await?;
        Ok(())
    }

    /// Cache-backed "am I in a room?" check, revalidated against the room store
    pub async fn check_player_room(&self, identity: &str) -> Result<RoomStatusResponse, AppError> {
        let Some(info) = self.cache.get(identity).await? else {
            return Ok(RoomStatusResponse::not_in_room());
        };

        Ok(match self.live_cached_room(identity, &info).await? {
            Some(room) => RoomStatusResponse {
                in_room: true,
                room_id: Some(room.id),
                room_code: Some(room.code.clone()),
                username: Some(info.username),
                status: Some(room.status),
            },
            None => RoomStatusResponse::not_in_room(),
        })
    }

    /// The cached room if it still exists, is not finished and still seats `identity`.
    /// Stale entries are dropped.
    async fn live_cached_room(
        &self,
        identity: &str,
        info: &PlayerRoomInfo,
    ) -> Result<Option<RoomModel>, AppError> {
        let room = self.rooms.get_room(info.room_id).await?;
        match room {
            Some(room)
                if room.status != RoomStatus::Finished
                    && room.player_by_identity(identity).is_some() =>
            {
                Ok(Some(room))
            }
            _ => {
                debug!(room_id = info.room_id, "Dropping stale room cache entry");
                self.cache.remove(identity).await?;
                Ok(None)
            }
        }
    }

    /// Relays a stroke from the drawer to everyone else in the room
    pub async fn relay_draw(
        &self,
        client: &ClientContext,
        payload: serde_json::Value,
    ) -> Result<(), AppError> {
        let (room, player) = self.require_drawer(client).await?;
        self.broadcaster
            .to_room_except(&room, player.id, &WebSocketMessage::draw(payload))
            .await;
        Ok(())
    }

    pub async fn clear_canvas(&self, client: &ClientContext) -> Result<(), AppError> {
        let (room, _) = self.require_drawer(client).await?;
        self.broadcaster
            .to_room(&room, &WebSocketMessage::clear_canvas())
            .await;
        Ok(())
    }

    async fn require_drawer(
        &self,
        client: &ClientContext,
    ) -> Result<(RoomModel, PlayerModel), AppError> {
        let (room, player) = self.require_membership(&client.identity).await?;
        if room.phase != TurnPhase::RoundActive || !room.is_drawer(player.id) {
            return Err(AppError::Forbidden("Only the drawer can draw".to_string()));
        }
        Ok((room, player))
    }

    pub(super) async fn require_membership(
        &self,
        identity: &str,
    ) -> Result<(RoomModel, PlayerModel), AppError> {
        let (room_id, player) = self
            .rooms
            .find_player_by_identity(identity)
            .await?
            .ok_or_else(|| AppError::NotFound("You are not in a room".to_string()))?;
        let room = self.rooms.require_room(room_id).await?;
        Ok((room, player))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::room::repository::InMemoryRoomRepository;
    use crate::websockets::InMemoryConnectionManager;

    fn orchestrator() -> Arc<RoomOrchestrator> {
        let rooms = Arc::new(RoomService::new(Arc::new(InMemoryRoomRepository::new())));
        RoomOrchestrator::builder(rooms, Arc::new(InMemoryConnectionManager::new())).build()
    }

    fn client(name: &str) -> ClientContext {
        ClientContext {
            connection_id: format!("conn-{}", name),
            identity: format!("id-{}", name),
            username: name.to_string(),
        }
    }

    #[tokio::test]
    async fn test_private_room_creator_is_host() {
        let orchestrator = orchestrator();
        let alice = client("alice");

        let outcome = orchestrator
            .create_private_room(&alice, "alice".to_string(), &CreateRoomRequest::default())
            .await
            .unwrap();

        assert!(outcome.player.is_host);
        assert_eq!(outcome.room.room_type, RoomType::Private);
        assert_eq!(outcome.room.status, RoomStatus::Waiting);
    }

    #[tokio::test]
    async fn test_non_host_cannot_start() {
        let orchestrator = orchestrator();
        let alice = client("alice");
        let bob = client("bob");

        let outcome = orchestrator
            .create_private_room(&alice, "alice".to_string(), &CreateRoomRequest::default())
            .await
            .unwrap();
        orchestrator
            .join_by_code(&bob, "bob".to_string(), &outcome.room.code)
            .await
            .unwrap();

        let result = orchestrator.start_game_as_host(&bob).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_joining_new_room_evicts_previous_seat() {
        let orchestrator = orchestrator();
        let alice = client("alice");

        let first = orchestrator
            .create_private_room(&alice, "alice".to_string(), &CreateRoomRequest::default())
            .await
            .unwrap();
        let second = orchestrator
            .create_private_room(&alice, "alice".to_string(), &CreateRoomRequest::default())
            .await
            .unwrap();

        let old_room = orchestrator.rooms.require_room(first.room.id).await.unwrap();
        assert!(old_room.players.is_empty());
        assert_eq!(old_room.status, RoomStatus::Finished);

        let status = orchestrator.check_player_room("id-alice").await.unwrap();
        assert_eq!(status.room_id, Some(second.room.id));
    }

    #[tokio::test]
    async fn test_lock_entries_released_when_room_empties() {
        let orchestrator = orchestrator();
        let alice = client("alice");
        let bob = client("bob");

        let outcome = orchestrator
            .create_private_room(&alice, "alice".to_string(), &CreateRoomRequest::default())
            .await
            .unwrap();
        orchestrator
            .join_by_code(&bob, "bob".to_string(), &outcome.room.code)
            .await
            .unwrap();
        assert_eq!(orchestrator.tracked_room_locks().await, 1);
        assert!(orchestrator.identity_locks.is_empty().await);

        orchestrator.leave(&alice.connection_id).await.unwrap();
        assert_eq!(orchestrator.tracked_room_locks().await, 1);

        orchestrator.leave(&bob.connection_id).await.unwrap();
        assert_eq!(orchestrator.tracked_room_locks().await, 0);

        let room = orchestrator.rooms.require_room(outcome.room.id).await.unwrap();
        assert_eq!(room.status, RoomStatus::Finished);
    }

    #[tokio::test]
    async fn test_seat_player_rebinds_an_already_seated_identity() {
        let orchestrator = orchestrator();
        let alice = client("alice");

        let outcome = orchestrator
            .create_private_room(&alice, "alice".to_string(), &CreateRoomRequest::default())
            .await
            .unwrap();

        let moved = ClientContext {
            connection_id: "conn-alice-2".to_string(),
            ..client("alice")
        };
        let again = orchestrator
            .seat_player(outcome.room.id, &moved, "alice".to_string(), false)
            .await
            .unwrap();

        assert_eq!(again.player.id, outcome.player.id);
        assert!(again.player.is_host);
        assert_eq!(again.player.connection_id, "conn-alice-2");
        let room = orchestrator.rooms.require_room(outcome.room.id).await.unwrap();
        assert_eq!(room.player_count(), 1);
    }

    #[tokio::test]
    async fn test_check_player_room_drops_stale_entry() {
        let orchestrator = orchestrator();
        let alice = client("alice");

        orchestrator
            .create_private_room(&alice, "alice".to_string(), &CreateRoomRequest::default())
            .await
            .unwrap();
        orchestrator.leave(&alice.connection_id).await.unwrap();

        let status = orchestrator.check_player_room("id-alice").await.unwrap();
        assert!(!status.in_room);
        assert!(orchestrator.cache.get("id-alice").await.unwrap().is_none());
    }
}
