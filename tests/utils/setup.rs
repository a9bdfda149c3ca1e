#![allow(dead_code)] // Test utilities may not all be used in every test

use std::sync::Arc;
use std::time::Duration;

use scribble::{
    game::{ClientContext, InMemoryScoreLedger, RoomOrchestrator},
    reconnect::{InMemoryPlayerRoomCache, PlayerRoomCache},
    room::{repository::InMemoryRoomRepository, RoomService},
    stats::{InMemoryLeaderboardRepository, LeaderboardService},
    websockets::WebsocketReceiveHandler,
    GameConfig, WordBank,
};

use super::mocks::MockConnectionManager;

/// Every drawer is offered exactly these, so tests can pick one blindly
pub const TEST_WORDS: [&str; 3] = ["apple", "house", "guitar"];

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

pub struct TestSetup {
    pub mock_conn_manager: Arc<MockConnectionManager>,
    pub orchestrator: Arc<RoomOrchestrator>,
    pub input_handler: WebsocketReceiveHandler,
    pub rooms: Arc<RoomService>,
    pub cache: Arc<dyn PlayerRoomCache>,
    pub leaderboard: Arc<LeaderboardService>,
    pub players: Vec<String>,
}

impl TestSetup {
    /// Connection handle a player uses unless a test reconnects them
    pub fn connection_of(player: &str) -> String {
        format!("conn-{}", player)
    }

    pub fn identity_of(player: &str) -> String {
        format!("id-{}", player)
    }

    pub fn client(&self, player: &str) -> ClientContext {
        self.client_on(player, &Self::connection_of(player))
    }

    pub fn client_on(&self, player: &str, connection_id: &str) -> ClientContext {
        ClientContext {
            connection_id: connection_id.to_string(),
            identity: Self::identity_of(player),
            username: player.to_string(),
        }
    }
}

pub struct TestSetupBuilder {
    players: Vec<String>,
    config: GameConfig,
    cache_ttl: Option<chrono::Duration>,
}

impl TestSetupBuilder {
    pub fn new() -> Self {
        Self {
            players: vec![],
            config: GameConfig::default(),
            cache_ttl: None,
        }
    }

    pub fn with_players(mut self, players: Vec<&str>) -> Self {
        self.players = players.into_iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_two_players(self) -> Self {
        self.with_players(vec!["alice", "bob"])
    }

    pub fn with_three_players(self) -> Self {
        self.with_players(vec!["alice", "bob", "carol"])
    }

    pub fn with_next_turn_delay(mut self, delay: Duration) -> Self {
        self.config.next_turn_delay = delay;
        self
    }

    pub fn with_cache_ttl(mut self, ttl: chrono::Duration) -> Self {
        self.cache_ttl = Some(ttl);
        self
    }

    pub async fn build(self) -> TestSetup {
        let mock_conn_manager = Arc::new(MockConnectionManager::new());
        let rooms = Arc::new(RoomService::new(Arc::new(InMemoryRoomRepository::new())));
        let ledger = Arc::new(InMemoryScoreLedger::new());
        let leaderboard = Arc::new(LeaderboardService::new(
            Arc::new(InMemoryLeaderboardRepository::new()),
            ledger.clone(),
        ));
        let cache: Arc<dyn PlayerRoomCache> = match self.cache_ttl {
            Some(ttl) => Arc::new(InMemoryPlayerRoomCache::with_ttl(ttl)),
            None => Arc::new(InMemoryPlayerRoomCache::new()),
        };

        let orchestrator = RoomOrchestrator::builder(rooms.clone(), mock_conn_manager.clone())
            .with_cache(cache.clone())
            .with_ledger(ledger)
            .with_leaderboard(leaderboard.clone())
            .with_words(Arc::new(WordBank::from_words(TEST_WORDS)))
            .with_config(self.config)
            .build();

        let input_handler = WebsocketReceiveHandler::new(orchestrator.clone());

        TestSetup {
            mock_conn_manager,
            orchestrator,
            input_handler,
            rooms,
            cache,
            leaderboard,
            players: self.players,
        }
    }
}

impl Default for TestSetupBuilder {
    fn default() -> Self {
        Self::new()
    }
}
