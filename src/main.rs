use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use scribble::{
    game::InMemoryScoreLedger,
    room::{self, repository::InMemoryRoomRepository},
    session::{self, TokenConfig},
    stats::{self, InMemoryLeaderboardRepository, LeaderboardService},
    websockets::{self, InMemoryConnectionManager},
    AppState, GameConfig, RoomOrchestrator, RoomService, ServerConfig, WordBank,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "scribble=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Scribble game server");

    let server_config = ServerConfig::from_env();
    let game_config = GameConfig::from_env();

    let room_service = Arc::new(RoomService::new(Arc::new(InMemoryRoomRepository::new())));
    let connection_manager = Arc::new(InMemoryConnectionManager::new());
    let ledger = Arc::new(InMemoryScoreLedger::new());
    let leaderboard = Arc::new(LeaderboardService::new(
        Arc::new(InMemoryLeaderboardRepository::new()),
        ledger.clone(),
    ));
    let words = Arc::new(WordBank::new());
    info!(words = words.len(), "Word bank loaded");

    let orchestrator = RoomOrchestrator::builder(room_service.clone(), connection_manager.clone())
        .with_ledger(ledger)
        .with_leaderboard(leaderboard.clone())
        .with_words(words)
        .with_config(game_config)
        .build();

    let app_state = AppState::new(
        orchestrator,
        room_service,
        leaderboard,
        connection_manager,
        TokenConfig::from_config(&server_config),
    );

    let authed = Router::new()
        .route("/room/status", get(room::room_status))
        .route("/room/leave", post(room::leave_room))
        .route("/leaderboard/me", get(stats::handlers::my_stats))
        .layer(middleware::from_fn_with_state(
            app_state.clone(),
            session::jwt_auth,
        ));

    let app = Router::new()
        .merge(authed)
        .route("/ws", get(websockets::websocket_handler))
        .route("/game/room/:room_id", get(room::get_room))
        .route("/game/room/:room_id/scores", get(room::get_room_scores))
        .route("/leaderboard", get(stats::handlers::leaderboard))
        .route("/health", get(|| async { "OK" }))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    let listener = tokio::net::TcpListener::bind(&server_config.bind_addr)
        .await
        .expect("Failed to bind listener");
    info!(addr = %server_config.bind_addr, "Server running");
    axum::serve(listener, app).await.expect("Server error");
}
