// Library crate for the Scribble game server
// This file exposes the public API for integration tests

pub mod config;
pub mod game;
pub mod reconnect;
pub mod room;
pub mod session;
pub mod shared;
pub mod stats;
pub mod websockets;
pub mod words;

// Re-export commonly used types for easier access in tests
pub use config::{GameConfig, ServerConfig};
pub use game::{ClientContext, RoomOrchestrator};
pub use room::{models::RoomModel, repository::RoomRepository, RoomService};
pub use shared::{AppError, AppState};
pub use websockets::{
    ConnectionManager, MessageHandler, MessageType, WebSocketMessage, WebsocketReceiveHandler,
};
pub use words::WordBank;
