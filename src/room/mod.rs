// Public API - what other modules can use
pub use handlers::{get_room, get_room_scores, leave_room, room_status};
pub use service::RoomService;

// Internal modules
mod handlers;
pub mod models;
pub mod repository;
pub mod service;
pub mod types;
