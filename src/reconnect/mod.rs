pub use cache::{InMemoryPlayerRoomCache, PlayerRoomCache, PlayerRoomInfo};

mod cache;
