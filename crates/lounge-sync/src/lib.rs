pub mod config;
pub mod game_session;
pub mod memory;
pub mod room;
pub mod session;
pub mod sim;
pub mod sync;
