//! The in-memory world: concurrent user/room/game directories and the ID
//! allocator they share.

mod game;
mod ids;
mod room;
mod state;
mod user;

pub use game::Game;
pub use ids::{IdAllocator, IdExhaustion};
pub use room::Room;
pub use state::World;
pub use user::{User, NO_ROOM};
