//! Concurrent directories of users, rooms, and games, sharing one ID space.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

pub use crate::world::ids::IdExhaustion;
use crate::world::ids::IdAllocator;
use crate::world::{Game, Room, User};

/// The in-memory world: three independently-locked directories plus the
/// shared ID allocator. Every mapping-scoped operation takes at most one
/// lock internally; callers should never need to hold more than one of
/// these locks across an await point.
#[derive(Default)]
pub struct World {
    ids: IdAllocator,
    users: RwLock<HashMap<u32, Arc<User>>>,
    rooms: RwLock<HashMap<u32, Arc<Room>>>,
    games: RwLock<HashMap<u32, Arc<Game>>>,
}

impl World {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&self) -> Result<u32, IdExhaustion> {
        self.ids.next_id()
    }

    // -- users ---------------------------------------------------------

    pub fn add_user(&self, user: Arc<User>) {
        self.users.write().insert(user.id, user);
    }

    #[must_use]
    pub fn remove_user(&self, id: u32) -> Option<Arc<User>> {
        let removed = self.users.write().remove(&id);
        if removed.is_some() {
            self.ids.recycle(id);
        }
        removed
    }

    #[must_use]
    pub fn get_user(&self, id: u32) -> Option<Arc<User>> {
        self.users.read().get(&id).cloned()
    }

    #[must_use]
    pub fn users(&self) -> Vec<Arc<User>> {
        self.users.read().values().cloned().collect()
    }

    #[must_use]
    pub fn users_in_room(&self, room_id: u32) -> Vec<Arc<User>> {
        self.users
            .read()
            .values()
            .filter(|u| u.room_id() == room_id)
            .cloned()
            .collect()
    }

    /// Case-insensitive existence check used by login and room creation.
    #[must_use]
    pub fn user_name_taken(&self, name: &str) -> bool {
        self.users
            .read()
            .values()
            .any(|u| u.name_eq_ignore_ascii_case(name))
    }

    pub fn set_user_room(&self, user_id: u32, room_id: u32) {
        if let Some(user) = self.users.read().get(&user_id) {
            user.set_room_id(room_id);
        }
    }

    // -- rooms -----------------------------------------------------------

    pub fn add_room(&self, room: Arc<Room>) {
        self.rooms.write().insert(room.id, room);
    }

    #[must_use]
    pub fn remove_room(&self, id: u32) -> Option<Arc<Room>> {
        let removed = self.rooms.write().remove(&id);
        if removed.is_some() {
            self.ids.recycle(id);
        }
        removed
    }

    #[must_use]
    pub fn get_room(&self, id: u32) -> Option<Arc<Room>> {
        self.rooms.read().get(&id).cloned()
    }

    #[must_use]
    pub fn rooms(&self) -> Vec<Arc<Room>> {
        self.rooms.read().values().cloned().collect()
    }

    #[must_use]
    pub fn room_name_taken(&self, name: &str) -> bool {
        self.rooms
            .read()
            .values()
            .any(|r| r.name.eq_ignore_ascii_case(name))
    }

    // -- games -------------------------------------------------------------

    pub fn add_game(&self, game: Arc<Game>) {
        self.games.write().insert(game.id, game);
    }

    #[must_use]
    pub fn remove_game(&self, id: u32) -> Option<Arc<Game>> {
        let removed = self.games.write().remove(&id);
        if removed.is_some() {
            self.ids.recycle(id);
        }
        removed
    }

    #[must_use]
    pub fn get_game(&self, id: u32) -> Option<Arc<Game>> {
        self.games.read().get(&id).cloned()
    }

    #[must_use]
    pub fn games(&self) -> Vec<Arc<Game>> {
        self.games.read().values().cloned().collect()
    }

    /// Linear search, case-sensitive on the stored name — a game is always
    /// named for its host, so this doubles as "is this user already hosting".
    #[must_use]
    pub fn game_by_name(&self, name: &str) -> Option<Arc<Game>> {
        self.games.read().values().find(|g| g.name == name).cloned()
    }

    // -- cross-domain helpers ---------------------------------------------

    /// True if, excluding `exclude_user`, no live user has `room_id` and no
    /// live game has `room_id`.
    #[must_use]
    pub fn room_is_empty(&self, room_id: u32, exclude_user: u32) -> bool {
        let no_users = !self
            .users
            .read()
            .values()
            .any(|u| u.id != exclude_user && u.room_id() == room_id);
        let no_games = !self.games.read().values().any(|g| g.room_id == room_id);
        no_users && no_games
    }

    /// Shared by the explicit `Leave` handler and the disconnect cascade:
    /// clears `user_id`'s room membership and, if that leaves the room
    /// empty of users and games, removes it. Returns the removed room, if
    /// any, so the caller can broadcast `Close` after releasing locks.
    pub fn leave_room(&self, user_id: u32, room_id: u32) -> Option<Arc<Room>> {
        let closed = if self.room_is_empty(room_id, user_id) {
            self.remove_room(room_id)
        } else {
            None
        };
        self.set_user_room(user_id, super::user::NO_ROOM);
        closed
    }
}
