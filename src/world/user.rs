//! A logged-in principal: at most one per session.

use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::protocol::SessionInfo;
use crate::session::writer::OutboundHandle;

/// Sentinel `room_id` meaning "not in any room."
pub const NO_ROOM: u32 = 0;

pub struct User {
    pub id: u32,
    pub name: String,
    pub session_info: SessionInfo,
    room_id: AtomicU32,
    pub address: Ipv4Addr,
    /// Non-owning handle to this user's outbound writer queue. Cloning it
    /// never keeps the connection alive; send failures are silently
    /// ignored (the session is already tearing down).
    pub outbound: OutboundHandle,
}

impl User {
    #[must_use]
    pub fn new(
        id: u32,
        name: String,
        session_info: SessionInfo,
        address: Ipv4Addr,
        outbound: OutboundHandle,
    ) -> Self {
        Self {
            id,
            name,
            session_info,
            room_id: AtomicU32::new(NO_ROOM),
            address,
            outbound,
        }
    }

    #[must_use]
    pub fn room_id(&self) -> u32 {
        self.room_id.load(Ordering::Acquire)
    }

    pub fn set_room_id(&self, room_id: u32) {
        self.room_id.store(room_id, Ordering::Release);
    }

    pub fn name_eq_ignore_ascii_case(&self, other: &str) -> bool {
        self.name.eq_ignore_ascii_case(other)
    }
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("room_id", &self.room_id())
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}
