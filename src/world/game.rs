//! A peer-to-peer session hosted by a user; advertised to the room, with
//! the host's IPv4 address handed out to joiners.
//!
//! Immutable after creation; destroyed when the host disconnects, or
//! explicitly by server policy.

use std::net::Ipv4Addr;

use crate::protocol::SessionInfo;

#[derive(Debug, Clone)]
pub struct Game {
    pub id: u32,
    /// Always equal to the host's user name.
    pub name: String,
    pub session_info: SessionInfo,
    pub room_id: u32,
    pub host_address: Ipv4Addr,
}

impl Game {
    #[must_use]
    pub fn new(
        id: u32,
        name: String,
        session_info: SessionInfo,
        room_id: u32,
        host_address: Ipv4Addr,
    ) -> Self {
        Self {
            id,
            name,
            session_info,
            room_id,
            host_address,
        }
    }
}
