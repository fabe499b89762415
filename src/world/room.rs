//! A named rendezvous; users within a room see each other's chat and games.
//!
//! Immutable after creation; destroyed exactly when no remaining user or
//! game references it.

use std::net::Ipv4Addr;

use crate::protocol::SessionInfo;

#[derive(Debug, Clone)]
pub struct Room {
    pub id: u32,
    pub name: String,
    pub session_info: SessionInfo,
    pub host_address: Ipv4Addr,
}

impl Room {
    #[must_use]
    pub fn new(id: u32, name: String, session_info: SessionInfo, host_address: Ipv4Addr) -> Self {
        Self {
            id,
            name,
            session_info,
            host_address,
        }
    }
}
