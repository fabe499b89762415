//! Per-code semantic rules: structural validation, world mutation, and
//! broadcast-set selection. Validation failures that violate the wire
//! contract return `false` (the session moves to Draining); semantic
//! rejections are answered with an `error`-bearing reply and return `true`.

mod chat;
mod games;
mod list;
mod rooms;

use std::sync::Arc;

use crate::protocol::{Packet, PacketCode};
use crate::server::context::ServerContext;
use crate::world::User;

/// Applies one packet's semantic rules against `sender`. Returns `false`
/// when the connection must transition to Draining.
pub fn dispatch(packet: Packet, sender: &Arc<User>, ctx: &ServerContext) -> bool {
    match packet.code {
        PacketCode::ChatRoom => chat::handle(&packet, sender, ctx),
        PacketCode::ListRooms => list::rooms(&packet, sender, ctx),
        PacketCode::ListUsers => list::users(&packet, sender, ctx),
        PacketCode::ListGames => list::games(&packet, sender, ctx),
        PacketCode::CreateRoom => rooms::create(&packet, sender, ctx),
        PacketCode::Join => rooms::join(&packet, sender, ctx),
        PacketCode::Leave => rooms::leave(&packet, sender, ctx),
        PacketCode::Close => rooms::close(&packet, sender, ctx),
        PacketCode::CreateGame => games::create(&packet, sender, ctx),
        PacketCode::ConnectGame => games::connect(&packet, sender, ctx),
        PacketCode::Login => {
            tracing::debug!(user_id = sender.id, "ignoring Login after authentication");
            true
        }
        other => {
            tracing::debug!(user_id = sender.id, code = ?other, "ignoring packet with no handler");
            true
        }
    }
}
