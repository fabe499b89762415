//! `ListRooms`/`ListUsers`/`ListGames`: snapshot enumeration terminated by
//! a shared `ListEnd` frame.

use std::sync::Arc;

use crate::protocol::{Fields, Packet, PacketCode};
use crate::server::context::ServerContext;
use crate::session;
use crate::world::User;

pub fn rooms(packet: &Packet, sender: &Arc<User>, ctx: &ServerContext) -> bool {
    if packet.fields.value4 != Some(0) {
        return false;
    }
    let page = ctx.config.server.code_page;

    for room in ctx.world.rooms() {
        let item = Packet::new(
            PacketCode::ListItem,
            Fields::default()
                .value1(room.id)
                .name(room.name.clone())
                .data("")
                .session_info(room.session_info),
        );
        session::send(sender, item, page);
    }
    session::send(sender, Packet::list_end(), page);
    true
}

pub fn users(packet: &Packet, sender: &Arc<User>, ctx: &ServerContext) -> bool {
    if packet.fields.value4 != Some(0) {
        return false;
    }
    let Some(value2) = packet.fields.value2 else {
        return false;
    };
    if value2 != sender.room_id() {
        return false;
    }
    let page = ctx.config.server.code_page;

    for user in ctx.world.users_in_room(value2) {
        let item = Packet::new(
            PacketCode::ListItem,
            Fields::default()
                .value1(user.id)
                .name(user.name.clone())
                .data("")
                .session_info(user.session_info),
        );
        session::send(sender, item, page);
    }
    session::send(sender, Packet::list_end(), page);
    true
}

pub fn games(packet: &Packet, sender: &Arc<User>, ctx: &ServerContext) -> bool {
    if packet.fields.value4 != Some(0) {
        return false;
    }
    let Some(value2) = packet.fields.value2 else {
        return false;
    };
    if value2 != sender.room_id() {
        return false;
    }
    let page = ctx.config.server.code_page;

    for game in ctx.world.games().into_iter().filter(|g| g.room_id == value2) {
        let item = Packet::new(
            PacketCode::ListItem,
            Fields::default()
                .value1(game.id)
                .name(game.name.clone())
                .data(game.host_address.to_string())
                .session_info(game.session_info),
        );
        session::send(sender, item, page);
    }
    session::send(sender, Packet::list_end(), page);
    true
}
