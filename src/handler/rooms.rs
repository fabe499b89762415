//! `CreateRoom`, `Join`, `Leave`, `Close`: room lifecycle and membership.

use std::sync::Arc;

use crate::protocol::{Fields, Packet, PacketCode};
use crate::server::context::ServerContext;
use crate::session;
use crate::world::{Room, User};

pub fn create(packet: &Packet, sender: &Arc<User>, ctx: &ServerContext) -> bool {
    if packet.fields.value1 != Some(0) || packet.fields.value4 != Some(0) {
        return false;
    }
    let Some(name) = packet.fields.name.clone() else {
        return false;
    };
    if name.is_empty() {
        return false;
    }
    let Some(session_info) = packet.fields.session_info else {
        return false;
    };
    let page = ctx.config.server.code_page;

    if ctx.world.room_name_taken(&name) {
        session::send(
            sender,
            Packet::new(PacketCode::CreateRoomReply, Fields::default().value1(0).error(1)),
            page,
        );
        return true;
    }

    let id = match ctx.world.next_id() {
        Ok(id) => id,
        Err(e) => {
            tracing::error!(error = %e, "id allocator exhausted while creating room");
            return false;
        }
    };
    let room = Arc::new(Room::new(id, name.clone(), session_info, sender.address));
    ctx.world.add_room(room);

    let notice = Packet::new(
        PacketCode::CreateRoom,
        Fields::default().value1(id).value4(0).name(name).session_info(session_info),
    );
    session::broadcast_others(&ctx.world.users(), sender.id, notice, page);

    session::send(
        sender,
        Packet::new(PacketCode::CreateRoomReply, Fields::default().value1(id).error(0)),
        page,
    );
    true
}

pub fn join(packet: &Packet, sender: &Arc<User>, ctx: &ServerContext) -> bool {
    let Some(value2) = packet.fields.value2 else {
        return false;
    };
    if packet.fields.value10 != Some(sender.id) {
        return false;
    }
    let page = ctx.config.server.code_page;

    let joined = if ctx.world.get_room(value2).is_some() {
        ctx.world.set_user_room(sender.id, value2);
        true
    } else if let Some(game) = ctx.world.get_game(value2) {
        // Joining a game advertised in the current room does not move the
        // user into a different room.
        game.room_id == sender.room_id()
    } else {
        false
    };

    if joined {
        let notice = Packet::new(PacketCode::Join, Fields::default().value2(value2).value10(sender.id));
        session::broadcast_others(&ctx.world.users(), sender.id, notice, page);
        session::send(sender, Packet::new(PacketCode::JoinReply, Fields::default().error(0)), page);
    } else {
        session::send(sender, Packet::new(PacketCode::JoinReply, Fields::default().error(1)), page);
    }
    true
}

pub fn leave(packet: &Packet, sender: &Arc<User>, ctx: &ServerContext) -> bool {
    if packet.fields.value10 != Some(sender.id) {
        return false;
    }
    let Some(value2) = packet.fields.value2 else {
        return false;
    };
    let page = ctx.config.server.code_page;

    if value2 == sender.room_id() {
        let closed = ctx.world.leave_room(sender.id, value2);
        let remaining = ctx.world.users();

        let leave_notice = Packet::new(PacketCode::Leave, Fields::default().value2(value2).value10(sender.id));
        session::broadcast_others(&remaining, sender.id, leave_notice, page);

        if let Some(room) = closed {
            let close_notice = Packet::new(PacketCode::Close, Fields::default().value10(room.id));
            session::broadcast_others(&remaining, sender.id, close_notice, page);
        }

        session::send(sender, Packet::new(PacketCode::LeaveReply, Fields::default().error(0)), page);
    } else {
        session::send(sender, Packet::new(PacketCode::LeaveReply, Fields::default().error(1)), page);
    }
    true
}

pub fn close(packet: &Packet, sender: &Arc<User>, ctx: &ServerContext) -> bool {
    if packet.fields.value10.is_none() {
        return false;
    }
    let page = ctx.config.server.code_page;
    session::send(sender, Packet::new(PacketCode::CloseReply, Fields::default().error(0)), page);
    true
}
