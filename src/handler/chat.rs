//! `ChatRoom`: room broadcast and private messages, multiplexed on a
//! prefix embedded in `data` rather than a dedicated flag.

use std::sync::Arc;

use crate::protocol::{Fields, Packet, PacketCode};
use crate::server::context::ServerContext;
use crate::session;
use crate::world::User;

pub fn handle(packet: &Packet, sender: &Arc<User>, ctx: &ServerContext) -> bool {
    if packet.fields.value0 != Some(sender.id) {
        return false;
    }
    let Some(value3) = packet.fields.value3 else {
        return false;
    };
    let Some(data) = packet.fields.data.clone() else {
        return false;
    };
    let page = ctx.config.server.code_page;

    let group_prefix = format!("GRP:[ {} ]  ", sender.name);
    if data.starts_with(&group_prefix) {
        if value3 == sender.room_id() {
            let notice = Packet::new(
                PacketCode::ChatRoom,
                Fields::default().value0(sender.id).value3(value3).data(data),
            );
            for user in ctx.world.users_in_room(value3) {
                if user.id != sender.id {
                    session::send(&user, notice.clone(), page);
                }
            }
            session::send(sender, Packet::new(PacketCode::ChatRoomReply, Fields::default().error(0)), page);
        } else {
            session::send(sender, Packet::new(PacketCode::ChatRoomReply, Fields::default().error(1)), page);
        }
        return true;
    }

    let private_prefix = format!("PRV:[ {} ]  ", sender.name);
    if data.starts_with(&private_prefix) {
        let target = ctx.world.get_user(value3);
        match target {
            Some(target) if target.room_id() == sender.room_id() => {
                session::send(&target, packet.clone(), page);
                session::send(sender, Packet::new(PacketCode::ChatRoomReply, Fields::default().error(0)), page);
            }
            _ => {
                session::send(sender, Packet::new(PacketCode::ChatRoomReply, Fields::default().error(1)), page);
            }
        }
        return true;
    }

    true
}
