//! `CreateGame`, `ConnectGame`: peer-hosted game advertisement and lookup.

use std::net::Ipv4Addr;
use std::sync::Arc;

use crate::protocol::{Fields, Packet, PacketCode};
use crate::server::context::ServerContext;
use crate::session;
use crate::world::{Game, User};

/// Sent as a `ChatRoom` courtesy message when a client's advertised host
/// address doesn't match its socket's address.
const CANNOT_HOST_NOTICE: &str =
    "GRP:Cannot host your game. Please use FrontendKitWS with fkNetcode. More information at worms2d.info/fkNetcode";

pub fn create(packet: &Packet, sender: &Arc<User>, ctx: &ServerContext) -> bool {
    if packet.fields.value1 != Some(0) {
        return false;
    }
    if packet.fields.value2 != Some(sender.room_id()) {
        return false;
    }
    if packet.fields.value4 != Some(0x800) {
        return false;
    }
    let Some(data) = packet.fields.data.clone() else {
        return false;
    };
    if packet.fields.name.is_none() {
        return false;
    }
    let Some(session_info) = packet.fields.session_info else {
        return false;
    };
    let page = ctx.config.server.code_page;

    let parsed: Option<Ipv4Addr> = data.parse().ok();
    if parsed != Some(sender.address) {
        session::send(
            sender,
            Packet::new(PacketCode::CreateGameReply, Fields::default().value1(0).error(2)),
            page,
        );
        session::send(
            sender,
            Packet::new(PacketCode::ChatRoom, Fields::default().data(CANNOT_HOST_NOTICE)),
            page,
        );
        return true;
    }

    let id = match ctx.world.next_id() {
        Ok(id) => id,
        Err(e) => {
            tracing::error!(error = %e, "id allocator exhausted while creating game");
            return false;
        }
    };
    let room_id = sender.room_id();
    let game = Arc::new(Game::new(id, sender.name.clone(), session_info, room_id, sender.address));
    ctx.world.add_game(game);

    let notice = Packet::new(
        PacketCode::CreateGame,
        Fields::default()
            .value1(id)
            .value2(room_id)
            .value4(0x800)
            .name(sender.name.clone())
            .data(data)
            .session_info(session_info),
    );
    session::broadcast_others(&ctx.world.users(), sender.id, notice, page);

    session::send(
        sender,
        Packet::new(PacketCode::CreateGameReply, Fields::default().value1(id).error(0)),
        page,
    );
    true
}

pub fn connect(packet: &Packet, sender: &Arc<User>, ctx: &ServerContext) -> bool {
    let Some(value0) = packet.fields.value0 else {
        return false;
    };
    let page = ctx.config.server.code_page;

    if let Some(game) = ctx.world.get_game(value0) {
        if game.room_id == sender.room_id() {
            session::send(
                sender,
                Packet::new(
                    PacketCode::ConnectGameReply,
                    Fields::default().data(game.host_address.to_string()).error(0),
                ),
                page,
            );
            return true;
        }
    }

    session::send(
        sender,
        Packet::new(PacketCode::ConnectGameReply, Fields::default().data("").error(1)),
        page,
    );
    true
}
