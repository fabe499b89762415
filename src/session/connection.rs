//! Per-connection lifecycle: Accepted -> Authenticating -> Active ->
//! Draining -> Closed, expressed as a sequential chain of async functions
//! rather than an explicit state enum.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tokio::net::tcp::OwnedReadHalf;
use tokio::time::timeout;

use crate::handler;
use crate::protocol::{Fields, FrameReader, Packet, PacketCode};
use crate::server::context::ServerContext;
use crate::session;
use crate::session::writer::{self, WriterSettings};
use crate::world::User;

const READ_CHUNK: usize = 4096;

/// Drives one accepted socket from handshake through teardown. Never
/// returns early on error without first unwinding world state for any
/// user it managed to register.
pub async fn run(stream: TcpStream, addr: SocketAddr, ctx: Arc<ServerContext>) {
    if let Err(e) = stream.set_nodelay(true) {
        tracing::debug!(%addr, error = %e, "failed to set TCP_NODELAY");
    }

    let ip = match addr.ip() {
        IpAddr::V4(v4) => v4,
        IpAddr::V6(v6) => {
            tracing::debug!(%v6, "rejecting non-IPv4 peer");
            return;
        }
    };

    let (read_half, write_half) = stream.into_split();
    let (outbound_tx, outbound_rx) = writer::channel();
    let writer_settings = WriterSettings {
        flush_delay: Duration::from_millis(ctx.config.server.writer_flush_interval_ms),
        max_batch: ctx.config.server.writer_batch_max,
    };
    let writer_task = tokio::spawn(writer::run(
        write_half,
        outbound_rx,
        ctx.shutdown.clone(),
        writer_settings,
    ));

    let mut socket = read_half;
    let mut reader = FrameReader::new(ctx.config.server.code_page).with_shrink_thresholds(
        ctx.config.server.frame_shrink_capacity_bytes,
        ctx.config.server.frame_shrink_occupancy_divisor,
    );

    let user = authenticate(&mut socket, &mut reader, ip, outbound_tx.clone(), &ctx).await;

    if let Some(user) = user {
        tracing::info!(user_id = user.id, name = %user.name, %addr, "session authenticated");
        active_loop(&mut socket, &mut reader, &user, &ctx).await;
        disconnect(&user, &ctx).await;
    }

    drop(outbound_tx);
    let _ = writer_task.await;
    tracing::debug!(%addr, "connection closed");
}

/// Reads packets off `socket` until a `Login` is fully parsed or the login
/// deadline expires, returning the registered [`User`] on success.
async fn authenticate(
    socket: &mut OwnedReadHalf,
    reader: &mut FrameReader,
    ip: Ipv4Addr,
    outbound: writer::OutboundHandle,
    ctx: &Arc<ServerContext>,
) -> Option<Arc<User>> {
    let deadline = Duration::from_secs(ctx.config.server.login_timeout_secs);
    let mut buf = [0u8; READ_CHUNK];

    let page = ctx.config.server.code_page;
    let reject = |outbound: &writer::OutboundHandle| {
        session::send_handle(outbound, Packet::new(PacketCode::LoginReply, Fields::default().value1(0).error(1)), page);
    };

    let packet = loop {
        match reader.try_read() {
            Ok(Some(packet)) => break packet,
            Ok(None) => {}
            Err(e) => {
                tracing::debug!(error = %e, "malformed login frame");
                reject(&outbound);
                return None;
            }
        }

        let read = match timeout(deadline, socket.read(&mut buf)).await {
            Ok(Ok(0)) => return None,
            Ok(Ok(n)) => n,
            Ok(Err(e)) => {
                tracing::debug!(error = %e, "read error before login");
                return None;
            }
            Err(_) => {
                tracing::debug!("login timed out");
                return None;
            }
        };
        reader.append(&buf[..read]);
    };

    if packet.code != PacketCode::Login {
        tracing::debug!(code = ?packet.code, "expected Login as the first packet");
        reject(&outbound);
        return None;
    }

    let (Some(_value1), Some(_value4), Some(name), Some(session_info)) = (
        packet.fields.value1,
        packet.fields.value4,
        packet.fields.name.clone(),
        packet.fields.session_info,
    ) else {
        reject(&outbound);
        return None;
    };

    if ctx.world.user_name_taken(&name) {
        ctx.metrics.record_login_failed();
        reject(&outbound);
        return None;
    }

    let id = match ctx.world.next_id() {
        Ok(id) => id,
        Err(e) => {
            tracing::error!(error = %e, "id allocator exhausted during login");
            return None;
        }
    };

    // Announce the new user to everyone already logged in before adding it
    // to the directory, so it never sees its own join broadcast.
    let notice = Packet::new(
        PacketCode::Login,
        Fields::default().value1(id).value4(0).name(name.clone()).session_info(session_info),
    );
    session::broadcast_all(&ctx.world.users(), notice, page);

    let user = Arc::new(User::new(id, name, session_info, ip, outbound));
    ctx.world.add_user(user.clone());
    ctx.metrics.record_login_succeeded();

    session::send(
        &user,
        Packet::new(PacketCode::LoginReply, Fields::default().value1(id).error(0)),
        page,
    );

    Some(user)
}

/// Dispatches every packet that's already buffered, then blocks on the
/// socket with an idle deadline. Returns once the session must close.
async fn active_loop(socket: &mut OwnedReadHalf, reader: &mut FrameReader, user: &Arc<User>, ctx: &Arc<ServerContext>) {
    let idle = Duration::from_secs(ctx.config.server.idle_timeout_secs);
    let mut buf = [0u8; READ_CHUNK];

    loop {
        loop {
            match reader.try_read() {
                Ok(Some(packet)) => {
                    ctx.metrics.record_packet_parsed();
                    if !handler::dispatch(packet, user, ctx) {
                        return;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    ctx.metrics.record_parse_error();
                    tracing::debug!(user_id = user.id, error = %e, "closing connection on malformed frame");
                    return;
                }
            }
        }

        let read = match timeout(idle, socket.read(&mut buf)).await {
            Ok(Ok(0)) => return,
            Ok(Ok(n)) => n,
            Ok(Err(e)) => {
                tracing::debug!(user_id = user.id, error = %e, "read error");
                return;
            }
            Err(_) => {
                tracing::debug!(user_id = user.id, "idle timeout");
                return;
            }
        };
        reader.append(&buf[..read]);
    }
}

/// Unwinds every trace of `user` from world state: any game it hosts, its
/// room membership, and its own directory entry, broadcasting a notice for
/// each change before the final `DisconnectUser`.
async fn disconnect(user: &Arc<User>, ctx: &Arc<ServerContext>) {
    let page = ctx.config.server.code_page;

    ctx.world.remove_user(user.id);

    if let Some(game) = ctx.world.game_by_name(&user.name) {
        ctx.world.remove_game(game.id);
        let remaining = ctx.world.users();
        let leave = Packet::new(
            PacketCode::Leave,
            Fields::default().value2(game.id).value10(user.id),
        );
        session::broadcast_all(&remaining, leave, page);
        let close = Packet::new(PacketCode::Close, Fields::default().value10(game.id));
        session::broadcast_all(&remaining, close, page);
    }

    let room_id = user.room_id();
    if room_id != crate::world::NO_ROOM {
        let closed = ctx.world.leave_room(user.id, room_id);
        let remaining = ctx.world.users();
        let leave = Packet::new(
            PacketCode::Leave,
            Fields::default().value2(room_id).value10(user.id),
        );
        session::broadcast_all(&remaining, leave, page);
        if let Some(room) = closed {
            let close = Packet::new(PacketCode::Close, Fields::default().value10(room.id));
            session::broadcast_all(&remaining, close, page);
        }
    }

    let remaining = ctx.world.users();
    let disconnect_notice = Packet::new(PacketCode::DisconnectUser, Fields::default().value10(user.id));
    session::broadcast_all(&remaining, disconnect_notice, page);

    ctx.metrics.record_disconnect();
    tracing::info!(user_id = user.id, name = %user.name, "session disconnected");
}
