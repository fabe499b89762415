//! End-to-end protocol scenarios driven over real loopback TCP sockets
//! against the full accept-dispatch-broadcast pipeline.

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use worms_lobby_server::codec::CodePage;
use worms_lobby_server::config::Config;
use worms_lobby_server::protocol::{
    Fields, FrameReader, Nation, Packet, PacketCode, SessionAccess, SessionInfo, SessionType,
};
use worms_lobby_server::server::{acceptor, ServerContext};

const PAGE: CodePage = CodePage::Windows1251;

async fn spawn_server() -> SocketAddr {
    let ctx = Arc::new(ServerContext::new(Config::default()));
    let listener = acceptor::bind((Ipv4Addr::LOCALHOST, 0).into()).expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(acceptor::serve(ctx, listener));
    addr
}

fn user_session_info() -> SessionInfo {
    SessionInfo::new(Nation::new(0).unwrap(), SessionType::User, SessionAccess::Public)
}

fn room_session_info() -> SessionInfo {
    SessionInfo::new(Nation::new(0).unwrap(), SessionType::Room, SessionAccess::Public)
}

async fn send(stream: &mut TcpStream, packet: Packet) {
    let bytes = packet.encode(PAGE).unwrap();
    stream.write_all(&bytes).await.unwrap();
}

/// Reads exactly one packet, blocking (with a generous timeout) until a
/// complete frame has arrived.
async fn recv(stream: &mut TcpStream, reader: &mut FrameReader) -> Packet {
    let mut buf = [0u8; 4096];
    loop {
        if let Some(packet) = reader.try_read().unwrap() {
            return packet;
        }
        let n = tokio::time::timeout(Duration::from_secs(2), stream.read(&mut buf))
            .await
            .expect("timed out waiting for a packet")
            .expect("read error");
        assert!(n > 0, "peer closed before sending a complete packet");
        reader.append(&buf[..n]);
    }
}

async fn login(stream: &mut TcpStream, reader: &mut FrameReader, name: &str) -> Packet {
    send(
        stream,
        Packet::new(
            PacketCode::Login,
            Fields::default().value1(1).value4(0).name(name).session_info(user_session_info()),
        ),
    )
    .await;
    recv(stream, reader).await
}

#[tokio::test]
async fn login_success_assigns_an_id_past_the_floor() {
    let addr = spawn_server().await;
    let mut client = TcpStream::connect(addr).await.unwrap();
    let mut reader = FrameReader::new(PAGE);

    let reply = login(&mut client, &mut reader, "alice").await;
    assert_eq!(reply.code, PacketCode::LoginReply);
    assert_eq!(reply.fields.error, Some(0));
    let id = reply.fields.value1.expect("LoginReply carries the new id");
    assert!(id >= 0x1000);
}

#[tokio::test]
async fn duplicate_login_name_is_rejected_and_first_session_is_unaffected() {
    let addr = spawn_server().await;

    let mut first = TcpStream::connect(addr).await.unwrap();
    let mut first_reader = FrameReader::new(PAGE);
    let first_reply = login(&mut first, &mut first_reader, "bob").await;
    assert_eq!(first_reply.fields.error, Some(0));

    let mut second = TcpStream::connect(addr).await.unwrap();
    let mut second_reader = FrameReader::new(PAGE);
    let second_reply = login(&mut second, &mut second_reader, "bob").await;
    assert_eq!(second_reply.code, PacketCode::LoginReply);
    assert_eq!(second_reply.fields.value1, Some(0));
    assert_eq!(second_reply.fields.error, Some(1));

    // The rejected session never reaches Active; confirm the socket is
    // closed rather than left open for further traffic.
    let mut buf = [0u8; 8];
    let read = tokio::time::timeout(Duration::from_secs(1), second.read(&mut buf)).await;
    assert!(matches!(read, Ok(Ok(0)) | Err(_)));
}

#[tokio::test]
async fn room_lifecycle_create_join_leave() {
    let addr = spawn_server().await;

    let mut host = TcpStream::connect(addr).await.unwrap();
    let mut host_reader = FrameReader::new(PAGE);
    let host_reply = login(&mut host, &mut host_reader, "host").await;
    let host_id = host_reply.fields.value1.unwrap();

    send(
        &mut host,
        Packet::new(
            PacketCode::CreateRoom,
            Fields::default().value1(0).value4(0).name("lobby").session_info(room_session_info()),
        ),
    )
    .await;
    let created = recv(&mut host, &mut host_reader).await;
    assert_eq!(created.code, PacketCode::CreateRoomReply);
    assert_eq!(created.fields.error, Some(0));
    let room_id = created.fields.value1.unwrap();

    let mut guest = TcpStream::connect(addr).await.unwrap();
    let mut guest_reader = FrameReader::new(PAGE);
    let guest_reply = login(&mut guest, &mut guest_reader, "guest").await;
    let guest_id = guest_reply.fields.value1.unwrap();

    // The host sees the guest's login broadcast.
    let login_notice = recv(&mut host, &mut host_reader).await;
    assert_eq!(login_notice.code, PacketCode::Login);
    assert_eq!(login_notice.fields.value1, Some(guest_id));

    send(
        &mut guest,
        Packet::new(PacketCode::Join, Fields::default().value2(room_id).value10(guest_id)),
    )
    .await;
    let join_reply = recv(&mut guest, &mut guest_reader).await;
    assert_eq!(join_reply.code, PacketCode::JoinReply);
    assert_eq!(join_reply.fields.error, Some(0));

    let join_notice = recv(&mut host, &mut host_reader).await;
    assert_eq!(join_notice.code, PacketCode::Join);
    assert_eq!(join_notice.fields.value10, Some(guest_id));

    send(
        &mut guest,
        Packet::new(PacketCode::Leave, Fields::default().value2(room_id).value10(guest_id)),
    )
    .await;
    let leave_reply = recv(&mut guest, &mut guest_reader).await;
    assert_eq!(leave_reply.code, PacketCode::LeaveReply);
    assert_eq!(leave_reply.fields.error, Some(0));

    let leave_notice = recv(&mut host, &mut host_reader).await;
    assert_eq!(leave_notice.code, PacketCode::Leave);
    assert_eq!(leave_notice.fields.value10, Some(guest_id));

    let _ = host_id;
}

#[tokio::test]
async fn chat_room_broadcast_reaches_other_room_members_only() {
    let addr = spawn_server().await;

    let mut alice = TcpStream::connect(addr).await.unwrap();
    let mut alice_reader = FrameReader::new(PAGE);
    let alice_reply = login(&mut alice, &mut alice_reader, "alice").await;
    let alice_id = alice_reply.fields.value1.unwrap();

    send(
        &mut alice,
        Packet::new(
            PacketCode::CreateRoom,
            Fields::default().value1(0).value4(0).name("chatroom").session_info(room_session_info()),
        ),
    )
    .await;
    let created = recv(&mut alice, &mut alice_reader).await;
    let room_id = created.fields.value1.unwrap();

    send(&mut alice, Packet::new(PacketCode::Join, Fields::default().value2(room_id).value10(alice_id))).await;
    let _alice_join_reply = recv(&mut alice, &mut alice_reader).await;

    let mut bob = TcpStream::connect(addr).await.unwrap();
    let mut bob_reader = FrameReader::new(PAGE);
    let bob_reply = login(&mut bob, &mut bob_reader, "bob").await;
    let bob_id = bob_reply.fields.value1.unwrap();
    let _login_notice = recv(&mut alice, &mut alice_reader).await;

    send(&mut bob, Packet::new(PacketCode::Join, Fields::default().value2(room_id).value10(bob_id))).await;
    let _bob_join_reply = recv(&mut bob, &mut bob_reader).await;
    let _join_notice = recv(&mut alice, &mut alice_reader).await;

    let message = "GRP:[ alice ]  hello room".to_string();
    send(
        &mut alice,
        Packet::new(
            PacketCode::ChatRoom,
            Fields::default().value0(alice_id).value3(room_id).data(message.clone()),
        ),
    )
    .await;

    let chat_reply = recv(&mut alice, &mut alice_reader).await;
    assert_eq!(chat_reply.code, PacketCode::ChatRoomReply);
    assert_eq!(chat_reply.fields.error, Some(0));

    let received = recv(&mut bob, &mut bob_reader).await;
    assert_eq!(received.code, PacketCode::ChatRoom);
    assert_eq!(received.fields.data.as_deref(), Some(message.as_str()));
}

#[tokio::test]
async fn create_game_with_mismatched_address_is_rejected() {
    let addr = spawn_server().await;
    let mut client = TcpStream::connect(addr).await.unwrap();
    let mut reader = FrameReader::new(PAGE);
    let reply = login(&mut client, &mut reader, "host").await;
    let id = reply.fields.value1.unwrap();

    send(
        &mut client,
        Packet::new(
            PacketCode::CreateRoom,
            Fields::default().value1(0).value4(0).name("arena").session_info(room_session_info()),
        ),
    )
    .await;
    let room_reply = recv(&mut client, &mut reader).await;
    let room_id = room_reply.fields.value1.unwrap();

    send(&mut client, Packet::new(PacketCode::Join, Fields::default().value2(room_id).value10(id))).await;
    let _join_reply = recv(&mut client, &mut reader).await;

    send(
        &mut client,
        Packet::new(
            PacketCode::CreateGame,
            Fields::default()
                .value1(0)
                .value2(room_id)
                .value4(0x800)
                .name("host")
                .data("10.0.0.99")
                .session_info(SessionInfo::new(Nation::new(0).unwrap(), SessionType::Game, SessionAccess::Public)),
        ),
    )
    .await;

    let game_reply = recv(&mut client, &mut reader).await;
    assert_eq!(game_reply.code, PacketCode::CreateGameReply);
    assert_eq!(game_reply.fields.error, Some(2));

    let notice = recv(&mut client, &mut reader).await;
    assert_eq!(notice.code, PacketCode::ChatRoom);
    assert!(notice.fields.data.unwrap().contains("fkNetcode"));
}

#[tokio::test]
async fn connect_game_outside_the_callers_room_is_refused() {
    let addr = spawn_server().await;

    let mut host = TcpStream::connect(addr).await.unwrap();
    let mut host_reader = FrameReader::new(PAGE);
    let host_reply = login(&mut host, &mut host_reader, "host").await;
    let host_id = host_reply.fields.value1.unwrap();

    send(
        &mut host,
        Packet::new(
            PacketCode::CreateRoom,
            Fields::default().value1(0).value4(0).name("arena").session_info(room_session_info()),
        ),
    )
    .await;
    let room_reply = recv(&mut host, &mut host_reader).await;
    let room_id = room_reply.fields.value1.unwrap();

    send(&mut host, Packet::new(PacketCode::Join, Fields::default().value2(room_id).value10(host_id))).await;
    let _join_reply = recv(&mut host, &mut host_reader).await;

    send(
        &mut host,
        Packet::new(
            PacketCode::CreateGame,
            Fields::default()
                .value1(0)
                .value2(room_id)
                .value4(0x800)
                .name("host")
                .data(host.local_addr().unwrap().ip().to_string())
                .session_info(SessionInfo::new(Nation::new(0).unwrap(), SessionType::Game, SessionAccess::Public)),
        ),
    )
    .await;
    let game_reply = recv(&mut host, &mut host_reader).await;
    let game_id = game_reply.fields.value1.unwrap();
    assert_eq!(game_reply.fields.error, Some(0));

    // A second user, never having joined the host's room, tries to connect.
    let mut outsider = TcpStream::connect(addr).await.unwrap();
    let mut outsider_reader = FrameReader::new(PAGE);
    let _outsider_reply = login(&mut outsider, &mut outsider_reader, "outsider").await;
    let _login_notice = recv(&mut host, &mut host_reader).await;

    send(&mut outsider, Packet::new(PacketCode::ConnectGame, Fields::default().value0(game_id))).await;
    let connect_reply = recv(&mut outsider, &mut outsider_reader).await;
    assert_eq!(connect_reply.code, PacketCode::ConnectGameReply);
    assert_eq!(connect_reply.fields.error, Some(1));

    let _ = host_reply;
}
