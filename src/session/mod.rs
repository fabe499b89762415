//! Per-connection plumbing: the state machine driving one TCP connection
//! and the outbound coalescing writer it owns.

pub mod connection;
pub mod writer;

use crate::codec::CodePage;
use crate::protocol::Packet;
use crate::session::writer::OutboundHandle;
use crate::world::User;

/// Encodes `packet` and enqueues it on `user`'s outbound writer. Encoding
/// failures and a torn-down receiver are both logged-and-dropped: by the
/// time a send fails the session is already tearing itself down.
pub fn send(user: &User, packet: Packet, page: CodePage) {
    send_handle(&user.outbound, packet, page);
}

/// Same as [`send`], but against a raw outbound handle rather than a
/// [`User`] — used during login, before a `User` exists yet.
pub fn send_handle(handle: &OutboundHandle, packet: Packet, page: CodePage) {
    match packet.encode(page) {
        Ok(bytes) => {
            let _ = handle.send(bytes.into());
        }
        Err(e) => tracing::warn!(error = %e, "dropping packet that failed to encode"),
    }
}

/// Sends `packet` to every user in `users` except `exclude`.
pub fn broadcast_others(users: &[std::sync::Arc<User>], exclude: u32, packet: Packet, page: CodePage) {
    for user in users {
        if user.id != exclude {
            send(user, packet.clone(), page);
        }
    }
}

/// Sends `packet` to every user in `users`, with no exclusion.
pub fn broadcast_all(users: &[std::sync::Arc<User>], packet: Packet, page: CodePage) {
    for user in users {
        send(user, packet.clone(), page);
    }
}
