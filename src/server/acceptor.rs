//! Binds the listening socket and spawns one session per accepted
//! connection, subject to a live-connection cap.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use socket2::{Domain, Protocol, SockRef, Socket, Type};
use tokio::net::TcpListener;

use crate::server::context::ServerContext;
use crate::session::connection;

/// Binds `ctx.config.port` with `SO_REUSEADDR` set before bind, then accepts
/// connections until shutdown is signalled. Each accepted socket is handed
/// to its own session task; the listener itself never blocks on a session.
pub async fn run(ctx: Arc<ServerContext>) -> std::io::Result<()> {
    let addr: SocketAddr = (std::net::Ipv4Addr::UNSPECIFIED, ctx.config.port).into();
    let listener = bind(addr)?;
    tracing::info!(%addr, "listening");
    serve(ctx, listener).await
}

/// Drives the accept loop over an already-bound listener. Split from
/// [`run`] so callers that need the bound ephemeral port (port `0`) up
/// front, such as tests, can bind first and read it back.
pub async fn serve(ctx: Arc<ServerContext>, listener: TcpListener) -> std::io::Result<()> {
    let live = Arc::new(AtomicUsize::new(0));

    loop {
        tokio::select! {
            () = ctx.shutdown.notified() => {
                tracing::info!("shutdown signalled, no longer accepting connections");
                return Ok(());
            }
            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(pair) => pair,
                    Err(e) => {
                        tracing::warn!(error = %e, "accept failed");
                        continue;
                    }
                };

                if live.load(Ordering::Acquire) >= ctx.config.server.max_connections {
                    ctx.metrics.record_connection_rejected();
                    tracing::debug!(%peer, "rejecting connection: at capacity");
                    drop(stream);
                    continue;
                }

                if let Err(e) = SockRef::from(&stream).set_keepalive(true) {
                    tracing::debug!(%peer, error = %e, "failed to set SO_KEEPALIVE");
                }

                live.fetch_add(1, Ordering::AcqRel);
                ctx.metrics.record_connection_accepted();

                let ctx = ctx.clone();
                let live = live.clone();
                tokio::spawn(async move {
                    connection::run(stream, peer, ctx).await;
                    live.fetch_sub(1, Ordering::AcqRel);
                });
            }
        }
    }
}

/// Binds `addr` with `SO_REUSEADDR` set before bind. `addr`'s port may be
/// `0` to let the OS choose one; read it back with `TcpListener::local_addr`.
pub fn bind(addr: SocketAddr) -> std::io::Result<TcpListener> {
    let domain = Domain::for_address(addr);
    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;
    socket.set_reuse_address(true)?;
    socket.set_nonblocking(true)?;
    socket.bind(&addr.into())?;
    socket.listen(1024)?;
    TcpListener::from_std(socket.into())
}
