//! Outbound coalescing writer: one per connection, draining an unbounded
//! queue of owned byte buffers with batched, optionally vectored writes.

use std::io::IoSlice;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::mpsc;
use tokio::time::sleep;

/// Non-owning handle producers use to enqueue bytes for a session's writer.
///
/// This is the "weak back-reference" the protocol's `User ↔ Session` cycle
/// collapses to: any handler can clone it and fire a packet at a user
/// without taking ownership of that user's connection.
pub type OutboundHandle = mpsc::UnboundedSender<Bytes>;

/// Default flush delay and batch size, used when no override is configured.
pub const DEFAULT_FLUSH_DELAY: Duration = Duration::from_millis(100);
pub const DEFAULT_MAX_BATCH: usize = 16;

/// Writer batching knobs, threaded through from [`crate::config`].
#[derive(Debug, Clone, Copy)]
pub struct WriterSettings {
    pub flush_delay: Duration,
    pub max_batch: usize,
}

impl Default for WriterSettings {
    fn default() -> Self {
        Self {
            flush_delay: DEFAULT_FLUSH_DELAY,
            max_batch: DEFAULT_MAX_BATCH,
        }
    }
}

/// Creates a fresh outbound queue and its producer handle.
#[must_use]
pub fn channel() -> (OutboundHandle, mpsc::UnboundedReceiver<Bytes>) {
    mpsc::unbounded_channel()
}

/// Drains `rx` into `sock` until the socket errors, the shutdown flag trips,
/// or every producer handle is dropped.
///
/// Bytes from a single producer are written in enqueue order; no ordering
/// is implied or required across producers.
pub async fn run(
    mut sock: OwnedWriteHalf,
    mut rx: mpsc::UnboundedReceiver<Bytes>,
    shutdown: Arc<tokio::sync::Notify>,
    settings: WriterSettings,
) {
    let mut batch = Vec::with_capacity(settings.max_batch);

    loop {
        tokio::select! {
            () = shutdown.notified() => break,
            n = rx.recv_many(&mut batch, settings.max_batch) => {
                if n == 0 {
                    break; // every sender dropped
                }
                if write_batch(&mut sock, &batch).await.is_err() {
                    break;
                }
                batch.clear();
            }
        }

        // Drained the queue for now; wait for a flush delay or new work.
        if rx.is_empty() {
            tokio::select! {
                () = shutdown.notified() => break,
                () = sleep(settings.flush_delay) => {}
                n = rx.recv_many(&mut batch, settings.max_batch) => {
                    if n == 0 {
                        break;
                    }
                    if write_batch(&mut sock, &batch).await.is_err() {
                        break;
                    }
                    batch.clear();
                }
            }
        }
    }
}

async fn write_batch(sock: &mut OwnedWriteHalf, batch: &[Bytes]) -> std::io::Result<()> {
    if batch.is_empty() {
        return Ok(());
    }
    if batch.len() == 1 {
        return sock.write_all(&batch[0]).await;
    }

    let slices: Vec<IoSlice<'_>> = batch.iter().map(|b| IoSlice::new(b)).collect();
    let total: usize = batch.iter().map(Bytes::len).sum();
    let mut written = 0usize;
    while written < total {
        let n = sock.write_vectored(&slices).await?;
        if n == 0 {
            return Err(std::io::ErrorKind::WriteZero.into());
        }
        written += n;
        if written >= total {
            break;
        }
        // Partial vectored write: fall back to a plain concatenated write
        // for whatever remains rather than re-slicing IoSlice boundaries.
        let mut rest = Vec::with_capacity(total - written);
        let mut skip = written;
        for b in batch {
            if skip >= b.len() {
                skip -= b.len();
                continue;
            }
            rest.extend_from_slice(&b[skip..]);
            skip = 0;
        }
        return sock.write_all(&rest).await;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    async fn loopback_pair() -> (tokio::net::TcpStream, tokio::net::TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let connect = tokio::net::TcpStream::connect(addr);
        let (accept, connect) = tokio::join!(listener.accept(), connect);
        (accept.unwrap().0, connect.unwrap())
    }

    #[tokio::test]
    async fn write_batch_concatenates_multiple_buffers() {
        let (server, mut client) = loopback_pair().await;
        let (_rx, mut tx) = server.into_split();

        let batch = vec![Bytes::from_static(b"hello "), Bytes::from_static(b"world")];
        write_batch(&mut tx, &batch).await.unwrap();
        drop(tx);

        let mut got = Vec::new();
        client.read_to_end(&mut got).await.unwrap();
        assert_eq!(got, b"hello world");
    }

    #[tokio::test]
    async fn run_drains_queue_then_idles_until_shutdown() {
        let (server, mut client) = loopback_pair().await;
        let (_rx_unused, write) = server.into_split();
        let (tx, rx) = channel();
        let shutdown = Arc::new(tokio::sync::Notify::new());

        let shutdown_clone = Arc::clone(&shutdown);
        let task = tokio::spawn(run(write, rx, shutdown_clone, WriterSettings::default()));

        tx.send(Bytes::from_static(b"ping")).unwrap();
        let mut buf = [0u8; 4];
        client.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"ping");

        shutdown.notify_waiters();
        task.await.unwrap();
    }
}
