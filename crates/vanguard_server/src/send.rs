//! Per-connection outbound send channel.
//!
//! Each connection owns one worker thread doing blocking writes, so
//! buffers hit the wire strictly in enqueue order. Producers enqueue
//! through a thread-safe FIFO and never block on the socket themselves.
//!
//! Stall detection: while a write is in flight the worker publishes a
//! start marker through an atomic; a producer that observes the marker
//! exceeding [`STALL_TIMEOUT_MS`] fails fast instead of growing the
//! queue against a dead peer.

use std::net::{Shutdown, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crossbeam_channel::{unbounded, Sender};
use std::io::Write;

use crate::error::{Result, ServerError};

/// An in-flight send older than this means the peer is dead.
pub const STALL_TIMEOUT_MS: u64 = 10_000;

/// Marker value meaning "no send in flight". Start times are stored
/// offset by one so a send beginning at millisecond zero is
/// distinguishable from idle.
const IDLE: u64 = 0;

/// Queue plus worker thread owning the write half of a socket.
#[derive(Debug)]
pub struct SendChannel {
    queue: Option<Sender<Vec<u8>>>,
    cancelled: Arc<AtomicBool>,
    in_flight_since: Arc<AtomicU64>,
    epoch: Instant,
    stall_timeout_ms: u64,
    worker: Option<JoinHandle<()>>,
}

impl SendChannel {
    /// Spawn the worker on the write half of a connection's socket,
    /// with the standard stall threshold.
    ///
    /// `label` identifies the connection in logs.
    #[must_use]
    pub fn spawn(stream: TcpStream, label: String) -> Self {
        Self::spawn_with_timeout(stream, label, STALL_TIMEOUT_MS)
    }

    /// Spawn with an explicit stall threshold in milliseconds.
    #[must_use]
    pub fn spawn_with_timeout(stream: TcpStream, label: String, stall_timeout_ms: u64) -> Self {
        let (tx, rx) = unbounded::<Vec<u8>>();
        let cancelled = Arc::new(AtomicBool::new(false));
        let in_flight_since = Arc::new(AtomicU64::new(IDLE));
        let epoch = Instant::now();

        let worker_cancelled = Arc::clone(&cancelled);
        let worker_marker = Arc::clone(&in_flight_since);
        let worker = thread::spawn(move || {
            let mut stream = stream;
            while let Ok(buf) = rx.recv() {
                if worker_cancelled.load(Ordering::Acquire) {
                    break;
                }

                let started = u64::try_from(epoch.elapsed().as_millis()).unwrap_or(u64::MAX);
                worker_marker.store(started + 1, Ordering::Release);
                let result = stream.write_all(&buf);
                worker_marker.store(IDLE, Ordering::Release);

                if let Err(e) = result {
                    tracing::warn!(connection = %label, error = %e, "send failed, tearing down socket");
                    let _ = stream.shutdown(Shutdown::Both);
                    return;
                }
            }

            if worker_cancelled.load(Ordering::Acquire) {
                let _ = stream.shutdown(Shutdown::Both);
            } else {
                // Queue closed without cancellation: drain finished,
                // part gracefully.
                let _ = stream.shutdown(Shutdown::Write);
            }
        });

        Self {
            queue: Some(tx),
            cancelled,
            in_flight_since,
            epoch,
            stall_timeout_ms,
            worker: Some(worker),
        }
    }

    /// Enqueue a buffer for in-order transmission.
    ///
    /// Fails fast when the current in-flight send has stalled past the
    /// threshold, or when the worker has already exited.
    pub fn send(&self, buf: Vec<u8>) -> Result<()> {
        let marker = self.in_flight_since.load(Ordering::Acquire);
        if marker != IDLE {
            let now = u64::try_from(self.epoch.elapsed().as_millis()).unwrap_or(u64::MAX);
            let elapsed = now.saturating_sub(marker - 1);
            if elapsed >= self.stall_timeout_ms {
                return Err(ServerError::SendStalled(elapsed));
            }
        }

        self.queue
            .as_ref()
            .ok_or(ServerError::SendClosed)?
            .send(buf)
            .map_err(|_| ServerError::SendClosed)
    }

    /// Whether the worker thread is still running.
    #[must_use]
    pub fn is_worker_alive(&self) -> bool {
        self.worker.as_ref().is_some_and(|w| !w.is_finished())
    }

    /// Request cancellation: the worker stops after any in-flight write
    /// completes and closes the socket itself.
    pub fn cancel(&mut self) {
        self.cancelled.store(true, Ordering::Release);
        self.queue = None;
    }

    /// Stop accepting sends, let the worker drain the queue, and wait
    /// for it to exit.
    pub fn finish(&mut self) {
        self.queue = None;
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl Drop for SendChannel {
    fn drop(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };
        if worker.is_finished() {
            let _ = worker.join();
        } else {
            // Worker still running: it owns socket cleanup. Detach so a
            // blocked write cannot hang the owner.
            self.cancelled.store(true, Ordering::Release);
            self.queue = None;
        }
    }
}
