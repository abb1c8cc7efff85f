//! Server error types.

use thiserror::Error;

/// Errors surfaced by the wire protocol and connection layer.
///
/// Every variant is connection-fatal: the contract on a protocol fault
/// or a dead send channel is to drop the connection, never to retry.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Declared payload length fell outside `[0, MAX_ORDER_LENGTH]`.
    #[error("declared payload length {0} out of range")]
    InvalidLength(i64),

    /// The decoder already faulted on this connection; no further bytes
    /// are accepted.
    #[error("frame decoder faulted, connection must be dropped")]
    DecoderFaulted,

    /// A queued send sat in flight past the stall threshold.
    #[error("send stalled for {0} ms, peer considered dead")]
    SendStalled(u64),

    /// The send worker has exited; nothing more can be queued.
    #[error("send channel closed")]
    SendClosed,

    /// The peer closed its end of the connection.
    #[error("connection closed by peer")]
    PeerClosed,

    /// Underlying socket failure.
    #[error("socket error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result alias for server operations.
pub type Result<T> = std::result::Result<T, ServerError>;
