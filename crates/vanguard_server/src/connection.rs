//! One client connection: non-blocking reads through the frame decoder
//! plus the outbound send channel.

use std::io::Read;
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::time::Instant;

use vanguard_core::world::PlayerId;

use crate::error::{Result, ServerError};
use crate::framing::{encode_frame, FrameDecoder, OrderFrame};
use crate::send::SendChannel;

const READ_CHUNK: usize = 4096;

/// A live client connection.
///
/// The owning thread drives non-blocking reads via [`pump_reads`]; the
/// send worker owns all writes. The auth token is immutable once set.
///
/// [`pump_reads`]: Connection::pump_reads
#[derive(Debug)]
pub struct Connection {
    stream: TcpStream,
    peer: SocketAddr,
    player: PlayerId,
    decoder: FrameDecoder,
    send: SendChannel,
    auth_token: Option<String>,
    validated: bool,
    last_received: Instant,
    timeout_warned: bool,
}

impl Connection {
    /// Wrap an accepted socket.
    ///
    /// Switches the read half to non-blocking and spawns the send
    /// worker on a cloned write half.
    pub fn new(stream: TcpStream, player: PlayerId) -> Result<Self> {
        let peer = stream.peer_addr()?;
        stream.set_nonblocking(true)?;
        let write_half = stream.try_clone()?;

        Ok(Self {
            stream,
            peer,
            player,
            decoder: FrameDecoder::new(),
            send: SendChannel::spawn(write_half, peer.to_string()),
            auth_token: None,
            validated: false,
            last_received: Instant::now(),
            timeout_warned: false,
        })
    }

    /// Player slot this connection controls.
    #[must_use]
    pub fn player(&self) -> PlayerId {
        self.player
    }

    /// Peer address, for logs.
    #[must_use]
    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// Set the auth token. Returns false (and changes nothing) if one
    /// is already set.
    pub fn set_auth_token(&mut self, token: String) -> bool {
        if self.auth_token.is_some() {
            return false;
        }
        self.auth_token = Some(token);
        true
    }

    /// The auth token, if the client has presented one.
    #[must_use]
    pub fn auth_token(&self) -> Option<&str> {
        self.auth_token.as_deref()
    }

    /// Mark the handshake as validated.
    pub fn validate(&mut self) {
        self.validated = true;
    }

    /// Whether the handshake has been validated.
    #[must_use]
    pub fn is_validated(&self) -> bool {
        self.validated
    }

    /// Highest frame number received from this client.
    #[must_use]
    pub fn most_recent_frame(&self) -> i32 {
        self.decoder.most_recent_frame()
    }

    /// Seconds since the last successful read.
    #[must_use]
    pub fn idle_seconds(&self) -> u64 {
        self.last_received.elapsed().as_secs()
    }

    /// Record that an idle warning was logged, so it fires once.
    pub fn mark_timeout_warned(&mut self) -> bool {
        let first = !self.timeout_warned;
        self.timeout_warned = true;
        first
    }

    /// Queue one framed packet for transmission.
    pub fn send_frame(&self, frame: i32, payload: &[u8]) -> Result<()> {
        self.send.send(encode_frame(frame, payload)?)
    }

    /// Drain everything currently readable and decode it.
    ///
    /// A zero-length read means the peer closed gracefully; would-block
    /// means "no more data this tick". Both a socket error and a
    /// decoder fault are connection-fatal.
    pub fn pump_reads(&mut self) -> Result<Vec<OrderFrame>> {
        let mut frames = Vec::new();
        let mut chunk = [0u8; READ_CHUNK];

        loop {
            match self.stream.read(&mut chunk) {
                Ok(0) => return Err(ServerError::PeerClosed),
                Ok(n) => {
                    self.last_received = Instant::now();
                    self.timeout_warned = false;
                    frames.extend(self.decoder.feed(&chunk[..n])?);
                }
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }

        Ok(frames)
    }

    /// Tear the connection down.
    ///
    /// If the send worker is still running it gets cancelled and closes
    /// the socket itself; otherwise the owner closes it here.
    pub fn disconnect(mut self) {
        if self.send.is_worker_alive() {
            self.send.cancel();
        } else {
            let _ = self.stream.shutdown(Shutdown::Both);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::net::TcpListener;
    use std::time::Duration;

    fn connected_pair() -> (Connection, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let client = TcpStream::connect(addr).unwrap();
        let (server_side, _) = listener.accept().unwrap();
        (Connection::new(server_side, 0).unwrap(), client)
    }

    fn pump_until(conn: &mut Connection, want: usize) -> Vec<OrderFrame> {
        let mut frames = Vec::new();
        for _ in 0..200 {
            frames.extend(conn.pump_reads().unwrap());
            if frames.len() >= want {
                return frames;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        panic!("expected {want} frames, got {}", frames.len());
    }

    #[test]
    fn test_pump_decodes_client_packets() {
        let (mut conn, mut client) = connected_pair();

        client.write_all(&encode_frame(3, b"first").unwrap()).unwrap();
        client.write_all(&encode_frame(4, b"second").unwrap()).unwrap();
        client.flush().unwrap();

        let frames = pump_until(&mut conn, 2);
        assert_eq!(frames[0].frame, 3);
        assert_eq!(frames[1].payload, b"second");
        assert_eq!(conn.most_recent_frame(), 4);
    }

    #[test]
    fn test_peer_close_is_fatal() {
        let (mut conn, client) = connected_pair();
        drop(client);

        let mut saw_close = false;
        for _ in 0..200 {
            match conn.pump_reads() {
                Err(ServerError::PeerClosed) => {
                    saw_close = true;
                    break;
                }
                Ok(_) => std::thread::sleep(Duration::from_millis(5)),
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
        assert!(saw_close);
    }

    #[test]
    fn test_auth_token_is_set_once() {
        let (mut conn, _client) = connected_pair();

        assert!(conn.set_auth_token("secret".into()));
        assert!(!conn.set_auth_token("other".into()));
        assert_eq!(conn.auth_token(), Some("secret"));
    }

    #[test]
    fn test_send_frame_reaches_client() {
        let (conn, mut client) = connected_pair();
        client
            .set_read_timeout(Some(Duration::from_secs(5)))
            .unwrap();

        conn.send_frame(11, b"hello").unwrap();

        let mut decoder = FrameDecoder::new();
        let mut chunk = [0u8; 64];
        loop {
            let n = client.read(&mut chunk).unwrap();
            let frames = decoder.feed(&chunk[..n]).unwrap();
            if !frames.is_empty() {
                assert_eq!(frames[0].frame, 11);
                assert_eq!(frames[0].payload, b"hello");
                break;
            }
        }
    }
}
