//! Connection set ownership and the per-tick network pump.

use std::net::{TcpListener, TcpStream};

use vanguard_core::world::PlayerId;

use crate::connection::Connection;
use crate::error::{Result, ServerError};
use crate::ServerConfig;

/// Receiver for decoded order packets, tagged with their origin.
///
/// The simulation scheduler implements this to inject client orders
/// into the tick loop.
pub trait OrderDispatcher {
    /// Handle one decoded packet from `player` for simulation `frame`.
    fn dispatch(&mut self, player: PlayerId, frame: i32, payload: &[u8]);
}

/// Owns every live connection and drives their reads each tick.
#[derive(Debug)]
pub struct ConnectionManager {
    listener: TcpListener,
    connections: Vec<Connection>,
    next_player: PlayerId,
    max_players: u8,
    idle_warning_secs: u64,
}

impl ConnectionManager {
    /// Bind the listen socket described by `config`.
    pub fn bind(config: &ServerConfig) -> Result<Self> {
        let listener = TcpListener::bind(("0.0.0.0", config.port))?;
        listener.set_nonblocking(true)?;
        tracing::info!(addr = %listener.local_addr()?, "listening for clients");

        Ok(Self {
            listener,
            connections: Vec::new(),
            next_player: 0,
            max_players: config.max_players,
            idle_warning_secs: config.idle_warning_secs,
        })
    }

    /// Local listen address (useful when binding port 0 in tests).
    pub fn local_addr(&self) -> Result<std::net::SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Number of live connections.
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Accept every pending client, up to the player cap.
    pub fn accept_pending(&mut self) {
        loop {
            match self.listener.accept() {
                Ok((stream, addr)) => {
                    if self.connections.len() >= usize::from(self.max_players) {
                        tracing::warn!(peer = %addr, "refusing connection, server full");
                        drop(stream);
                        continue;
                    }
                    self.admit(stream);
                }
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => break,
                Err(e) => {
                    tracing::warn!(error = %e, "accept failed");
                    break;
                }
            }
        }
    }

    fn admit(&mut self, stream: TcpStream) {
        let player = self.next_player;
        match Connection::new(stream, player) {
            Ok(conn) => {
                tracing::info!(peer = %conn.peer(), player, "client connected");
                self.next_player = self.next_player.wrapping_add(1);
                self.connections.push(conn);
            }
            Err(e) => tracing::warn!(error = %e, "failed to set up accepted socket"),
        }
    }

    /// Pump every connection once: read what is available, route the
    /// decoded packets, drop anything faulted.
    pub fn pump(&mut self, dispatcher: &mut dyn OrderDispatcher) {
        let mut dropped = Vec::new();

        for (index, conn) in self.connections.iter_mut().enumerate() {
            match conn.pump_reads() {
                Ok(frames) => {
                    for frame in frames {
                        dispatcher.dispatch(conn.player(), frame.frame, &frame.payload);
                    }
                    if conn.idle_seconds() >= self.idle_warning_secs && conn.mark_timeout_warned()
                    {
                        tracing::warn!(
                            peer = %conn.peer(),
                            player = conn.player(),
                            idle_secs = conn.idle_seconds(),
                            "client has gone quiet"
                        );
                    }
                }
                Err(ServerError::PeerClosed) => {
                    tracing::info!(peer = %conn.peer(), player = conn.player(), "client disconnected");
                    dropped.push(index);
                }
                Err(e) => {
                    tracing::warn!(
                        peer = %conn.peer(),
                        player = conn.player(),
                        error = %e,
                        "dropping faulted client"
                    );
                    dropped.push(index);
                }
            }
        }

        for index in dropped.into_iter().rev() {
            self.connections.remove(index).disconnect();
        }
    }

    /// Send one framed packet to every client. A failed send is
    /// connection-fatal for that client.
    pub fn broadcast(&mut self, frame: i32, payload: &[u8]) {
        let mut dropped = Vec::new();

        for (index, conn) in self.connections.iter().enumerate() {
            if let Err(e) = conn.send_frame(frame, payload) {
                tracing::warn!(
                    peer = %conn.peer(),
                    player = conn.player(),
                    error = %e,
                    "dropping client after failed send"
                );
                dropped.push(index);
            }
        }

        for index in dropped.into_iter().rev() {
            self.connections.remove(index).disconnect();
        }
    }

    /// Disconnect every client.
    pub fn shutdown(&mut self) {
        for conn in self.connections.drain(..) {
            conn.disconnect();
        }
    }
}
