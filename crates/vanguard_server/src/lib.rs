//! # Vanguard Dedicated Server
//!
//! Headless server side of the lockstep order protocol.
//!
//! Accepts client connections, reassembles frame-numbered order packets
//! from their byte streams, routes them into the simulation scheduler,
//! and broadcasts the agreed order stream back out.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod connection;
pub mod error;
pub mod framing;
pub mod manager;
pub mod send;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to listen on.
    pub port: u16,
    /// Maximum players per game.
    pub max_players: u8,
    /// Simulation tick rate (should match clients).
    pub tick_rate: u32,
    /// Log a warning when a client stays silent this long.
    pub idle_warning_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 7777,
            max_players: 8,
            tick_rate: 30,
            idle_warning_secs: 30,
        }
    }
}
