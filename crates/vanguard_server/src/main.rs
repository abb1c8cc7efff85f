//! Vanguard RTS - Dedicated Server

use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vanguard_core::world::PlayerId;
use vanguard_server::manager::{ConnectionManager, OrderDispatcher};
use vanguard_server::ServerConfig;

/// Relays every received packet back to all clients.
///
/// Stand-in scheduler until the full game session layer lands on top.
struct RelayDispatcher {
    pending: Vec<(i32, Vec<u8>)>,
}

impl OrderDispatcher for RelayDispatcher {
    fn dispatch(&mut self, player: PlayerId, frame: i32, payload: &[u8]) {
        tracing::debug!(player, frame, bytes = payload.len(), "received orders");
        self.pending.push((frame, payload.to_vec()));
    }
}

fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    tracing::info!("Starting Vanguard RTS Dedicated Server");

    let config = ServerConfig::default();
    let mut manager = match ConnectionManager::bind(&config) {
        Ok(m) => m,
        Err(e) => {
            tracing::error!(error = %e, port = config.port, "failed to bind listen socket");
            std::process::exit(1);
        }
    };

    let tick = Duration::from_secs(1) / config.tick_rate;
    let mut dispatcher = RelayDispatcher { pending: Vec::new() };

    loop {
        manager.accept_pending();
        manager.pump(&mut dispatcher);

        for (frame, payload) in dispatcher.pending.drain(..) {
            manager.broadcast(frame, &payload);
        }

        std::thread::sleep(tick);
    }
}
