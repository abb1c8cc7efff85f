//! Loopback integration tests for the connection layer.

use std::io::{Read, Write};
use std::net::TcpStream;
use std::time::Duration;

use vanguard_core::world::PlayerId;
use vanguard_server::framing::{encode_frame, FrameDecoder};
use vanguard_server::manager::{ConnectionManager, OrderDispatcher};
use vanguard_server::ServerConfig;

#[derive(Default)]
struct RecordingDispatcher {
    received: Vec<(PlayerId, i32, Vec<u8>)>,
}

impl OrderDispatcher for RecordingDispatcher {
    fn dispatch(&mut self, player: PlayerId, frame: i32, payload: &[u8]) {
        self.received.push((player, frame, payload.to_vec()));
    }
}

fn test_manager(max_players: u8) -> ConnectionManager {
    let config = ServerConfig {
        port: 0,
        max_players,
        ..ServerConfig::default()
    };
    ConnectionManager::bind(&config).unwrap()
}

fn pump_until<F: Fn(&RecordingDispatcher) -> bool>(
    manager: &mut ConnectionManager,
    dispatcher: &mut RecordingDispatcher,
    done: F,
) {
    for _ in 0..400 {
        manager.accept_pending();
        manager.pump(dispatcher);
        if done(dispatcher) {
            return;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    panic!("condition not reached after pumping");
}

#[test]
fn test_client_orders_reach_dispatcher() {
    let mut manager = test_manager(8);
    let addr = manager.local_addr().unwrap();

    let mut client = TcpStream::connect(addr).unwrap();
    client.write_all(&encode_frame(1, b"orders-a").unwrap()).unwrap();
    client.write_all(&encode_frame(2, b"orders-b").unwrap()).unwrap();
    client.flush().unwrap();

    let mut dispatcher = RecordingDispatcher::default();
    pump_until(&mut manager, &mut dispatcher, |d| d.received.len() >= 2);

    assert_eq!(dispatcher.received[0], (0, 1, b"orders-a".to_vec()));
    assert_eq!(dispatcher.received[1], (0, 2, b"orders-b".to_vec()));
}

#[test]
fn test_players_get_distinct_indices() {
    let mut manager = test_manager(8);
    let addr = manager.local_addr().unwrap();

    let mut first = TcpStream::connect(addr).unwrap();
    let mut second = TcpStream::connect(addr).unwrap();

    let mut dispatcher = RecordingDispatcher::default();
    // Both sockets must be admitted before either writes.
    for _ in 0..400 {
        manager.accept_pending();
        if manager.connection_count() == 2 {
            break;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    assert_eq!(manager.connection_count(), 2);

    first.write_all(&encode_frame(5, b"p0").unwrap()).unwrap();
    second.write_all(&encode_frame(5, b"p1").unwrap()).unwrap();

    pump_until(&mut manager, &mut dispatcher, |d| d.received.len() >= 2);

    let mut players: Vec<PlayerId> = dispatcher.received.iter().map(|(p, _, _)| *p).collect();
    players.sort_unstable();
    assert_eq!(players, vec![0, 1]);
}

#[test]
fn test_broadcast_reaches_all_clients() {
    let mut manager = test_manager(8);
    let addr = manager.local_addr().unwrap();

    let clients: Vec<TcpStream> = (0..2).map(|_| TcpStream::connect(addr).unwrap()).collect();
    for _ in 0..400 {
        manager.accept_pending();
        if manager.connection_count() == 2 {
            break;
        }
        std::thread::sleep(Duration::from_millis(5));
    }

    manager.broadcast(77, b"tick-orders");

    for mut client in clients {
        client
            .set_read_timeout(Some(Duration::from_secs(5)))
            .unwrap();
        let mut decoder = FrameDecoder::new();
        let mut chunk = [0u8; 64];
        loop {
            let n = client.read(&mut chunk).unwrap();
            let frames = decoder.feed(&chunk[..n]).unwrap();
            if !frames.is_empty() {
                assert_eq!(frames[0].frame, 77);
                assert_eq!(frames[0].payload, b"tick-orders");
                break;
            }
        }
    }
}

#[test]
fn test_disconnect_removes_connection() {
    let mut manager = test_manager(8);
    let addr = manager.local_addr().unwrap();

    let client = TcpStream::connect(addr).unwrap();
    let mut dispatcher = RecordingDispatcher::default();
    for _ in 0..400 {
        manager.accept_pending();
        if manager.connection_count() == 1 {
            break;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    assert_eq!(manager.connection_count(), 1);

    drop(client);
    for _ in 0..400 {
        manager.pump(&mut dispatcher);
        if manager.connection_count() == 0 {
            break;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    assert_eq!(manager.connection_count(), 0);
}

#[test]
fn test_protocol_fault_drops_client() {
    let mut manager = test_manager(8);
    let addr = manager.local_addr().unwrap();

    let mut client = TcpStream::connect(addr).unwrap();
    for _ in 0..400 {
        manager.accept_pending();
        if manager.connection_count() == 1 {
            break;
        }
        std::thread::sleep(Duration::from_millis(5));
    }

    // Declared length far past the protocol maximum.
    let mut hostile = Vec::new();
    hostile.extend_from_slice(&(1_000_000i32).to_le_bytes());
    hostile.extend_from_slice(&1i32.to_le_bytes());
    client.write_all(&hostile).unwrap();
    client.flush().unwrap();

    let mut dispatcher = RecordingDispatcher::default();
    for _ in 0..400 {
        manager.pump(&mut dispatcher);
        if manager.connection_count() == 0 {
            break;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    assert_eq!(manager.connection_count(), 0);
    assert!(dispatcher.received.is_empty());
}

#[test]
fn test_server_full_refuses_extra_clients() {
    let mut manager = test_manager(1);
    let addr = manager.local_addr().unwrap();

    let _first = TcpStream::connect(addr).unwrap();
    for _ in 0..400 {
        manager.accept_pending();
        if manager.connection_count() == 1 {
            break;
        }
        std::thread::sleep(Duration::from_millis(5));
    }

    let _second = TcpStream::connect(addr).unwrap();
    for _ in 0..50 {
        manager.accept_pending();
        std::thread::sleep(Duration::from_millis(5));
    }
    assert_eq!(manager.connection_count(), 1);
}
