//! Tests for the simulated controller
//!
//! These tests verify:
//! - Replies echo sequence id and flag
//! - Known, unknown and written variables
//! - Multiple clients at once
//! - Malformed requests drop the connection
//! - Shutdown

use std::io::{Read, Write};
use std::net::TcpStream;
use std::sync::Arc;
use std::thread;

use bytes::Bytes;
use openshowvar::protocol::{encode_read, encode_write, read_response, STATUS_FAILED, STATUS_OK};
use openshowvar::sim::{SimHandle, SimServer, VariableTable};
use openshowvar::{Config, Session};

// =============================================================================
// Helper Functions
// =============================================================================

fn start_sim(table: VariableTable) -> SimHandle {
    SimServer::bind("127.0.0.1:0", Arc::new(table))
        .unwrap()
        .spawn()
        .unwrap()
}

fn session_for(sim: &SimHandle) -> Session {
    let config = Config::builder()
        .host(sim.addr().ip().to_string())
        .port(sim.addr().port())
        .build();
    Session::connect_with(config).unwrap()
}

// =============================================================================
// Raw Protocol Tests
// =============================================================================

#[test]
fn test_reply_echoes_id_and_flag() {
    let sim = start_sim(VariableTable::with_defaults());
    let mut stream = TcpStream::connect(sim.addr()).unwrap();

    stream.write_all(&encode_read(1234, b"$OV_PRO").unwrap()).unwrap();
    let response = read_response(&mut stream).unwrap();
    assert_eq!(response.sequence_id, 1234);
    assert_eq!(response.flag, 0);
    assert_eq!(response.value, Bytes::from_static(b"100"));
    assert_eq!(response.status, STATUS_OK);

    stream.write_all(&encode_write(1235, b"$OV_PRO", b"50").unwrap()).unwrap();
    let response = read_response(&mut stream).unwrap();
    assert_eq!(response.sequence_id, 1235);
    assert_eq!(response.flag, 1);
    assert_eq!(response.value, Bytes::from_static(b"50"));
}

#[test]
fn test_unknown_variable_fails() {
    let sim = start_sim(VariableTable::new());
    let mut stream = TcpStream::connect(sim.addr()).unwrap();

    stream.write_all(&encode_read(1, b"MISSING").unwrap()).unwrap();
    let response = read_response(&mut stream).unwrap();

    assert!(response.value.is_empty());
    assert_eq!(response.status, STATUS_FAILED);
    assert!(!response.is_success());
}

#[test]
fn test_malformed_request_drops_connection() {
    let sim = start_sim(VariableTable::new());
    let mut stream = TcpStream::connect(sim.addr()).unwrap();

    // Flag 0x07 does not exist
    let mut frame = encode_read(1, b"X").unwrap().to_vec();
    frame[4] = 0x07;
    stream.write_all(&frame).unwrap();

    let mut buf = [0u8; 16];
    let n = stream.read(&mut buf).unwrap_or(0);
    assert_eq!(n, 0, "connection should be closed without a reply");
}

// =============================================================================
// Session Against Simulator
// =============================================================================

#[test]
fn test_session_write_then_read() {
    let sim = start_sim(VariableTable::new());
    let mut session = session_for(&sim);
    let start = session.sequence_id();
    assert!((1..=100).contains(&start));

    assert_eq!(session.write("SCHICHT", "80").unwrap(), Bytes::from_static(b"80"));
    assert_eq!(session.read("SCHICHT").unwrap(), Bytes::from_static(b"80"));
    assert_eq!(session.sequence_id(), start + 2);

    session.close().unwrap();
}

#[test]
fn test_removed_variable_is_rejected() {
    let table = Arc::new(VariableTable::with_defaults());
    let sim = SimServer::bind("127.0.0.1:0", Arc::clone(&table))
        .unwrap()
        .spawn()
        .unwrap();
    let mut session = session_for(&sim);

    assert_eq!(session.read("$OV_PRO").unwrap(), Bytes::from_static(b"100"));
    assert_eq!(table.remove("$OV_PRO"), Some(Bytes::from_static(b"100")));

    let err = session.read("$OV_PRO").unwrap_err();
    assert!(err.is_no_match());
    assert!(!session.is_broken());
}

#[test]
fn test_values_larger_than_256_bytes() {
    let table = VariableTable::new();
    let big = "x".repeat(4000);
    table.set("BIG", big.clone());
    let sim = start_sim(table);
    let mut session = session_for(&sim);

    assert_eq!(session.read("BIG").unwrap().len(), 4000);

    let bigger = "y".repeat(20_000);
    assert_eq!(session.write("BIGGER", &bigger).unwrap().len(), 20_000);
    assert_eq!(session.read_text("BIGGER").unwrap(), bigger);
}

#[test]
fn test_utf8_round_trip() {
    let sim = start_sim(VariableTable::new());
    let mut session = session_for(&sim);

    session.write("GRÖSSE", "Schweißnaht").unwrap();
    assert_eq!(session.read_text("GRÖSSE").unwrap(), "Schweißnaht");
}

#[test]
fn test_multiple_clients() {
    let sim = start_sim(VariableTable::with_defaults());

    let clients: Vec<_> = (0..4)
        .map(|i| {
            let mut session = session_for(&sim);
            thread::spawn(move || {
                let name = format!("CLIENT_{}", i);
                for round in 0..10 {
                    let value = format!("{}", round);
                    session.write(&name, &value).unwrap();
                    assert_eq!(session.read_text(&name).unwrap(), value);
                }
            })
        })
        .collect();

    for client in clients {
        client.join().unwrap();
    }
}

#[test]
fn test_shutdown_stops_accepting() {
    let sim = start_sim(VariableTable::new());
    let addr = sim.addr();

    sim.shutdown();

    let config = Config::builder()
        .host(addr.ip().to_string())
        .port(addr.port())
        .build();
    assert!(Session::connect_with(config).is_err());
}
