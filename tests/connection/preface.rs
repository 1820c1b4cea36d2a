//! Tests for the preface gate

use h2_fingerprint::{Connection, ConnectionError, ConnectionState, CONNECTION_PREFACE};

use super::Duplex;

#[test]
fn test_any_other_prefix_closes_without_frames() {
    let mut candidates = vec![
        b"GET / HTTP/1.1\r\nHost: a.b\r\n\r\n".to_vec(),
        b"PRI * HTTP/2.0\r\n\r\nSM\r\n\r\r".to_vec(),
        vec![0u8; 24],
    ];
    let mut flipped = CONNECTION_PREFACE.to_vec();
    flipped[0] ^= 0x20;
    candidates.push(flipped);

    for input in candidates {
        let mut io = Duplex::new(input);
        let mut connection = Connection::new(&mut io);

        assert!(matches!(connection.run(), Err(ConnectionError::PrefaceMismatch)));
        assert_eq!(connection.state(), ConnectionState::Closed);
        assert!(io.output.is_empty());
    }
}

#[test]
fn test_truncated_preface_closes() {
    let mut io = Duplex::new(CONNECTION_PREFACE[..23].to_vec());
    let mut connection = Connection::new(&mut io);

    assert!(matches!(connection.run(), Err(ConnectionError::PrefaceUnreadable(_))));
    assert_eq!(connection.state(), ConnectionState::Closed);
}

#[test]
fn test_valid_preface_then_eof_is_transport_error() {
    let mut io = Duplex::new(CONNECTION_PREFACE.to_vec());
    let mut connection = Connection::new(&mut io);

    assert!(matches!(connection.run(), Err(ConnectionError::Transport(_))));
    assert!(io.output.is_empty());
}

#[test]
fn test_new_connection_is_idle() {
    let mut io = Duplex::new(Vec::new());
    let connection = Connection::new(&mut io);
    assert_eq!(connection.state(), ConnectionState::Idle);
    assert!(connection.fingerprint().is_none());
}
