//! h2-fingerprint: an HTTP/2 preamble fingerprinting endpoint
//!
//! This crate speaks just enough HTTP/2 framing to watch a client open a
//! connection. It records the client's SETTINGS, WINDOW_UPDATE, PRIORITY and
//! pseudo-header order, folds them into a compact identifier, and returns that
//! identifier as the body of a single synthetic response.
//!
//! # Features
//!
//! - **Typed Frame Codec**: All ten RFC 7540 frame types parsed into a closed
//!   [`Frame`] sum type and serialized back byte-for-byte
//! - **HPACK Support**: Header compression via fluke-hpack, one encoder and
//!   one decoder per connection
//! - **Deterministic Fingerprint**: Identical preambles always render the
//!   identical identifier
//! - **Blocking I/O**: One thread per connection, no async runtime
//!
//! # Quick Start
//!
//! ```rust
//! use h2_fingerprint::{Connection, CONNECTION_PREFACE};
//! use std::io::{Cursor, Read, Write};
//!
//! struct Duplex {
//!     input: Cursor<Vec<u8>>,
//!     output: Vec<u8>,
//! }
//!
//! impl Read for Duplex {
//!     fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
//!         self.input.read(buf)
//!     }
//! }
//!
//! impl Write for Duplex {
//!     fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
//!         self.output.extend_from_slice(buf);
//!         Ok(buf.len())
//!     }
//!     fn flush(&mut self) -> std::io::Result<()> {
//!         Ok(())
//!     }
//! }
//!
//! // Preface followed by an empty SETTINGS frame, then the peer hangs up.
//! let mut input = CONNECTION_PREFACE.to_vec();
//! input.extend_from_slice(&[0, 0, 0, 4, 0, 0, 0, 0, 0]);
//! let mut io = Duplex { input: Cursor::new(input), output: Vec::new() };
//!
//! let mut connection = Connection::new(&mut io);
//! assert!(connection.run().is_err()); // EOF before any request
//!
//! // The SETTINGS frame was acknowledged before the transport ran dry.
//! assert_eq!(io.output, [0, 0, 0, 4, 1, 0, 0, 0, 0]);
//! ```
//!
//! # Architecture
//!
//! - [`h2_codec`]: frame header and payload parsing, serialization
//! - [`hpack`]: header codec wrapper
//! - [`fingerprint`]: preamble accumulation and rendering
//! - [`stream`]: per-stream state machine producing the synthetic response
//! - [`connection`]: per-connection receive loop and dispatch
//! - [`server`]: TLS + ALPN listener spawning one thread per connection
//!
//! It does NOT provide:
//! - Flow control or frame-size enforcement
//! - GOAWAY / RST_STREAM error signaling (failures drop the connection)
//! - More than one request per connection

pub mod config;
pub mod connection;
pub mod error;
pub mod fingerprint;
pub mod h2_codec;
pub mod hpack;
pub mod server;
pub mod stream;

pub use config::ServerConfig;
pub use connection::{Connection, ConnectionState};
pub use error::{ConnectionError, FrameError, HpackError, ServerError};
pub use fingerprint::{FingerprintBuilder, FINGERPRINT_PREFIX, FINGERPRINT_VERSION};
pub use h2_codec::{
    flags, is_h2_preface, Frame, FramePayload, FrameType, H2Codec, H2FrameHeader, PrioritySpec,
    SettingId, CONNECTION_PREFACE, FRAME_HEADER_LEN,
};
pub use hpack::{H2Header, HpackDecoder, HpackEncoder};
pub use server::Server;
pub use stream::{Stream, StreamOutcome, StreamState};
