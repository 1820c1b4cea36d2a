//! Error types.
//!
//! Every error here is local to one connection. The listener logs them and
//! keeps accepting.

use std::io;

use thiserror::Error;

use crate::h2_codec::FrameType;

/// Failure reported by the header codec.
#[derive(Debug, Error)]
pub enum HpackError {
    #[error("HPACK decode error: {0}")]
    Decode(String),
}

/// A frame header or payload that could not be turned into a [`Frame`](crate::Frame).
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("unknown frame type 0x{0:x}")]
    UnknownFrameType(u8),

    #[error("unknown SETTINGS identifier 0x{0:x}")]
    UnknownSetting(u16),

    #[error("malformed {frame_type} payload: {reason}")]
    MalformedPayload {
        frame_type: FrameType,
        reason: &'static str,
    },

    #[error("truncated frame: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error(transparent)]
    Hpack(#[from] HpackError),
}

impl FrameError {
    pub(crate) fn malformed(frame_type: FrameType, reason: &'static str) -> Self {
        FrameError::MalformedPayload { frame_type, reason }
    }
}

/// Why a connection stopped before (or instead of) serving its response.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("client preface mismatch")]
    PrefaceMismatch,

    #[error("failed to read client preface: {0}")]
    PrefaceUnreadable(#[source] io::Error),

    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error("transport error: {0}")]
    Transport(#[from] io::Error),
}

/// Listener setup and per-connection TLS failures.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),

    #[error("certificate error: {0}")]
    Certificate(String),

    #[error("client did not negotiate h2 (got {0:?})")]
    AlpnMismatch(Option<String>),

    #[error(transparent)]
    Connection(#[from] ConnectionError),
}
