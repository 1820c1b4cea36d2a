//! Per-stream state machine.
//!
//! A stream never touches the transport itself. [`Stream::process`] returns
//! the frames to send and whether the connection should close, and the
//! owning [`Connection`](crate::Connection) carries that out.

use tracing::debug;

use crate::h2_codec::{flags, Frame, FramePayload};
use crate::hpack::H2Header;

/// Stream states (RFC 7540 Section 5.1). Only Idle, Open and Closed are
/// reached today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamState {
    #[default]
    Idle,
    ReservedLocal,
    ReservedRemote,
    Open,
    HalfClosedLocal,
    HalfClosedRemote,
    Closed,
}

/// What the connection must do after a stream handled a frame.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct StreamOutcome {
    pub frames: Vec<Frame>,
    pub close_connection: bool,
}

#[derive(Debug)]
pub struct Stream {
    id: u32,
    state: StreamState,
}

impl Stream {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            state: StreamState::Idle,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    /// Handle a frame routed to this stream.
    ///
    /// A complete request header block is answered with a 200 response whose
    /// body is `fingerprint`, after which the connection is done.
    pub fn process(&mut self, frame: &Frame, fingerprint: &str) -> StreamOutcome {
        match &frame.payload {
            FramePayload::Headers { .. } => {
                self.state = StreamState::Open;
                if !frame.has_flag(flags::END_HEADERS) {
                    return StreamOutcome::default();
                }

                let body = fingerprint.as_bytes().to_vec();
                let headers =
                    Frame::headers(self.id, response_headers(body.len()), flags::END_HEADERS);
                let data = Frame::data(self.id, body, flags::END_STREAM);
                self.state = StreamState::Closed;
                debug!(stream_id = self.id, "serving fingerprint response");

                StreamOutcome {
                    frames: vec![headers, data],
                    close_connection: true,
                }
            }
            FramePayload::RstStream { .. } | FramePayload::GoAway { .. } => {
                self.state = StreamState::Closed;
                StreamOutcome {
                    frames: Vec::new(),
                    close_connection: true,
                }
            }
            _ => StreamOutcome::default(),
        }
    }
}

fn response_headers(content_length: usize) -> Vec<H2Header> {
    vec![
        H2Header::new(":status", "200"),
        H2Header::new("content-length", content_length.to_string()),
        H2Header::new("content-type", "text/html; charset=UTF-8"),
        H2Header::new("access-control-allow-origin", "*"),
    ]
}
