//! Per-connection engine.
//!
//! [`Connection`] drives one already-negotiated byte stream: it checks the
//! client preface, reads frames strictly in order, feeds the preamble into a
//! [`FingerprintBuilder`], and routes stream-scoped frames to lazily created
//! [`Stream`]s. Any I/O or parse failure is terminal; nothing is retried and
//! no GOAWAY is sent.

use std::collections::HashMap;
use std::io::{self, Read, Write};

use tracing::{debug, info};

use crate::error::ConnectionError;
use crate::fingerprint::FingerprintBuilder;
use crate::h2_codec::{
    flags, is_h2_preface, Frame, FramePayload, H2Codec, H2FrameHeader, FRAME_HEADER_LEN,
};
use crate::stream::Stream;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Idle,
    Open,
    Closed,
}

/// One client connection over any blocking `Read + Write` transport.
#[derive(Debug)]
pub struct Connection<S> {
    io: S,
    state: ConnectionState,
    /// Owns this connection's HPACK encoder and decoder.
    codec: H2Codec,
    /// Created on first reference, kept for the life of the connection.
    streams: HashMap<u32, Stream>,
    builder: FingerprintBuilder,
    /// Rendered once, when the first HEADERS frame arrives.
    fingerprint: Option<String>,
}

impl<S: Read + Write> Connection<S> {
    pub fn new(io: S) -> Self {
        Self {
            io,
            state: ConnectionState::Idle,
            codec: H2Codec::new(),
            streams: HashMap::new(),
            builder: FingerprintBuilder::new(),
            fingerprint: None,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn fingerprint(&self) -> Option<&str> {
        self.fingerprint.as_deref()
    }

    pub fn stream(&self, stream_id: u32) -> Option<&Stream> {
        self.streams.get(&stream_id)
    }

    pub fn into_inner(self) -> S {
        self.io
    }

    /// Serve the connection until it closes.
    ///
    /// Returns `Ok` when the connection closed on its own terms (response
    /// sent, or the peer reset after the fingerprint was taken). The
    /// connection is always `Closed` on return.
    pub fn run(&mut self) -> Result<(), ConnectionError> {
        let result = self.serve();
        self.close();
        result
    }

    fn serve(&mut self) -> Result<(), ConnectionError> {
        self.receive_preface()?;
        while self.state != ConnectionState::Closed {
            let frame = self.recv_frame()?;
            self.dispatch(frame)?;
        }
        Ok(())
    }

    /// Read and check the 24-byte client preface. Idle -> Open on success.
    pub fn receive_preface(&mut self) -> Result<(), ConnectionError> {
        let mut preface = [0u8; 24];
        if let Err(e) = self.io.read_exact(&mut preface) {
            self.close();
            return Err(ConnectionError::PrefaceUnreadable(e));
        }
        if !is_h2_preface(&preface) {
            self.close();
            return Err(ConnectionError::PrefaceMismatch);
        }
        self.state = ConnectionState::Open;
        Ok(())
    }

    fn recv_frame(&mut self) -> Result<Frame, ConnectionError> {
        let mut head = [0u8; FRAME_HEADER_LEN];
        self.io.read_exact(&mut head)?;
        let header = H2FrameHeader::parse(&head)?;

        // Never size a buffer from the untrusted length up front.
        let mut payload = Vec::new();
        let read = Read::take(&mut self.io, u64::from(header.length)).read_to_end(&mut payload)?;
        if read != header.length as usize {
            return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into());
        }

        Ok(self.codec.parse_payload(&header, &payload)?)
    }

    /// Apply one inbound frame.
    pub fn dispatch(&mut self, frame: Frame) -> Result<(), ConnectionError> {
        debug!(
            frame_type = %frame.frame_type(),
            stream_id = frame.stream_id,
            flags = frame.flags,
            "frame received"
        );

        if self.fingerprint.is_none() {
            match &frame.payload {
                FramePayload::Settings { settings } => {
                    self.builder.observe_settings(settings);
                    if !frame.has_flag(flags::ACK) {
                        self.send_frame(&Frame::settings_ack())?;
                    }
                }
                FramePayload::WindowUpdate { increment } => {
                    self.builder.observe_window_update(*increment);
                }
                FramePayload::Priority(priority) => {
                    self.builder.observe_priority(frame.stream_id, priority);
                }
                FramePayload::Headers { headers, .. } => {
                    self.builder.observe_headers(headers);
                    let fingerprint = self.builder.build();
                    info!(raw = %self.builder.raw(), %fingerprint, "fingerprint computed");
                    self.fingerprint = Some(fingerprint);
                }
                FramePayload::Data { .. }
                | FramePayload::RstStream { .. }
                | FramePayload::PushPromise { .. }
                | FramePayload::Ping { .. }
                | FramePayload::GoAway { .. }
                | FramePayload::Continuation { .. } => {}
            }
        } else if matches!(
            frame.payload,
            FramePayload::RstStream { .. } | FramePayload::GoAway { .. }
        ) {
            self.close();
        }

        if frame.stream_id != 0 {
            let stream_id = frame.stream_id;
            let fingerprint = self.fingerprint.as_deref().unwrap_or_default();
            let stream = self
                .streams
                .entry(stream_id)
                .or_insert_with(|| Stream::new(stream_id));
            let outcome = stream.process(&frame, fingerprint);

            for reply in &outcome.frames {
                self.send_frame(reply)?;
            }
            if outcome.close_connection {
                self.close();
            }
        }

        Ok(())
    }

    pub fn send_frame(&mut self, frame: &Frame) -> Result<(), ConnectionError> {
        let bytes = self.codec.serialize(frame);
        debug!(
            frame_type = %frame.frame_type(),
            stream_id = frame.stream_id,
            len = bytes.len(),
            "frame sent"
        );
        self.io.write_all(&bytes)?;
        self.io.flush()?;
        Ok(())
    }

    /// Move to `Closed`. Only this connection is affected; the transport is
    /// flushed and released when the connection is dropped.
    pub fn close(&mut self) {
        if self.state == ConnectionState::Closed {
            return;
        }
        self.state = ConnectionState::Closed;
        let _ = self.io.flush();
        debug!("connection closed");
    }
}
