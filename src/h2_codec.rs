//! HTTP/2 frame codec.
//!
//! Maps raw bytes to a typed [`Frame`] and back. The 9-byte header is parsed
//! on its own so a blocking reader can learn the payload length before it
//! reads the payload; [`H2Codec::parse_payload`] then applies the layout for
//! that frame type. Header blocks are decoded eagerly with the codec's HPACK
//! decoder, so frames carry header lists rather than compressed bytes.
//!
//! Reference: RFC 7540 (HTTP/2), Section 4 and 6

use std::fmt;

use crate::error::FrameError;
use crate::hpack::{H2Header, HpackDecoder, HpackEncoder};

/// Size of the fixed frame header.
pub const FRAME_HEADER_LEN: usize = 9;

/// Largest payload length expressible in the 24-bit length field.
pub const MAX_PAYLOAD_LEN: usize = 0x00FF_FFFF;

/// The HTTP/2 connection preface (24 bytes)
pub const CONNECTION_PREFACE: &[u8] = b"PRI * HTTP/2.0\r\n\r\nSM\r\n\r\n";

const STREAM_ID_MASK: u32 = 0x7FFF_FFFF;

/// Check if data starts with the HTTP/2 connection preface
pub fn is_h2_preface(data: &[u8]) -> bool {
    data.len() >= CONNECTION_PREFACE.len()
        && &data[..CONNECTION_PREFACE.len()] == CONNECTION_PREFACE
}

/// HTTP/2 frame flags
pub mod flags {
    pub const END_STREAM: u8 = 0x1;
    /// SETTINGS and PING only; shares the END_STREAM bit.
    pub const ACK: u8 = 0x1;
    pub const END_HEADERS: u8 = 0x4;
    pub const PADDED: u8 = 0x8;
    pub const PRIORITY: u8 = 0x20;
}

/// HTTP/2 frame types (RFC 7540 Section 6)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FrameType {
    Data = 0x0,
    Headers = 0x1,
    Priority = 0x2,
    RstStream = 0x3,
    Settings = 0x4,
    PushPromise = 0x5,
    Ping = 0x6,
    GoAway = 0x7,
    WindowUpdate = 0x8,
    Continuation = 0x9,
}

impl FrameType {
    /// Flag bits defined for this frame type. Anything else is dropped on parse.
    pub fn allowed_flags(self) -> u8 {
        match self {
            FrameType::Data => flags::END_STREAM | flags::PADDED,
            FrameType::Headers => {
                flags::END_STREAM | flags::END_HEADERS | flags::PADDED | flags::PRIORITY
            }
            FrameType::Settings | FrameType::Ping => flags::ACK,
            FrameType::PushPromise => flags::END_HEADERS | flags::PADDED,
            FrameType::Continuation => flags::END_HEADERS,
            FrameType::Priority
            | FrameType::RstStream
            | FrameType::GoAway
            | FrameType::WindowUpdate => 0,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            FrameType::Data => "DATA",
            FrameType::Headers => "HEADERS",
            FrameType::Priority => "PRIORITY",
            FrameType::RstStream => "RST_STREAM",
            FrameType::Settings => "SETTINGS",
            FrameType::PushPromise => "PUSH_PROMISE",
            FrameType::Ping => "PING",
            FrameType::GoAway => "GOAWAY",
            FrameType::WindowUpdate => "WINDOW_UPDATE",
            FrameType::Continuation => "CONTINUATION",
        }
    }
}

impl TryFrom<u8> for FrameType {
    type Error = FrameError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0x0 => FrameType::Data,
            0x1 => FrameType::Headers,
            0x2 => FrameType::Priority,
            0x3 => FrameType::RstStream,
            0x4 => FrameType::Settings,
            0x5 => FrameType::PushPromise,
            0x6 => FrameType::Ping,
            0x7 => FrameType::GoAway,
            0x8 => FrameType::WindowUpdate,
            0x9 => FrameType::Continuation,
            other => return Err(FrameError::UnknownFrameType(other)),
        })
    }
}

impl fmt::Display for FrameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// HTTP/2 SETTINGS identifiers (RFC 7540 Section 6.5.2)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum SettingId {
    HeaderTableSize = 0x1,
    EnablePush = 0x2,
    MaxConcurrentStreams = 0x3,
    InitialWindowSize = 0x4,
    MaxFrameSize = 0x5,
    MaxHeaderListSize = 0x6,
}

impl SettingId {
    pub fn code(self) -> u16 {
        self as u16
    }
}

impl TryFrom<u16> for SettingId {
    type Error = FrameError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Ok(match value {
            0x1 => SettingId::HeaderTableSize,
            0x2 => SettingId::EnablePush,
            0x3 => SettingId::MaxConcurrentStreams,
            0x4 => SettingId::InitialWindowSize,
            0x5 => SettingId::MaxFrameSize,
            0x6 => SettingId::MaxHeaderListSize,
            other => return Err(FrameError::UnknownSetting(other)),
        })
    }
}

/// A parsed HTTP/2 frame header (9 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct H2FrameHeader {
    pub length: u32, // 24 bits
    pub frame_type: FrameType,
    /// Raw flag byte, including bits not defined for `frame_type`.
    pub flags: u8,
    pub stream_id: u32, // 31 bits (high bit reserved)
}

impl H2FrameHeader {
    /// Parse a 9-byte frame header.
    ///
    /// Fails on an unknown type code; a connection cannot skip such a frame.
    pub fn parse(data: &[u8]) -> Result<Self, FrameError> {
        if data.len() < FRAME_HEADER_LEN {
            return Err(FrameError::Truncated {
                expected: FRAME_HEADER_LEN,
                actual: data.len(),
            });
        }

        let length = ((data[0] as u32) << 16) | ((data[1] as u32) << 8) | (data[2] as u32);
        let frame_type = FrameType::try_from(data[3])?;
        let flags = data[4];
        let stream_id = read_u32(&data[5..9]) & STREAM_ID_MASK;

        Ok(Self {
            length,
            frame_type,
            flags,
            stream_id,
        })
    }

    /// Emit the header: 16-bit high part of the length, 8-bit low part, type,
    /// flags, then the stream id with the reserved bit cleared.
    pub fn encode(&self) -> [u8; FRAME_HEADER_LEN] {
        let high = ((self.length >> 8) as u16).to_be_bytes();
        let stream_id = (self.stream_id & STREAM_ID_MASK).to_be_bytes();
        [
            high[0],
            high[1],
            self.length as u8,
            self.frame_type as u8,
            self.flags,
            stream_id[0],
            stream_id[1],
            stream_id[2],
            stream_id[3],
        ]
    }

    /// Total frame size including header
    pub fn total_size(&self) -> usize {
        FRAME_HEADER_LEN + self.length as usize
    }

    pub fn has_flag(&self, flag: u8) -> bool {
        self.flags & flag != 0
    }
}

/// Stream dependency fields shared by PRIORITY frames and prioritized HEADERS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrioritySpec {
    pub exclusive: bool,
    pub dependency: u32,
    /// Effective weight, 1..=256 (wire byte + 1).
    pub weight: u16,
}

impl PrioritySpec {
    const LEN: usize = 5;

    fn parse(bytes: &[u8]) -> Self {
        let raw = read_u32(&bytes[..4]);
        Self {
            exclusive: raw >> 31 == 1,
            dependency: raw & STREAM_ID_MASK,
            weight: bytes[4] as u16 + 1,
        }
    }

    /// The 32-bit dependency word as it appears on the wire, exclusive bit
    /// included.
    pub fn dependency_word(&self) -> u32 {
        let mut raw = self.dependency & STREAM_ID_MASK;
        if self.exclusive {
            raw |= 1 << 31;
        }
        raw
    }

    fn encode(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.dependency_word().to_be_bytes());
        buf.push(self.weight.saturating_sub(1).min(255) as u8);
    }
}

/// Type-specific frame contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FramePayload {
    Data {
        data: Vec<u8>,
        pad_length: Option<u8>,
    },
    Headers {
        pad_length: Option<u8>,
        priority: Option<PrioritySpec>,
        headers: Vec<H2Header>,
    },
    Priority(PrioritySpec),
    RstStream {
        error_code: u32,
    },
    Settings {
        settings: Vec<(SettingId, u32)>,
    },
    PushPromise {
        pad_length: Option<u8>,
        promised_stream_id: u32,
        headers: Vec<H2Header>,
    },
    Ping {
        data: [u8; 8],
    },
    GoAway {
        last_stream_id: u32,
        error_code: u32,
        debug_data: Vec<u8>,
    },
    WindowUpdate {
        increment: u32,
    },
    Continuation {
        headers: Vec<H2Header>,
    },
}

impl FramePayload {
    pub fn frame_type(&self) -> FrameType {
        match self {
            FramePayload::Data { .. } => FrameType::Data,
            FramePayload::Headers { .. } => FrameType::Headers,
            FramePayload::Priority(_) => FrameType::Priority,
            FramePayload::RstStream { .. } => FrameType::RstStream,
            FramePayload::Settings { .. } => FrameType::Settings,
            FramePayload::PushPromise { .. } => FrameType::PushPromise,
            FramePayload::Ping { .. } => FrameType::Ping,
            FramePayload::GoAway { .. } => FrameType::GoAway,
            FramePayload::WindowUpdate { .. } => FrameType::WindowUpdate,
            FramePayload::Continuation { .. } => FrameType::Continuation,
        }
    }
}

/// One HTTP/2 frame.
///
/// `flags` only ever holds bits defined for the payload's frame type, and
/// PADDED / PRIORITY always agree with `pad_length` / `priority`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub stream_id: u32,
    pub flags: u8,
    pub payload: FramePayload,
}

impl Frame {
    pub fn new(stream_id: u32, flags: u8, payload: FramePayload) -> Self {
        let flags = normalize_flags(flags, &payload);
        Self {
            stream_id: stream_id & STREAM_ID_MASK,
            flags,
            payload,
        }
    }

    /// SETTINGS acknowledgment: ACK flag, empty settings list.
    pub fn settings_ack() -> Self {
        Self::new(0, flags::ACK, FramePayload::Settings { settings: Vec::new() })
    }

    pub fn headers(stream_id: u32, headers: Vec<H2Header>, flags: u8) -> Self {
        Self::new(
            stream_id,
            flags,
            FramePayload::Headers {
                pad_length: None,
                priority: None,
                headers,
            },
        )
    }

    pub fn data(stream_id: u32, data: Vec<u8>, flags: u8) -> Self {
        Self::new(stream_id, flags, FramePayload::Data { data, pad_length: None })
    }

    pub fn frame_type(&self) -> FrameType {
        self.payload.frame_type()
    }

    pub fn has_flag(&self, flag: u8) -> bool {
        self.flags & flag != 0
    }
}

fn normalize_flags(flags: u8, payload: &FramePayload) -> u8 {
    let mut flags = flags & payload.frame_type().allowed_flags();
    let (padded, prioritized) = match payload {
        FramePayload::Data { pad_length, .. } | FramePayload::PushPromise { pad_length, .. } => {
            (pad_length.is_some(), false)
        }
        FramePayload::Headers { pad_length, priority, .. } => {
            (pad_length.is_some(), priority.is_some())
        }
        _ => return flags,
    };
    flags &= !(flags::PADDED | flags::PRIORITY);
    if padded {
        flags |= flags::PADDED;
    }
    if prioritized {
        flags |= flags::PRIORITY;
    }
    flags
}

/// Frame parser/serializer bound to one connection's HPACK state.
///
/// Besides the two-step `parse_payload` path used by blocking readers,
/// [`H2Codec::process`] accepts arbitrary byte chunks, buffers partial
/// frames, and returns every frame completed so far.
#[derive(Debug, Default)]
pub struct H2Codec {
    /// Buffer for incomplete frames
    buffer: Vec<u8>,
    decoder: HpackDecoder,
    encoder: HpackEncoder,
}

impl H2Codec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes and get back every complete frame.
    pub fn process(&mut self, data: &[u8]) -> Result<Vec<Frame>, FrameError> {
        self.buffer.extend_from_slice(data);
        let mut frames = Vec::new();

        while self.buffer.len() >= FRAME_HEADER_LEN {
            let header = H2FrameHeader::parse(&self.buffer)?;
            let total_size = header.total_size();
            if self.buffer.len() < total_size {
                break;
            }

            let remainder = self.buffer.split_off(total_size);
            let frame_data = std::mem::replace(&mut self.buffer, remainder);
            frames.push(self.parse_payload(&header, &frame_data[FRAME_HEADER_LEN..])?);
        }

        Ok(frames)
    }

    /// Bytes held back waiting for the rest of a frame.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Parse the payload that follows `header`.
    pub fn parse_payload(
        &mut self,
        header: &H2FrameHeader,
        payload: &[u8],
    ) -> Result<Frame, FrameError> {
        if payload.len() != header.length as usize {
            return Err(FrameError::Truncated {
                expected: header.length as usize,
                actual: payload.len(),
            });
        }

        let frame_type = header.frame_type;
        let flags = header.flags & frame_type.allowed_flags();

        let body = match frame_type {
            FrameType::Data => {
                let (pad_length, data) = split_padding(frame_type, flags, payload)?;
                FramePayload::Data {
                    data: data.to_vec(),
                    pad_length,
                }
            }
            FrameType::Headers => {
                let (pad_length, mut block) = split_padding(frame_type, flags, payload)?;
                let priority = if flags & flags::PRIORITY != 0 {
                    if block.len() < PrioritySpec::LEN {
                        return Err(FrameError::malformed(frame_type, "missing priority fields"));
                    }
                    let priority = PrioritySpec::parse(&block[..PrioritySpec::LEN]);
                    block = &block[PrioritySpec::LEN..];
                    Some(priority)
                } else {
                    None
                };
                FramePayload::Headers {
                    pad_length,
                    priority,
                    headers: self.decoder.decode(block)?,
                }
            }
            FrameType::Priority => {
                expect_len(frame_type, payload, PrioritySpec::LEN)?;
                FramePayload::Priority(PrioritySpec::parse(payload))
            }
            FrameType::RstStream => {
                expect_len(frame_type, payload, 4)?;
                FramePayload::RstStream {
                    error_code: read_u32(payload),
                }
            }
            FrameType::Settings => {
                if payload.len() % 6 != 0 {
                    return Err(FrameError::malformed(frame_type, "length not a multiple of 6"));
                }
                let settings = payload
                    .chunks_exact(6)
                    .map(|entry| -> Result<(SettingId, u32), FrameError> {
                        let id = SettingId::try_from(u16::from_be_bytes([entry[0], entry[1]]))?;
                        Ok((id, read_u32(&entry[2..])))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                FramePayload::Settings { settings }
            }
            FrameType::PushPromise => {
                let (pad_length, block) = split_padding(frame_type, flags, payload)?;
                if block.len() < 4 {
                    return Err(FrameError::malformed(frame_type, "missing promised stream id"));
                }
                FramePayload::PushPromise {
                    pad_length,
                    promised_stream_id: read_u32(block) & STREAM_ID_MASK,
                    headers: self.decoder.decode(&block[4..])?,
                }
            }
            FrameType::Ping => {
                expect_len(frame_type, payload, 8)?;
                let mut data = [0u8; 8];
                data.copy_from_slice(payload);
                FramePayload::Ping { data }
            }
            FrameType::GoAway => {
                if payload.len() < 8 {
                    return Err(FrameError::malformed(frame_type, "shorter than 8 bytes"));
                }
                FramePayload::GoAway {
                    last_stream_id: read_u32(payload) & STREAM_ID_MASK,
                    error_code: read_u32(&payload[4..]),
                    debug_data: payload[8..].to_vec(),
                }
            }
            FrameType::WindowUpdate => {
                expect_len(frame_type, payload, 4)?;
                FramePayload::WindowUpdate {
                    increment: read_u32(payload),
                }
            }
            FrameType::Continuation => FramePayload::Continuation {
                headers: self.decoder.decode(payload)?,
            },
        };

        Ok(Frame {
            stream_id: header.stream_id,
            flags,
            payload: body,
        })
    }

    /// Serialize a frame, HPACK-encoding any header list with this codec's encoder.
    pub fn serialize(&mut self, frame: &Frame) -> Vec<u8> {
        let mut payload = Vec::new();

        match &frame.payload {
            FramePayload::Data { data, pad_length } => {
                write_padded(&mut payload, *pad_length, |buf| buf.extend_from_slice(data));
            }
            FramePayload::Headers { pad_length, priority, headers } => {
                let block = self.encoder.encode(headers);
                write_padded(&mut payload, *pad_length, |buf| {
                    if let Some(priority) = priority {
                        priority.encode(buf);
                    }
                    buf.extend_from_slice(&block);
                });
            }
            FramePayload::Priority(priority) => priority.encode(&mut payload),
            FramePayload::RstStream { error_code } => {
                payload.extend_from_slice(&error_code.to_be_bytes());
            }
            FramePayload::Settings { settings } => {
                for (id, value) in settings {
                    payload.extend_from_slice(&id.code().to_be_bytes());
                    payload.extend_from_slice(&value.to_be_bytes());
                }
            }
            FramePayload::PushPromise { pad_length, promised_stream_id, headers } => {
                let block = self.encoder.encode(headers);
                write_padded(&mut payload, *pad_length, |buf| {
                    buf.extend_from_slice(&(promised_stream_id & STREAM_ID_MASK).to_be_bytes());
                    buf.extend_from_slice(&block);
                });
            }
            FramePayload::Ping { data } => payload.extend_from_slice(data),
            FramePayload::GoAway { last_stream_id, error_code, debug_data } => {
                payload.extend_from_slice(&(last_stream_id & STREAM_ID_MASK).to_be_bytes());
                payload.extend_from_slice(&error_code.to_be_bytes());
                payload.extend_from_slice(debug_data);
            }
            FramePayload::WindowUpdate { increment } => {
                payload.extend_from_slice(&increment.to_be_bytes());
            }
            FramePayload::Continuation { headers } => {
                payload.extend_from_slice(&self.encoder.encode(headers));
            }
        }

        debug_assert!(payload.len() <= MAX_PAYLOAD_LEN, "frame payload exceeds 24-bit length");

        let header = H2FrameHeader {
            length: payload.len() as u32,
            frame_type: frame.frame_type(),
            flags: normalize_flags(frame.flags, &frame.payload),
            stream_id: frame.stream_id,
        };

        let mut out = Vec::with_capacity(FRAME_HEADER_LEN + payload.len());
        out.extend_from_slice(&header.encode());
        out.extend_from_slice(&payload);
        out
    }
}

fn read_u32(bytes: &[u8]) -> u32 {
    u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

fn expect_len(frame_type: FrameType, payload: &[u8], len: usize) -> Result<(), FrameError> {
    if payload.len() == len {
        Ok(())
    } else {
        Err(FrameError::malformed(frame_type, "unexpected payload length"))
    }
}

/// Strip the pad-length byte and trailing padding when PADDED is set.
fn split_padding(
    frame_type: FrameType,
    flags: u8,
    payload: &[u8],
) -> Result<(Option<u8>, &[u8]), FrameError> {
    if flags & flags::PADDED == 0 {
        return Ok((None, payload));
    }
    let (&pad_length, rest) = payload
        .split_first()
        .ok_or_else(|| FrameError::malformed(frame_type, "missing pad length"))?;
    let pad = pad_length as usize;
    if pad > rest.len() {
        return Err(FrameError::malformed(frame_type, "padding exceeds payload"));
    }
    Ok((Some(pad_length), &rest[..rest.len() - pad]))
}

fn write_padded(buf: &mut Vec<u8>, pad_length: Option<u8>, body: impl FnOnce(&mut Vec<u8>)) {
    if let Some(pad) = pad_length {
        buf.push(pad);
    }
    body(buf);
    if let Some(pad) = pad_length {
        buf.resize(buf.len() + pad as usize, 0);
    }
}
