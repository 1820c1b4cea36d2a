//! Integration tests for the HTTP/2 frame codec

mod codec_processing;
mod frame_parsing;
mod roundtrip;

use h2_fingerprint::{Frame, FrameError, H2Codec, H2FrameHeader, FRAME_HEADER_LEN};

/// Parse one complete frame (header + payload) with a fresh codec.
pub fn parse_frame(bytes: &[u8]) -> Result<Frame, FrameError> {
    let header = H2FrameHeader::parse(bytes)?;
    H2Codec::new().parse_payload(&header, &bytes[FRAME_HEADER_LEN..])
}
