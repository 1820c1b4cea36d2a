//! Tests for HTTP/2 frame header parsing

use h2_fingerprint::{flags, FrameError, FrameType, H2FrameHeader, SettingId};

#[test]
fn test_frame_header_parse() {
    // DATA frame, length 5, stream 1, END_STREAM
    let header_bytes = [0, 0, 5, 0, 1, 0, 0, 0, 1];
    let header = H2FrameHeader::parse(&header_bytes).unwrap();

    assert_eq!(header.length, 5);
    assert_eq!(header.frame_type, FrameType::Data);
    assert_eq!(header.stream_id, 1);
    assert!(header.has_flag(flags::END_STREAM));
    assert!(!header.has_flag(flags::END_HEADERS));
}

#[test]
fn test_frame_header_headers() {
    // HEADERS frame, length 10, stream 3, END_HEADERS
    let header_bytes = [0, 0, 10, 1, 4, 0, 0, 0, 3];
    let header = H2FrameHeader::parse(&header_bytes).unwrap();

    assert_eq!(header.length, 10);
    assert_eq!(header.frame_type, FrameType::Headers);
    assert_eq!(header.stream_id, 3);
    assert!(!header.has_flag(flags::END_STREAM));
    assert!(header.has_flag(flags::END_HEADERS));
}

#[test]
fn test_stream_id_clears_reserved_bit() {
    let header_bytes = [0, 0, 0, 4, 0, 0x80, 0x00, 0x00, 0x05];
    let header = H2FrameHeader::parse(&header_bytes).unwrap();
    assert_eq!(header.stream_id, 5, "Reserved bit should be cleared from stream ID");
}

#[test]
fn test_every_known_type_code() {
    let expected = [
        FrameType::Data,
        FrameType::Headers,
        FrameType::Priority,
        FrameType::RstStream,
        FrameType::Settings,
        FrameType::PushPromise,
        FrameType::Ping,
        FrameType::GoAway,
        FrameType::WindowUpdate,
        FrameType::Continuation,
    ];
    for (code, frame_type) in expected.iter().enumerate() {
        let header = H2FrameHeader::parse(&[0, 0, 0, code as u8, 0, 0, 0, 0, 0]).unwrap();
        assert_eq!(header.frame_type, *frame_type);
        assert_eq!(*frame_type as u8, code as u8);
    }
}

#[test]
fn test_total_size() {
    let header = H2FrameHeader {
        length: 100,
        frame_type: FrameType::Data,
        flags: 0,
        stream_id: 1,
    };
    assert_eq!(header.total_size(), 109); // 9 + 100
}

#[test]
fn test_header_encode_inverts_parse() {
    let bytes = [0x00, 0x40, 0x01, 1, 0x25, 0x00, 0x00, 0x01, 0x01];
    let header = H2FrameHeader::parse(&bytes).unwrap();
    assert_eq!(header.length, 0x4001);
    assert_eq!(header.encode(), bytes);
}

#[test]
fn test_frame_type_codes() {
    for code in 0u8..=9 {
        let frame_type = FrameType::try_from(code).unwrap();
        assert_eq!(frame_type as u8, code);
    }
    assert!(matches!(FrameType::try_from(0x0a), Err(FrameError::UnknownFrameType(0x0a))));
    assert_eq!(FrameType::WindowUpdate.to_string(), "WINDOW_UPDATE");
}

#[test]
fn test_setting_id_codes() {
    for code in 1u16..=6 {
        assert_eq!(SettingId::try_from(code).unwrap().code(), code);
    }
    assert!(matches!(SettingId::try_from(0), Err(FrameError::UnknownSetting(0))));
    assert!(matches!(SettingId::try_from(0x8), Err(FrameError::UnknownSetting(0x8))));
}
