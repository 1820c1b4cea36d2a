//! Tests for buffered processing (bytes -> frames)

use h2_fingerprint::{flags, Frame, FramePayload, H2Codec, H2Header, SettingId};

#[test]
fn test_codec_fragmented_frames() {
    let mut codec = H2Codec::new();

    let mut frame = vec![0, 0, 5, 0, 1, 0, 0, 0, 1];
    frame.extend_from_slice(b"hello");

    assert!(codec.process(&frame[..5]).unwrap().is_empty());
    assert!(codec.process(&frame[5..10]).unwrap().is_empty());

    let frames = codec.process(&frame[10..]).unwrap();
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0], Frame::data(1, b"hello".to_vec(), flags::END_STREAM));
}

#[test]
fn test_multiple_frames_in_single_process() {
    let mut codec = H2Codec::new();

    let mut data = vec![0, 0, 6, 4, 0, 0, 0, 0, 0, 0, 3, 0, 0, 0, 100];
    data.extend_from_slice(&[0, 0, 4, 8, 0, 0, 0, 0, 0, 0, 0, 0x10, 0]);
    data.extend_from_slice(&[0, 0, 1, 1, flags::END_HEADERS, 0, 0, 0, 1, 0x82]);

    let frames = codec.process(&data).unwrap();
    assert_eq!(frames.len(), 3);
    assert_eq!(
        frames[0].payload,
        FramePayload::Settings {
            settings: vec![(SettingId::MaxConcurrentStreams, 100)],
        }
    );
    assert_eq!(frames[1].payload, FramePayload::WindowUpdate { increment: 4096 });
    let request = Frame::headers(1, vec![H2Header::new(":method", "GET")], flags::END_HEADERS);
    assert_eq!(frames[2], request);
    assert_eq!(codec.buffered_len(), 0);
}

#[test]
fn test_buffer_preserves_partial_trailing_frame() {
    let mut codec = H2Codec::new();

    let mut data = vec![0, 0, 0, 4, 1, 0, 0, 0, 0];
    data.extend_from_slice(&[0, 0, 8, 6, 0, 0, 0]);

    let frames = codec.process(&data).unwrap();
    assert_eq!(frames, vec![Frame::settings_ack()]);
    assert_eq!(codec.buffered_len(), 7);

    let frames = codec.process(&[0, 0, 1, 2, 3, 4, 5, 6, 7, 8]).unwrap();
    assert_eq!(frames[0].payload, FramePayload::Ping { data: [1, 2, 3, 4, 5, 6, 7, 8] });
    assert_eq!(codec.buffered_len(), 0);
}

#[test]
fn test_header_table_state_shared_across_frames() {
    // One encoder feeds one decoder; dynamic-table entries must line up.
    let mut client = H2Codec::new();
    let mut server = H2Codec::new();
    let headers = vec![
        H2Header::new(":authority", "example.com"),
        H2Header::new("user-agent", "curl/8.4.0"),
    ];

    for stream_id in [1, 3, 5] {
        let frame = Frame::headers(stream_id, headers.clone(), flags::END_HEADERS);
        let bytes = client.serialize(&frame);
        let frames = server.process(&bytes).unwrap();
        assert_eq!(frames, vec![frame]);
    }
}
