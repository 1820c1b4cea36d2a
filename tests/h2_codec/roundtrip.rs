//! parse(serialize(frame)) == frame for every constructible frame

use h2_fingerprint::{Frame, FramePayload, H2Codec, H2Header, PrioritySpec, SettingId};
use proptest::prelude::*;

const MAX_STREAM_ID: u32 = 0x7FFF_FFFF;

fn stream_id() -> impl Strategy<Value = u32> {
    0..=MAX_STREAM_ID
}

fn header_list() -> impl Strategy<Value = Vec<H2Header>> {
    prop::collection::vec(
        ("[a-z][a-z0-9-]{0,12}", "[ -~]{0,24}")
            .prop_map(|(name, value)| H2Header::new(name, value)),
        0..6,
    )
}

fn priority() -> impl Strategy<Value = PrioritySpec> {
    (any::<bool>(), stream_id(), 1u16..=256).prop_map(|(exclusive, dependency, weight)| {
        PrioritySpec {
            exclusive,
            dependency,
            weight,
        }
    })
}

fn setting_id() -> impl Strategy<Value = SettingId> {
    prop_oneof![
        Just(SettingId::HeaderTableSize),
        Just(SettingId::EnablePush),
        Just(SettingId::MaxConcurrentStreams),
        Just(SettingId::InitialWindowSize),
        Just(SettingId::MaxFrameSize),
        Just(SettingId::MaxHeaderListSize),
    ]
}

fn payload() -> impl Strategy<Value = FramePayload> {
    prop_oneof![
        (prop::collection::vec(any::<u8>(), 0..64), any::<Option<u8>>())
            .prop_map(|(data, pad_length)| FramePayload::Data { data, pad_length }),
        (any::<Option<u8>>(), prop::option::of(priority()), header_list()).prop_map(
            |(pad_length, priority, headers)| FramePayload::Headers {
                pad_length,
                priority,
                headers,
            }
        ),
        priority().prop_map(FramePayload::Priority),
        any::<u32>().prop_map(|error_code| FramePayload::RstStream { error_code }),
        prop::collection::vec((setting_id(), any::<u32>()), 0..8)
            .prop_map(|settings| FramePayload::Settings { settings }),
        (any::<Option<u8>>(), stream_id(), header_list()).prop_map(
            |(pad_length, promised_stream_id, headers)| FramePayload::PushPromise {
                pad_length,
                promised_stream_id,
                headers,
            }
        ),
        any::<[u8; 8]>().prop_map(|data| FramePayload::Ping { data }),
        (stream_id(), any::<u32>(), prop::collection::vec(any::<u8>(), 0..32)).prop_map(
            |(last_stream_id, error_code, debug_data)| FramePayload::GoAway {
                last_stream_id,
                error_code,
                debug_data,
            }
        ),
        any::<u32>().prop_map(|increment| FramePayload::WindowUpdate { increment }),
        header_list().prop_map(|headers| FramePayload::Continuation { headers }),
    ]
}

fn frame() -> impl Strategy<Value = Frame> {
    (stream_id(), any::<u8>(), payload())
        .prop_map(|(stream_id, flags, payload)| Frame::new(stream_id, flags, payload))
}

proptest! {
    #[test]
    fn frame_roundtrip(frame in frame()) {
        let mut codec = H2Codec::new();
        let bytes = codec.serialize(&frame);
        let parsed = codec.process(&bytes).unwrap();
        prop_assert_eq!(parsed, vec![frame]);
        prop_assert_eq!(codec.buffered_len(), 0);
    }

    #[test]
    fn frame_sequence_roundtrip(frames in prop::collection::vec(frame(), 1..8)) {
        let mut writer = H2Codec::new();
        let mut reader = H2Codec::new();
        let bytes: Vec<u8> = frames.iter().flat_map(|f| writer.serialize(f)).collect();
        prop_assert_eq!(reader.process(&bytes).unwrap(), frames);
    }
}
