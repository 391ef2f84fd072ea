#![no_main]

use libfuzzer_sys::fuzz_target;
use tranquility_protocol::core::serialization::{deserialize, serialize};
use tranquility_protocol::fixed_layout;

fixed_layout! {
    #[derive(Debug, PartialEq)]
    struct Frame {
        sequence: u64,
        flags: u8,
        live: bool,
        scale: f32,
        window: [u16; 4],
    }
}

fuzz_target!(|data: &[u8]| {
    // Decoding arbitrary bytes must fail cleanly or re-encode to the same bytes
    if let Ok(frame) = deserialize::<Frame>(data) {
        assert_eq!(serialize(&frame), data);
    }
});
