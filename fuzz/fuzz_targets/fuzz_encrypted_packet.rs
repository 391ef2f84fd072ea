#![no_main]

use libfuzzer_sys::fuzz_target;
use tranquility_protocol::{build_encrypted_packet, parse_encrypted_packet};

const KEY: [u8; 32] = [0x5C; 32];

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes must never panic the encrypted parser
    let _ = parse_encrypted_packet(data, &KEY);

    // Well-formed packets around arbitrary payloads must round-trip
    if data.len() >= 16 {
        let (iv, payload) = data.split_at(16);
        if let Ok(packet) = build_encrypted_packet(payload, 3, &KEY, iv) {
            let parsed = parse_encrypted_packet(&packet, &KEY);
            assert!(matches!(parsed, Ok((3, ref body)) if body.as_slice() == payload));
        }
    }
});
