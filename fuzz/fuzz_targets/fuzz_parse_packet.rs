#![no_main]

use libfuzzer_sys::fuzz_target;
use tranquility_protocol::parse_packet;

fuzz_target!(|data: &[u8]| {
    // Fuzz plain packet parsing - test for panics, crashes, infinite loops
    let _ = parse_packet(data);
});
