//! Fuzz target: bit timings → `decode_bits` → `SensorFrame::from_bytes`
//!
//! Interprets the input as 40 (low, high) wait pairs and checks that
//! decoding is total and that only checksum-valid frames are accepted.
//!
//! cargo fuzz run fuzz_pulse_decoder

#![no_main]

use greenhouse::sensors::frame::{BitTiming, FRAME_BITS, SensorFrame, checksum, decode_bits};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() < FRAME_BITS * 2 {
        return;
    }
    let mut timings = [BitTiming::default(); FRAME_BITS];
    for (slot, pair) in timings.iter_mut().zip(data.chunks_exact(2)) {
        *slot = BitTiming::new(u32::from(pair[0]), u32::from(pair[1]));
    }

    let bytes = decode_bits(&timings);
    match SensorFrame::from_bytes(bytes) {
        Ok(frame) => {
            assert_eq!(bytes[4], checksum(&bytes[..4]));
            assert!(frame.humidity() >= 0.0);
        }
        Err(_) => assert_ne!(bytes[4], checksum(&bytes[..4])),
    }
});
