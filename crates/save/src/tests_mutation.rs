//! Robustness against arbitrary corruption: the loader may reject a
//! damaged stream but must never panic, loop, or misallocate.

use world::version_table::{VersionTable, CURRENT_VERSION};

use crate::tests_roundtrip::sample_world;
use crate::world_codec::WorldCodec;

fn saved_bytes() -> Vec<u8> {
    let table = VersionTable::embedded().unwrap();
    let codec = WorldCodec::new(&table);
    let mut bytes = Vec::new();
    codec.save(&sample_world(CURRENT_VERSION), &mut bytes).unwrap();
    bytes
}

#[test]
fn test_single_byte_flips_never_panic() {
    let table = VersionTable::embedded().unwrap();
    let codec = WorldCodec::new(&table);
    let baseline = saved_bytes();

    // Stepped offsets keep the runtime modest while still hitting every
    // stream section (header, grid, entity tables, footer).
    for offset in (0..baseline.len()).step_by(7) {
        let mut bytes = baseline.clone();
        bytes[offset] ^= 0xFF;
        // Ok (benign flip) and Err are both acceptable.
        let _ = codec.load(&mut bytes.as_slice());
    }
}

#[test]
fn test_flipped_low_bits_never_panic() {
    // Low-bit flips are likelier to survive bounds checks and reach the
    // deeper decoding paths than whole-byte inversions.
    let table = VersionTable::embedded().unwrap();
    let codec = WorldCodec::new(&table);
    let baseline = saved_bytes();

    for offset in (0..baseline.len()).step_by(11) {
        let mut bytes = baseline.clone();
        bytes[offset] ^= 0x01;
        let _ = codec.load(&mut bytes.as_slice());
    }
}

#[test]
fn test_every_truncation_is_rejected() {
    let table = VersionTable::embedded().unwrap();
    let codec = WorldCodec::new(&table);
    let baseline = saved_bytes();

    for len in 0..baseline.len() {
        let result = codec.load(&mut &baseline[..len]);
        assert!(
            result.is_err(),
            "a {len}-byte prefix of a {}-byte stream parsed as a world",
            baseline.len()
        );
    }
}

#[test]
fn test_garbage_stream_is_rejected() {
    let table = VersionTable::embedded().unwrap();
    let codec = WorldCodec::new(&table);

    // A deterministic pseudo-random byte soup.
    let mut state = 0x2545_F491u32;
    let garbage: Vec<u8> = (0..4096)
        .map(|_| {
            state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            (state >> 16) as u8
        })
        .collect();

    assert!(codec.load(&mut garbage.as_slice()).is_err());
}
