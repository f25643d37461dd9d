//! Tests for the SPSC ring.

use std::sync::Arc;
use std::thread;

use crate::ring::RingBuffer;

const KIB: usize = 1 << 10;
const MIB: usize = 1 << 20;

fn assert_state(ring: &RingBuffer, used: u32, consumable: u32) {
    assert_eq!(ring.used(), used, "used mismatch");
    assert_eq!(ring.size() - used, ring.unused(), "unused mismatch");
    assert_eq!(ring.consumable(), consumable, "consumable mismatch");
}

// ============================================================================
// Construction
// ============================================================================

#[test]
fn test_default_capacity_is_one_mib() {
    let ring = RingBuffer::with_default_capacity();
    assert_eq!(ring.size() as usize, MIB);
    assert_state(&ring, 0, 0);
}

#[test]
fn test_capacity_rounds_to_power_of_two() {
    let ring = RingBuffer::new(1000);
    assert_eq!(ring.size(), 1024);
}

#[test]
#[should_panic(expected = "ring capacity must be > 0")]
fn test_zero_capacity_panics() {
    let _ = RingBuffer::new(0);
}

// ============================================================================
// Fill, publish, drain in stages (uneven runs crossing the wrap boundary)
// ============================================================================

#[test]
fn test_staged_fill_publish_drain() {
    let ring = RingBuffer::with_default_capacity();
    let size = ring.size();

    let one = [b'c'; 1];
    let fill_128 = vec![b'1'; 128];
    let fill_1k = vec![b'2'; KIB];
    let fill_64k = vec![b'3'; 64 * KIB];
    let fill_256k = vec![b'4'; 256 * KIB];
    // Remaining space once the fills above are in: 719743 bytes.
    let tail_len = MIB - (1 + 128 + KIB + 64 * KIB + 256 * KIB);
    assert_eq!(tail_len, 719_743);
    let tail = vec![b'A'; tail_len];

    let mut used = 0u32;

    ring.produce(&[]);
    assert_state(&ring, 0, 0);

    for chunk in [&one[..], &fill_128, &fill_1k, &fill_64k, &fill_256k, &tail] {
        ring.produce(chunk);
        used += chunk.len() as u32;
        assert_state(&ring, used, 0);
    }
    assert_eq!(ring.unused(), 0);

    // Nothing is drainable until published.
    let mut sink = vec![0u8; MIB];
    assert_eq!(ring.consume(&mut sink[..1]), 0);

    // Publish and drain the first two runs one at a time.
    ring.advance_consumable(0);
    assert_state(&ring, used, 0);
    ring.advance_consumable(1);
    assert_state(&ring, used, 1);

    let mut byte = [0u8; 1];
    assert_eq!(ring.consume(&mut byte), 1);
    assert_eq!(byte[0], b'c');
    used -= 1;
    assert_state(&ring, used, 0);

    ring.advance_consumable(128);
    ring.advance_consumable(KIB as u32);
    assert_state(&ring, used, (128 + KIB) as u32);

    let mut run = vec![0u8; 128];
    assert_eq!(ring.consume(&mut run), 128);
    assert!(run.iter().all(|&b| b == b'1'));
    used -= 128;

    let mut run = vec![0u8; KIB];
    assert_eq!(ring.consume(&mut run), KIB);
    assert!(run.iter().all(|&b| b == b'2'));
    used -= KIB as u32;
    assert_state(&ring, used, 0);

    // Publish everything left and drain it run by run.
    let rest = (320 * KIB + tail_len) as u32;
    ring.advance_consumable(rest);
    assert_state(&ring, used, rest);

    let mut run = vec![0u8; 64 * KIB];
    assert_eq!(ring.consume(&mut run), 64 * KIB);
    assert!(run.iter().all(|&b| b == b'3'));

    let mut run = vec![0u8; 256 * KIB];
    assert_eq!(ring.consume(&mut run), 256 * KIB);
    assert!(run.iter().all(|&b| b == b'4'));

    let mut run = vec![0u8; tail_len];
    assert_eq!(ring.consume(&mut run), tail_len);
    assert!(run.iter().all(|&b| b == b'A'));

    assert_state(&ring, 0, 0);

    // A full-capacity lap through the now-offset positions.
    let lap = vec![b'5'; MIB];
    ring.produce(&lap);
    assert_state(&ring, MIB as u32, 0);
    ring.advance_consumable(MIB as u32);
    assert_eq!(ring.consume(&mut sink), MIB);
    assert!(sink.iter().all(|&b| b == b'5'));
    assert_state(&ring, 0, 0);
}

// ============================================================================
// Wrap boundary
// ============================================================================

#[test]
fn test_split_copy_across_wrap() {
    let ring = RingBuffer::new(8);

    ring.produce(b"abcdef");
    ring.advance_consumable(6);
    let mut out = [0u8; 6];
    assert_eq!(ring.consume(&mut out), 6);
    assert_eq!(&out, b"abcdef");

    // Positions now sit at 6; the next run wraps through the end.
    ring.produce(b"ghijkl");
    ring.advance_consumable(6);
    assert_eq!(ring.consume(&mut out), 6);
    assert_eq!(&out, b"ghijkl");
    assert_state(&ring, 0, 0);
}

#[test]
fn test_produce_clamps_to_capacity() {
    let ring = RingBuffer::new(16);
    let oversized = (0u8..32).collect::<Vec<_>>();

    ring.produce(&oversized);
    assert_eq!(ring.used(), 16);

    ring.advance_consumable(16);
    let mut out = [0u8; 16];
    assert_eq!(ring.consume(&mut out), 16);
    assert_eq!(&out[..], &oversized[..16]);
}

// ============================================================================
// Round trip restores free space
// ============================================================================

#[test]
fn test_produce_consume_round_trip() {
    let ring = RingBuffer::new(4 * KIB);
    let before = ring.unused();

    let payload = b"the quick brown fox jumps over the lazy dog";
    ring.produce(payload);
    ring.advance_consumable(payload.len() as u32);

    let mut out = vec![0u8; payload.len()];
    assert_eq!(ring.consume(&mut out), payload.len());
    assert_eq!(&out[..], payload);
    assert_eq!(ring.unused(), before);
}

// ============================================================================
// Concurrent producer/consumer
// ============================================================================

#[test]
fn test_spsc_record_stream() {
    const RECORD: &[u8] = b"hello\n";
    const COUNT: usize = 200_000;

    let ring = Arc::new(RingBuffer::new(64 * KIB));

    let producer = {
        let ring = Arc::clone(&ring);
        thread::spawn(move || {
            for _ in 0..COUNT {
                ring.produce(RECORD);
                ring.advance_consumable(RECORD.len() as u32);
            }
        })
    };

    let mut stream = Vec::with_capacity(COUNT * RECORD.len());
    let mut chunk = vec![0u8; 4 * KIB];
    while stream.len() < COUNT * RECORD.len() {
        let n = ring.consume(&mut chunk);
        if n == 0 {
            std::hint::spin_loop();
            continue;
        }
        stream.extend_from_slice(&chunk[..n]);
    }
    producer.join().unwrap();

    assert_eq!(stream.len(), COUNT * RECORD.len());
    for record in stream.chunks(RECORD.len()) {
        assert_eq!(record, RECORD);
    }
    assert_state(&ring, 0, 0);
}

#[test]
fn test_consumer_never_sees_unpublished_bytes() {
    let ring = RingBuffer::new(KIB);

    ring.produce(b"partial record");
    let mut out = [0u8; 32];
    assert_eq!(ring.consume(&mut out), 0);
    assert_eq!(ring.consumable(), 0);
    assert_eq!(ring.used(), 14);

    ring.advance_consumable(14);
    assert_eq!(ring.consume(&mut out), 14);
    assert_eq!(&out[..14], b"partial record");
}
