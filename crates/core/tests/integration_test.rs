//! Integration tests for the full bit channel.
//!
//! These tests drive the sender, the simulated channel and the streaming
//! receiver together, and check the receiver against batch decoding.

use bitchannel_core::{
    bitio::BitBuffer,
    broadcast::{BroadcastConfig, Broadcaster},
    channel::{ChannelConfig, NoisyChannel},
    framing::{decode, decode_observed, encode_str, BYTES_PER_FRAME},
    observer::{Event, FieldKind, Observers},
    reassembly::Reassembler,
    DecodeIssue,
};
use std::cell::RefCell;
use std::rc::Rc;

fn recorder() -> (Rc<RefCell<Vec<Event>>>, impl FnMut(&Event) + 'static) {
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);
    (events, move |event: &Event| sink.borrow_mut().push(event.clone()))
}

/// Sender -> perfect channel -> receiver.
#[test]
fn test_full_pipeline_perfect_channel() {
    let message = "hello world";

    let sender = Broadcaster::new(message.as_bytes()).expect("encode failed");
    let mut channel = NoisyChannel::new(ChannelConfig::perfect(42));
    let received = channel.transmit(sender);

    let mut receiver = Reassembler::new();
    receiver.feed_bits(received);

    assert_eq!(receiver.message().to_string(), message);
    assert!(receiver.message().is_complete());
    assert_eq!(receiver.metrics().bits_received, channel.stats().bits_delivered);
}

/// The streaming receiver agrees with batch decoding on clean input.
#[test]
fn test_streaming_matches_batch() {
    let bytes = encode_str("The quick brown fox jumps over the lazy dog.").unwrap();

    let mut receiver = Reassembler::new();
    receiver.feed_bits(BitBuffer::from_bytes(bytes.clone()).bits());

    assert_eq!(receiver.message(), &decode(&bytes));
}

/// One spurious bit in front of the stream is absorbed by resynchronization.
#[test]
fn test_resync_after_leading_spurious_bit() {
    let message = "hello world";
    let bits: Vec<bool> = BitBuffer::from_bytes(encode_str(message).unwrap())
        .bits()
        .collect();

    let (events, record) = recorder();
    let mut receiver = Reassembler::new();
    receiver.subscribe(record);

    let mut max_attempts = 0;
    for bit in std::iter::once(true).chain(bits) {
        receiver.feed_bit(bit);
        max_attempts = max_attempts.max(receiver.align_attempts());
    }

    assert!(max_attempts > 0);
    assert_eq!(receiver.align_attempts(), 0);
    assert_eq!(receiver.message().to_string(), message);

    let misaligned = events
        .borrow()
        .iter()
        .filter(|e| matches!(e, Event::Diagnostic(DecodeIssue::Misaligned { .. })))
        .count();
    assert_eq!(misaligned as u32, max_attempts);
}

/// A spurious bit between two frames costs nothing but a resync.
#[test]
fn test_resync_mid_stream() {
    let message = "hello world";
    let bits: Vec<bool> = BitBuffer::from_bytes(encode_str(message).unwrap())
        .bits()
        .collect();

    for spurious in [false, true] {
        let mut noisy = bits.clone();
        // Right before the position word of frame 1
        noisy.insert(BYTES_PER_FRAME * 8, spurious);

        let mut receiver = Reassembler::new();
        receiver.feed_bits(noisy);

        assert_eq!(receiver.message().to_string(), message);
        assert_eq!(receiver.metrics().longest_resync, 1);
        assert_eq!(receiver.metrics().words_accepted, 22);
    }

    // Two spurious bits up front take two attempts
    let mut prefixed = vec![true, true];
    prefixed.extend(bits);
    let mut receiver = Reassembler::new();
    receiver.feed_bits(prefixed);
    assert_eq!(receiver.message().to_string(), message);
    assert_eq!(receiver.metrics().longest_resync, 2);
}

/// Corrupt position checksum is trusted when the position is the next one.
#[test]
fn test_position_checksum_corruption_tolerated() {
    let mut bytes = encode_str("hello world").unwrap();
    bytes[4 * BYTES_PER_FRAME + 1] ^= 0b0010_0100;

    let (events, record) = recorder();
    let mut observers = Observers::new();
    observers.subscribe(record);

    let decoded = decode_observed(&bytes, &mut observers);
    assert_eq!(decoded.to_string(), "hello world");

    let events = events.borrow();
    assert!(events.iter().any(|e| matches!(
        e,
        Event::Diagnostic(DecodeIssue::ChecksumMismatch { trusted: true, payload: 0x84, .. })
    )));
    let positions = events
        .iter()
        .filter(|e| matches!(e, Event::FieldResolved(f) if f.kind == FieldKind::Position))
        .count();
    assert_eq!(positions, 11);
}

/// Corrupt value checksum loses exactly that character.
#[test]
fn test_value_checksum_corruption_not_tolerated() {
    let mut bytes = encode_str("hello world").unwrap();
    bytes[6 * BYTES_PER_FRAME + 3] ^= 0x80;

    assert_eq!(decode(&bytes).to_string(), "hello \u{FFFD}orld");
}

/// Receiver joining a repeating broadcast mid-message fills in on the next pass.
#[test]
fn test_late_join_on_repeating_broadcast() {
    let config = BroadcastConfig { repeat: true };
    let sender = Broadcaster::with_config(b"repeat", config).unwrap();
    let pass = sender.bit_len();

    // Join exactly at the start of frame 2
    let mut bits = sender.skip(2 * BYTES_PER_FRAME * 8);
    let mut receiver = Reassembler::new();

    // Positions 2..=5 look implausible this early in the session
    receiver.feed_bits(bits.by_ref().take(pass));
    assert_eq!(receiver.message().to_string(), "re");
    assert_eq!(receiver.metrics().position_overflows, 4);

    receiver.feed_bits(bits.by_ref().take(pass));
    assert_eq!(receiver.message().to_string(), "repeat");
}

/// Random noise never panics and never grows the message past the limit.
#[test]
fn test_noisy_channel_degrades_gracefully() {
    for seed in 0..20 {
        let sender = Broadcaster::new(b"noisy channel, partial message").unwrap();
        let mut channel = NoisyChannel::new(ChannelConfig {
            flip_rate: 0.01,
            insert_rate: 0.005,
            drop_rate: 0.005,
            seed,
        });
        let received = channel.transmit(sender);

        let mut receiver = Reassembler::new();
        receiver.feed_bits(received.iter().copied());

        assert!(receiver.message().len() <= 128);
        assert_eq!(receiver.metrics().bits_received, received.len() as u64);
        assert!(receiver.bit_index() <= received.len());
    }
}
