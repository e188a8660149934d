//! Frame encoding and batch decoding.
//!
//! Every content byte of a message travels as one frame of two words. A word
//! is a payload byte followed by its checksum (see [`crate::bits`]).
//!
//! # Frame Format
//!
//! ```text
//! +-------------------+
//! | 0x80 | position   |  position word payload (top bit set)
//! +-------------------+
//! | checksum          |  reverse_byte(!payload)
//! +-------------------+
//! | value             |  content byte (top bit clear)
//! +-------------------+
//! | checksum          |  reverse_byte(!value)
//! +-------------------+
//! ```
//!
//! Frames are concatenated in position order with no header or trailer, so
//! `encode` of an n-byte message is exactly `4 * n` bytes. The position field
//! has 7 bits, which caps messages at 128 bytes.
//!
//! # Decoding
//!
//! [`decode`] walks the input two bytes at a time and feeds each word to an
//! [`Assembly`]. Corrupt words are skipped rather than failing the decode;
//! positions that never resolve show up as U+FFFD in the result.

use crate::assembly::{Assembly, Message};
use crate::bits::{binary_string, checksum_of};
use crate::error::{DecodeIssue, Error, Result};
use crate::observer::{FieldKind, Observers};

/// Marks a word payload as a position
pub const POSITION_FLAG: u8 = 0b1000_0000;

/// Position bits of a position word payload
pub const POSITION_MASK: u8 = 0b0111_1111;

/// Largest message the position field can address
pub const MAX_MESSAGE_LEN: usize = 128;

/// Bytes in one word (payload + checksum)
pub const BYTES_PER_WORD: usize = 2;

/// Bytes in one frame (position word + value word)
pub const BYTES_PER_FRAME: usize = 4;

/// Bits in one word
pub const BITS_PER_WORD: usize = BYTES_PER_WORD * 8;

/// A payload byte paired with its checksum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Word {
    pub payload: u8,
    pub checksum: u8,
}

impl Word {
    /// Build a correctly checksummed word.
    pub const fn new(payload: u8) -> Self {
        Self {
            payload,
            checksum: checksum_of(payload),
        }
    }

    /// Build the position word for `position` (only the low 7 bits are used).
    pub const fn position(position: u8) -> Self {
        Self::new(POSITION_FLAG | (position & POSITION_MASK))
    }

    /// Reinterpret two bytes as a word, without checking it.
    pub const fn from_bytes(bytes: [u8; 2]) -> Self {
        Self {
            payload: bytes[0],
            checksum: bytes[1],
        }
    }

    pub const fn to_bytes(self) -> [u8; 2] {
        [self.payload, self.checksum]
    }

    /// Check if the payload marks a position.
    pub const fn is_position(self) -> bool {
        self.payload & POSITION_FLAG != 0
    }

    /// Check the checksum.
    pub const fn is_valid(self) -> bool {
        crate::bits::verify(self.payload, self.checksum)
    }

    /// Word kind as announced by the payload's top bit.
    pub const fn kind(self) -> FieldKind {
        if self.is_position() {
            FieldKind::Position
        } else {
            FieldKind::Character
        }
    }
}

/// Encode a message into its frame sequence.
///
/// # Errors
/// Returns `Error::MessageTooLong` if the message has more than
/// [`MAX_MESSAGE_LEN`] bytes. Nothing is produced in that case.
///
/// # Example
/// ```
/// use bitchannel_core::framing::{decode, encode};
///
/// let bytes = encode(b"hi").unwrap();
/// assert_eq!(bytes.len(), 8);
/// assert_eq!(bytes[0], 0x80);
/// assert_eq!(decode(&bytes).to_string(), "hi");
/// ```
pub fn encode(message: &[u8]) -> Result<Vec<u8>> {
    if message.len() > MAX_MESSAGE_LEN {
        return Err(Error::MessageTooLong {
            len: message.len(),
            max: MAX_MESSAGE_LEN,
        });
    }

    let mut frames = Vec::with_capacity(message.len() * BYTES_PER_FRAME);
    for (position, &value) in message.iter().enumerate() {
        // Bounded by MAX_MESSAGE_LEN above
        frames.extend_from_slice(&Word::position(position as u8).to_bytes());
        frames.extend_from_slice(&Word::new(value).to_bytes());
    }

    Ok(frames)
}

/// Encode a UTF-8 string. Only ASCII content survives the round trip.
pub fn encode_str(message: &str) -> Result<Vec<u8>> {
    encode(message.as_bytes())
}

/// Decode a byte sequence into a (possibly partial) message.
///
/// Never fails: corrupt or unplaceable words are logged and skipped.
pub fn decode(bytes: &[u8]) -> Message {
    decode_observed(bytes, &mut Observers::new())
}

/// Decode, reporting resolved fields and issues to `observers` as they occur.
///
/// A trailing odd byte is ignored.
pub fn decode_observed(bytes: &[u8], observers: &mut Observers) -> Message {
    let mut assembly = Assembly::new();

    for pair in bytes.chunks_exact(BYTES_PER_WORD) {
        let word = Word::from_bytes([pair[0], pair[1]]);
        let step = assembly.accept(word, bytes.len());

        if let Some(issue) = &step.issue {
            report_issue(issue);
            observers.diagnostic(issue);
        }
        if let Some(field) = &step.field {
            tracing::debug!(kind = ?field.kind, value = field.value, "resolved field");
            observers.field_resolved(field);
        }
    }

    assembly.into_message()
}

/// Log a decode issue at the level it deserves.
pub(crate) fn report_issue(issue: &DecodeIssue) {
    match *issue {
        DecodeIssue::ChecksumMismatch {
            payload,
            checksum,
            trusted,
        } => {
            tracing::warn!(
                "checksum {} test failed for byte {}",
                binary_string(checksum as u32),
                binary_string(payload as u32)
            );
            if trusted {
                tracing::warn!(
                    "position {} appears to be sequential, trusting it",
                    payload & POSITION_MASK
                );
            }
        }
        DecodeIssue::Misaligned { attempt, .. } => {
            tracing::debug!("misaligned or corrupt data, shifting to find new alignment ({attempt})");
        }
        DecodeIssue::PositionOverflow {
            position,
            limit_bytes,
        } => {
            tracing::warn!("decoded position {position}, but it is implausible for {limit_bytes} bytes");
        }
        DecodeIssue::UnsolicitedValue { value } => {
            tracing::warn!("decoded value {value:#04x}, but its position is unknown");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::Event;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_encode_hi() {
        let bytes = encode(b"hi").unwrap();
        assert_eq!(
            bytes,
            vec![
                0x80,
                checksum_of(0x80),
                0x68,
                checksum_of(0x68),
                0x81,
                checksum_of(0x81),
                0x69,
                checksum_of(0x69),
            ]
        );
        assert_eq!(decode(&bytes).to_string(), "hi");
    }

    #[test]
    fn test_round_trip_hello_world() {
        let bytes = encode_str("hello world").unwrap();
        assert_eq!(bytes.len(), 44);
        assert_eq!(decode(&bytes).to_string(), "hello world");
    }

    #[test]
    fn test_empty_message() {
        let bytes = encode(b"").unwrap();
        assert!(bytes.is_empty());
        assert!(decode(&bytes).is_empty());
    }

    #[test]
    fn test_message_too_long() {
        let long = vec![b'a'; MAX_MESSAGE_LEN + 1];
        assert_eq!(
            encode(&long),
            Err(Error::MessageTooLong {
                len: 129,
                max: MAX_MESSAGE_LEN
            })
        );

        // Exactly at the limit is fine
        let max = vec![b'a'; MAX_MESSAGE_LEN];
        let bytes = encode(&max).unwrap();
        assert_eq!(bytes.len(), MAX_MESSAGE_LEN * BYTES_PER_FRAME);
        assert_eq!(decode(&bytes).bytes(), Some(max));
    }

    #[test]
    fn test_position_checksum_corruption_trusted() {
        let mut bytes = encode_str("hello").unwrap();
        // Checksum of the position word for index 2
        bytes[2 * BYTES_PER_FRAME + 1] ^= 0xFF;

        assert_eq!(decode(&bytes).to_string(), "hello");
    }

    #[test]
    fn test_value_checksum_corruption_shows_replacement() {
        let mut bytes = encode_str("hello").unwrap();
        // Checksum of the value word for index 2
        bytes[2 * BYTES_PER_FRAME + 3] ^= 0x01;

        assert_eq!(decode(&bytes).to_string(), "he\u{FFFD}lo");
    }

    #[test]
    fn test_corrupt_position_payload_dropped() {
        let mut bytes = encode_str("hello world").unwrap();
        // Position 2 ('l') turned into position 7; checksum no longer matches
        bytes[2 * BYTES_PER_FRAME] = POSITION_FLAG | 7;

        let decoded = decode(&bytes);
        assert_eq!(decoded.to_string(), "he\u{FFFD}lo world");
    }

    #[test]
    fn test_trailing_odd_byte_ignored() {
        let mut bytes = encode_str("ok").unwrap();
        bytes.push(0x80);
        assert_eq!(decode(&bytes).to_string(), "ok");
    }

    #[test]
    fn test_word_helpers() {
        let word = Word::position(5);
        assert!(word.is_position());
        assert!(word.is_valid());
        assert_eq!(word.kind(), FieldKind::Position);
        assert_eq!(Word::from_bytes(word.to_bytes()), word);

        let value = Word::new(b'A');
        assert_eq!(value.kind(), FieldKind::Character);
        assert!(!Word::from_bytes([b'A', b'A']).is_valid());
    }

    #[test]
    fn test_decode_observed_events() {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        let mut observers = Observers::new();
        observers.subscribe(move |event: &Event| sink.borrow_mut().push(event.clone()));

        let mut bytes = encode_str("ab").unwrap();
        bytes[BYTES_PER_FRAME + 3] ^= 0x01;
        let decoded = decode_observed(&bytes, &mut observers);

        assert_eq!(decoded.to_string(), "a");
        let events = events.borrow();
        let fields = events
            .iter()
            .filter(|e| matches!(e, Event::FieldResolved(_)))
            .count();
        // pos 0, 'a', pos 1 resolve; 'b' fails its checksum
        assert_eq!(fields, 3);
        assert!(events.iter().any(|e| matches!(
            e,
            Event::Diagnostic(DecodeIssue::ChecksumMismatch { trusted: false, .. })
        )));
    }
}
