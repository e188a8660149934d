//! Word interpretation and message assembly.
//!
//! Both receive paths (batch [`decode`](crate::framing::decode) and the
//! streaming [`Reassembler`](crate::reassembly::Reassembler)) push words
//! through the same [`Assembly`], which tracks:
//! - the pending position, waiting for its value word
//! - the last accepted position, used to recognise sequential continuation
//! - the content byte recorded for each resolved position
//!
//! # Rules
//!
//! For a word `(payload, checksum)`:
//! - Position word, checksum fails, position is `last + 1` (or 0 before any
//!   position was seen): trusted and accepted anyway.
//! - Any other failed word: dropped, state unchanged.
//! - Position word accepted: becomes pending, replacing any earlier pending
//!   position, unless `4 * position` exceeds the bytes seen so far, in which
//!   case pending is cleared.
//! - Value word: recorded at the pending position, which is then consumed.
//!   Without a pending position it is dropped.

use crate::bits::verify;
use crate::error::DecodeIssue;
use crate::framing::{Word, BYTES_PER_FRAME, POSITION_FLAG, POSITION_MASK};
use crate::observer::{FieldKind, ResolvedField};
use std::fmt;

/// Character shown for positions that never resolved.
pub const REPLACEMENT_CHAR: char = '\u{FFFD}';

/// A possibly partial message, one optional content byte per position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    /// Index = position; length = highest recorded position + 1
    slots: Vec<Option<u8>>,
}

impl Message {
    /// Create an empty message.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `value` at `position`, widening the message if needed.
    fn record(&mut self, position: u8, value: u8) {
        let index = position as usize;
        if index >= self.slots.len() {
            self.slots.resize(index + 1, None);
        }
        self.slots[index] = Some(value);
    }

    /// Content byte at `position`, if resolved.
    pub fn get(&self, position: usize) -> Option<u8> {
        self.slots.get(position).copied().flatten()
    }

    /// All positions up to the highest one recorded.
    pub fn slots(&self) -> &[Option<u8>] {
        &self.slots
    }

    /// Resolved bytes, or `None` if any position is still missing.
    pub fn bytes(&self) -> Option<Vec<u8>> {
        self.slots.iter().copied().collect()
    }

    /// Number of positions up to the highest one recorded.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Check that every position up to the highest recorded one resolved.
    pub fn is_complete(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    /// Number of positions still missing.
    pub fn missing(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_none()).count()
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use fmt::Write;

        for slot in &self.slots {
            // Recorded values always have the top bit clear, so they are ASCII
            let ch = match slot {
                Some(byte) if byte.is_ascii() => *byte as char,
                _ => REPLACEMENT_CHAR,
            };
            f.write_char(ch)?;
        }
        Ok(())
    }
}

/// What happened to a single word.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Step {
    /// The word resolved as a position or character
    pub field: Option<ResolvedField>,
    /// A recoverable problem was found
    pub issue: Option<DecodeIssue>,
}

/// Position/value interpretation state for one receive session.
#[derive(Debug, Clone, Default)]
pub struct Assembly {
    message: Message,
    /// Position waiting for its value word
    pending: Option<u8>,
    /// Most recently accepted position
    last_position: Option<u8>,
}

impl Assembly {
    /// Create an empty session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Interpret one word.
    ///
    /// `available_bytes` is how many bytes of input the word is drawn from,
    /// used to reject implausibly large positions.
    pub fn accept(&mut self, word: Word, available_bytes: usize) -> Step {
        let Word { payload, checksum } = word;

        if payload & POSITION_FLAG != 0 {
            self.accept_position(word, available_bytes)
        } else if !verify(payload, checksum) {
            Step {
                field: None,
                issue: Some(DecodeIssue::ChecksumMismatch {
                    payload,
                    checksum,
                    trusted: false,
                }),
            }
        } else {
            self.accept_value(word)
        }
    }

    fn accept_position(&mut self, word: Word, available_bytes: usize) -> Step {
        let position = word.payload & POSITION_MASK;
        let mut step = Step::default();

        if !verify(word.payload, word.checksum) {
            let trusted = position == self.expected_position();
            step.issue = Some(DecodeIssue::ChecksumMismatch {
                payload: word.payload,
                checksum: word.checksum,
                trusted,
            });
            if !trusted {
                return step;
            }
        }

        if position as usize * BYTES_PER_FRAME > available_bytes {
            self.pending = None;
            // An overflow outranks the checksum note: the word is rejected
            step.issue = Some(DecodeIssue::PositionOverflow {
                position,
                limit_bytes: available_bytes,
            });
            return step;
        }

        self.pending = Some(position);
        self.last_position = Some(position);
        step.field = Some(ResolvedField {
            kind: FieldKind::Position,
            value: position,
            raw: word.to_bytes(),
        });
        step
    }

    fn accept_value(&mut self, word: Word) -> Step {
        match self.pending.take() {
            Some(position) => {
                self.message.record(position, word.payload);
                Step {
                    field: Some(ResolvedField {
                        kind: FieldKind::Character,
                        value: word.payload,
                        raw: word.to_bytes(),
                    }),
                    issue: None,
                }
            }
            None => Step {
                field: None,
                issue: Some(DecodeIssue::UnsolicitedValue {
                    value: word.payload,
                }),
            },
        }
    }

    /// Position a sequentially continuing stream would carry next.
    pub fn expected_position(&self) -> u8 {
        self.last_position.map_or(0, |p| p.wrapping_add(1))
    }

    /// Position waiting for its value word, if any.
    pub fn pending(&self) -> Option<u8> {
        self.pending
    }

    /// The message assembled so far.
    pub fn message(&self) -> &Message {
        &self.message
    }

    /// Finish the session and keep the message.
    pub fn into_message(self) -> Message {
        self.message
    }
}
