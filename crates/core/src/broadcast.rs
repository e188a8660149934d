//! Sender side: turns a message into a stream of bits.
//!
//! A [`Broadcaster`] encodes its message once and then hands out one bit per
//! call, which is all a one-bit-at-a-time channel can take. Observers see
//! every bit and, at the first bit of each word, the field that word carries.
//!
//! With [`BroadcastConfig::repeat`] the sequence starts over after the last
//! bit, so a receiver that joined late still gets a full copy.

use crate::bitio::BitBuffer;
use crate::error::Result;
use crate::framing::{encode, Word, BITS_PER_WORD, BYTES_PER_WORD, POSITION_MASK};
use crate::observer::{ChannelObserver, FieldKind, Observers, ResolvedField, SubscriptionId};

/// Sender behaviour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastConfig {
    /// Restart from the first bit after the last one, forever
    pub repeat: bool,
}

/// Bit-by-bit transmitter for one message.
#[derive(Debug)]
pub struct Broadcaster {
    config: BroadcastConfig,
    bits: BitBuffer,
    /// Next bit to send
    cursor: usize,
    /// Completed passes over the message
    passes: u64,
    observers: Observers,
}

impl Broadcaster {
    /// Encode `message` for sending once.
    ///
    /// # Errors
    /// `Error::MessageTooLong` if the message exceeds 128 bytes.
    pub fn new(message: &[u8]) -> Result<Self> {
        Self::with_config(message, BroadcastConfig::default())
    }

    pub fn with_config(message: &[u8], config: BroadcastConfig) -> Result<Self> {
        let bits = BitBuffer::from_bytes(encode(message)?);
        Ok(Self {
            config,
            bits,
            cursor: 0,
            passes: 0,
            observers: Observers::new(),
        })
    }

    pub fn subscribe<O>(&mut self, observer: O) -> SubscriptionId
    where
        O: ChannelObserver + 'static,
    {
        self.observers.subscribe(observer)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    /// Produce the next bit, or `None` once a non-repeating message is done.
    pub fn next_bit(&mut self) -> Option<bool> {
        if self.bits.is_empty() {
            return None;
        }
        if self.cursor >= self.bits.bit_len() {
            if !self.config.repeat {
                return None;
            }
            self.cursor = 0;
        }

        if self.cursor % BITS_PER_WORD == 0 {
            self.announce_word(self.cursor / 8);
        }

        let bit = self.bits.get_bit(self.cursor);
        self.observers.bit_observed(bit);
        self.cursor += 1;

        if self.cursor == self.bits.bit_len() {
            self.passes += 1;
            tracing::debug!(passes = self.passes, "message sent");
        }
        Some(bit)
    }

    /// Tell observers which field the word at `byte_offset` carries.
    fn announce_word(&mut self, byte_offset: usize) {
        let word = Word::from_bytes([
            self.bits.byte(byte_offset).unwrap_or(0),
            self.bits.byte(byte_offset + 1).unwrap_or(0),
        ]);
        let value = match word.kind() {
            FieldKind::Position => word.payload & POSITION_MASK,
            FieldKind::Character => word.payload,
        };
        let field = ResolvedField {
            kind: word.kind(),
            value,
            raw: word.to_bytes(),
        };
        tracing::debug!(kind = ?field.kind, value, "sending field");
        self.observers.field_resolved(&field);
    }

    /// Encoded message as bytes.
    pub fn encoded(&self) -> &[u8] {
        self.bits.as_bytes()
    }

    /// Bits in one pass over the message.
    pub fn bit_len(&self) -> usize {
        self.bits.bit_len()
    }

    /// Words in one pass over the message.
    pub fn word_count(&self) -> usize {
        self.bits.byte_len() / BYTES_PER_WORD
    }

    /// Completed passes.
    pub fn passes(&self) -> u64 {
        self.passes
    }

    pub fn config(&self) -> &BroadcastConfig {
        &self.config
    }
}

impl Iterator for Broadcaster {
    type Item = bool;

    fn next(&mut self) -> Option<bool> {
        self.next_bit()
    }
}
