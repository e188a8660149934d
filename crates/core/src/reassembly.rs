//! Bit-at-a-time message reassembly with automatic resynchronization.
//!
//! The receiver gets one bit per event, at arbitrary intervals, with no
//! indication of where words start. The reassembler writes every bit into a
//! [`BitBuffer`] and, each time the write cursor reaches a 16-bit boundary,
//! checks the last two bytes as a `(payload, checksum)` word.
//!
//! # Resynchronization
//!
//! If the word fails its checksum the window is probably misaligned (a bit
//! was inserted or lost upstream) or corrupt. The reassembler then:
//! 1. steps the write cursor back by one bit
//! 2. shifts the 16-bit window left by one bit, dropping its oldest bit
//!
//! so the next incoming bit completes a candidate window that starts one bit
//! later. This repeats until a word verifies. Against a clean stream that is
//! off by `k` bits, at most `k` attempts are needed before the true boundary
//! is found, and earlier accepted words are never revisited.
//!
//! There is no retry ceiling: persistently corrupt input keeps the
//! reassembler sliding. [`ReassemblerConfig::max_align_attempts`] only adds a
//! one-time error log and a metric when a run gets that long.
//!
//! # Thread Safety
//!
//! Not thread-safe and not reentrant; one instance per receive session.
//! Dropping the instance ends the session.

use crate::assembly::{Assembly, Message};
use crate::bitio::BitBuffer;
use crate::error::DecodeIssue;
use crate::framing::{report_issue, Word, BITS_PER_WORD, BYTES_PER_WORD};
use crate::metrics::ReassemblyMetrics;
use crate::observer::{ChannelObserver, Observers, SubscriptionId};

/// Tuning for a [`Reassembler`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReassemblerConfig {
    /// Consecutive failed alignments after which a stall is reported.
    ///
    /// `None` never reports. Resynchronization continues either way.
    pub max_align_attempts: Option<u32>,
}

/// Streaming receiver for one message.
///
/// # Invariants
/// - `bit_index % 16 == 0` right after a word was accepted
/// - at most one position is pending (held by the [`Assembly`])
#[derive(Debug)]
pub struct Reassembler {
    config: ReassemblerConfig,

    /// Every bit received, realigned in place by window shifts
    buffer: BitBuffer,

    /// Next bit to write; counts bits kept in the buffer
    bit_index: usize,

    /// Failed windows since the last accepted word
    align_attempts: u32,

    /// Shared position/value interpretation state
    assembly: Assembly,

    observers: Observers,
    metrics: ReassemblyMetrics,
}

impl Reassembler {
    /// Create a reassembler with the default configuration.
    pub fn new() -> Self {
        Self::with_config(ReassemblerConfig::default())
    }

    pub fn with_config(config: ReassemblerConfig) -> Self {
        Self {
            config,
            buffer: BitBuffer::with_capacity(BYTES_PER_WORD),
            bit_index: 0,
            align_attempts: 0,
            assembly: Assembly::new(),
            observers: Observers::new(),
            metrics: ReassemblyMetrics::new(),
        }
    }

    /// Register an observer for bits, fields, message updates and diagnostics.
    pub fn subscribe<O>(&mut self, observer: O) -> SubscriptionId
    where
        O: ChannelObserver + 'static,
    {
        self.observers.subscribe(observer)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    /// Accept one bit from the channel.
    ///
    /// Never blocks and never fails. Observers are notified before this
    /// returns.
    pub fn feed_bit(&mut self, bit: bool) {
        self.buffer.set_bit(self.bit_index, bit);
        self.bit_index += 1;
        self.metrics.bits_received += 1;
        tracing::trace!(bit, index = self.bit_index, "bit received");
        self.observers.bit_observed(bit);

        if self.bit_index % BITS_PER_WORD != 0 {
            return;
        }

        // Window = the two bytes just completed
        let window_offset = self.bit_index / 8 - BYTES_PER_WORD;
        let word = Word::from_bytes([
            self.buffer.byte(window_offset).unwrap_or(0),
            self.buffer.byte(window_offset + 1).unwrap_or(0),
        ]);

        if !word.is_valid() {
            self.realign(window_offset, word);
            return;
        }

        self.accept(word);
    }

    /// Feed a sequence of bits in order.
    pub fn feed_bits<I>(&mut self, bits: I)
    where
        I: IntoIterator<Item = bool>,
    {
        for bit in bits {
            self.feed_bit(bit);
        }
    }

    /// Slide the candidate window by one bit after a failed word.
    fn realign(&mut self, window_offset: usize, word: Word) {
        self.align_attempts += 1;
        self.metrics.longest_resync = self.metrics.longest_resync.max(self.align_attempts);

        let issue = DecodeIssue::Misaligned {
            attempt: self.align_attempts,
            payload: word.payload,
            checksum: word.checksum,
        };
        self.metrics.record_issue(&issue);
        report_issue(&issue);
        self.observers.diagnostic(&issue);

        if self.config.max_align_attempts == Some(self.align_attempts) {
            self.metrics.alignment_stalls += 1;
            tracing::error!(
                attempts = self.align_attempts,
                "no word boundary found, still resynchronizing"
            );
        }

        self.bit_index -= 1;
        self.buffer.truncate_bits(self.bit_index);
        self.buffer.shift_window_left(window_offset, 1);
    }

    /// Interpret a verified word and publish the updated message.
    fn accept(&mut self, word: Word) {
        let step = self.assembly.accept(word, self.bit_index / 8);
        self.metrics.words_accepted += 1;

        if let Some(issue) = &step.issue {
            self.metrics.record_issue(issue);
            report_issue(issue);
            self.observers.diagnostic(issue);
        }
        if let Some(field) = &step.field {
            tracing::debug!(kind = ?field.kind, value = field.value, "resolved field");
            self.observers.field_resolved(field);
        }

        // Fresh slot for the next word
        self.buffer.grow(BYTES_PER_WORD);
        if self.align_attempts > 0 {
            tracing::debug!(attempts = self.align_attempts, "alignment found");
        }
        self.align_attempts = 0;

        let message = self.assembly.message().to_string();
        self.observers.message_updated(&message);
    }

    /// The message assembled so far.
    pub fn message(&self) -> &Message {
        self.assembly.message()
    }

    /// Failed windows since the last accepted word.
    pub fn align_attempts(&self) -> u32 {
        self.align_attempts
    }

    /// Bits currently kept in the buffer (received minus rolled back).
    pub fn bit_index(&self) -> usize {
        self.bit_index
    }

    /// Check if the cursor sits on a word boundary.
    pub fn is_aligned(&self) -> bool {
        self.align_attempts == 0 && self.bit_index % BITS_PER_WORD == 0
    }

    pub fn metrics(&self) -> &ReassemblyMetrics {
        &self.metrics
    }

    pub fn config(&self) -> &ReassemblerConfig {
        &self.config
    }

    /// End the session and keep the message.
    pub fn into_message(self) -> Message {
        self.assembly.into_message()
    }
}

impl Default for Reassembler {
    fn default() -> Self {
        Self::new()
    }
}
