//! bitchannel-core: self-synchronizing bit framing for noisy one-bit channels
//!
//! This library carries a short text message over a channel that moves one
//! bit at a time, where bit boundaries drift and bytes get corrupted:
//! - Every content byte travels as a frame of two checksummed words
//!   (position, then value)
//! - The receiver reassembles words bit by bit and slides its window one
//!   bit at a time until checksums line up again
//! - Corruption is detected, not corrected; unresolved positions show as
//!   U+FFFD in the decoded message
//!
//! # Architecture
//!
//! - `bits`: byte reversal and the word checksum
//! - `bitio`: bit-addressable growable buffer
//! - `framing`: frame encoding and batch decoding
//! - `assembly`: shared position/value interpretation state
//! - `reassembly`: streaming, bit-at-a-time receiver
//! - `broadcast`: bit-at-a-time sender
//! - `observer`: synchronous event subscriptions
//! - `channel`: seeded noisy-channel simulator
//! - `metrics`: per-session receive counters
//!
//! # Design Principles
//!
//! - **No panics**: only encoding can fail; everything on the receive side
//!   degrades the output instead
//! - **Event driven**: the receiver reacts to bit arrival only, never to time
//! - **Deterministic**: seeded randomness makes channel runs reproducible
//! - **Observable**: diagnostics go to `tracing` and to subscribers
//!
//! # Example
//! ```
//! use bitchannel_core::{Broadcaster, Reassembler};
//!
//! let sender = Broadcaster::new(b"hello world").unwrap();
//! let mut receiver = Reassembler::new();
//! for bit in sender {
//!     receiver.feed_bit(bit);
//! }
//! assert_eq!(receiver.message().to_string(), "hello world");
//! ```

pub mod assembly;
pub mod bitio;
pub mod bits;
pub mod broadcast;
pub mod channel;
pub mod error;
pub mod framing;
pub mod metrics;
pub mod observer;
pub mod reassembly;

// Re-export commonly used types
pub use assembly::Message;
pub use broadcast::Broadcaster;
pub use error::{DecodeIssue, Error, Result};
pub use framing::{decode, encode};
pub use reassembly::Reassembler;
