//! Error types for the bit channel.
//!
//! Two kinds of failure exist, and they are kept apart on purpose:
//! - [`Error`]: hard failures returned to the caller. Only encoding can fail
//!   this way, when a message does not fit the 7-bit position field.
//! - [`DecodeIssue`]: recoverable conditions seen while decoding or
//!   reassembling. They degrade the output (missing positions render as
//!   U+FFFD) and are reported to observers and the log, never returned as `Err`.

use thiserror::Error;

/// Top-level error type for fallible operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Message has more bytes than the position field can address
    #[error("message of {len} bytes exceeds the {max}-byte limit of the position field")]
    MessageTooLong { len: usize, max: usize },
}

/// Recoverable conditions observed on the receive side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeIssue {
    /// Word failed verification in the batch path.
    ///
    /// `trusted` is set when the word was a position word carrying the next
    /// sequential position and was accepted regardless.
    #[error("checksum {checksum:#04x} does not match payload {payload:#04x} (trusted: {trusted})")]
    ChecksumMismatch {
        payload: u8,
        checksum: u8,
        trusted: bool,
    },

    /// Word failed verification in the streaming path; the window slides by one bit.
    #[error("misaligned or corrupt word {payload:#04x}/{checksum:#04x}, resync attempt {attempt}")]
    Misaligned {
        attempt: u32,
        payload: u8,
        checksum: u8,
    },

    /// Position is implausible for the number of bytes seen; demoted to unknown
    #[error("position {position} is implausible for {limit_bytes} bytes of input")]
    PositionOverflow { position: u8, limit_bytes: usize },

    /// Value word arrived with no pending position and was dropped
    #[error("value {value:#04x} arrived without a pending position")]
    UnsolicitedValue { value: u8 },
}

/// Type alias for Result with our Error type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = Error::MessageTooLong { len: 200, max: 128 };
        assert_eq!(
            err.to_string(),
            "message of 200 bytes exceeds the 128-byte limit of the position field"
        );

        let issue = DecodeIssue::UnsolicitedValue { value: 0x41 };
        assert_eq!(issue.to_string(), "value 0x41 arrived without a pending position");
    }
}
