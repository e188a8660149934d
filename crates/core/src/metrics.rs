//! Counters describing what a receive session went through.
//!
//! The streaming reassembler keeps one [`ReassemblyMetrics`] per session and
//! updates it on every bit. Counts only; the session never looks at a clock.
//!
//! # Thread Safety
//!
//! Plain data. Clone it out of the reassembler to read it elsewhere.

use crate::error::DecodeIssue;

/// Per-session receive statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReassemblyMetrics {
    // === Input ===
    /// Bits handed to the reassembler
    pub bits_received: u64,

    // === Words ===
    /// Words that passed verification
    pub words_accepted: u64,

    /// Candidate windows that failed verification
    pub checksum_failures: u64,

    /// Failed position words accepted because they continued the sequence
    pub trusted_continuations: u64,

    /// Positions rejected as implausible for the input seen so far
    pub position_overflows: u64,

    /// Value words dropped for lack of a pending position
    pub unsolicited_values: u64,

    // === Alignment ===
    /// Longest run of consecutive failed windows
    pub longest_resync: u32,

    /// Times a resync run reached the configured ceiling
    pub alignment_stalls: u64,
}

impl ReassemblyMetrics {
    /// Create zeroed metrics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a decode issue under its category.
    pub fn record_issue(&mut self, issue: &DecodeIssue) {
        match issue {
            DecodeIssue::ChecksumMismatch { trusted, .. } => {
                self.checksum_failures += 1;
                if *trusted {
                    self.trusted_continuations += 1;
                }
            }
            DecodeIssue::Misaligned { .. } => self.checksum_failures += 1,
            DecodeIssue::PositionOverflow { .. } => self.position_overflows += 1,
            DecodeIssue::UnsolicitedValue { .. } => self.unsolicited_values += 1,
        }
    }

    /// Fraction of checked windows that failed.
    ///
    /// Returns 0.0 if nothing was checked yet.
    pub fn failure_rate(&self) -> f64 {
        let checked = self.words_accepted + self.checksum_failures;
        if checked == 0 {
            0.0
        } else {
            self.checksum_failures as f64 / checked as f64
        }
    }

    /// Print a human-readable summary to stdout.
    pub fn print_summary(&self) {
        println!("\n=== Reassembly Summary ===");
        println!("Bits received: {}", self.bits_received);
        println!("Words accepted: {}", self.words_accepted);
        println!(
            "Checksum failures: {} ({:.2}%)",
            self.checksum_failures,
            self.failure_rate() * 100.0
        );
        println!("Trusted continuations: {}", self.trusted_continuations);
        println!("Position overflows: {}", self.position_overflows);
        println!("Unsolicited values: {}", self.unsolicited_values);
        println!();
        println!("=== Alignment ===");
        println!("Longest resync run: {} bits", self.longest_resync);
        println!("Stalls: {}", self.alignment_stalls);
        println!();
    }

    /// Export metrics as key=value lines (for parsing/testing).
    pub fn export_text(&self) -> String {
        format!(
            "bits_received={}\n\
             words_accepted={}\n\
             checksum_failures={}\n\
             failure_rate={:.4}\n\
             trusted_continuations={}\n\
             position_overflows={}\n\
             unsolicited_values={}\n\
             longest_resync={}\n\
             alignment_stalls={}\n",
            self.bits_received,
            self.words_accepted,
            self.checksum_failures,
            self.failure_rate(),
            self.trusted_continuations,
            self.position_overflows,
            self.unsolicited_values,
            self.longest_resync,
            self.alignment_stalls,
        )
    }
}
