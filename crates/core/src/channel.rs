//! Noisy one-bit channel simulator.
//!
//! Models what a crude side channel does to a bit stream, deterministically
//! from a seed, so corruption scenarios can be replayed exactly.
//!
//! # Simulated Effects
//!
//! Applied per bit, in this order:
//! - **Insertion**: a spurious random bit slips in before the real one
//!   (probability `insert_rate`)
//! - **Drop**: the real bit is lost (probability `drop_rate`)
//! - **Flip**: the real bit is inverted (probability `flip_rate`)
//!
//! Insertions and drops shift word boundaries and exercise resynchronization;
//! flips corrupt words in place.
//!
//! # Determinism
//!
//! All randomness comes from a seeded ChaCha8 RNG. Given the same seed
//! and inputs, outputs are bit-identical.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Configuration for channel simulation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelConfig {
    /// Probability a bit is inverted [0.0, 1.0]
    pub flip_rate: f64,

    /// Probability a spurious bit is inserted before a bit [0.0, 1.0]
    pub insert_rate: f64,

    /// Probability a bit is lost [0.0, 1.0]
    pub drop_rate: f64,

    /// Random seed for determinism
    pub seed: u64,
}

impl ChannelConfig {
    /// A channel that delivers every bit untouched.
    pub fn perfect(seed: u64) -> Self {
        Self {
            flip_rate: 0.0,
            insert_rate: 0.0,
            drop_rate: 0.0,
            seed,
        }
    }

    /// Moderate impairments, roughly what a busy host produces.
    pub fn default_with_seed(seed: u64) -> Self {
        Self {
            flip_rate: 0.002,
            insert_rate: 0.001,
            drop_rate: 0.001,
            seed,
        }
    }
}

/// Counters kept by a [`NoisyChannel`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelStats {
    pub bits_sent: u64,
    pub bits_dropped: u64,
    pub bits_flipped: u64,
    pub bits_inserted: u64,
    pub bits_delivered: u64,
}

/// Seeded bit channel with flips, insertions and drops.
///
/// # Thread Safety
/// Not thread-safe; use one instance per thread or synchronize externally.
#[derive(Debug, Clone)]
pub struct NoisyChannel {
    config: ChannelConfig,
    rng: ChaCha8Rng,
    stats: ChannelStats,
}

impl NoisyChannel {
    /// Create a new channel with the given configuration.
    pub fn new(config: ChannelConfig) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            config,
            stats: ChannelStats::default(),
        }
    }

    /// Send one bit; returns the zero, one or two bits that come out.
    pub fn send(&mut self, bit: bool) -> Vec<bool> {
        let mut out = Vec::with_capacity(2);
        self.send_into(bit, &mut out);
        out
    }

    /// Send a whole bit sequence and collect what arrives.
    pub fn transmit<I>(&mut self, bits: I) -> Vec<bool>
    where
        I: IntoIterator<Item = bool>,
    {
        let mut out = Vec::new();
        for bit in bits {
            self.send_into(bit, &mut out);
        }
        out
    }

    fn send_into(&mut self, bit: bool, out: &mut Vec<bool>) {
        self.stats.bits_sent += 1;

        if self.roll(self.config.insert_rate) {
            let spurious: bool = self.rng.gen();
            self.stats.bits_inserted += 1;
            self.stats.bits_delivered += 1;
            out.push(spurious);
        }

        if self.roll(self.config.drop_rate) {
            self.stats.bits_dropped += 1;
            return;
        }

        let flipped = self.roll(self.config.flip_rate);
        if flipped {
            self.stats.bits_flipped += 1;
        }
        self.stats.bits_delivered += 1;
        out.push(bit ^ flipped);
    }

    /// Bernoulli trial; never touches the RNG for a zero rate.
    fn roll(&mut self, rate: f64) -> bool {
        rate > 0.0 && self.rng.gen::<f64>() < rate
    }

    pub fn stats(&self) -> ChannelStats {
        self.stats
    }

    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }
}
