//! Deterministic draw sources and the per-target [`Roller`].
//!
//! A single hit performs several independent randomized sub-steps (miss
//! check, defense roll, critical roll). Each consumes "the next" draw from a
//! [`Roller`] in a fixed order, so the resulting envelope is reproducible
//! from the seed alone. Server and client streams are independent: the
//! envelope bounds what a client could have rolled, it does not replay it.

/// Source of deterministic 32-bit draws.
///
/// Implementations must be pure: the same seed always yields the same value.
pub trait RngOracle: Send + Sync {
    /// Generate a random u32 value from a seed.
    fn next_u32(&self, seed: u64) -> u32;
}

/// PCG random number generator (Permuted Congruential Generator).
///
/// Stateless PCG-XSH-RR: one LCG step over the seed followed by the
/// xorshift-high / random-rotate output permutation.
#[derive(Clone, Copy, Debug, Default)]
pub struct PcgRng;

impl PcgRng {
    const MULTIPLIER: u64 = 6364136223846793005;
    const INCREMENT: u64 = 1442695040888963407;

    #[inline]
    fn pcg_step(state: u64) -> u64 {
        state
            .wrapping_mul(Self::MULTIPLIER)
            .wrapping_add(Self::INCREMENT)
    }

    #[inline]
    fn pcg_output(state: u64) -> u32 {
        let xorshifted = (((state >> 18) ^ state) >> 27) as u32;
        let rot = (state >> 59) as u32;
        xorshifted.rotate_right(rot)
    }
}

impl RngOracle for PcgRng {
    fn next_u32(&self, seed: u64) -> u32 {
        Self::pcg_output(Self::pcg_step(seed))
    }
}

/// Mix an attack seed with the draw position and the roll owner.
///
/// * `attack_seed` - fresh per-attack entropy chosen by the caller
/// * `index` - position of the draw inside the roller
/// * `character_id` - attacking character
/// * `context` - distinguishes rollers of the same attack (target spawn id)
pub fn compute_seed(attack_seed: u64, index: u64, character_id: u32, context: u32) -> u64 {
    let mut hash = attack_seed;
    hash ^= index.wrapping_mul(0x9e3779b97f4a7c15);
    hash ^= (character_id as u64).wrapping_mul(0x517cc1b727220a95);
    hash ^= (context as u64).wrapping_mul(0x85ebca6b);

    // Final avalanche step
    hash ^= hash >> 33;
    hash = hash.wrapping_mul(0xff51afd7ed558ccd);
    hash ^= hash >> 33;

    hash
}

/// Fixed-length ordered draw sequence with a cyclic cursor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Roller {
    draws: Vec<u32>,
    cursor: usize,
}

impl Roller {
    /// Raw draws are reduced modulo this before scaling.
    pub const ROLL_RANGE: u32 = 10_000_000;

    /// Value returned by a roller that holds no draws.
    pub const NEUTRAL_ROLL: f64 = 0.5;

    /// Pre-draws `count` values from `source`, once.
    pub fn new(
        source: &(impl RngOracle + ?Sized),
        attack_seed: u64,
        character_id: u32,
        context: u32,
        count: usize,
    ) -> Self {
        let draws = (0..count)
            .map(|index| {
                source.next_u32(compute_seed(
                    attack_seed,
                    index as u64,
                    character_id,
                    context,
                ))
            })
            .collect();
        Self::from_draws(draws)
    }

    /// Builds a roller over explicit draws.
    pub fn from_draws(draws: Vec<u32>) -> Self {
        Self { draws, cursor: 0 }
    }

    /// Returns `(draw mod ROLL_RANGE) * modifier` and advances the cursor,
    /// wrapping after the last draw.
    pub fn roll(&mut self, modifier: f64) -> f64 {
        if self.draws.is_empty() {
            return Self::NEUTRAL_ROLL;
        }
        let draw = self.draws[self.cursor];
        self.cursor = (self.cursor + 1) % self.draws.len();
        f64::from(draw % Self::ROLL_RANGE) * modifier
    }

    pub fn len(&self) -> usize {
        self.draws.len()
    }

    pub fn is_empty(&self) -> bool {
        self.draws.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pcg_is_deterministic() {
        let rng = PcgRng;
        assert_eq!(rng.next_u32(42), rng.next_u32(42));
        assert_ne!(rng.next_u32(42), rng.next_u32(43));
    }

    #[test]
    fn roll_reduces_and_scales() {
        let mut roller = Roller::from_draws(vec![12_345_678, 5_000_000]);
        assert_eq!(roller.roll(1.0), 2_345_678.0);
        assert!((roller.roll(1e-7) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn roller_repeats_every_len_calls() {
        let mut roller = Roller::new(&PcgRng, 0xdead_beef, 7, 100_100, 7);
        let first: Vec<f64> = (0..roller.len()).map(|_| roller.roll(1.0)).collect();
        let second: Vec<f64> = (0..roller.len()).map(|_| roller.roll(1.0)).collect();
        let third: Vec<f64> = (0..3).map(|_| roller.roll(1.0)).collect();

        assert_eq!(first, second);
        assert_eq!(&first[..3], third.as_slice());
    }

    #[test]
    fn same_seed_same_sequence() {
        let mut a = Roller::new(&PcgRng, 99, 1, 2, 7);
        let mut b = Roller::new(&PcgRng, 99, 1, 2, 7);
        let mut c = Roller::new(&PcgRng, 99, 1, 3, 7);
        let seq_a: Vec<f64> = (0..7).map(|_| a.roll(1e-7)).collect();
        let seq_b: Vec<f64> = (0..7).map(|_| b.roll(1e-7)).collect();
        let seq_c: Vec<f64> = (0..7).map(|_| c.roll(1e-7)).collect();

        assert_eq!(seq_a, seq_b);
        assert_ne!(seq_a, seq_c);
        assert!(seq_a.iter().all(|value| (0.0..1.0).contains(value)));
    }

    #[test]
    fn empty_roller_is_neutral() {
        let mut roller = Roller::from_draws(Vec::new());
        assert!(roller.is_empty());
        assert_eq!(roller.roll(1e-7), Roller::NEUTRAL_ROLL);
    }
}
