// Deterministic, portable random source for note drills.
//
// Implements xoshiro256++ (Blackman & Vigna, 2019) with SplitMix64 seeding
// from a 32-bit drill seed. Every drill decision (next target, answer choice
// order, distractor selection) draws from a `DrillRng`, so a session started
// with a given seed replays the exact same prompt sequence.
//
// On top of the raw generator this crate provides the drill-level sampling
// helpers: bounded integers, single picks, copy-shuffles, and exclusion-based
// picks that relax the exclusion set instead of failing when it would empty
// the pool.
//
// **Critical constraint: determinism.** Every method must produce identical
// output given the same prior state, regardless of platform or optimization
// level. The core generator uses integer arithmetic only.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Contract violations on the sampling helpers: a zero bound, or picking
/// from an empty slice.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RngError {
    #[error("bound must be greater than 0, got {bound}")]
    InvalidArgument { bound: usize },
    #[error("cannot pick from an empty sequence")]
    EmptySequence,
}

/// Xoshiro256++ PRNG seeded from a 32-bit drill seed.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DrillRng {
    s: [u64; 4],
}

impl DrillRng {
    /// Create a new generator from a 32-bit seed.
    ///
    /// Uses SplitMix64 to expand the seed into the 256-bit internal state.
    /// Two `DrillRng` instances created with the same seed produce identical
    /// output sequences.
    pub fn new(seed: u32) -> Self {
        let mut sm = u64::from(seed);
        Self {
            s: [
                splitmix64(&mut sm),
                splitmix64(&mut sm),
                splitmix64(&mut sm),
                splitmix64(&mut sm),
            ],
        }
    }

    /// Create a generator seeded from the wall clock. Used when the caller
    /// did not pin a seed.
    pub fn from_clock() -> Self {
        Self::new(clock_seed())
    }

    /// Generate the next `u64` in the sequence.
    pub fn next_u64(&mut self) -> u64 {
        let result = (self.s[0].wrapping_add(self.s[3]))
            .rotate_left(23)
            .wrapping_add(self.s[0]);

        let t = self.s[1] << 17;

        self.s[2] ^= self.s[0];
        self.s[3] ^= self.s[1];
        self.s[1] ^= self.s[2];
        self.s[0] ^= self.s[3];

        self.s[2] ^= t;
        self.s[3] = self.s[3].rotate_left(45);

        result
    }

    /// Generate a uniform `f64` in [0, 1) from the upper 53 bits.
    pub fn next_float(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Generate a uniform integer in `[0, bound)`.
    ///
    /// Uses rejection sampling to avoid modulo bias. Fails with
    /// `InvalidArgument` when `bound` is zero.
    pub fn next_int(&mut self, bound: usize) -> Result<usize, RngError> {
        if bound == 0 {
            return Err(RngError::InvalidArgument { bound });
        }
        let range = bound as u64;
        if range.is_power_of_two() {
            return Ok((self.next_u64() & (range - 1)) as usize);
        }
        let threshold = range.wrapping_neg() % range; // = (2^64 - range) % range
        loop {
            let r = self.next_u64();
            if r >= threshold {
                return Ok((r % range) as usize);
            }
        }
    }

    /// Pick one element uniformly. Fails with `EmptySequence` on an empty slice.
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Result<&'a T, RngError> {
        if items.is_empty() {
            return Err(RngError::EmptySequence);
        }
        let index = self.next_int(items.len())?;
        Ok(&items[index])
    }

    /// Return a shuffled copy of `items` (Fisher–Yates). The input is left
    /// untouched.
    pub fn shuffle<T: Clone>(&mut self, items: &[T]) -> Vec<T> {
        let mut out = items.to_vec();
        for i in (1..out.len()).rev() {
            // i + 1 is never zero here.
            let j = self.next_int(i + 1).unwrap_or(i);
            out.swap(i, j);
        }
        out
    }

    /// Pick an element that is not equal (per `is_equal`) to anything in
    /// `excluded`. If the exclusion set covers the whole pool, the pick falls
    /// back to the unfiltered pool, so this only fails when `items` itself is
    /// empty.
    pub fn pick_excluding<'a, T, F>(
        &mut self,
        items: &'a [T],
        excluded: &[T],
        is_equal: F,
    ) -> Result<&'a T, RngError>
    where
        F: Fn(&T, &T) -> bool,
    {
        let filtered: Vec<&'a T> = items
            .iter()
            .filter(|candidate| !excluded.iter().any(|ex| is_equal(ex, candidate)))
            .collect();
        if filtered.is_empty() {
            return self.pick(items);
        }
        let index = self.next_int(filtered.len())?;
        Ok(filtered[index])
    }
}

/// Seed derived from the current time in milliseconds, truncated to 32 bits.
pub fn clock_seed() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u32)
        .unwrap_or(0)
}

/// SplitMix64, used only to expand the seed into xoshiro state.
fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}
