//! RNG module - seedable randomness for level generation
//!
//! The generator needs three things: picking which tile images a level uses,
//! sampling them without replacement, and shuffling the resulting tile
//! multiset. All three run on one deterministic LCG so a seed reproduces a
//! whole run (useful for replays and AI training).

/// Simple LCG (Linear Congruential Generator) RNG
/// Uses constants from Numerical Recipes
#[derive(Debug, Clone)]
pub struct SimpleRng {
    state: u32,
}

impl SimpleRng {
    /// Create a new RNG with the given seed
    pub fn new(seed: u32) -> Self {
        // Avoid 0 seed which would produce all zeros
        let state = if seed == 0 { 1 } else { seed };
        Self { state }
    }

    /// Generate next random u32
    pub fn next_u32(&mut self) -> u32 {
        // LCG formula: (a * state + c) mod m
        // Using Numerical Recipes constants: a=1664525, c=1013904223, m=2^32
        self.state = self.state.wrapping_mul(1664525).wrapping_add(1013904223);
        self.state
    }

    /// Generate random value in range [0, max). Returns 0 when `max` is 0.
    pub fn next_range(&mut self, max: u32) -> u32 {
        if max == 0 {
            return 0;
        }
        // High bits of an LCG are far better distributed than the low ones.
        ((self.next_u32() as u64 * max as u64) >> 32) as u32
    }

    /// Shuffle a slice using Fisher-Yates
    pub fn shuffle<T>(&mut self, slice: &mut [T]) {
        for i in (1..slice.len()).rev() {
            let j = self.next_range((i + 1) as u32) as usize;
            slice.swap(i, j);
        }
    }

    /// Sample `count` distinct indices from `0..pool_len`, in draw order.
    ///
    /// Partial Fisher-Yates over an index table; `count` is clamped to `pool_len`.
    pub fn sample_indices(&mut self, pool_len: usize, count: usize) -> Vec<usize> {
        let count = count.min(pool_len);
        let mut pool: Vec<usize> = (0..pool_len).collect();
        for i in 0..count {
            let j = i + self.next_range((pool_len - i) as u32) as usize;
            pool.swap(i, j);
        }
        pool.truncate(count);
        pool
    }

    /// Current internal state. Feeding it back into [`SimpleRng::new`]
    /// continues the same sequence.
    pub fn state(&self) -> u32 {
        self.state
    }
}

impl Default for SimpleRng {
    fn default() -> Self {
        Self::new(1)
    }
}
