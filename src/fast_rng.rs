// Random number streams for particle histories
//
// FastRng is the PCG-LCG generator used by OpenMC (random_lcg.cpp), with the
// same skip-ahead so that every history gets its own replayable stream.
// ScriptedRng replays fixed fractions and is meant for tests.

use rand::{RngCore, SeedableRng};

/// LCG multiplier (same as OpenMC)
const PRN_MULT: u64 = 6364136223846793005;
/// LCG additive constant (same as OpenMC)
const PRN_ADD: u64 = 1442695040888963407;
/// Draws reserved per history before streams overlap (same as OpenMC)
pub const HISTORY_STRIDE: u64 = 152917;

/// Top 53 bits of `word` as a fraction in [0, 1). Every result is exactly
/// representable, so `u64::MAX` maps below one.
#[inline(always)]
fn unit_fraction(word: u64) -> f64 {
    (word >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
}

/// Seed reached after advancing `seed` by `n` LCG steps, in O(log n).
fn skip_ahead(seed: u64, mut n: u64) -> u64 {
    let mut g = PRN_MULT;
    let mut c = PRN_ADD;
    let mut g_new: u64 = 1;
    let mut c_new: u64 = 0;
    while n > 0 {
        if n & 1 == 1 {
            g_new = g_new.wrapping_mul(g);
            c_new = c_new.wrapping_mul(g).wrapping_add(c);
        }
        c = g.wrapping_add(1).wrapping_mul(c);
        g = g.wrapping_mul(g);
        n >>= 1;
    }
    g_new.wrapping_mul(seed).wrapping_add(c_new)
}

/// Fast RNG using OpenMC's PCG-LCG algorithm.
///
/// The whole state is one `u64`, so a history's stream is cheap to create,
/// copy and replay.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FastRng {
    seed: u64,
}

impl FastRng {
    #[inline]
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Independent stream for history number `history` of a run.
    pub fn for_history(master_seed: u64, history: u64) -> Self {
        Self::new(skip_ahead(master_seed, history.wrapping_mul(HISTORY_STRIDE)))
    }

    /// Generate a random f64 in [0, 1)
    #[inline(always)]
    pub fn random(&mut self) -> f64 {
        unit_fraction(self.next_u64())
    }

    /// Skip the next `n` draws.
    pub fn advance(&mut self, n: u64) {
        self.seed = skip_ahead(self.seed, n);
    }

    #[inline]
    pub fn reseed(&mut self, seed: u64) {
        self.seed = seed;
    }
}

impl SeedableRng for FastRng {
    type Seed = [u8; 8];

    fn from_seed(seed: Self::Seed) -> Self {
        Self {
            seed: u64::from_le_bytes(seed),
        }
    }
}

impl RngCore for FastRng {
    #[inline(always)]
    fn next_u32(&mut self) -> u32 {
        self.next_u64() as u32
    }

    #[inline(always)]
    fn next_u64(&mut self) -> u64 {
        self.seed = PRN_MULT.wrapping_mul(self.seed).wrapping_add(PRN_ADD);

        // PCG output permutation (RXS-M-XS)
        let word = ((self.seed >> ((self.seed >> 59) + 5)) ^ self.seed)
            .wrapping_mul(12605985483714917081);
        (word >> 43) ^ word
    }

    #[inline]
    fn fill_bytes(&mut self, dest: &mut [u8]) {
        let mut chunks = dest.chunks_mut(8);
        for chunk in &mut chunks {
            let bytes = self.next_u64().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    #[inline]
    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

const FRACTION_BITS: u32 = 53;

/// A stream that replays a fixed list of fractions in `[0, 1)`, cycling
/// when it runs out.
///
/// `rng.gen::<f64>()` returns each scripted fraction exactly when it is a
/// multiple of 2^-53, which covers values like 0.5 or 0.375. Other values
/// are rounded down to the nearest such multiple. Values outside
/// `[0, 1)` are clamped into it.
#[derive(Clone, Debug)]
pub struct ScriptedRng {
    fractions: Vec<f64>,
    position: usize,
}

impl ScriptedRng {
    pub fn new(fractions: Vec<f64>) -> Self {
        ScriptedRng {
            fractions,
            position: 0,
        }
    }

    /// Number of fractions handed out so far.
    pub fn draws(&self) -> usize {
        self.position
    }

    fn next_fraction(&mut self) -> f64 {
        if self.fractions.is_empty() {
            return 0.0;
        }
        let value = self.fractions[self.position % self.fractions.len()];
        self.position += 1;
        value
    }
}

impl RngCore for ScriptedRng {
    fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    fn next_u64(&mut self) -> u64 {
        let max_mantissa = (1u64 << FRACTION_BITS) - 1;
        let scaled = (self.next_fraction().clamp(0.0, 1.0) * (1u64 << FRACTION_BITS) as f64) as u64;
        scaled.min(max_mantissa) << (64 - FRACTION_BITS)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(8) {
            let bytes = self.next_u64().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}
