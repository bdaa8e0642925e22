use anyhow::{Context, Result};
use rand::prelude::*;
use rand_chacha::ChaCha12Rng;
use rand_distr::{Uniform, weighted::WeightedIndex};

/// Seedable source of randomness owned by a generation model.
///
/// Every draw a model makes flows through its own stream. With a fixed seed
/// the sequence of draws is byte-identical across runs, so the generated
/// network is reproducible as long as the draw order is unchanged.
pub struct RandomStream {
    rng: ChaCha12Rng,
}

impl RandomStream {
    /// Create a stream from an explicit seed, or from OS entropy when `None`.
    pub fn new(seed: Option<u64>) -> Result<Self> {
        let rng = match seed {
            Some(seed) => ChaCha12Rng::seed_from_u64(seed),
            None => ChaCha12Rng::try_from_os_rng().context("failed to seed rng from the OS")?,
        };
        Ok(Self { rng })
    }

    /// Draw a float uniformly from `[lo, hi)`.
    ///
    /// A degenerate interval (`hi <= lo`) collapses to `lo` without consuming
    /// a draw.
    pub fn uniform(&mut self, lo: f64, hi: f64) -> Result<f64> {
        if hi <= lo {
            return Ok(lo);
        }
        let dist = Uniform::new(lo, hi).context("failed to construct uniform distribution")?;
        Ok(dist.sample(&mut self.rng))
    }

    /// Pick one element of `items` uniformly at random.
    pub fn choice<'a, T>(&mut self, items: &'a [T]) -> Result<&'a T> {
        items
            .choose(&mut self.rng)
            .context("cannot choose from an empty sequence")
    }

    /// Distribute `n` trials over `probs.len()` categories.
    ///
    /// Returns how many trials landed in each category; the counts sum to `n`.
    pub fn multinomial(&mut self, n: usize, probs: &[f64]) -> Result<Vec<usize>> {
        let dist =
            WeightedIndex::new(probs).context("failed to construct weighted distribution")?;
        let mut counts = vec![0; probs.len()];
        for _ in 0..n {
            counts[dist.sample(&mut self.rng)] += 1;
        }
        Ok(counts)
    }
}
