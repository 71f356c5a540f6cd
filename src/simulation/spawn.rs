//! Weighted selection of vehicle appearance variants

use anyhow::{bail, Context, Result};
use rand::distr::weighted::WeightedIndex;
use rand::rngs::StdRng;
use rand::Rng;
use rand_distr::{Distribution, Exp};

use super::config::VariantWeight;
use super::types::VariantId;

/// Picks vehicle variants with a frequency proportional to their weight
///
/// An empty or otherwise unusable weight table is a configuration error and
/// fails construction; sampling itself never fails.
#[derive(Debug, Clone)]
pub struct SpawnModel {
    dist: WeightedIndex<f32>,
}

impl SpawnModel {
    pub fn new(variants: &[VariantWeight]) -> Result<Self> {
        if variants.is_empty() {
            bail!("spawn weight table is empty");
        }
        let dist = WeightedIndex::new(variants.iter().map(|v| v.weight))
            .context("invalid spawn weight table")?;
        Ok(Self { dist })
    }

    pub fn sample(&self, rng: &mut StdRng) -> VariantId {
        VariantId(self.dist.sample(rng))
    }
}

/// An exponentially distributed magnitude with random sign, used for both
/// speed jitter and crash-position jitter. A zero mean disables the jitter.
pub(crate) fn signed_jitter(mean: f32, rng: &mut StdRng) -> f32 {
    if mean <= 0.0 {
        return 0.0;
    }
    // Exp::new only fails for a non-positive rate, which the mean check rules out.
    let exp = match Exp::new(1.0 / mean) {
        Ok(exp) => exp,
        Err(_) => return 0.0,
    };
    let magnitude: f32 = exp.sample(rng);
    if rng.random_bool(0.5) {
        magnitude
    } else {
        -magnitude
    }
}
