//! Monte Carlo uncertainty model
//!
//! The deterministic point estimate is perturbed with normally distributed
//! relative noise. Each horizon gets its own RNG derived from the base seed,
//! so a seeded run does not depend on the order horizons are evaluated in.

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

use crate::error::{Error, Result};
use crate::models::{Percentiles, UncertaintyModel};
use crate::stats::{mean, percentile_sorted};

/// Mix a base seed with a horizon into an independent stream seed
pub fn derive_seed(base_seed: u64, horizon_months: u32) -> u64 {
    splitmix64(base_seed ^ ((horizon_months as u64) << 32))
}

fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// RNG for one horizon; entropy when no seed is configured
pub fn horizon_rng(seed: Option<u64>, horizon_months: u32) -> StdRng {
    match seed {
        Some(base) => StdRng::seed_from_u64(derive_seed(base, horizon_months)),
        None => StdRng::from_entropy(),
    }
}

/// Simulate `samples` outcomes around `point` with relative noise `volatility`
pub fn simulate(
    point: f64,
    volatility: f64,
    samples: usize,
    rng: &mut StdRng,
) -> Result<UncertaintyModel> {
    if samples == 0 {
        return Err(Error::Computation("Monte Carlo needs at least one sample".into()));
    }
    let noise = Normal::new(0.0, volatility)
        .map_err(|e| Error::Computation(format!("invalid volatility {}: {}", volatility, e)))?;

    let mut outcomes: Vec<f64> = (0..samples)
        .map(|_| point * (1.0 + noise.sample(rng)))
        .collect();
    outcomes.sort_by(|a, b| a.total_cmp(b));

    Ok(UncertaintyModel {
        percentiles: Percentiles {
            p5: percentile_sorted(&outcomes, 5.0),
            p25: percentile_sorted(&outcomes, 25.0),
            p50: percentile_sorted(&outcomes, 50.0),
            p75: percentile_sorted(&outcomes, 75.0),
            p95: percentile_sorted(&outcomes, 95.0),
        },
        mean: mean(&outcomes),
        volatility,
        samples,
    })
}
