//! Per-slot random streams and the handful of distributions the engine draws from.
//!
//! Every fleet slot owns a ChaCha8 stream keyed by `(seed, slot)`, so the
//! values a slot sees do not depend on how many other slots exist or on the
//! order in which worker threads tick them.

use std::f64::consts::PI;

use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

pub type SlotRng = ChaCha8Rng;

pub fn slot_stream(seed: u64, slot: u32) -> SlotRng {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(u64::from(slot));
    rng
}

/// Uniform on `[0, 1)`.
#[inline]
pub fn unit(rng: &mut dyn RngCore) -> f64 {
    rng.gen::<f64>()
}

/// Uniform on `[low, high)`. Collapses to `low` for an empty range.
pub fn uniform_range(rng: &mut dyn RngCore, low: f64, high: f64) -> f64 {
    if high <= low {
        return low;
    }
    low + (high - low) * unit(rng)
}

/// Standard normal via Box-Muller; consumes two uniforms.
pub fn standard_normal(rng: &mut dyn RngCore) -> f64 {
    let u1 = unit(rng).max(1e-300);
    let u2 = unit(rng);
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}

pub fn log_normal(rng: &mut dyn RngCore, mu: f64, sigma: f64) -> f64 {
    (mu + sigma * standard_normal(rng)).exp()
}

/// Gamma(shape, scale) using Marsaglia and Tsang's squeeze method.
///
/// Shapes below one are boosted through `Gamma(shape + 1) * U^(1 / shape)`.
pub fn gamma(rng: &mut dyn RngCore, shape: f64, scale: f64) -> f64 {
    if shape <= 0.0 || scale <= 0.0 {
        return 0.0;
    }
    if shape < 1.0 {
        let boost = unit(rng).max(1e-300).powf(1.0 / shape);
        return gamma(rng, shape + 1.0, scale) * boost;
    }

    let d = shape - 1.0 / 3.0;
    let c = 1.0 / (9.0 * d).sqrt();
    loop {
        let x = standard_normal(rng);
        let v = 1.0 + c * x;
        if v <= 0.0 {
            continue;
        }
        let v = v * v * v;
        let u = unit(rng).max(1e-300);
        let x2 = x * x;
        if u < 1.0 - 0.0331 * x2 * x2 {
            return d * v * scale;
        }
        if u.ln() < 0.5 * x2 + d * (1.0 - v + v.ln()) {
            return d * v * scale;
        }
    }
}
