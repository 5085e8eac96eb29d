//! Daily usage draws and the wear processes that turn usage into degradation.

use std::fmt;

use contracts::{UsageDistribution, WearConfig, WearModel};
use rand::RngCore;

use crate::rng::{gamma, log_normal, uniform_range};

/// One usage draw (zero draws for a constant distribution). Never negative.
pub fn sample_usage(distribution: &UsageDistribution, rng: &mut dyn RngCore) -> f64 {
    let usage = match *distribution {
        UsageDistribution::Constant { value } => value,
        UsageDistribution::Uniform { low, high } => uniform_range(rng, low, high),
        UsageDistribution::LogNormal { mu, sigma } => log_normal(rng, mu, sigma),
    };
    usage.max(0.0)
}

/// Converts a day's usage into a non-negative wear increment.
pub trait WearProcess: fmt::Debug + Send + Sync {
    fn advance(&self, usage: f64, age: u64, rng: &mut dyn RngCore) -> f64;

    fn label(&self) -> &'static str;
}

/// `alpha * usage * (1 + accel_age * age)`.
fn mean_increment(alpha: f64, accel_age: f64, usage: f64, age: u64) -> f64 {
    alpha * usage * (1.0 + accel_age * age as f64)
}

/// Mean increment plus uniform noise on `[0, noise_max)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearWear {
    pub alpha: f64,
    pub accel_age: f64,
    pub noise_max: f64,
}

impl WearProcess for LinearWear {
    fn advance(&self, usage: f64, age: u64, rng: &mut dyn RngCore) -> f64 {
        let mean = mean_increment(self.alpha, self.accel_age, usage, age);
        let noise = if self.noise_max > 0.0 {
            uniform_range(rng, 0.0, self.noise_max)
        } else {
            0.0
        };
        (mean + noise).max(0.0)
    }

    fn label(&self) -> &'static str {
        "linear"
    }
}

/// Gamma increment with the given shape whose mean equals the computed mean.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GammaWear {
    pub alpha: f64,
    pub accel_age: f64,
    pub shape: f64,
}

impl WearProcess for GammaWear {
    fn advance(&self, usage: f64, age: u64, rng: &mut dyn RngCore) -> f64 {
        let mean = mean_increment(self.alpha, self.accel_age, usage, age);
        if mean <= 0.0 {
            return 0.0;
        }
        gamma(rng, self.shape, mean / self.shape).max(0.0)
    }

    fn label(&self) -> &'static str {
        "gamma"
    }
}

pub fn wear_process_from_config(config: &WearConfig) -> Box<dyn WearProcess> {
    match config.model {
        WearModel::Linear { noise_max } => Box::new(LinearWear {
            alpha: config.alpha,
            accel_age: config.accel_age,
            noise_max,
        }),
        WearModel::Gamma { shape } => Box::new(GammaWear {
            alpha: config.alpha,
            accel_age: config.accel_age,
            shape,
        }),
    }
}
