use std::fmt;

use contracts::{FailureConfig, FailureModelConfig};
use rand::RngCore;

use crate::rng::unit;

/// Decides whether an operational unit breaks at its current wear.
pub trait FailureModel: fmt::Debug + Send + Sync {
    fn breaks(&self, wear: f64, rng: &mut dyn RngCore) -> bool;

    /// Wear the replace-versus-repair cutoff is measured against.
    fn reference_threshold(&self) -> f64;

    fn label(&self) -> &'static str;
}

/// Deterministic break at `wear >= threshold`. Consumes no draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdFailure {
    pub threshold: f64,
}

impl FailureModel for ThresholdFailure {
    fn breaks(&self, wear: f64, _rng: &mut dyn RngCore) -> bool {
        wear >= self.threshold
    }

    fn reference_threshold(&self) -> f64 {
        self.threshold
    }

    fn label(&self) -> &'static str {
        "threshold"
    }
}

/// Wear-dependent daily hazard. Consumes exactly one draw per call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HazardFailure {
    pub k: f64,
    pub c: f64,
    pub max_exponent: f64,
    pub reference_threshold: f64,
}

impl HazardFailure {
    pub fn probability(&self, wear: f64) -> f64 {
        hazard_probability(wear, self.k, self.c, self.max_exponent)
    }
}

impl FailureModel for HazardFailure {
    fn breaks(&self, wear: f64, rng: &mut dyn RngCore) -> bool {
        let probability = self.probability(wear);
        unit(rng) < probability
    }

    fn reference_threshold(&self) -> f64 {
        self.reference_threshold
    }

    fn label(&self) -> &'static str {
        "hazard"
    }
}

/// Largest exponent whose `exp` is still a finite `f64`.
pub const MAX_FINITE_EXPONENT: f64 = 709.782_712_893_384;

/// `1 - exp(-k * exp(c * wear))`, saturating to 1 once `c * wear` passes
/// `max_exponent` or the largest finite exponent, whichever is lower.
/// A zero scale `k` never fails.
pub fn hazard_probability(wear: f64, k: f64, c: f64, max_exponent: f64) -> f64 {
    if k == 0.0 {
        return 0.0;
    }
    let exponent = c * wear;
    if !exponent.is_finite() || exponent > max_exponent.min(MAX_FINITE_EXPONENT) {
        return 1.0;
    }
    (1.0 - (-k * exponent.exp()).exp()).clamp(0.0, 1.0)
}

pub fn failure_model_from_config(config: &FailureConfig) -> Box<dyn FailureModel> {
    match config.model {
        FailureModelConfig::Threshold => Box::new(ThresholdFailure {
            threshold: config.failure_threshold,
        }),
        FailureModelConfig::Hazard { k, c, max_exponent } => Box::new(HazardFailure {
            k,
            c,
            max_exponent,
            reference_threshold: config.failure_threshold,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::slot_stream;

    #[test]
    fn threshold_is_inclusive() {
        let model = ThresholdFailure { threshold: 2.0 };
        let mut rng = slot_stream(0, 0);
        assert!(!model.breaks(1.999, &mut rng));
        assert!(model.breaks(2.0, &mut rng));
    }

    #[test]
    fn hazard_grows_with_wear() {
        let low = hazard_probability(0.0, 0.001, 2.5, 100.0);
        let mid = hazard_probability(1.0, 0.001, 2.5, 100.0);
        let high = hazard_probability(3.0, 0.001, 2.5, 100.0);
        assert!(low > 0.0);
        assert!(low < mid && mid < high);
        assert!(high < 1.0);
    }

    #[test]
    fn hazard_saturates_past_the_exponent_bound() {
        assert_eq!(hazard_probability(41.0, 0.001, 2.5, 100.0), 1.0);
        assert_eq!(hazard_probability(1e308, 0.001, 2.5, 100.0), 1.0);
        assert_eq!(hazard_probability(f64::INFINITY, 0.001, 2.5, 100.0), 1.0);
        let model = HazardFailure {
            k: 0.001,
            c: 2.5,
            max_exponent: 100.0,
            reference_threshold: 20.0,
        };
        let mut rng = slot_stream(1, 0);
        assert!(model.breaks(50.0, &mut rng));
    }

    #[test]
    fn zero_scale_never_breaks() {
        let model = HazardFailure {
            k: 0.0,
            c: 2.5,
            max_exponent: 100.0,
            reference_threshold: 20.0,
        };
        let mut rng = slot_stream(2, 0);
        assert!((0..1_000).all(|_| !model.breaks(5.0, &mut rng)));
    }

    #[test]
    fn loose_exponent_bound_still_cannot_overflow() {
        assert_eq!(hazard_probability(300.0, 0.0, 2.5, 1000.0), 0.0);
        assert_eq!(hazard_probability(300.0, 0.001, 2.5, 1000.0), 1.0);
        assert_eq!(hazard_probability(283.0, 1e-300, 2.5, 1000.0), 1.0);
        let probability = hazard_probability(200.0, 1e-300, 2.5, 1000.0);
        assert!(probability.is_finite() && (0.0..=1.0).contains(&probability));

        let model = HazardFailure {
            k: 0.0,
            c: 2.5,
            max_exponent: 1000.0,
            reference_threshold: 20.0,
        };
        let mut rng = slot_stream(3, 0);
        assert!((0..100).all(|_| !model.breaks(300.0, &mut rng)));
    }

    #[test]
    fn builder_keeps_the_reference_threshold() {
        let config = FailureConfig {
            failure_threshold: 4.0,
            model: FailureModelConfig::default_hazard(),
        };
        let model = failure_model_from_config(&config);
        assert_eq!(model.label(), "hazard");
        assert_eq!(model.reference_threshold(), 4.0);
    }
}
