use contracts::{DetectionOutcome, DetectorConfig};
use rand::RngCore;

use crate::rng::{standard_normal, unit};

/// Noisy condition monitor. A unit is anomalous once its true wear reaches
/// `alert_threshold`; the reported alarm then follows the configured
/// sensitivity or false-alarm rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detector {
    pub alert_threshold: f64,
    pub sensitivity: f64,
    pub specificity: f64,
    pub score_noise: f64,
    pub score_min: Option<f64>,
}

/// One inspection: the confusion-matrix cell and the score written down.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub outcome: DetectionOutcome,
    pub measurement: f64,
}

impl Detector {
    pub fn from_config(config: &DetectorConfig) -> Self {
        Self {
            alert_threshold: config.alert_threshold,
            sensitivity: config.sensitivity,
            specificity: config.specificity,
            score_noise: config.score_noise,
            score_min: config.score_min,
        }
    }

    pub fn is_anomalous(&self, true_wear: f64) -> bool {
        true_wear >= self.alert_threshold
    }

    /// Recorded score: true wear plus Gaussian noise, floored at `score_min`.
    /// Draws only when `score_noise > 0`.
    pub fn measure(&self, true_wear: f64, rng: &mut dyn RngCore) -> f64 {
        let score = if self.score_noise > 0.0 {
            true_wear + self.score_noise * standard_normal(rng)
        } else {
            true_wear
        };
        match self.score_min {
            Some(floor) => score.max(floor),
            None => score,
        }
    }

    /// Measurement first, then the alarm draw.
    pub fn read(&self, true_wear: f64, rng: &mut dyn RngCore) -> Reading {
        let measurement = self.measure(true_wear, rng);
        Reading {
            outcome: self.inspect(true_wear, rng),
            measurement,
        }
    }

    /// Consumes exactly one draw.
    pub fn inspect(&self, true_wear: f64, rng: &mut dyn RngCore) -> DetectionOutcome {
        let anomalous = self.is_anomalous(true_wear);
        let draw = unit(rng);
        let alarm = if anomalous {
            draw < self.sensitivity
        } else {
            draw < 1.0 - self.specificity
        };
        DetectionOutcome::classify(anomalous, alarm)
    }
}
