use contracts::{FailureModelConfig, FleetConfig, UsageDistribution, WearModel};
use thiserror::Error;

use crate::failure::MAX_FINITE_EXPONENT;

/// Rejected configuration. Each variant names the offending field using the
/// dotted path of the JSON document.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{field} must lie in [0, 1], got {value}")]
    OutOfUnitRange { field: &'static str, value: f64 },

    #[error("{field} must be non-negative, got {value}")]
    Negative { field: &'static str, value: f64 },

    #[error("{field} must be a finite number, got {value}")]
    NotFinite { field: &'static str, value: f64 },

    #[error("{field} must be greater than zero")]
    NotPositive { field: &'static str },

    #[error("{field}: {reason}")]
    Inconsistent { field: &'static str, reason: String },
}

impl ConfigError {
    pub fn field(&self) -> &'static str {
        match self {
            Self::OutOfUnitRange { field, .. }
            | Self::Negative { field, .. }
            | Self::NotFinite { field, .. }
            | Self::NotPositive { field }
            | Self::Inconsistent { field, .. } => field,
        }
    }
}

pub fn validate_config(config: &FleetConfig) -> Result<(), ConfigError> {
    if config.n_assets == 0 {
        return Err(ConfigError::NotPositive { field: "n_assets" });
    }
    if config.n_days == 0 {
        return Err(ConfigError::NotPositive { field: "n_days" });
    }

    match config.usage {
        UsageDistribution::Constant { value } => non_negative("usage.value", value)?,
        UsageDistribution::Uniform { low, high } => {
            non_negative("usage.low", low)?;
            non_negative("usage.high", high)?;
            if high < low {
                return Err(ConfigError::Inconsistent {
                    field: "usage.high",
                    reason: format!("upper bound {high} is below lower bound {low}"),
                });
            }
        }
        UsageDistribution::LogNormal { mu, sigma } => {
            finite("usage.mu", mu)?;
            non_negative("usage.sigma", sigma)?;
        }
    }

    non_negative("wear.alpha", config.wear.alpha)?;
    non_negative("wear.accel_age", config.wear.accel_age)?;
    match config.wear.model {
        WearModel::Linear { noise_max } => non_negative("wear.model.noise_max", noise_max)?,
        WearModel::Gamma { shape } => {
            finite("wear.model.shape", shape)?;
            if shape <= 0.0 {
                return Err(ConfigError::NotPositive {
                    field: "wear.model.shape",
                });
            }
        }
    }

    non_negative("failure.failure_threshold", config.failure.failure_threshold)?;
    if let FailureModelConfig::Hazard { k, c, max_exponent } = config.failure.model {
        non_negative("failure.model.k", k)?;
        non_negative("failure.model.c", c)?;
        non_negative("failure.model.max_exponent", max_exponent)?;
        if max_exponent > MAX_FINITE_EXPONENT {
            return Err(ConfigError::Inconsistent {
                field: "failure.model.max_exponent",
                reason: format!(
                    "{max_exponent} exceeds the largest finite exponent {MAX_FINITE_EXPONENT}"
                ),
            });
        }
    }

    non_negative("detector.alert_threshold", config.detector.alert_threshold)?;
    unit_range("detector.sensitivity", config.detector.sensitivity)?;
    unit_range("detector.specificity", config.detector.specificity)?;
    non_negative("detector.score_noise", config.detector.score_noise)?;
    if let Some(floor) = config.detector.score_min {
        finite("detector.score_min", floor)?;
    }

    if config.policy.inspection_interval == Some(0) {
        return Err(ConfigError::NotPositive {
            field: "policy.inspection_interval",
        });
    }
    if config.policy.systematic_interval == Some(0) {
        return Err(ConfigError::NotPositive {
            field: "policy.systematic_interval",
        });
    }
    unit_range("policy.repair_quality", config.policy.repair_quality)?;
    if let Some(cutoff) = config.policy.replace_cutoff {
        non_negative("policy.replace_cutoff", cutoff)?;
    }

    non_negative("costs.repair_cost", config.costs.repair_cost)?;
    non_negative("costs.replacement_cost", config.costs.replacement_cost)?;
    non_negative("costs.failure_cost", config.costs.failure_cost)?;
    non_negative("costs.inspection_cost", config.costs.inspection_cost)?;

    Ok(())
}

fn finite(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NotFinite { field, value })
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    finite(field, value)?;
    if value < 0.0 {
        return Err(ConfigError::Negative { field, value });
    }
    Ok(())
}

fn unit_range(field: &'static str, value: f64) -> Result<(), ConfigError> {
    finite(field, value)?;
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::OutOfUnitRange { field, value });
    }
    Ok(())
}
