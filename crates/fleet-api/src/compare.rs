use contracts::{FleetConfig, RunSummary};
use fleet_core::{ConfigError, FleetSimulator, MaintenanceModel, RunToFailurePolicy};
use serde::{Deserialize, Serialize};

/// The configured policy and the run-to-failure baseline run over the
/// same seed and fleet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PolicyComparison {
    pub configured: RunSummary,
    pub run_to_failure: RunSummary,
}

impl PolicyComparison {
    /// Positive when the configured policy is cheaper than the baseline.
    pub fn savings(&self) -> f64 {
        self.run_to_failure.total_cost - self.configured.total_cost
    }

    pub fn failures_avoided(&self) -> i64 {
        self.run_to_failure.failures as i64 - self.configured.failures as i64
    }
}

pub fn compare_policies(config: &FleetConfig) -> Result<PolicyComparison, ConfigError> {
    let configured = FleetSimulator::new(config.clone())?.run().summary;

    let baseline_model =
        MaintenanceModel::from_config(config)?.with_policy(Box::new(RunToFailurePolicy));
    let run_to_failure = FleetSimulator::with_model(config.clone(), baseline_model)?
        .run()
        .summary;

    Ok(PolicyComparison {
        configured,
        run_to_failure,
    })
}
