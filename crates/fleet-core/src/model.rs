use contracts::{CostConfig, DowntimeConfig, EventType, FleetConfig, UsageDistribution};

use crate::detector::Detector;
use crate::failure::{failure_model_from_config, FailureModel};
use crate::policy::{policy_from_config, MaintenancePolicy};
use crate::validate::{validate_config, ConfigError};
use crate::wear::{wear_process_from_config, WearProcess};

/// Everything an asset tick consults: the pluggable strategies plus the
/// prices and downtimes attached to each kind of work.
#[derive(Debug)]
pub struct MaintenanceModel {
    pub usage: UsageDistribution,
    pub wear: Box<dyn WearProcess>,
    pub failure: Box<dyn FailureModel>,
    pub detector: Detector,
    pub policy: Box<dyn MaintenancePolicy>,
    pub repair_quality: f64,
    pub costs: CostConfig,
    pub downtime: DowntimeConfig,
}

impl MaintenanceModel {
    pub fn from_config(config: &FleetConfig) -> Result<Self, ConfigError> {
        validate_config(config)?;
        let failure = failure_model_from_config(&config.failure);
        let policy = policy_from_config(&config.policy, failure.reference_threshold());
        Ok(Self {
            usage: config.usage,
            wear: wear_process_from_config(&config.wear),
            failure,
            detector: Detector::from_config(&config.detector),
            policy,
            repair_quality: config.policy.repair_quality,
            costs: config.costs,
            downtime: config.downtime,
        })
    }

    pub fn with_wear(mut self, wear: Box<dyn WearProcess>) -> Self {
        self.wear = wear;
        self
    }

    pub fn with_failure(mut self, failure: Box<dyn FailureModel>) -> Self {
        self.failure = failure;
        self
    }

    pub fn with_policy(mut self, policy: Box<dyn MaintenancePolicy>) -> Self {
        self.policy = policy;
        self
    }

    /// Price of one event. Failures carry the breakdown penalty plus the
    /// replacement unit; every inspection-driven event includes the visit.
    pub fn event_cost(&self, event_type: EventType) -> f64 {
        let costs = &self.costs;
        match event_type {
            EventType::Failure => costs.failure_cost + costs.replacement_cost,
            EventType::SystematicReplacement => costs.replacement_cost,
            EventType::InspectionAlarmRepair => costs.inspection_cost + costs.repair_cost,
            EventType::InspectionAlarmReplacement => {
                costs.inspection_cost + costs.replacement_cost
            }
            EventType::InspectionClear => costs.inspection_cost,
            EventType::Other => 0.0,
        }
    }

    pub fn downtime_for(&self, event_type: EventType) -> u64 {
        match event_type {
            EventType::InspectionAlarmRepair => self.downtime.repair_days,
            event_type if event_type.is_replacement() => self.downtime.replace_days,
            _ => 0,
        }
    }
}
