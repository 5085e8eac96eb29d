//! Maintenance policies.
//!
//! The tick asks the policy twice at most: once without an inspection
//! reading (corrective and systematic work), then, only when nothing was
//! decided and an inspection is due, again with the detector's alarm.

use std::fmt;

use contracts::{
    AssetStatus, InspectionMode, PolicyConfig, PolicyKind, ReplaceTrigger, SystematicBasis,
};

use crate::asset::Asset;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    None,
    Repair,
    Replace(ReplaceTrigger),
}

pub trait MaintenancePolicy: fmt::Debug + Send + Sync {
    /// `alarm` is `None` before any inspection has been run this tick.
    fn decide(&self, asset: &Asset, day: u64, alarm: Option<bool>) -> Action;

    fn inspection_due(&self, asset: &Asset, day: u64) -> bool;

    /// Next per-unit inspection day armed from `day` (install or inspection).
    fn arm_inspection(&self, _day: u64) -> Option<u64> {
        None
    }

    fn label(&self) -> &'static str;
}

/// When inspections happen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InspectionPlan {
    Disabled,
    Calendar { interval: u64 },
    PerUnit { interval: u64 },
}

impl InspectionPlan {
    pub fn from_config(config: &PolicyConfig) -> Self {
        match (config.inspection_interval, config.inspection_mode) {
            (None, _) | (Some(0), _) => Self::Disabled,
            (Some(interval), InspectionMode::Calendar) => Self::Calendar { interval },
            (Some(interval), InspectionMode::PerUnit) => Self::PerUnit { interval },
        }
    }
}

/// Corrective replacement, then systematic replacement, then
/// inspection-driven repair or conditional replacement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrecedencePolicy {
    pub inspection: InspectionPlan,
    pub systematic_interval: Option<u64>,
    pub systematic_basis: SystematicBasis,
    /// Absolute wear above which an alarm replaces instead of repairing.
    pub replace_above: Option<f64>,
}

impl PrecedencePolicy {
    pub fn from_config(config: &PolicyConfig, reference_threshold: f64) -> Self {
        Self {
            inspection: InspectionPlan::from_config(config),
            systematic_interval: config.systematic_interval.filter(|interval| *interval > 0),
            systematic_basis: config.systematic_basis,
            replace_above: config
                .replace_cutoff
                .map(|fraction| fraction * reference_threshold),
        }
    }

    pub fn systematic_due(&self, asset: &Asset, day: u64) -> bool {
        let Some(interval) = self.systematic_interval else {
            return false;
        };
        match self.systematic_basis {
            SystematicBasis::SinceReplacement => {
                day.saturating_sub(asset.last_maintenance_day) >= interval
            }
            SystematicBasis::Calendar => day % interval == 0,
        }
    }
}

impl MaintenancePolicy for PrecedencePolicy {
    fn decide(&self, asset: &Asset, day: u64, alarm: Option<bool>) -> Action {
        if asset.status == AssetStatus::Failed {
            return Action::Replace(ReplaceTrigger::Corrective);
        }
        if self.systematic_due(asset, day) {
            return Action::Replace(ReplaceTrigger::Systematic);
        }
        match alarm {
            Some(true) => match self.replace_above {
                Some(limit) if asset.wear > limit => Action::Replace(ReplaceTrigger::Conditional),
                _ => Action::Repair,
            },
            Some(false) | None => Action::None,
        }
    }

    fn inspection_due(&self, asset: &Asset, day: u64) -> bool {
        match self.inspection {
            InspectionPlan::Disabled => false,
            InspectionPlan::Calendar { interval } => day % interval == 0,
            InspectionPlan::PerUnit { .. } => asset
                .next_inspection_day
                .map_or(false, |due| day >= due),
        }
    }

    fn arm_inspection(&self, day: u64) -> Option<u64> {
        match self.inspection {
            InspectionPlan::PerUnit { interval } => Some(day.saturating_add(interval)),
            InspectionPlan::Disabled | InspectionPlan::Calendar { .. } => None,
        }
    }

    fn label(&self) -> &'static str {
        "precedence"
    }
}

/// Baseline: replace on breakdown, never inspect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunToFailurePolicy;

impl MaintenancePolicy for RunToFailurePolicy {
    fn decide(&self, asset: &Asset, _day: u64, _alarm: Option<bool>) -> Action {
        if asset.status == AssetStatus::Failed {
            Action::Replace(ReplaceTrigger::Corrective)
        } else {
            Action::None
        }
    }

    fn inspection_due(&self, _asset: &Asset, _day: u64) -> bool {
        false
    }

    fn label(&self) -> &'static str {
        "run_to_failure"
    }
}

pub fn policy_from_config(
    config: &PolicyConfig,
    reference_threshold: f64,
) -> Box<dyn MaintenancePolicy> {
    match config.kind {
        PolicyKind::Precedence => {
            Box::new(PrecedencePolicy::from_config(config, reference_threshold))
        }
        PolicyKind::RunToFailure => Box::new(RunToFailurePolicy),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::AssetId;

    fn asset(wear: f64, status: AssetStatus, last_maintenance_day: u64) -> Asset {
        let mut asset = Asset::install(AssetId::first(0), 0, 1);
        asset.wear = wear;
        asset.status = status;
        asset.last_maintenance_day = last_maintenance_day;
        asset
    }

    fn policy() -> PrecedencePolicy {
        PrecedencePolicy::from_config(&PolicyConfig::default(), 20.0)
    }

    #[test]
    fn failed_units_are_replaced_correctively_first() {
        let failed = asset(25.0, AssetStatus::Failed, 0);
        assert_eq!(
            policy().decide(&failed, 100, Some(true)),
            Action::Replace(ReplaceTrigger::Corrective)
        );
    }

    #[test]
    fn systematic_wins_over_inspection() {
        let aged = asset(19.5, AssetStatus::Operational, 0);
        assert_eq!(
            policy().decide(&aged, 100, Some(true)),
            Action::Replace(ReplaceTrigger::Systematic)
        );
        assert_eq!(policy().decide(&aged, 99, None), Action::None);
    }

    #[test]
    fn alarm_repairs_below_cutoff_and_replaces_above() {
        let policy = policy();
        let moderate = asset(15.0, AssetStatus::Operational, 0);
        let severe = asset(18.5, AssetStatus::Operational, 0);
        assert_eq!(policy.decide(&moderate, 30, Some(true)), Action::Repair);
        assert_eq!(
            policy.decide(&severe, 30, Some(true)),
            Action::Replace(ReplaceTrigger::Conditional)
        );
        assert_eq!(policy.decide(&severe, 30, Some(false)), Action::None);
    }

    #[test]
    fn no_cutoff_always_repairs() {
        let mut config = PolicyConfig::default();
        config.replace_cutoff = None;
        let policy = PrecedencePolicy::from_config(&config, 20.0);
        let severe = asset(19.9, AssetStatus::Operational, 0);
        assert_eq!(policy.decide(&severe, 30, Some(true)), Action::Repair);
    }

    #[test]
    fn calendar_basis_ignores_install_day() {
        let mut config = PolicyConfig::default();
        config.systematic_interval = Some(10);
        config.systematic_basis = SystematicBasis::Calendar;
        let policy = PrecedencePolicy::from_config(&config, 20.0);
        let fresh = asset(0.0, AssetStatus::Operational, 19);
        assert!(policy.systematic_due(&fresh, 20));
        assert!(!policy.systematic_due(&fresh, 25));
    }

    #[test]
    fn inspection_schedules() {
        let calendar = policy();
        let unit = asset(0.0, AssetStatus::Operational, 0);
        assert!(calendar.inspection_due(&unit, 30));
        assert!(!calendar.inspection_due(&unit, 31));
        assert_eq!(calendar.arm_inspection(30), None);

        let mut config = PolicyConfig::default();
        config.inspection_mode = InspectionMode::PerUnit;
        let per_unit = PrecedencePolicy::from_config(&config, 20.0);
        let mut armed = unit.clone();
        armed.next_inspection_day = per_unit.arm_inspection(7);
        assert_eq!(armed.next_inspection_day, Some(22));
        assert!(!per_unit.inspection_due(&armed, 21));
        assert!(per_unit.inspection_due(&armed, 22));

        config.inspection_interval = None;
        let disabled = PrecedencePolicy::from_config(&config, 20.0);
        assert!(!disabled.inspection_due(&armed, 22));
    }

    #[test]
    fn run_to_failure_only_replaces_broken_units() {
        let policy = RunToFailurePolicy;
        let healthy = asset(19.0, AssetStatus::Operational, 0);
        let broken = asset(21.0, AssetStatus::Failed, 0);
        assert_eq!(policy.decide(&healthy, 100, Some(true)), Action::None);
        assert!(!policy.inspection_due(&healthy, 15));
        assert_eq!(
            policy.decide(&broken, 100, None),
            Action::Replace(ReplaceTrigger::Corrective)
        );
    }
}
