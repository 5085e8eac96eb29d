//! One fleet slot and the physical unit currently installed in it.

use contracts::{
    AssetId, AssetSnapshot, AssetStatus, DetectionOutcome, EventType, ReplaceTrigger,
};

use crate::model::MaintenanceModel;
use crate::policy::Action;
use crate::rng::{slot_stream, SlotRng};
use crate::wear::sample_usage;

/// Mutable state of one slot. The random stream belongs to the slot and
/// survives replacements, so a slot's draws never depend on its neighbours.
#[derive(Debug, Clone)]
pub struct Asset {
    pub id: AssetId,
    pub wear: f64,
    pub status: AssetStatus,
    /// Days since install, refreshed every tick the unit is in service.
    pub age: u64,
    pub installed_day: u64,
    /// Day of the last replacement; systematic work is timed from here.
    pub last_maintenance_day: u64,
    /// Ticks strictly before this day are skipped.
    pub busy_until: Option<u64>,
    pub next_inspection_day: Option<u64>,
    /// Usage drawn for the installed unit since it entered the slot.
    pub cumulative_usage: f64,
    rng: SlotRng,
}

/// What one asset did on one day, before the fleet assigns a log sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct MaintenanceRecord {
    pub asset_id: AssetId,
    pub event_type: EventType,
    pub wear_at_event: f64,
    pub cost: f64,
    pub detection: Option<DetectionOutcome>,
    pub measurement: Option<f64>,
    /// Set for replacements: the unit that took the slot and why.
    pub replacement: Option<(AssetId, ReplaceTrigger)>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Out of service for repair or replacement; nothing was drawn.
    Busy,
    /// Aged without any maintenance event.
    Quiet,
    Acted(MaintenanceRecord),
}

impl Asset {
    pub fn install(id: AssetId, day: u64, seed: u64) -> Self {
        Self {
            id,
            wear: 0.0,
            status: AssetStatus::Operational,
            age: 0,
            installed_day: day,
            last_maintenance_day: day,
            busy_until: None,
            next_inspection_day: None,
            cumulative_usage: 0.0,
            rng: slot_stream(seed, id.slot),
        }
    }

    pub fn slot(&self) -> u32 {
        self.id.slot
    }

    /// Advances the unit by one day.
    ///
    /// Draw order within a tick is fixed: usage, wear noise, failure,
    /// then the score noise and alarm draw when an inspection runs.
    pub fn tick(&mut self, day: u64, model: &MaintenanceModel) -> TickOutcome {
        if let Some(until) = self.busy_until {
            if day < until {
                return TickOutcome::Busy;
            }
            self.busy_until = None;
        }

        self.age = day.saturating_sub(self.installed_day);
        if self.status == AssetStatus::Operational {
            let usage = sample_usage(&model.usage, &mut self.rng);
            self.cumulative_usage += usage;
            let increment = model.wear.advance(usage, self.age, &mut self.rng);
            self.wear += increment.max(0.0);
            if model.failure.breaks(self.wear, &mut self.rng) {
                self.status = AssetStatus::Failed;
            }
        }

        let mut action = model.policy.decide(self, day, None);
        let mut reading = None;
        if action == Action::None && model.policy.inspection_due(self, day) {
            let taken = model.detector.read(self.wear, &mut self.rng);
            reading = Some(taken);
            self.next_inspection_day = model.policy.arm_inspection(day);
            action = model.policy.decide(self, day, Some(taken.outcome.alarm()));
        }

        let event_type = match action {
            Action::None if reading.is_some() => EventType::InspectionClear,
            Action::None => return TickOutcome::Quiet,
            Action::Repair => EventType::InspectionAlarmRepair,
            Action::Replace(ReplaceTrigger::Corrective) => EventType::Failure,
            Action::Replace(ReplaceTrigger::Systematic) => EventType::SystematicReplacement,
            Action::Replace(ReplaceTrigger::Conditional) => EventType::InspectionAlarmReplacement,
        };

        let mut record = MaintenanceRecord {
            asset_id: self.id,
            event_type,
            wear_at_event: self.wear,
            cost: model.event_cost(event_type),
            detection: reading.map(|taken| taken.outcome),
            measurement: reading.map(|taken| taken.measurement),
            replacement: None,
        };
        match action {
            Action::Repair => self.repair(model.repair_quality),
            Action::Replace(trigger) => {
                let installed = self.replace(day, model);
                record.replacement = Some((installed, trigger));
            }
            Action::None => {}
        }

        let downtime = model.downtime_for(event_type);
        if downtime > 0 {
            self.busy_until = Some(day.saturating_add(downtime));
        }
        TickOutcome::Acted(record)
    }

    /// Imperfect repair: keeps identity and removes a `quality` share of wear.
    pub fn repair(&mut self, quality: f64) {
        self.wear *= 1.0 - quality;
        self.status = AssetStatus::Operational;
    }

    /// Installs a fresh unit in this slot and returns its identity.
    pub fn replace(&mut self, day: u64, model: &MaintenanceModel) -> AssetId {
        self.id = self.id.successor();
        self.wear = 0.0;
        self.status = AssetStatus::Operational;
        self.age = 0;
        self.installed_day = day;
        self.last_maintenance_day = day;
        self.next_inspection_day = model.policy.arm_inspection(day);
        self.cumulative_usage = 0.0;
        self.id
    }

    pub fn snapshot(&self) -> AssetSnapshot {
        AssetSnapshot {
            slot: self.slot(),
            asset_id: self.id,
            wear: self.wear,
            status: self.status,
            age: self.age,
            installed_day: self.installed_day,
            last_maintenance_day: self.last_maintenance_day,
            busy_until: self.busy_until,
            next_inspection_day: self.next_inspection_day,
            cumulative_usage: self.cumulative_usage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{FleetConfig, UsageDistribution, WearModel};

    fn deterministic_config() -> FleetConfig {
        let mut config = FleetConfig::default();
        config.usage = UsageDistribution::Constant { value: 1.0 };
        config.wear.alpha = 0.5;
        config.wear.model = WearModel::Linear { noise_max: 0.0 };
        config.failure.failure_threshold = 2.0;
        config.policy.inspection_interval = None;
        config.policy.systematic_interval = None;
        config
    }

    fn run_until_event(
        asset: &mut Asset,
        model: &MaintenanceModel,
        days: u64,
    ) -> Vec<(u64, MaintenanceRecord)> {
        (1..=days)
            .filter_map(|day| match asset.tick(day, model) {
                TickOutcome::Acted(record) => Some((day, record)),
                TickOutcome::Busy | TickOutcome::Quiet => None,
            })
            .collect()
    }

    #[test]
    fn threshold_breakdown_replaces_on_the_crossing_day() {
        let model = MaintenanceModel::from_config(&deterministic_config()).expect("valid");
        let mut asset = Asset::install(AssetId::first(0), 0, 7);
        let events = run_until_event(&mut asset, &model, 4);
        assert_eq!(events.len(), 1);
        let (day, record) = &events[0];
        assert_eq!(*day, 4);
        assert_eq!(record.event_type, EventType::Failure);
        assert_eq!(record.wear_at_event, 2.0);
        assert_eq!(record.cost, 6500.0);
        assert_eq!(
            record.replacement,
            Some((AssetId::first(0).successor(), ReplaceTrigger::Corrective))
        );
        assert_eq!(asset.wear, 0.0);
        assert_eq!(asset.installed_day, 4);
        assert_eq!(asset.status, AssetStatus::Operational);
    }

    #[test]
    fn repair_keeps_identity_and_scales_wear() {
        let model = MaintenanceModel::from_config(&deterministic_config()).expect("valid");
        let mut asset = Asset::install(AssetId::first(3), 0, 7);
        asset.wear = 10.0;
        asset.status = AssetStatus::Failed;
        asset.repair(0.7);
        assert!((asset.wear - 3.0).abs() < 1e-12);
        assert_eq!(asset.status, AssetStatus::Operational);
        assert_eq!(asset.id, AssetId::first(3));

        let replaced = asset.replace(12, &model);
        assert_eq!(replaced.generation, 1);
        assert_eq!(asset.wear, 0.0);
        assert_eq!(asset.last_maintenance_day, 12);
    }

    #[test]
    fn busy_units_skip_ticks_without_drawing() {
        let mut config = deterministic_config();
        config.downtime.replace_days = 3;
        let model = MaintenanceModel::from_config(&config).expect("valid");
        let mut asset = Asset::install(AssetId::first(0), 0, 7);
        let events = run_until_event(&mut asset, &model, 4);
        assert_eq!(events.len(), 1);
        assert_eq!(asset.busy_until, Some(7));
        assert_eq!(asset.tick(5, &model), TickOutcome::Busy);
        assert_eq!(asset.tick(6, &model), TickOutcome::Busy);
        assert_eq!(asset.wear, 0.0);
        assert_eq!(asset.tick(7, &model), TickOutcome::Quiet);
        assert_eq!(asset.wear, 0.5);
        assert_eq!(asset.busy_until, None);
    }

    #[test]
    fn clear_inspection_is_an_event() {
        let mut config = deterministic_config();
        config.failure.failure_threshold = 100.0;
        config.policy.inspection_interval = Some(2);
        config.detector.alert_threshold = 50.0;
        config.detector.specificity = 1.0;
        let model = MaintenanceModel::from_config(&config).expect("valid");
        let mut asset = Asset::install(AssetId::first(0), 0, 7);
        assert_eq!(asset.tick(1, &model), TickOutcome::Quiet);
        let TickOutcome::Acted(record) = asset.tick(2, &model) else {
            panic!("inspection expected on day 2");
        };
        assert_eq!(record.event_type, EventType::InspectionClear);
        assert_eq!(record.detection, Some(DetectionOutcome::TrueNegative));
        assert_eq!(record.measurement, Some(1.0));
        assert_eq!(record.cost, 50.0);
        assert_eq!(asset.wear, 1.0);
    }

    #[test]
    fn alarm_repair_reports_pre_repair_wear() {
        let mut config = deterministic_config();
        config.failure.failure_threshold = 100.0;
        config.policy.inspection_interval = Some(4);
        config.detector.alert_threshold = 1.0;
        config.detector.sensitivity = 1.0;
        config.policy.repair_quality = 0.5;
        let model = MaintenanceModel::from_config(&config).expect("valid");
        let mut asset = Asset::install(AssetId::first(0), 0, 7);
        let events = run_until_event(&mut asset, &model, 4);
        let (_, record) = &events[0];
        assert_eq!(record.event_type, EventType::InspectionAlarmRepair);
        assert_eq!(record.detection, Some(DetectionOutcome::TruePositive));
        assert_eq!(record.wear_at_event, 2.0);
        assert_eq!(asset.wear, 1.0);
        assert_eq!(asset.id, AssetId::first(0));
    }

    #[test]
    fn usage_accumulates_per_installed_unit() {
        let mut config = deterministic_config();
        config.usage = UsageDistribution::Constant { value: 1.5 };
        let model = MaintenanceModel::from_config(&config).expect("valid");
        let mut asset = Asset::install(AssetId::first(0), 0, 7);
        assert_eq!(asset.tick(1, &model), TickOutcome::Quiet);
        assert_eq!(asset.tick(2, &model), TickOutcome::Quiet);
        assert_eq!(asset.snapshot().cumulative_usage, 3.0);
        let TickOutcome::Acted(record) = asset.tick(3, &model) else {
            panic!("breakdown expected on day 3");
        };
        assert_eq!(record.event_type, EventType::Failure);
        assert_eq!(record.measurement, None);
        assert_eq!(asset.cumulative_usage, 0.0);
    }

    #[test]
    fn snapshot_mirrors_state() {
        let asset = Asset::install(AssetId::first(5), 2, 1);
        let snapshot = asset.snapshot();
        assert_eq!(snapshot.slot, 5);
        assert_eq!(snapshot.installed_day, 2);
        assert_eq!(snapshot.status, AssetStatus::Operational);
    }
}
