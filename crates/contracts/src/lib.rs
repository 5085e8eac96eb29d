//! v1 cross-boundary contracts for the maintenance engine, API, persistence and CLI.

pub mod config;
pub mod serde_seed;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

pub use config::{
    CostConfig, DetectorConfig, DowntimeConfig, FailureConfig, FailureModelConfig, FleetConfig,
    InspectionMode, PolicyConfig, PolicyKind, SystematicBasis, UsageDistribution, WearConfig,
    WearModel,
};

pub const SCHEMA_VERSION_V1: &str = "1.0";

/// Opaque identity of one physical unit. The slot is the fleet position, the
/// generation counts replacements made in that slot.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetId {
    pub slot: u32,
    pub generation: u32,
}

impl AssetId {
    pub fn first(slot: u32) -> Self {
        Self {
            slot,
            generation: 0,
        }
    }

    pub fn successor(self) -> Self {
        Self {
            slot: self.slot,
            generation: self.generation.saturating_add(1),
        }
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AST-{:03}-{:04}", self.slot, self.generation)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AssetStatus {
    Operational,
    Failed,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ReplaceTrigger {
    Corrective,
    Systematic,
    Conditional,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Failure,
    SystematicReplacement,
    InspectionAlarmRepair,
    InspectionAlarmReplacement,
    InspectionClear,
    Other,
}

impl EventType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Failure => "failure",
            Self::SystematicReplacement => "systematic_replacement",
            Self::InspectionAlarmRepair => "inspection_alarm_repair",
            Self::InspectionAlarmReplacement => "inspection_alarm_replacement",
            Self::InspectionClear => "inspection_clear",
            Self::Other => "other",
        }
    }

    pub fn is_replacement(self) -> bool {
        matches!(
            self,
            Self::Failure | Self::SystematicReplacement | Self::InspectionAlarmReplacement
        )
    }

    pub fn is_inspection(self) -> bool {
        matches!(
            self,
            Self::InspectionAlarmRepair | Self::InspectionAlarmReplacement | Self::InspectionClear
        )
    }
}

/// Confusion-matrix cell of one detector reading.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum DetectionOutcome {
    TrueNegative,
    TruePositive,
    FalseNegative,
    FalsePositive,
}

impl DetectionOutcome {
    pub fn classify(anomalous: bool, alarm: bool) -> Self {
        match (anomalous, alarm) {
            (true, true) => Self::TruePositive,
            (true, false) => Self::FalseNegative,
            (false, true) => Self::FalsePositive,
            (false, false) => Self::TrueNegative,
        }
    }

    pub fn alarm(self) -> bool {
        matches!(self, Self::TruePositive | Self::FalsePositive)
    }

    pub fn anomalous(self) -> bool {
        matches!(self, Self::TruePositive | Self::FalseNegative)
    }
}

/// The eight canonical maintenance scenarios used for traceability.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    NormalAging,
    TrueNegative,
    TruePositive,
    BreakdownBetweenInspections,
    FalseNegative,
    FalsePositive,
    ImperfectRepair,
    SystematicReplacement,
}

impl Scenario {
    pub fn number(self) -> u8 {
        match self {
            Self::NormalAging => 1,
            Self::TrueNegative => 2,
            Self::TruePositive => 3,
            Self::BreakdownBetweenInspections => 4,
            Self::FalseNegative => 5,
            Self::FalsePositive => 6,
            Self::ImperfectRepair => 7,
            Self::SystematicReplacement => 8,
        }
    }
}

impl From<DetectionOutcome> for Scenario {
    fn from(outcome: DetectionOutcome) -> Self {
        match outcome {
            DetectionOutcome::TrueNegative => Self::TrueNegative,
            DetectionOutcome::TruePositive => Self::TruePositive,
            DetectionOutcome::FalseNegative => Self::FalseNegative,
            DetectionOutcome::FalsePositive => Self::FalsePositive,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Event {
    pub day: u64,
    /// Position in the run's event log.
    pub sequence: u64,
    pub slot: u32,
    pub asset_id: AssetId,
    pub event_type: EventType,
    /// Wear observed when the action was decided, before any reset.
    pub wear_at_event: f64,
    pub cost: f64,
    #[serde(default)]
    pub detection: Option<DetectionOutcome>,
    /// Score reported by the inspection, when one ran.
    #[serde(default)]
    pub measurement: Option<f64>,
}

impl Event {
    /// Scenarios this event evidences. Normal aging never produces an event.
    pub fn scenarios(&self) -> Vec<Scenario> {
        let mut scenarios = Vec::with_capacity(2);
        if let Some(outcome) = self.detection {
            scenarios.push(Scenario::from(outcome));
        }
        match self.event_type {
            EventType::Failure => scenarios.push(Scenario::BreakdownBetweenInspections),
            EventType::SystematicReplacement => scenarios.push(Scenario::SystematicReplacement),
            EventType::InspectionAlarmRepair => scenarios.push(Scenario::ImperfectRepair),
            EventType::InspectionAlarmReplacement
            | EventType::InspectionClear
            | EventType::Other => {}
        }
        scenarios
    }
}

/// Audit entry for one physical unit occupying a slot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InstallRecord {
    pub asset_id: AssetId,
    pub slot: u32,
    pub installed_day: u64,
    pub retired_day: Option<u64>,
    pub retire_trigger: Option<ReplaceTrigger>,
}

impl InstallRecord {
    pub fn installed(asset_id: AssetId, installed_day: u64) -> Self {
        Self {
            asset_id,
            slot: asset_id.slot,
            installed_day,
            retired_day: None,
            retire_trigger: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.retired_day.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssetSnapshot {
    pub slot: u32,
    pub asset_id: AssetId,
    pub wear: f64,
    pub status: AssetStatus,
    pub age: u64,
    pub installed_day: u64,
    pub last_maintenance_day: u64,
    pub busy_until: Option<u64>,
    pub next_inspection_day: Option<u64>,
    /// Usage accumulated by the installed unit since it entered the slot.
    #[serde(default)]
    pub cumulative_usage: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FleetSnapshot {
    pub schema_version: String,
    pub run_id: String,
    pub day: u64,
    pub snapshot_id: String,
    pub assets: Vec<AssetSnapshot>,
    pub event_count: u64,
    pub total_cost: f64,
    pub replay_hash: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunStatus {
    pub schema_version: String,
    pub run_id: String,
    pub current_day: u64,
    pub max_days: u64,
}

impl RunStatus {
    pub fn is_complete(&self) -> bool {
        self.current_day >= self.max_days
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "run_id={} day={}/{}",
            self.run_id, self.current_day, self.max_days
        )
    }
}

/// Aggregates folded from an event log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct RunSummary {
    pub run_id: String,
    #[serde(with = "serde_seed")]
    pub seed: u64,
    pub days_simulated: u64,
    pub n_assets: u32,
    pub total_cost: f64,
    pub event_counts: BTreeMap<EventType, u64>,
    pub cost_by_type: BTreeMap<EventType, f64>,
    pub scenario_counts: BTreeMap<Scenario, u64>,
    pub failures: u64,
    pub replacements: u64,
    pub repairs: u64,
    pub inspections: u64,
    /// Asset-days that produced no event.
    pub quiet_asset_days: u64,
    pub replay_hash: String,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "run_id={} seed={} days={} assets={}",
            self.run_id, self.seed, self.days_simulated, self.n_assets
        )?;
        writeln!(f, "total_cost={:.2}", self.total_cost)?;
        writeln!(
            f,
            "failures={} replacements={} repairs={} inspections={} quiet_asset_days={}",
            self.failures, self.replacements, self.repairs, self.inspections, self.quiet_asset_days
        )?;
        for (event_type, count) in &self.event_counts {
            let cost = self.cost_by_type.get(event_type).copied().unwrap_or(0.0);
            writeln!(f, "  {:<30} count={:<8} cost={:.2}", event_type.as_str(), count, cost)?;
        }
        write!(f, "replay_hash={}", self.replay_hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(event_type: EventType, detection: Option<DetectionOutcome>) -> Event {
        Event {
            day: 3,
            sequence: 0,
            slot: 1,
            asset_id: AssetId::first(1),
            event_type,
            wear_at_event: 1.0,
            cost: 10.0,
            measurement: detection.map(|_| 1.0),
            detection,
        }
    }

    #[test]
    fn asset_id_display_is_zero_padded() {
        let id = AssetId::first(7).successor().successor();
        assert_eq!(id.to_string(), "AST-007-0002");
    }

    #[test]
    fn detection_outcome_matches_confusion_matrix() {
        assert_eq!(
            DetectionOutcome::classify(true, true),
            DetectionOutcome::TruePositive
        );
        assert_eq!(
            DetectionOutcome::classify(true, false),
            DetectionOutcome::FalseNegative
        );
        assert_eq!(
            DetectionOutcome::classify(false, true),
            DetectionOutcome::FalsePositive
        );
        assert_eq!(
            DetectionOutcome::classify(false, false),
            DetectionOutcome::TrueNegative
        );
        assert!(DetectionOutcome::FalsePositive.alarm());
        assert!(!DetectionOutcome::FalsePositive.anomalous());
    }

    #[test]
    fn scenarios_follow_event_shape() {
        assert_eq!(
            event(
                EventType::InspectionAlarmRepair,
                Some(DetectionOutcome::FalsePositive)
            )
            .scenarios(),
            vec![Scenario::FalsePositive, Scenario::ImperfectRepair]
        );
        assert_eq!(
            event(EventType::Failure, None).scenarios(),
            vec![Scenario::BreakdownBetweenInspections]
        );
        assert_eq!(
            event(
                EventType::InspectionClear,
                Some(DetectionOutcome::FalseNegative)
            )
            .scenarios(),
            vec![Scenario::FalseNegative]
        );
        assert_eq!(Scenario::SystematicReplacement.number(), 8);
    }

    #[test]
    fn events_without_a_measurement_still_parse() {
        let raw = r#"{"day":4,"sequence":0,"slot":0,"asset_id":{"slot":0,"generation":0},
            "event_type":"failure","wear_at_event":2.0,"cost":6500.0}"#;
        let parsed: Event = serde_json::from_str(raw).expect("older event parses");
        assert_eq!(parsed.detection, None);
        assert_eq!(parsed.measurement, None);
    }

    #[test]
    fn summary_maps_serialize_with_enum_keys() {
        let mut summary = RunSummary::default();
        summary.event_counts.insert(EventType::Failure, 2);
        summary.scenario_counts.insert(Scenario::TruePositive, 1);
        let raw = serde_json::to_string(&summary).expect("serialize summary");
        assert!(raw.contains(r#""failure":2"#));
        assert!(raw.contains(r#""true_positive":1"#));
    }
}
