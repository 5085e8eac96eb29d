//! FleetSimulator: owns every slot, advances them one day at a time and
//! commits their maintenance records to the event log in slot order.

mod evaluate;
mod init;
mod snapshot;
mod step;


use contracts::{
    Event, FleetConfig, FleetSnapshot, InstallRecord, ReplaceTrigger, RunStatus, RunSummary,
    SCHEMA_VERSION_V1,
};
use tracing::{debug, info};

use crate::asset::{Asset, MaintenanceRecord, TickOutcome};
use crate::ledger::{self, EventLog};
use crate::model::MaintenanceModel;
use crate::validate::ConfigError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepMetrics {
    pub day: u64,
    pub events: u64,
    pub replacements: u64,
    pub busy_assets: u64,
    pub quiet_assets: u64,
}

#[derive(Debug)]
pub struct FleetSimulator {
    config: FleetConfig,
    status: RunStatus,
    model: MaintenanceModel,
    assets: Vec<Asset>,
    event_log: EventLog,
    install_history: Vec<InstallRecord>,
    /// Index into `install_history` of the unit currently in each slot.
    active_install: Vec<usize>,
    replay_hash: u64,
    quiet_asset_days: u64,
    worker_threads: usize,
    worker_pool: Option<rayon::ThreadPool>,
    last_step_metrics: StepMetrics,
}

/// Final state of a completed run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    pub event_log: EventLog,
    pub total_cost: f64,
    pub install_history: Vec<InstallRecord>,
    pub summary: RunSummary,
}

/// Builds a simulator from `config` and runs it to its last day.
pub fn simulate(config: FleetConfig) -> Result<RunOutcome, ConfigError> {
    Ok(FleetSimulator::new(config)?.run())
}

fn mix_replay_hash(current: u64, event: &Event) -> u64 {
    let mut hash = current ^ event.day.wrapping_mul(0xA24B_1C62_5B93_2D47);
    hash ^= event.sequence.wrapping_mul(0x9E37_79B9_7F4A_7C15);
    let fields = [
        u64::from(event.slot),
        u64::from(event.asset_id.generation),
        event.event_type as u64,
        event.wear_at_event.to_bits(),
        event.cost.to_bits(),
        event.detection.map_or(u64::MAX, |outcome| outcome as u64),
        event.measurement.map_or(u64::MAX, f64::to_bits),
    ];
    for field in fields {
        hash = hash.rotate_left(7) ^ field;
        hash = hash.wrapping_mul(0x517C_C1B7_2722_0A95);
    }
    hash
}
