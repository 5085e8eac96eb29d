//! In-process facade over the fleet engine with SQLite persistence and
//! JSON-lines export.

mod compare;
mod export;
mod persistence;

use std::io::Write;
use std::path::Path;

use contracts::{
    Event, EventType, FleetConfig, FleetSnapshot, InstallRecord, RunStatus, RunSummary,
};
use fleet_core::{ConfigError, FleetSimulator};
use tracing::{info, warn};

pub use compare::{compare_policies, PolicyComparison};
pub use export::{read_events_jsonl, write_events_jsonl};
pub use persistence::{PersistedRunSummary, PersistenceError, ReplaySlice, SqliteRunStore};

#[derive(Debug)]
struct PersistenceState {
    store: SqliteRunStore,
    persisted_event_count: usize,
    persisted_install_count: usize,
    last_flushed_day: u64,
    last_snapshot_day: Option<u64>,
}

#[derive(Debug)]
pub struct SimulationApi {
    engine: FleetSimulator,
    persistence: Option<PersistenceState>,
    last_persistence_error: Option<String>,
}

impl SimulationApi {
    pub fn from_config(config: FleetConfig) -> Result<Self, ConfigError> {
        Ok(Self::from_simulator(FleetSimulator::new(config)?))
    }

    pub fn from_simulator(engine: FleetSimulator) -> Self {
        Self {
            engine,
            persistence: None,
            last_persistence_error: None,
        }
    }

    pub fn attach_sqlite_store(&mut self, path: impl AsRef<Path>) -> Result<(), PersistenceError> {
        let store = SqliteRunStore::open(path)?;
        self.persistence = Some(PersistenceState {
            store,
            persisted_event_count: 0,
            persisted_install_count: 0,
            last_flushed_day: 0,
            last_snapshot_day: None,
        });
        Ok(())
    }

    pub fn initialize_run_storage(
        &mut self,
        replace_existing_run: bool,
    ) -> Result<(), PersistenceError> {
        let Some(state) = self.persistence.as_mut() else {
            return Err(PersistenceError::NotAttached);
        };

        let run_id = self.engine.run_id().to_string();
        if state.store.run_exists(&run_id)? {
            if replace_existing_run {
                info!(run_id = %run_id, "replacing stored run");
                state.store.delete_run(&run_id)?;
            } else {
                return Err(PersistenceError::RunAlreadyExists(run_id));
            }
        }

        let bootstrap_snapshot = self.engine.snapshot();
        state.store.persist_delta(
            self.engine.config(),
            self.engine.status(),
            self.engine.events(),
            self.engine.install_history(),
            Some(&bootstrap_snapshot),
        )?;
        state.persisted_event_count = self.engine.events().len();
        state.persisted_install_count = self.engine.install_history().len();
        state.last_flushed_day = bootstrap_snapshot.day;
        state.last_snapshot_day = Some(bootstrap_snapshot.day);
        self.last_persistence_error = None;
        Ok(())
    }

    /// Writes everything logged since the previous flush, plus a snapshot
    /// when the cadence or the end of the run calls for one.
    pub fn flush_persistence_checked(&mut self) -> Result<(), PersistenceError> {
        let Some(state) = self.persistence.as_mut() else {
            return Err(PersistenceError::NotAttached);
        };

        let new_events = self.engine.event_log().since(state.persisted_event_count as u64);
        let last_flushed_day = state.last_flushed_day;
        let persisted_install_count = state.persisted_install_count;
        let touched_installs = self
            .engine
            .install_history()
            .iter()
            .enumerate()
            .filter(|(index, record)| {
                *index >= persisted_install_count
                    || record.retired_day.is_some_and(|day| day > last_flushed_day)
            })
            .map(|(_, record)| record.clone())
            .collect::<Vec<InstallRecord>>();

        let current_day = self.engine.current_day();
        let cadence = self.engine.config().snapshot_every_days.max(1);
        let snapshot_due = (current_day % cadence == 0 || self.engine.status().is_complete())
            && state.last_snapshot_day != Some(current_day);
        let snapshot = snapshot_due.then(|| self.engine.snapshot());

        state.store.persist_delta(
            self.engine.config(),
            self.engine.status(),
            new_events,
            &touched_installs,
            snapshot.as_ref(),
        )?;

        state.persisted_event_count = self.engine.events().len();
        state.persisted_install_count = self.engine.install_history().len();
        state.last_flushed_day = current_day;
        if let Some(snapshot_payload) = snapshot {
            state.last_snapshot_day = Some(snapshot_payload.day);
        }

        self.last_persistence_error = None;
        Ok(())
    }

    pub fn replay_at_day(&self, run_id: &str, day: u64) -> Result<ReplaySlice, PersistenceError> {
        let Some(state) = self.persistence.as_ref() else {
            return Err(PersistenceError::NotAttached);
        };

        state.store.load_replay_at_day(run_id, day)
    }

    pub fn load_events_range(
        &self,
        run_id: &str,
        from_day: u64,
        to_day: u64,
    ) -> Result<Vec<Event>, PersistenceError> {
        let Some(state) = self.persistence.as_ref() else {
            return Err(PersistenceError::NotAttached);
        };

        state.store.load_events_range(run_id, from_day, to_day)
    }

    pub fn load_snapshots_range(
        &self,
        run_id: &str,
        from_day: u64,
        to_day: u64,
    ) -> Result<Vec<FleetSnapshot>, PersistenceError> {
        let Some(state) = self.persistence.as_ref() else {
            return Err(PersistenceError::NotAttached);
        };

        state.store.load_snapshots_range(run_id, from_day, to_day)
    }

    pub fn load_events_by_type(
        &self,
        run_id: &str,
        event_type: EventType,
        from_day: u64,
        to_day: u64,
    ) -> Result<Vec<Event>, PersistenceError> {
        let Some(state) = self.persistence.as_ref() else {
            return Err(PersistenceError::NotAttached);
        };

        state
            .store
            .load_events_by_type(run_id, event_type, from_day, to_day)
    }

    pub fn load_slot_events(
        &self,
        run_id: &str,
        slot: u32,
        to_day: u64,
    ) -> Result<Vec<Event>, PersistenceError> {
        let Some(state) = self.persistence.as_ref() else {
            return Err(PersistenceError::NotAttached);
        };

        state.store.load_slot_events(run_id, slot, to_day)
    }

    pub fn load_installs(&self, run_id: &str) -> Result<Vec<InstallRecord>, PersistenceError> {
        let Some(state) = self.persistence.as_ref() else {
            return Err(PersistenceError::NotAttached);
        };

        state.store.load_installs(run_id)
    }

    pub fn list_runs(&self) -> Result<Vec<PersistedRunSummary>, PersistenceError> {
        let Some(state) = self.persistence.as_ref() else {
            return Err(PersistenceError::NotAttached);
        };

        state.store.list_runs()
    }

    pub fn last_persistence_error(&self) -> Option<&str> {
        self.last_persistence_error.as_deref()
    }

    pub fn run_id(&self) -> &str {
        self.engine.run_id()
    }

    pub fn config(&self) -> &FleetConfig {
        self.engine.config()
    }

    pub fn status(&self) -> &RunStatus {
        self.engine.status()
    }

    pub fn events(&self) -> &[Event] {
        self.engine.events()
    }

    pub fn install_history(&self) -> &[InstallRecord] {
        self.engine.install_history()
    }

    pub fn snapshot(&self) -> FleetSnapshot {
        self.engine.snapshot()
    }

    pub fn summary(&self) -> RunSummary {
        self.engine.summary()
    }

    pub fn simulator(&self) -> &FleetSimulator {
        &self.engine
    }

    /// Advances up to `days` days and returns how many were simulated.
    pub fn step(&mut self, days: u64) -> (&RunStatus, u64) {
        let advanced = self.engine.step_n(days.max(1));
        self.flush_persistence_if_enabled();
        (self.engine.status(), advanced)
    }

    pub fn run_to_day(&mut self, day: u64) -> (&RunStatus, u64) {
        let advanced = self.engine.run_to_day(day);
        self.flush_persistence_if_enabled();
        (self.engine.status(), advanced)
    }

    /// Runs to the horizon, flushing once per snapshot cadence.
    pub fn run_to_completion(&mut self) -> &RunStatus {
        let cadence = self.engine.config().snapshot_every_days.max(1);
        while !self.engine.status().is_complete() {
            let target = self.engine.current_day().saturating_add(cadence);
            self.engine.run_to_day(target);
            self.flush_persistence_if_enabled();
        }
        self.engine.status()
    }

    pub fn export_events_jsonl<W: Write>(&self, writer: W) -> Result<usize, PersistenceError> {
        write_events_jsonl(self.engine.events(), writer)
    }

    fn flush_persistence_if_enabled(&mut self) {
        if self.persistence.is_none() {
            return;
        }

        if let Err(err) = self.flush_persistence_checked() {
            warn!(run_id = %self.engine.run_id(), error = %err, "persistence flush failed");
            self.last_persistence_error = Some(err.to_string());
        }
    }
}
