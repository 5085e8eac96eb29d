use std::collections::BTreeMap;
use std::path::Path;

use contracts::{AssetId, Event, EventType, FleetConfig, FleetSnapshot, InstallRecord, RunStatus};
use rusqlite::{params, Connection, OptionalExtension, Params};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Value of `PRAGMA user_version` for the table layout below.
const STORE_LAYOUT_VERSION: i64 = 1;

/// State of a stored run on one day.
#[derive(Debug, Clone)]
pub struct ReplaySlice {
    /// Nearest snapshot at or before the day.
    pub snapshot: Option<FleetSnapshot>,
    /// Events logged after the snapshot, up to and including the day.
    pub events: Vec<Event>,
    pub installs: Vec<InstallRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PersistedRunSummary {
    pub run_id: String,
    pub current_day: u64,
    pub max_days: u64,
    pub event_count: u64,
    pub total_cost: f64,
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("sqlite store is not attached")]
    NotAttached,
    #[error("run {0} already exists")]
    RunAlreadyExists(String),
    #[error("run {0} not found")]
    RunNotFound(String),
    #[error("store layout version {0} is newer than this build understands")]
    UnsupportedLayout(i64),
}

#[derive(Debug)]
pub struct SqliteRunStore {
    conn: Connection,
}

impl SqliteRunStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PersistenceError> {
        let conn = Connection::open(path)?;
        let mut store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    pub fn run_exists(&self, run_id: &str) -> Result<bool, PersistenceError> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM runs WHERE run_id = ?1",
                params![run_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    pub fn delete_run(&mut self, run_id: &str) -> Result<(), PersistenceError> {
        let tx = self.conn.transaction()?;
        for table in ["events", "installs", "snapshots", "runs"] {
            tx.execute(
                &format!("DELETE FROM {table} WHERE run_id = ?1"),
                params![run_id],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Writes new events, new or newly retired install records and an
    /// optional snapshot in one transaction. Re-persisting rows is a no-op.
    pub fn persist_delta(
        &mut self,
        config: &FleetConfig,
        status: &RunStatus,
        events: &[Event],
        installs: &[InstallRecord],
        snapshot: Option<&FleetSnapshot>,
    ) -> Result<(), PersistenceError> {
        let tx = self.conn.transaction()?;

        upsert_run(&tx, config, status)?;

        for event in events {
            let payload_json = serde_json::to_string(event)?;
            tx.execute(
                "INSERT OR IGNORE INTO events (
                    run_id,
                    sequence,
                    day,
                    slot,
                    asset_id,
                    event_type,
                    cost,
                    payload_json
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    config.run_id.as_str(),
                    to_sql_int(event.sequence),
                    to_sql_int(event.day),
                    i64::from(event.slot),
                    event.asset_id.to_string(),
                    event.event_type.as_str(),
                    event.cost,
                    payload_json,
                ],
            )?;
        }

        for install in installs {
            tx.execute(
                "INSERT INTO installs (
                    run_id,
                    asset_id,
                    slot,
                    generation,
                    installed_day,
                    retired_day,
                    retire_trigger
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(run_id, asset_id) DO UPDATE SET
                    retired_day = excluded.retired_day,
                    retire_trigger = excluded.retire_trigger",
                params![
                    config.run_id.as_str(),
                    install.asset_id.to_string(),
                    i64::from(install.slot),
                    i64::from(install.asset_id.generation),
                    to_sql_int(install.installed_day),
                    install.retired_day.map(to_sql_int),
                    install
                        .retire_trigger
                        .map(|trigger| serde_json::to_string(&trigger))
                        .transpose()?,
                ],
            )?;
        }

        if let Some(snapshot) = snapshot {
            let payload_json = serde_json::to_string(snapshot)?;
            tx.execute(
                "INSERT OR REPLACE INTO snapshots
                    (run_id, day, snapshot_id, replay_hash, payload_json)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    snapshot.run_id.as_str(),
                    to_sql_int(snapshot.day),
                    snapshot.snapshot_id.as_str(),
                    snapshot.replay_hash.as_str(),
                    payload_json,
                ],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    pub fn load_config(&self, run_id: &str) -> Result<FleetConfig, PersistenceError> {
        let raw: Option<String> = self
            .conn
            .query_row(
                "SELECT config_json FROM runs WHERE run_id = ?1",
                params![run_id],
                |row| row.get(0),
            )
            .optional()?;
        let raw = raw.ok_or_else(|| PersistenceError::RunNotFound(run_id.to_string()))?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn list_runs(&self) -> Result<Vec<PersistedRunSummary>, PersistenceError> {
        let mut stmt = self.conn.prepare(
            "SELECT runs.status_json,
                    COUNT(events.sequence),
                    COALESCE(SUM(events.cost), 0.0)
             FROM runs
             LEFT JOIN events ON events.run_id = runs.run_id
             GROUP BY runs.run_id
             ORDER BY runs.run_id ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, f64>(2)?,
            ))
        })?;

        let mut runs = Vec::new();
        for row in rows {
            let (status_json, event_count, total_cost) = row?;
            let status = serde_json::from_str::<RunStatus>(&status_json)?;
            runs.push(PersistedRunSummary {
                run_id: status.run_id,
                current_day: status.current_day,
                max_days: status.max_days,
                event_count: u64::try_from(event_count).unwrap_or(0),
                total_cost,
            });
        }
        Ok(runs)
    }

    pub fn load_events_range(
        &self,
        run_id: &str,
        from_day: u64,
        to_day: u64,
    ) -> Result<Vec<Event>, PersistenceError> {
        self.query_payloads(
            "SELECT payload_json FROM events
             WHERE run_id = ?1 AND day BETWEEN ?2 AND ?3
             ORDER BY sequence",
            params![run_id, to_sql_int(from_day), to_sql_int(to_day)],
        )
    }

    /// Events of one type, e.g. every breakdown, in log order.
    pub fn load_events_by_type(
        &self,
        run_id: &str,
        event_type: EventType,
        from_day: u64,
        to_day: u64,
    ) -> Result<Vec<Event>, PersistenceError> {
        self.query_payloads(
            "SELECT payload_json FROM events
             WHERE run_id = ?1 AND event_type = ?2 AND day BETWEEN ?3 AND ?4
             ORDER BY sequence",
            params![
                run_id,
                event_type.as_str(),
                to_sql_int(from_day),
                to_sql_int(to_day)
            ],
        )
    }

    /// Maintenance history of one fleet position up to `to_day`, across
    /// every unit that occupied it.
    pub fn load_slot_events(
        &self,
        run_id: &str,
        slot: u32,
        to_day: u64,
    ) -> Result<Vec<Event>, PersistenceError> {
        self.query_payloads(
            "SELECT payload_json FROM events
             WHERE run_id = ?1 AND slot = ?2 AND day <= ?3
             ORDER BY day",
            params![run_id, i64::from(slot), to_sql_int(to_day)],
        )
    }

    /// Stored cost per event type, summed in SQL.
    pub fn cost_by_type(
        &self,
        run_id: &str,
    ) -> Result<BTreeMap<EventType, f64>, PersistenceError> {
        let mut stmt = self.conn.prepare(
            "SELECT event_type, SUM(cost) FROM events
             WHERE run_id = ?1
             GROUP BY event_type",
        )?;
        let rows = stmt.query_map(params![run_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
        })?;

        let mut costs = BTreeMap::new();
        for row in rows {
            let (label, cost) = row?;
            let event_type: EventType =
                serde_json::from_value(serde_json::Value::String(label))?;
            costs.insert(event_type, cost);
        }
        Ok(costs)
    }

    pub fn load_installs(&self, run_id: &str) -> Result<Vec<InstallRecord>, PersistenceError> {
        self.query_installs(
            "SELECT slot, generation, installed_day, retired_day, retire_trigger
             FROM installs
             WHERE run_id = ?1
             ORDER BY installed_day, slot",
            params![run_id],
        )
    }

    /// Units in service on `day`: installed on or before it and not yet
    /// retired. A unit retired on `day` has already left the slot.
    pub fn load_installs_in_service(
        &self,
        run_id: &str,
        day: u64,
    ) -> Result<Vec<InstallRecord>, PersistenceError> {
        self.query_installs(
            "SELECT slot, generation, installed_day, retired_day, retire_trigger
             FROM installs
             WHERE run_id = ?1
               AND installed_day <= ?2
               AND (retired_day IS NULL OR retired_day > ?2)
             ORDER BY slot",
            params![run_id, to_sql_int(day)],
        )
    }

    pub fn load_snapshots_range(
        &self,
        run_id: &str,
        from_day: u64,
        to_day: u64,
    ) -> Result<Vec<FleetSnapshot>, PersistenceError> {
        self.query_payloads(
            "SELECT payload_json FROM snapshots
             WHERE run_id = ?1 AND day BETWEEN ?2 AND ?3
             ORDER BY day",
            params![run_id, to_sql_int(from_day), to_sql_int(to_day)],
        )
    }

    /// Rebuilds the view of a run on `day`: the nearest snapshot at or
    /// before it, the events logged since, and the units in service.
    pub fn load_replay_at_day(
        &self,
        run_id: &str,
        day: u64,
    ) -> Result<ReplaySlice, PersistenceError> {
        if !self.run_exists(run_id)? {
            return Err(PersistenceError::RunNotFound(run_id.to_string()));
        }
        let snapshot: Option<FleetSnapshot> = self
            .query_payloads(
                "SELECT payload_json FROM snapshots
                 WHERE run_id = ?1 AND day <= ?2
                 ORDER BY day DESC
                 LIMIT 1",
                params![run_id, to_sql_int(day)],
            )?
            .pop();
        let from_day = snapshot.as_ref().map_or(1, |snapshot| snapshot.day + 1);

        Ok(ReplaySlice {
            events: self.load_events_range(run_id, from_day, day)?,
            installs: self.load_installs_in_service(run_id, day)?,
            snapshot,
        })
    }

    fn query_payloads<T: DeserializeOwned>(
        &self,
        sql: &str,
        params: impl Params,
    ) -> Result<Vec<T>, PersistenceError> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, |row| row.get::<_, String>(0))?;
        let mut decoded = Vec::new();
        for row in rows {
            decoded.push(serde_json::from_str::<T>(&row?)?);
        }
        Ok(decoded)
    }

    fn query_installs(
        &self,
        sql: &str,
        params: impl Params,
    ) -> Result<Vec<InstallRecord>, PersistenceError> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, Option<i64>>(3)?,
                row.get::<_, Option<String>>(4)?,
            ))
        })?;

        let mut installs = Vec::new();
        for row in rows {
            let (slot, generation, installed_day, retired_day, trigger) = row?;
            let asset_id = AssetId {
                slot: u32::try_from(slot).unwrap_or(u32::MAX),
                generation: u32::try_from(generation).unwrap_or(u32::MAX),
            };
            installs.push(InstallRecord {
                asset_id,
                slot: asset_id.slot,
                installed_day: from_sql_int(installed_day),
                retired_day: retired_day.map(from_sql_int),
                retire_trigger: trigger
                    .map(|raw| serde_json::from_str(&raw))
                    .transpose()?,
            });
        }
        Ok(installs)
    }

    /// Creates the tables on a fresh file and stamps `user_version`. Files
    /// with a newer layout are refused.
    fn migrate(&mut self) -> Result<(), PersistenceError> {
        self.conn.pragma_update(None, "journal_mode", "WAL")?;
        let version: i64 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?;
        if version > STORE_LAYOUT_VERSION {
            return Err(PersistenceError::UnsupportedLayout(version));
        }

        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS runs (
                run_id TEXT PRIMARY KEY,
                schema_version TEXT NOT NULL,
                seed TEXT NOT NULL,
                n_assets INTEGER NOT NULL,
                n_days INTEGER NOT NULL,
                config_json TEXT NOT NULL,
                status_json TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS events (
                run_id TEXT NOT NULL,
                sequence INTEGER NOT NULL,
                day INTEGER NOT NULL,
                slot INTEGER NOT NULL,
                asset_id TEXT NOT NULL,
                event_type TEXT NOT NULL,
                cost REAL NOT NULL,
                payload_json TEXT NOT NULL,
                PRIMARY KEY (run_id, sequence),
                UNIQUE (run_id, day, slot)
            );

            CREATE TABLE IF NOT EXISTS installs (
                run_id TEXT NOT NULL,
                asset_id TEXT NOT NULL,
                slot INTEGER NOT NULL,
                generation INTEGER NOT NULL,
                installed_day INTEGER NOT NULL,
                retired_day INTEGER,
                retire_trigger TEXT,
                PRIMARY KEY (run_id, asset_id)
            );

            CREATE TABLE IF NOT EXISTS snapshots (
                run_id TEXT NOT NULL,
                day INTEGER NOT NULL,
                snapshot_id TEXT NOT NULL,
                replay_hash TEXT NOT NULL,
                payload_json TEXT NOT NULL,
                PRIMARY KEY (run_id, day)
            );

            CREATE INDEX IF NOT EXISTS idx_events_run_type_day ON events(run_id, event_type, day);
            CREATE INDEX IF NOT EXISTS idx_events_run_slot_day ON events(run_id, slot, day);
            CREATE INDEX IF NOT EXISTS idx_installs_run_day ON installs(run_id, installed_day);
            ",
        )?;
        self.conn
            .pragma_update(None, "user_version", STORE_LAYOUT_VERSION)?;
        Ok(())
    }
}

fn upsert_run(
    tx: &rusqlite::Transaction<'_>,
    config: &FleetConfig,
    status: &RunStatus,
) -> Result<(), PersistenceError> {
    tx.execute(
        "INSERT INTO runs
            (run_id, schema_version, seed, n_assets, n_days, config_json, status_json)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(run_id) DO UPDATE SET status_json = excluded.status_json",
        params![
            config.run_id.as_str(),
            config.schema_version.as_str(),
            config.seed.to_string(),
            i64::from(config.n_assets),
            to_sql_int(config.n_days),
            serde_json::to_string(config)?,
            serde_json::to_string(status)?,
        ],
    )?;
    Ok(())
}

fn to_sql_int(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn from_sql_int(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}
