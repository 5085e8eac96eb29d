use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use contracts::{FleetConfig, PolicyKind};
use fleet_api::{
    compare_policies, write_events_jsonl, PersistenceError, SimulationApi, SqliteRunStore,
};
use fleet_core::{ConfigError, FleetSimulator};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Fleet maintenance simulator
///
/// Runs seeded, reproducible maintenance simulations over a fleet of
/// degrading assets and reports the resulting event log and costs.
#[derive(Parser, Debug)]
#[command(name = "fleet-cli")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one simulation and print its summary
    Simulate {
        #[command(flatten)]
        run: RunArgs,

        /// Persist events, installs and snapshots to this SQLite file
        #[arg(long)]
        sqlite: Option<PathBuf>,

        /// Write the event log as JSON lines to this file
        #[arg(long)]
        export: Option<PathBuf>,

        /// Print the summary as JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Print the effective configuration as JSON
    PrintConfig {
        #[command(flatten)]
        run: RunArgs,
    },
    /// Load a stored run from SQLite and print the events up to a day
    Replay {
        /// SQLite file written by `simulate --sqlite`
        #[arg(long)]
        sqlite: Option<PathBuf>,

        #[arg(long)]
        run_id: String,

        /// Last day to include
        #[arg(long)]
        day: u64,

        /// Re-simulate the stored configuration and check it reproduces the stored events
        #[arg(long)]
        verify: bool,
    },
    /// Run the configured policy against the run-to-failure baseline
    Compare {
        #[command(flatten)]
        run: RunArgs,

        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug, Default)]
struct RunArgs {
    /// JSON configuration file; flags below override its values
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    #[arg(long)]
    run_id: Option<String>,

    #[arg(long)]
    seed: Option<u64>,

    /// Number of assets in the fleet
    #[arg(short = 'n', long)]
    assets: Option<u32>,

    /// Simulation horizon in days
    #[arg(short = 'd', long)]
    days: Option<u64>,

    /// Worker threads used to tick assets within a day
    #[arg(short = 'w', long)]
    workers: Option<usize>,

    #[arg(long, value_enum)]
    policy: Option<PolicyArg>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum PolicyArg {
    Precedence,
    RunToFailure,
}

impl From<PolicyArg> for PolicyKind {
    fn from(value: PolicyArg) -> Self {
        match value {
            PolicyArg::Precedence => PolicyKind::Precedence,
            PolicyArg::RunToFailure => PolicyKind::RunToFailure,
        }
    }
}

#[derive(Debug, Error)]
enum CliError {
    #[error("failed to read config {path}: {source}")]
    ReadConfig { path: PathBuf, source: io::Error },
    #[error("invalid config {path}: {source}")]
    ParseConfig {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error("failed to write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
    #[error("persistence error after simulation: {0}")]
    PersistenceAfterRun(String),
    #[error("replay of {run_id} diverged from stored events at day {day}")]
    ReplayDiverged { run_id: String, day: u64 },
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

fn default_sqlite_path() -> PathBuf {
    std::env::var("FLEET_SQLITE_PATH")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("fleet_runs.sqlite"))
}

fn load_config(path: &Path) -> Result<FleetConfig, CliError> {
    let raw = std::fs::read_to_string(path).map_err(|source| CliError::ReadConfig {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| CliError::ParseConfig {
        path: path.to_path_buf(),
        source,
    })
}

fn resolve_config(args: &RunArgs) -> Result<FleetConfig, CliError> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => FleetConfig::default(),
    };
    apply_overrides(&mut config, args);
    fleet_core::validate_config(&config)?;
    Ok(config)
}

fn apply_overrides(config: &mut FleetConfig, args: &RunArgs) {
    if let Some(run_id) = &args.run_id {
        config.run_id = run_id.clone();
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(assets) = args.assets {
        config.n_assets = assets;
    }
    if let Some(days) = args.days {
        config.n_days = days;
    }
    if let Some(workers) = args.workers {
        config.worker_threads = workers;
    }
    if let Some(policy) = args.policy {
        config.policy.kind = policy.into();
    }
}

fn run_simulation(
    run: &RunArgs,
    sqlite: Option<&Path>,
    export: Option<&Path>,
    json: bool,
) -> Result<(), CliError> {
    let config = resolve_config(run)?;
    let mut api = SimulationApi::from_config(config)?;
    if let Some(path) = sqlite {
        api.attach_sqlite_store(path)?;
        api.initialize_run_storage(true)?;
    }

    api.run_to_completion();
    if let Some(error) = api.last_persistence_error() {
        return Err(CliError::PersistenceAfterRun(error.to_string()));
    }

    if let Some(path) = export {
        let file = File::create(path).map_err(|source| CliError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        let written = api.export_events_jsonl(BufWriter::new(file))?;
        info!(path = %path.display(), events = written, "exported event log");
    }

    let summary = api.summary();
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{summary}");
        if let Some(path) = sqlite {
            println!("sqlite={}", path.display());
        }
    }
    Ok(())
}

fn replay_run(sqlite: &Path, run_id: &str, day: u64, verify: bool) -> Result<(), CliError> {
    let store = SqliteRunStore::open(sqlite)?;
    let slice = store.load_replay_at_day(run_id, day)?;
    if let Some(snapshot) = &slice.snapshot {
        println!(
            "snapshot day={} events={} total_cost={:.2} replay_hash={}",
            snapshot.day, snapshot.event_count, snapshot.total_cost, snapshot.replay_hash
        );
    }
    println!("units_in_service={}", slice.installs.len());
    write_events_jsonl(&slice.events, io::stdout().lock())?;

    if verify {
        let stored = store.load_events_range(run_id, 1, day)?;
        let mut engine = FleetSimulator::new(store.load_config(run_id)?)?;
        engine.run_to_day(day);
        if engine.events() != stored.as_slice() {
            return Err(CliError::ReplayDiverged {
                run_id: run_id.to_string(),
                day,
            });
        }
        println!(
            "verified run_id={} day={} events={}",
            run_id,
            day,
            stored.len()
        );
    }
    Ok(())
}

fn run_comparison(run: &RunArgs, json: bool) -> Result<(), CliError> {
    let config = resolve_config(run)?;
    let comparison = compare_policies(&config)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&comparison)?);
        return Ok(());
    }
    println!("== configured policy ==");
    println!("{}", comparison.configured);
    println!("== run to failure ==");
    println!("{}", comparison.run_to_failure);
    println!(
        "savings={:.2} failures_avoided={}",
        comparison.savings(),
        comparison.failures_avoided()
    );
    Ok(())
}

fn execute(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Simulate {
            run,
            sqlite,
            export,
            json,
        } => run_simulation(&run, sqlite.as_deref(), export.as_deref(), json),
        Command::PrintConfig { run } => {
            let config = resolve_config(&run)?;
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
        Command::Replay {
            sqlite,
            run_id,
            day,
            verify,
        } => {
            let sqlite = sqlite.unwrap_or_else(default_sqlite_path);
            replay_run(&sqlite, &run_id, day, verify)
        }
        Command::Compare { run, json } => run_comparison(&run, json),
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,fleet_core=info,fleet_cli=info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(err) = execute(cli) {
        eprintln!("error: {err}");
        std::process::exit(2);
    }
}
