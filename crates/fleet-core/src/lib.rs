//! Discrete-time fleet maintenance engine.
//!
//! A [`FleetSimulator`] advances every slot of a fleet one day at a time:
//! units wear with usage, break, get inspected by an imperfect detector and
//! are repaired or replaced by a [`MaintenancePolicy`]. Every maintenance
//! action lands in the append-only [`EventLog`], and all cost figures are
//! folds over that log.

pub mod asset;
pub mod detector;
pub mod failure;
pub mod fleet;
pub mod ledger;
pub mod model;
pub mod policy;
pub mod rng;
pub mod validate;
pub mod wear;

pub use asset::{Asset, MaintenanceRecord, TickOutcome};
pub use detector::{Detector, Reading};
pub use failure::{
    hazard_probability, FailureModel, HazardFailure, ThresholdFailure, MAX_FINITE_EXPONENT,
};
pub use fleet::{simulate, FleetSimulator, RunOutcome, StepMetrics};
pub use ledger::EventLog;
pub use model::MaintenanceModel;
pub use policy::{Action, InspectionPlan, MaintenancePolicy, PrecedencePolicy, RunToFailurePolicy};
pub use validate::{validate_config, ConfigError};
pub use wear::{sample_usage, GammaWear, LinearWear, WearProcess};
