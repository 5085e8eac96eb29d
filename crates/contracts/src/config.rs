//! Run configuration for the fleet maintenance engine.
//!
//! Every section carries `#[serde(default)]` so a partial JSON document only
//! needs to name the values it overrides. Field aliases accept the option
//! names used by the legacy parameter sheets (`seuil_panne`, `cout_panne`, ...).

use serde::{Deserialize, Serialize};

use crate::SCHEMA_VERSION_V1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FleetConfig {
    pub schema_version: String,
    pub run_id: String,
    #[serde(with = "crate::serde_seed", alias = "random_seed")]
    pub seed: u64,
    #[serde(alias = "n_systemes", alias = "taille_flotte")]
    pub n_assets: u32,
    #[serde(alias = "n_jours")]
    pub n_days: u64,
    /// Rayon workers used to tick assets within a day. `0` or `1` runs inline.
    pub worker_threads: usize,
    /// Cadence of persisted snapshots; `0` behaves like `1`.
    pub snapshot_every_days: u64,
    pub usage: UsageDistribution,
    pub wear: WearConfig,
    pub failure: FailureConfig,
    pub detector: DetectorConfig,
    pub policy: PolicyConfig,
    pub costs: CostConfig,
    pub downtime: DowntimeConfig,
    pub notes: Option<String>,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            run_id: "fleet_run_001".to_string(),
            seed: 42,
            n_assets: 100,
            n_days: 365,
            worker_threads: 0,
            snapshot_every_days: 30,
            usage: UsageDistribution::default(),
            wear: WearConfig::default(),
            failure: FailureConfig::default(),
            detector: DetectorConfig::default(),
            policy: PolicyConfig::default(),
            costs: CostConfig::default(),
            downtime: DowntimeConfig::default(),
            notes: None,
        }
    }
}

/// Daily usage magnitude fed into the wear model.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UsageDistribution {
    /// Fixed usage, no random draw.
    Constant { value: f64 },
    /// Uniform on `[low, high)`.
    Uniform { low: f64, high: f64 },
    /// `exp(N(mu, sigma))`.
    LogNormal { mu: f64, sigma: f64 },
}

impl Default for UsageDistribution {
    fn default() -> Self {
        Self::Uniform {
            low: 0.8,
            high: 1.2,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WearConfig {
    #[serde(alias = "usure_moyenne", alias = "vitesse_usure")]
    pub alpha: f64,
    pub accel_age: f64,
    pub model: WearModel,
}

impl Default for WearConfig {
    fn default() -> Self {
        Self {
            alpha: 0.15,
            accel_age: 0.0,
            model: WearModel::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WearModel {
    /// Mean increment plus additive uniform noise on `[0, noise_max)`.
    Linear { noise_max: f64 },
    /// Gamma-distributed increment whose mean equals the computed mean.
    Gamma { shape: f64 },
}

impl Default for WearModel {
    fn default() -> Self {
        Self::Linear { noise_max: 0.05 }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FailureConfig {
    /// Wear at which a unit breaks under the threshold model. Also the
    /// reference for the repair/replace cutoff under every model.
    #[serde(alias = "seuil_panne")]
    pub failure_threshold: f64,
    pub model: FailureModelConfig,
}

impl Default for FailureConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 20.0,
            model: FailureModelConfig::Threshold,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureModelConfig {
    /// Fail as soon as wear reaches `failure_threshold`.
    Threshold,
    /// Daily failure probability `1 - exp(-k * exp(c * wear))`.
    Hazard { k: f64, c: f64, max_exponent: f64 },
}

impl FailureModelConfig {
    pub fn default_hazard() -> Self {
        Self::Hazard {
            k: 0.001,
            c: 2.5,
            max_exponent: 100.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DetectorConfig {
    #[serde(alias = "seuil_alerte")]
    pub alert_threshold: f64,
    #[serde(alias = "sensibilite", alias = "fiabilite_detecteur")]
    pub sensitivity: f64,
    #[serde(alias = "specificite", alias = "specificite_detecteur")]
    pub specificity: f64,
    /// Standard deviation of the Gaussian noise on the recorded inspection
    /// score. `0` records the true wear and draws nothing.
    #[serde(alias = "score_bruit")]
    pub score_noise: f64,
    /// Lower bound applied to the recorded score.
    pub score_min: Option<f64>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            alert_threshold: 14.0,
            sensitivity: 0.90,
            specificity: 0.95,
            score_noise: 0.0,
            score_min: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    /// Corrective, then systematic, then inspection-driven maintenance.
    #[default]
    Precedence,
    /// Corrective replacement only; the baseline policy comparisons run against.
    RunToFailure,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum InspectionMode {
    /// Fleet-wide calendar: inspect when `day % interval == 0`.
    #[default]
    Calendar,
    /// Each unit keeps its own next-inspection day, armed at install.
    PerUnit,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum SystematicBasis {
    /// Replace once `day - last_maintenance_day >= interval`.
    #[default]
    SinceReplacement,
    /// Replace every unit on `day % interval == 0`.
    Calendar,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PolicyConfig {
    pub kind: PolicyKind,
    #[serde(alias = "frequence_inspection", alias = "frequence_insp")]
    pub inspection_interval: Option<u64>,
    pub inspection_mode: InspectionMode,
    #[serde(
        alias = "intervalle_systematique",
        alias = "remplacement_auto_jours",
        alias = "frequence_systematique"
    )]
    pub systematic_interval: Option<u64>,
    pub systematic_basis: SystematicBasis,
    #[serde(alias = "qualite_reparation", alias = "efficacite_reparation")]
    pub repair_quality: f64,
    /// Fraction of `failure_threshold` above which an alarm triggers a
    /// replacement instead of a repair. `None` always repairs.
    pub replace_cutoff: Option<f64>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            kind: PolicyKind::Precedence,
            inspection_interval: Some(15),
            inspection_mode: InspectionMode::Calendar,
            systematic_interval: Some(100),
            systematic_basis: SystematicBasis::SinceReplacement,
            repair_quality: 0.7,
            replace_cutoff: Some(0.9),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CostConfig {
    #[serde(alias = "cout_reparation")]
    pub repair_cost: f64,
    #[serde(alias = "cout_remplacement")]
    pub replacement_cost: f64,
    #[serde(alias = "cout_panne")]
    pub failure_cost: f64,
    #[serde(alias = "cout_inspection")]
    pub inspection_cost: f64,
}

impl Default for CostConfig {
    fn default() -> Self {
        Self {
            repair_cost: 400.0,
            replacement_cost: 1500.0,
            failure_cost: 5000.0,
            inspection_cost: 50.0,
        }
    }
}

/// Days a slot stays out of service after each kind of work.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct DowntimeConfig {
    pub repair_days: u64,
    pub replace_days: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_document_keeps_defaults() {
        let parsed: FleetConfig =
            serde_json::from_str(r#"{"n_assets": 3, "policy": {"systematic_interval": null}}"#)
                .expect("partial config parses");
        assert_eq!(parsed.n_assets, 3);
        assert_eq!(parsed.policy.systematic_interval, None);
        assert_eq!(parsed.policy.inspection_interval, Some(15));
        assert_eq!(parsed.costs, CostConfig::default());
    }

    #[test]
    fn legacy_option_names_are_accepted() {
        let parsed: FleetConfig = serde_json::from_str(
            r#"{
                "random_seed": 7,
                "n_systemes": 12,
                "wear": {"usure_moyenne": 0.003},
                "failure": {"seuil_panne": 2.0},
                "detector": {
                    "seuil_alerte": 1.0,
                    "sensibilite": 0.85,
                    "specificite": 0.9,
                    "score_bruit": 0.2
                },
                "policy": {"frequence_inspection": 30, "qualite_reparation": 0.5},
                "costs": {"cout_panne": 4000.0, "cout_remplacement": 1800.0}
            }"#,
        )
        .expect("legacy names parse");
        assert_eq!(parsed.seed, 7);
        assert_eq!(parsed.n_assets, 12);
        assert_eq!(parsed.wear.alpha, 0.003);
        assert_eq!(parsed.failure.failure_threshold, 2.0);
        assert_eq!(parsed.detector.sensitivity, 0.85);
        assert_eq!(parsed.detector.score_noise, 0.2);
        assert_eq!(parsed.detector.score_min, None);
        assert_eq!(parsed.policy.inspection_interval, Some(30));
        assert_eq!(parsed.policy.repair_quality, 0.5);
        assert_eq!(parsed.costs.failure_cost, 4000.0);
    }

    #[test]
    fn tagged_models_round_trip() {
        let mut config = FleetConfig::default();
        config.usage = UsageDistribution::LogNormal {
            mu: 1.2,
            sigma: 0.6,
        };
        config.wear.model = WearModel::Gamma { shape: 4.0 };
        config.failure.model = FailureModelConfig::default_hazard();

        let raw = serde_json::to_string(&config).expect("serialize");
        assert!(raw.contains(r#""kind":"log_normal""#));
        assert!(raw.contains(r#""seed":"42""#));
        let back: FleetConfig = serde_json::from_str(&raw).expect("deserialize");
        assert_eq!(back, config);
    }
}
