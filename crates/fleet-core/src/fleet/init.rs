use super::*;

impl FleetSimulator {
    pub fn new(config: FleetConfig) -> Result<Self, ConfigError> {
        let model = MaintenanceModel::from_config(&config)?;
        Self::with_model(config, model)
    }

    /// Uses `model` in place of the strategies named by `config`. The rest of
    /// the configuration (fleet size, horizon, seed) still has to validate.
    pub fn with_model(config: FleetConfig, model: MaintenanceModel) -> Result<Self, ConfigError> {
        crate::validate::validate_config(&config)?;

        let status = RunStatus {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            run_id: config.run_id.clone(),
            current_day: 0,
            max_days: config.n_days,
        };

        let mut assets = Vec::with_capacity(config.n_assets as usize);
        let mut install_history = Vec::with_capacity(config.n_assets as usize);
        for slot in 0..config.n_assets {
            let mut asset = Asset::install(contracts::AssetId::first(slot), 0, config.seed);
            asset.next_inspection_day = model.policy.arm_inspection(0);
            install_history.push(InstallRecord::installed(asset.id, 0));
            assets.push(asset);
        }
        let active_install = (0..install_history.len()).collect();

        let worker_threads = config.worker_threads.max(1);
        let worker_pool = if worker_threads > 1 {
            rayon::ThreadPoolBuilder::new()
                .num_threads(worker_threads)
                .build()
                .ok()
        } else {
            None
        };

        info!(
            run_id = %config.run_id,
            seed = config.seed,
            n_assets = config.n_assets,
            n_days = config.n_days,
            policy = model.policy.label(),
            wear = model.wear.label(),
            failure = model.failure.label(),
            worker_threads,
            "fleet initialised"
        );

        Ok(Self {
            config,
            status,
            model,
            assets,
            event_log: EventLog::new(),
            install_history,
            active_install,
            replay_hash: 0,
            quiet_asset_days: 0,
            worker_threads,
            worker_pool,
            last_step_metrics: StepMetrics::default(),
        })
    }
}
