use super::*;

impl FleetSimulator {
    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }

    pub fn asset(&self, slot: u32) -> Option<&Asset> {
        self.assets.get(slot as usize)
    }

    pub fn snapshot(&self) -> FleetSnapshot {
        let day = self.status.current_day;
        FleetSnapshot {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            run_id: self.status.run_id.clone(),
            day,
            snapshot_id: format!("snap:{}:{day:06}", self.status.run_id),
            assets: self.assets.iter().map(Asset::snapshot).collect(),
            event_count: self.event_log.len() as u64,
            total_cost: self.event_log.total_cost(),
            replay_hash: format!("{:016x}", self.replay_hash),
        }
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            run_id: self.status.run_id.clone(),
            seed: self.config.seed,
            days_simulated: self.status.current_day,
            n_assets: self.config.n_assets,
            replay_hash: format!("{:016x}", self.replay_hash),
            ..ledger::summarize(self.event_log.events(), self.quiet_asset_days)
        }
    }
}
