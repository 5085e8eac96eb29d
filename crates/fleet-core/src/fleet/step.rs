use super::*;

impl FleetSimulator {
    pub fn run_id(&self) -> &str {
        &self.status.run_id
    }

    pub fn config(&self) -> &FleetConfig {
        &self.config
    }

    pub fn model(&self) -> &MaintenanceModel {
        &self.model
    }

    pub fn status(&self) -> &RunStatus {
        &self.status
    }

    pub fn current_day(&self) -> u64 {
        self.status.current_day
    }

    pub fn events(&self) -> &[Event] {
        self.event_log.events()
    }

    pub fn event_log(&self) -> &EventLog {
        &self.event_log
    }

    pub fn install_history(&self) -> &[InstallRecord] {
        &self.install_history
    }

    pub fn total_cost(&self) -> f64 {
        self.event_log.total_cost()
    }

    pub fn replay_hash(&self) -> u64 {
        self.replay_hash
    }

    pub fn last_step_metrics(&self) -> StepMetrics {
        self.last_step_metrics
    }

    /// Advances the fleet by one day. Returns `false` once the horizon is
    /// reached.
    pub fn step(&mut self) -> bool {
        self.last_step_metrics = StepMetrics::default();
        if self.status.is_complete() {
            return false;
        }
        let day = self.status.current_day.saturating_add(1);
        self.status.current_day = day;

        let outcomes = self.tick_assets(day);
        let mut metrics = StepMetrics {
            day,
            ..StepMetrics::default()
        };
        for outcome in outcomes {
            match outcome {
                TickOutcome::Busy => metrics.busy_assets += 1,
                TickOutcome::Quiet => metrics.quiet_assets += 1,
                TickOutcome::Acted(record) => {
                    metrics.events += 1;
                    if record.replacement.is_some() {
                        metrics.replacements += 1;
                    }
                    self.commit_record(day, record);
                }
            }
        }
        self.quiet_asset_days += metrics.quiet_assets;
        self.last_step_metrics = metrics;

        if self.status.is_complete() {
            info!(
                run_id = %self.status.run_id,
                days = day,
                events = self.event_log.len(),
                total_cost = self.event_log.total_cost(),
                "run complete"
            );
        }
        true
    }

    pub fn step_n(&mut self, days: u64) -> u64 {
        let mut advanced = 0;
        for _ in 0..days {
            if !self.step() {
                break;
            }
            advanced += 1;
        }
        advanced
    }

    pub fn run_to_day(&mut self, day: u64) -> u64 {
        let target = day.min(self.status.max_days);
        let mut advanced = 0;
        while self.status.current_day < target {
            if !self.step() {
                break;
            }
            advanced += 1;
        }
        advanced
    }

    /// Runs the remaining days and hands back the log and its folds.
    pub fn run(mut self) -> RunOutcome {
        while self.step() {}
        let summary = self.summary();
        RunOutcome {
            total_cost: self.event_log.total_cost(),
            event_log: self.event_log,
            install_history: self.install_history,
            summary,
        }
    }

    fn commit_record(&mut self, day: u64, record: MaintenanceRecord) {
        let slot = record.asset_id.slot;
        let event = Event {
            day,
            sequence: self.event_log.len() as u64,
            slot,
            asset_id: record.asset_id,
            event_type: record.event_type,
            wear_at_event: record.wear_at_event,
            cost: record.cost,
            detection: record.detection,
            measurement: record.measurement,
        };
        self.replay_hash = mix_replay_hash(self.replay_hash, &event);
        debug!(
            day,
            slot,
            asset = %event.asset_id,
            event_type = event.event_type.as_str(),
            wear = event.wear_at_event,
            cost = event.cost,
            "maintenance event"
        );
        if let Some((installed, trigger)) = record.replacement {
            self.record_install(slot, day, installed, trigger);
        }
        self.event_log.append(event);
    }

    fn record_install(
        &mut self,
        slot: u32,
        day: u64,
        installed: contracts::AssetId,
        trigger: ReplaceTrigger,
    ) {
        let slot_index = slot as usize;
        if let Some(retired) = self
            .active_install
            .get(slot_index)
            .and_then(|index| self.install_history.get_mut(*index))
        {
            retired.retired_day = Some(day);
            retired.retire_trigger = Some(trigger);
        }
        self.install_history
            .push(InstallRecord::installed(installed, day));
        if let Some(active) = self.active_install.get_mut(slot_index) {
            *active = self.install_history.len() - 1;
        }
    }
}
