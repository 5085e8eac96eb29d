use super::*;
use rayon::prelude::*;

impl FleetSimulator {
    /// Ticks every slot for `day`. Results come back in slot order whether
    /// or not the worker pool is used.
    pub(super) fn tick_assets(&mut self, day: u64) -> Vec<TickOutcome> {
        let Self {
            assets,
            model,
            worker_pool,
            worker_threads,
            ..
        } = self;
        let model: &MaintenanceModel = model;

        if *worker_threads <= 1 || assets.len() <= 1 {
            return assets
                .iter_mut()
                .map(|asset| asset.tick(day, model))
                .collect();
        }
        if let Some(pool) = worker_pool.as_ref() {
            pool.install(|| {
                assets
                    .par_iter_mut()
                    .map(|asset| asset.tick(day, model))
                    .collect::<Vec<_>>()
            })
        } else {
            assets
                .iter_mut()
                .map(|asset| asset.tick(day, model))
                .collect()
        }
    }
}
