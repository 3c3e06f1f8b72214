use crate::{
    cli::BatchArgs,
    commands::shared::{self, Args},
    model::Params,
    readers::{find_population_pairs, read_run_id},
};
use anyhow::{anyhow, Result};
use std::path::PathBuf;

impl Args for BatchArgs {
    fn params(&self) -> Params {
        self.shared.params()
    }
    fn output_path(&self) -> &str {
        &self.output_path
    }
    fn summary_path(&self) -> Option<&str> {
        self.summary_path.as_deref()
    }
    fn num_threads(&self) -> usize {
        self.num_threads
    }
    fn mode_name(&self) -> &str {
        "batch"
    }
    fn simulation_paths(&self) -> Result<Vec<(PathBuf, PathBuf)>> {
        let run_id = match (&self.run_id, &self.sim_params_path) {
            (Some(run_id), _) => run_id.clone(),
            (None, Some(path)) => {
                let run_id = read_run_id(path)?;
                log::debug!("Run id {} from {}", run_id, path.display());
                run_id
            }
            (None, None) => return Err(anyhow!("Either --run-id or --sim-params is required")),
        };
        let pairs = find_population_pairs(&self.pop_dir, &run_id)?;
        log::info!(
            "Found {} simulation(s) for run {} in {}",
            pairs.len(),
            run_id,
            self.pop_dir.display()
        );
        Ok(pairs)
    }
}

pub fn batch(args: BatchArgs) -> Result<()> {
    shared::run(args)
}
