use crate::{
    cli::PairArgs,
    commands::shared::{self, Args},
    model::Params,
};
use anyhow::Result;
use std::path::PathBuf;

impl Args for PairArgs {
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
        "pair"
    }
    fn simulation_paths(&self) -> Result<Vec<(PathBuf, PathBuf)>> {
        Ok(vec![(self.source_path.clone(), self.recipient_path.clone())])
    }
}

pub fn pair(args: PairArgs) -> Result<()> {
    shared::run(args)
}
