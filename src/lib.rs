pub mod cli;
pub mod commands;
pub mod genome;
pub mod math;
pub mod model;
pub mod population;
pub mod readers;
pub mod stats;
pub mod tiers;
pub mod tree;
pub mod util;
