use clap::Parser;
use lineage_tiers::{
    cli::{init_verbose, Cli, Command},
    commands::{batch, pair},
    util::handle_error_and_exit,
};

fn main() {
    let cli = Cli::parse();
    init_verbose(&cli);
    log::debug!("Running {}", cli.command.name());
    let result = match cli.command {
        Command::Batch(args) => batch(args),
        Command::Pair(args) => pair(args),
    };
    if let Err(err) = result {
        handle_error_and_exit(err);
    }
}
