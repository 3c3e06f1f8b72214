use crate::{
    model::{EntropyBase, Params},
    util::Result,
};
use anyhow::anyhow;
use chrono::Datelike;
use clap::{ArgAction, ArgGroup, Parser, Subcommand};
use log::{Level, LevelFilter, Record};
use once_cell::sync::Lazy;
use owo_colors::{OwoColorize, Style};
use std::{
    collections::HashMap,
    io::Write,
    ops::Deref,
    path::{Path, PathBuf},
};

/// Full version string including the crate version and git description.
///
/// This version string is used in the command-line interface to provide detailed version information.
/// It includes the crate version from Cargo.toml and additional build information such as the git commit hash.
/// # Examples
/// * `0.1.0-1ba958a-dirty` - while on a dirty branch
/// * `0.1.0-1ba958a` - with a fresh commit
pub static FULL_VERSION: Lazy<String> = Lazy::new(|| {
    let git_describe = option_env!("VERGEN_GIT_DESCRIBE").unwrap_or_default();
    if !cfg!(has_git_describe) || git_describe.is_empty() {
        env!("CARGO_PKG_VERSION").to_string()
    } else {
        format!("{}-{}", env!("CARGO_PKG_VERSION"), git_describe)
    }
});

#[derive(Parser, Debug)]
#[command(name="lineage-tiers",
          author=env!("CARGO_PKG_AUTHORS"),
          version=&**FULL_VERSION,
          about="Ancestry, lineage sorting and admixture signals between a source and a recipient population",
          long_about = None,
          after_help = format!("Copyright (C) {}     lineage-tiers contributors
          This program comes with ABSOLUTELY NO WARRANTY; it is intended for
          research use on simulated data only.", chrono::Utc::now().year()),
          help_template = "{name} {version}\n{author}{about-section}\n{usage-heading}\n    {usage}\n\n{all-args}{after-help}",
          )]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Specify multiple times to increase verbosity level (e.g., -vv for more verbosity)
    #[arg(
        short = 'v',
        long = "verbose",
        action = ArgAction::Count,
        global = true
    )]
    pub verbosity: u8,

    /// Silence all output
    #[arg(
        long = "quiet",
        action = ArgAction::SetTrue,
        global = true,
        conflicts_with = "verbosity",
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Analyze all simulation runs found in a directory
    Batch(BatchArgs),
    /// Analyze a single pair of source and recipient population files
    Pair(PairArgs),
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Batch(_) => "batch",
            Command::Pair(_) => "pair",
        }
    }
}

#[derive(Parser, Debug, Clone)]
pub struct SharedArgs {
    /// Output tsv path, one row per analysis repetition
    #[arg(
        required = true,
        short = 'o',
        long = "out",
        value_name = "TSV",
        value_parser = check_prefix_path
    )]
    pub output_path: String,

    /// Output json path for the per-simulation signal proportions
    #[arg(long = "summary", value_name = "JSON", value_parser = check_prefix_path)]
    pub summary_path: Option<String>,

    #[arg(
        short = '@',
        value_name = "THREADS",
        default_value = "1",
        value_parser = threads_in_range
    )]
    pub num_threads: usize,

    /// Number of genomes sampled from each population per repetition
    #[arg(
        long = "sample-size",
        value_name = "SIZE",
        default_value = "10",
        value_parser = parse_positive
    )]
    pub sample_size: usize,

    /// Number of analysis repetitions per simulation
    #[arg(
        long = "repetitions",
        value_name = "N",
        default_value = "1",
        value_parser = parse_positive
    )]
    pub repetitions: usize,

    /// Seed for genome sampling
    #[arg(long = "seed", value_name = "SEED", default_value = "0")]
    pub seed: u64,

    /// Number of proportion bins used for the clumpiness entropy
    #[arg(
        help_heading("Advanced"),
        long = "bins",
        value_name = "BINS",
        default_value = "10",
        value_parser = bins_in_range
    )]
    pub num_bins: usize,

    /// Logarithm base of the clumpiness entropy
    #[arg(
        help_heading("Advanced"),
        long = "entropy-base",
        value_name = "BASE",
        value_enum,
        default_value_t = EntropyBase::Nats
    )]
    pub entropy_base: EntropyBase,
}

impl SharedArgs {
    pub fn params(&self) -> Params {
        Params {
            num_bins: self.num_bins,
            entropy_base: self.entropy_base,
            sample_size: self.sample_size,
            repetitions: self.repetitions,
            seed: self.seed,
        }
    }
}

impl Deref for BatchArgs {
    type Target = SharedArgs;

    fn deref(&self) -> &Self::Target {
        &self.shared
    }
}

impl Deref for PairArgs {
    type Target = SharedArgs;

    fn deref(&self) -> &Self::Target {
        &self.shared
    }
}

#[derive(Parser, Debug, Clone)]
#[command(group(ArgGroup::new("batch")))]
#[command(arg_required_else_help(true))]
pub struct BatchArgs {
    #[command(flatten)]
    pub shared: SharedArgs,

    /// Directory holding the simulated population files
    #[arg(
        required = true,
        short = 'd',
        long = "pop-dir",
        value_name = "DIR",
        value_parser = check_file_exists
    )]
    pub pop_dir: PathBuf,

    /// Simulation run id, files are matched as run_<RUN_ID>*pop*csv
    #[arg(
        long = "run-id",
        value_name = "RUN_ID",
        required_unless_present = "sim_params_path"
    )]
    pub run_id: Option<String>,

    /// Simulation parameters json, its `run_id` is used when --run-id is not given
    #[arg(
        long = "sim-params",
        value_name = "JSON",
        value_parser = check_file_exists
    )]
    pub sim_params_path: Option<PathBuf>,
}

#[derive(Parser, Debug, Clone)]
#[command(group(ArgGroup::new("pair")))]
#[command(arg_required_else_help(true))]
pub struct PairArgs {
    #[command(flatten)]
    pub shared: SharedArgs,

    /// Source population csv
    #[arg(
        required = true,
        short = 's',
        long = "source",
        value_name = "CSV",
        value_parser = check_file_exists
    )]
    pub source_path: PathBuf,

    /// Recipient population csv
    #[arg(
        required = true,
        short = 'r',
        long = "recipient",
        value_name = "CSV",
        value_parser = check_file_exists
    )]
    pub recipient_path: PathBuf,
}

/// Initializes the verbosity level for logging based on the command-line arguments.
///
/// Sets up the logger with a specific verbosity level that is determined
/// by the number of occurrences of the `-v` or `--verbose` flag in the command-line arguments.
///
/// # Arguments
///
/// * `args` - A reference to the parsed command-line arguments.
pub fn init_verbose(args: &Cli) {
    let filter_level: LevelFilter = if args.quiet {
        LevelFilter::Off
    } else {
        match args.verbosity {
            0 => LevelFilter::Info,  // -v
            1 => LevelFilter::Debug, // -vv
            _ => LevelFilter::Trace, // -vvv or more
        }
    };

    env_logger::Builder::from_default_env()
        .format(format_log)
        .filter_level(filter_level)
        .init();
}

static LEVEL_STYLES: Lazy<HashMap<Level, (&'static str, Style)>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert(Level::Error, ("ERROR", Style::new().red()));
    m.insert(Level::Warn, ("WARN", Style::new().yellow()));
    m.insert(Level::Info, ("INFO", Style::new().green()));
    m.insert(Level::Debug, ("DEBUG", Style::new().blue()));
    m.insert(Level::Trace, ("TRACE", Style::new().magenta()));
    m
});

fn format_log(buf: &mut env_logger::fmt::Formatter, record: &Record) -> std::io::Result<()> {
    let (level_text, style) = LEVEL_STYLES
        .get(&record.level())
        .copied()
        .unwrap_or(("LOG", Style::new()));
    let level_str = level_text.style(style).to_string();
    writeln!(
        buf,
        "{} [{}] - {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        level_str,
        record.args()
    )
}

/// Checks if the parent directory of the provided output path exists.
///
/// # Arguments
///
/// * `s` - A string slice representing the output path to check.
///
/// # Returns
///
/// Returns a `Result<String>` which is Ok if the parent directory exists, or an Err with a descriptive message if not.
fn check_prefix_path(s: &str) -> Result<String> {
    let path = Path::new(s);
    if let Some(parent_dir) = path.parent() {
        if !parent_dir.as_os_str().is_empty() && !parent_dir.exists() {
            return Err(anyhow!("Path does not exist: {}", parent_dir.display()));
        }
    }
    Ok(s.to_string())
}

/// Validates that the provided string represents a valid number of threads.
///
/// # Arguments
///
/// * `s` - A string slice representing the number of threads.
///
/// # Returns
///
/// Returns a `Result<usize>` which is Ok if the number is valid, or an Err with a descriptive message if not.
fn threads_in_range(s: &str) -> Result<usize> {
    let thread: usize = s
        .parse::<usize>()
        .map_err(|_| anyhow!("`{}` is not a valid thread number", s))?;
    if thread == 0 {
        return Err(anyhow!("Number of threads must be >= 1"));
    }
    Ok(thread)
}

/// Parses a strictly positive integer, used for sample sizes and repetitions.
fn parse_positive(s: &str) -> Result<usize> {
    let value: usize = s
        .parse::<usize>()
        .map_err(|_| anyhow!("`{}` is not a valid positive integer", s))?;
    if value == 0 {
        return Err(anyhow!("Value must be >= 1"));
    }
    Ok(value)
}

/// Upper bound on `--bins`.
const MAX_BINS: usize = 1_000_000;

/// Parses the number of proportion bins, which must lie in `[1, MAX_BINS]`.
fn bins_in_range(s: &str) -> Result<usize> {
    let bins: usize = s
        .parse::<usize>()
        .map_err(|_| anyhow!("`{}` is not a valid number of bins", s))?;
    if !(1..=MAX_BINS).contains(&bins) {
        return Err(anyhow!(
            "Number of bins must be between 1 and {}, got: {}",
            MAX_BINS,
            bins
        ));
    }
    Ok(bins)
}

/// Checks if the provided file path exists.
///
/// # Arguments
///
/// * `s` - A string slice representing the file path to check.
///
/// # Returns
///
/// Returns a `Result<PathBuf>` which is Ok if the file exists, or an Err with a descriptive message if not.
fn check_file_exists(s: &str) -> Result<PathBuf> {
    let path = Path::new(s);
    if !path.exists() {
        return Err(anyhow!("File does not exist: {}", path.display()));
    }
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_positive_ok() {
        assert_eq!(parse_positive("10").unwrap(), 10);
    }

    #[test]
    fn parse_positive_zero_err() {
        assert_eq!(
            parse_positive("0").unwrap_err().to_string(),
            "Value must be >= 1".to_string()
        );
    }

    #[test]
    fn parse_positive_negative_err() {
        assert_eq!(
            parse_positive("-3").unwrap_err().to_string(),
            "`-3` is not a valid positive integer".to_string()
        );
    }

    #[test]
    fn bins_in_range_bounds() {
        assert_eq!(bins_in_range("1").unwrap(), 1);
        assert_eq!(bins_in_range("1000000").unwrap(), 1_000_000);
        assert_eq!(
            bins_in_range("0").unwrap_err().to_string(),
            "Number of bins must be between 1 and 1000000, got: 0".to_string()
        );
        assert_eq!(
            bins_in_range("1000001").unwrap_err().to_string(),
            "Number of bins must be between 1 and 1000000, got: 1000001".to_string()
        );
    }

    #[test]
    fn threads_in_range_zero_err() {
        assert!(threads_in_range("0").is_err());
        assert_eq!(threads_in_range("4").unwrap(), 4);
    }

    #[test]
    fn cli_pair_params() {
        let dir = std::env::temp_dir();
        let dir = dir.to_str().unwrap();
        let cli = Cli::try_parse_from([
            "lineage-tiers",
            "pair",
            "-s",
            dir,
            "-r",
            dir,
            "-o",
            "out.tsv",
            "--bins",
            "4",
            "--entropy-base",
            "bits",
        ])
        .unwrap();
        match cli.command {
            Command::Pair(args) => {
                let params = args.params();
                assert_eq!(params.num_bins, 4);
                assert_eq!(params.entropy_base, EntropyBase::Bits);
                assert_eq!(params.sample_size, 10);
                assert_eq!(params.repetitions, 1);
            }
            Command::Batch(_) => panic!("expected pair command"),
        }
    }

    #[test]
    fn cli_rejects_zero_bins() {
        let dir = std::env::temp_dir();
        let dir = dir.to_str().unwrap();
        let res = Cli::try_parse_from([
            "lineage-tiers", "pair", "-s", dir, "-r", dir, "-o", "out.tsv", "--bins", "0",
        ]);
        assert!(res.is_err());
    }

    #[test]
    fn cli_rejects_huge_bins() {
        let dir = std::env::temp_dir();
        let dir = dir.to_str().unwrap();
        let err = Cli::try_parse_from([
            "lineage-tiers",
            "pair",
            "-s",
            dir,
            "-r",
            dir,
            "-o",
            "out.tsv",
            "--bins",
            "18446744073709551615",
        ])
        .unwrap_err();
        assert!(err
            .to_string()
            .contains("Number of bins must be between 1 and 1000000"));
    }

    #[test]
    fn cli_batch_requires_run_id_or_sim_params() {
        let dir = std::env::temp_dir();
        let dir = dir.to_str().unwrap();
        assert!(Cli::try_parse_from(["lineage-tiers", "batch", "-d", dir, "-o", "out.tsv"]).is_err());

        let cli = Cli::try_parse_from([
            "lineage-tiers",
            "batch",
            "-d",
            dir,
            "-o",
            "out.tsv",
            "--sim-params",
            dir,
        ])
        .unwrap();
        match cli.command {
            Command::Batch(args) => {
                assert_eq!(args.run_id, None);
                assert!(args.sim_params_path.is_some());
            }
            Command::Pair(_) => panic!("expected batch command"),
        }
    }

    #[test]
    fn help_credits_contributors() {
        use clap::CommandFactory;
        let help = Cli::command().render_long_help().to_string();
        assert!(help.contains("lineage-tiers contributors"));
        assert!(!help.contains("Pacific Biosciences"));
    }
}
