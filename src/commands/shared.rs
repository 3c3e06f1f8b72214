use crate::{
    model::Params,
    population::Population,
    readers::read_population,
    stats::{self, RepetitionRow},
    tree::Tree,
};
use anyhow::{anyhow, Context, Result};
use crossbeam_channel::{unbounded, Receiver, Sender};
use csv::{Writer, WriterBuilder};
use log;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::{
    iter::{IntoParallelRefIterator, ParallelIterator},
    ThreadPoolBuilder,
};
use std::{
    fs::File,
    io::Write,
    path::{Path, PathBuf},
    thread,
};

pub trait Args {
    fn params(&self) -> Params;
    fn output_path(&self) -> &str;
    fn summary_path(&self) -> Option<&str>;
    fn num_threads(&self) -> usize;
    fn mode_name(&self) -> &str;
    /// Source and recipient population files of every simulation to analyze.
    fn simulation_paths(&self) -> Result<Vec<(PathBuf, PathBuf)>>;
}

/// Populations of one simulation run.
pub struct Simulation {
    pub index: usize,
    pub source_file: String,
    pub recipient_file: String,
    pub source: Population,
    pub recipient: Population,
}

impl Simulation {
    pub fn load(index: usize, source_path: &Path, recipient_path: &Path) -> Result<Self> {
        Ok(Self {
            index,
            source_file: file_label(source_path),
            recipient_file: file_label(recipient_path),
            source: read_population(source_path)?,
            recipient: read_population(recipient_path)?,
        })
    }
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// SplitMix64 finalizer.
fn splitmix64(state: u64) -> u64 {
    let mut z = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

/// Seed of one repetition, so results do not depend on scheduling.
///
/// Every component passes through the mixer before the next is folded in,
/// so neighbouring user seeds do not share repetition streams.
fn repetition_seed(seed: u64, simulation: usize, repetition: usize) -> u64 {
    [simulation as u64, repetition as u64]
        .into_iter()
        .fold(splitmix64(seed), |state, value| splitmix64(state ^ value))
}

/// Samples both populations, builds the tree on the first drawn genomes and runs all tiers.
pub fn process_repetition(
    simulation: &Simulation,
    repetition: usize,
    params: &Params,
) -> Result<RepetitionRow> {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(repetition_seed(
        params.seed,
        simulation.index,
        repetition,
    ));
    let source_sample = simulation.source.sample(params.sample_size, &mut rng);
    let recipient_sample = simulation.recipient.sample(params.sample_size, &mut rng);

    let source_genome = source_sample
        .genomes()
        .first()
        .ok_or_else(|| anyhow!("Empty source population: {}", simulation.source_file))?;
    let recipient_genome = recipient_sample
        .genomes()
        .first()
        .ok_or_else(|| anyhow!("Empty recipient population: {}", simulation.recipient_file))?;

    let tree = Tree::new(
        source_genome,
        recipient_genome,
        &source_sample,
        &recipient_sample,
    )?;
    let report = tree.report(params);
    log::debug!(
        "Simulation {} repetition {}: {:?}",
        simulation.index + 1,
        repetition + 1,
        report
    );

    Ok(RepetitionRow::new(
        simulation.index,
        repetition,
        simulation.source_file.clone(),
        simulation.recipient_file.clone(),
        &report,
    ))
}

pub fn run<A: Args + Sync>(args: A) -> Result<()> {
    let params = args.params();
    log::debug!("Mode: {}, parameters: {:?}", args.mode_name(), params);

    let simulations = args
        .simulation_paths()?
        .iter()
        .enumerate()
        .map(|(index, (source_path, recipient_path))| {
            log::info!(
                "Simulation {}: {} & {}",
                index + 1,
                source_path.display(),
                recipient_path.display()
            );
            Simulation::load(index, source_path, recipient_path)
        })
        .collect::<Result<Vec<_>>>()?;

    let jobs: Vec<(&Simulation, usize)> = simulations
        .iter()
        .flat_map(|sim| (0..params.repetitions).map(move |rep| (sim, rep)))
        .collect();

    let tsv_writer = WriterBuilder::new()
        .delimiter(b'\t')
        .from_path(args.output_path())
        .with_context(|| format!("Failed to create output file {}", args.output_path()))?;
    let (sender_result, receiver_result) = unbounded();
    let writer_thread = process_writer_thread(tsv_writer, receiver_result);

    if args.num_threads() == 1 {
        log::debug!("Single-threaded mode");
        for (simulation, repetition) in &jobs {
            process_job(simulation, *repetition, &params, &sender_result);
        }
    } else {
        log::debug!(
            "Multi-threaded mode: estimated available cores: {}",
            thread::available_parallelism().map_or(1, |n| n.get())
        );
        let pool = initialize_thread_pool(args.num_threads())?;
        pool.install(|| {
            jobs.par_iter()
                .for_each_with(sender_result.clone(), |s, (simulation, repetition)| {
                    process_job(simulation, *repetition, &params, s)
                });
        });
    }
    drop(sender_result);

    let mut rows = writer_thread
        .join()
        .map_err(|_| anyhow!("Writer thread panicked"))??;
    rows.sort_by_key(|row| (row.simulation, row.repetition));
    log::info!(
        "Analyzed {} of {} repetition(s)",
        rows.len(),
        jobs.len()
    );

    if let Some(summary_path) = args.summary_path() {
        write_summary(summary_path, &rows)?;
    }
    Ok(())
}

fn process_job(
    simulation: &Simulation,
    repetition: usize,
    params: &Params,
    sender_result: &Sender<RepetitionRow>,
) {
    match process_repetition(simulation, repetition, params) {
        Ok(row) => {
            if sender_result.send(row).is_err() {
                log::error!("Result channel closed before all repetitions were processed");
            }
        }
        Err(err) => log::error!(
            "Repetition Processing (simulation {}, repetition {}): {:#}",
            simulation.index + 1,
            repetition + 1,
            err
        ),
    }
}

/// Writes rows as they arrive and returns the written ones.
///
/// Fails if any row or the final flush could not be written.
fn process_writer_thread<T: Write + Send + 'static>(
    mut tsv_writer: Writer<T>,
    receiver: Receiver<RepetitionRow>,
) -> thread::JoinHandle<Result<Vec<RepetitionRow>>> {
    thread::spawn(move || {
        let mut rows = Vec::new();
        let mut failed = 0usize;
        for row in &receiver {
            match tsv_writer.serialize(&row) {
                Ok(()) => rows.push(row),
                Err(err) => {
                    log::error!(
                        "Failed to write record (simulation {}, repetition {}): {}",
                        row.simulation + 1,
                        row.repetition + 1,
                        err
                    );
                    failed += 1;
                }
            }
        }
        tsv_writer.flush().context("Failed to flush output")?;
        log::trace!("All data processed, exiting writer thread.");
        if failed > 0 {
            return Err(anyhow!(
                "Failed to write {} of {} record(s)",
                failed,
                failed + rows.len()
            ));
        }
        Ok(rows)
    })
}

fn write_summary(path: &str, rows: &[RepetitionRow]) -> Result<()> {
    let summary = stats::summarize(rows);
    let file =
        File::create(path).with_context(|| format!("Failed to create summary file {}", path))?;
    serde_json::to_writer_pretty(file, &summary)
        .with_context(|| format!("Failed to write summary file {}", path))?;
    log::info!("Wrote summary of {} simulation(s) to {}", summary.len(), path);
    Ok(())
}

fn initialize_thread_pool(num_threads: usize) -> Result<rayon::ThreadPool> {
    log::info!("Starting job pool with {} thread(s)...", num_threads);
    ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build()
        .map_err(|e| anyhow!("Failed to initialize thread pool: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genome::Genome;

    fn simulation() -> Simulation {
        Simulation {
            index: 0,
            source_file: "run_1_source_pop.csv".to_string(),
            recipient_file: "run_1_recipient_pop.csv".to_string(),
            source: Population::from_genomes(vec![
                Genome::new([1, 2, 3, 4, 8]),
                Genome::new([1, 2, 3, 4, 5]),
                Genome::new([1, 3]),
            ]),
            recipient: Population::from_genomes(vec![
                Genome::new([1, 2, 3, 7]),
                Genome::new([1, 2, 3, 4, 5]),
                Genome::new([1, 2, 4]),
            ]),
        }
    }

    struct FailingSink;

    impl Write for FailingSink {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "disk full"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "disk full"))
        }
    }

    #[test]
    fn repetition_seed_distinct() {
        assert_ne!(repetition_seed(0, 0, 1), repetition_seed(0, 1, 0));
        assert_eq!(repetition_seed(7, 2, 3), repetition_seed(7, 2, 3));
    }

    #[test]
    fn repetition_seed_neighbouring_seeds_do_not_overlap() {
        assert_ne!(repetition_seed(1, 0, 0), repetition_seed(0, 0, 1));
        assert_ne!(repetition_seed(1, 0, 0), repetition_seed(0, 1, 0));
        let seeds: std::collections::HashSet<u64> = (0..4)
            .flat_map(|seed| (0..4).flat_map(move |sim| (0..4).map(move |rep| (seed, sim, rep))))
            .map(|(seed, sim, rep)| repetition_seed(seed, sim, rep))
            .collect();
        assert_eq!(seeds.len(), 64);
    }

    #[test]
    fn writer_thread_returns_written_rows() {
        let row = process_repetition(&simulation(), 0, &Params::default()).unwrap();
        let (sender, receiver) = unbounded();
        let handle = process_writer_thread(WriterBuilder::new().from_writer(Vec::new()), receiver);
        sender.send(row.clone()).unwrap();
        drop(sender);
        let rows = handle.join().unwrap().unwrap();
        assert_eq!(rows, vec![row]);
    }

    #[test]
    fn writer_thread_fails_when_output_cannot_be_written() {
        let row = process_repetition(&simulation(), 0, &Params::default()).unwrap();
        let (sender, receiver) = unbounded();
        let handle = process_writer_thread(
            WriterBuilder::new().buffer_capacity(1).from_writer(FailingSink),
            receiver,
        );
        sender.send(row).unwrap();
        drop(sender);
        assert!(handle.join().unwrap().is_err());
    }

    #[test]
    fn process_repetition_reproducible() {
        let sim = simulation();
        let params = Params::default();
        let first = process_repetition(&sim, 3, &params).unwrap();
        let second = process_repetition(&sim, 3, &params).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.simulation, 0);
        assert_eq!(first.repetition, 3);
        assert_eq!(first.source_file, "run_1_source_pop.csv");
    }
}
