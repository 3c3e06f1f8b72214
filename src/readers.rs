use crate::{
    genome::{Genome, MutationId},
    population::Population,
    util::{self, Result},
};
use anyhow::{anyhow, bail, Context};
use glob::MatchOptions;
use serde::Deserialize;
use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

const MUTATION_DELIMITER: char = ';';

/// One row of a population file: a genome and its `;`-separated mutation ids.
#[derive(Debug, Deserialize)]
struct GenomeRecord {
    genome: String,
    mutations: String,
}

fn parse_mutations(field: &str) -> Result<Vec<MutationId>> {
    field
        .split(MUTATION_DELIMITER)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<MutationId>()
                .map_err(|_| anyhow!("Invalid mutation id: {}", s))
        })
        .collect()
}

/// Reads a population CSV file with columns `genome,mutations`.
pub fn read_population(path: &Path) -> Result<Population> {
    util::try_exists(path)?;
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Failed to open population file {}", path.display()))?;

    let mut genomes = Vec::new();
    for (i, record) in reader.deserialize::<GenomeRecord>().enumerate() {
        let record = record.with_context(|| {
            format!("Failed to read record {} of {}", i + 1, path.display())
        })?;
        let mutations = parse_mutations(&record.mutations).with_context(|| {
            format!("Genome {} in {}", record.genome, path.display())
        })?;
        genomes.push(Genome::new(mutations));
    }

    if genomes.is_empty() {
        bail!("Population file contains no genomes: {}", path.display());
    }
    log::debug!("Read {} genomes from {}", genomes.len(), path.display());
    Ok(Population::from_genomes(genomes))
}

/// Finds the population files of a simulation run and pairs them up.
///
/// Matches `run_<run_id>*pop*csv` in `dir`. File names containing `source`
/// and `recipient` are sorted separately and zipped, so the i-th source file is
/// analyzed with the i-th recipient file.
pub fn find_population_pairs(dir: &Path, run_id: &str) -> Result<Vec<(PathBuf, PathBuf)>> {
    let pattern = dir.join(format!("run_{}*pop*csv", glob::Pattern::escape(run_id)));
    let pattern = pattern
        .to_str()
        .ok_or_else(|| anyhow!("Invalid path: {}", pattern.display()))?;

    let options = MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: false,
    };

    let mut source_files = Vec::new();
    let mut recipient_files = Vec::new();
    for entry in glob::glob_with(pattern, options)? {
        let path = entry?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        if name.contains("source") {
            source_files.push(path);
        } else if name.contains("recipient") {
            recipient_files.push(path);
        } else {
            log::warn!("Skipping population file of unknown role: {}", path.display());
        }
    }

    if source_files.is_empty() && recipient_files.is_empty() {
        bail!("No population files match {}", pattern);
    }
    if source_files.len() != recipient_files.len() {
        bail!(
            "Unpaired population files for run {}: {} source vs {} recipient",
            run_id,
            source_files.len(),
            recipient_files.len()
        );
    }

    source_files.sort();
    recipient_files.sort();
    Ok(source_files.into_iter().zip(recipient_files).collect())
}

/// Reads the `run_id` of a simulation parameters json, given as a string or an integer.
pub fn read_run_id(path: &Path) -> Result<String> {
    util::try_exists(path)?;
    let file = File::open(path)
        .with_context(|| format!("Failed to open simulation parameters {}", path.display()))?;
    let params: serde_json::Value = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse simulation parameters {}", path.display()))?;
    match params.get("run_id") {
        Some(serde_json::Value::String(id)) if !id.is_empty() => Ok(id.clone()),
        Some(serde_json::Value::Number(id)) if id.is_u64() => Ok(id.to_string()),
        Some(other) => bail!("Invalid run_id in {}: {}", path.display(), other),
        None => bail!("Missing run_id in {}", path.display()),
    }
}
