//! Sampled populations and their per-mutation sample frequencies.

use crate::{
    genome::{Genome, MutationId, MutationSet},
    util::{check_proportion, Result},
};
use anyhow::anyhow;
use indexmap::IndexMap;
use rand::{seq::index, Rng};
use std::collections::HashMap;

/// Read access to the fraction of sampled genomes carrying a mutation.
///
/// `None` means the mutation was not observed in the sample.
pub trait SampleFrequencies {
    fn proportion(&self, mutation: &MutationId) -> Option<f64>;
}

#[derive(Debug, Clone, Default)]
pub struct Population {
    genomes: Vec<Genome>,
    sample_snps: IndexMap<MutationId, f64>,
}

impl Population {
    /// Builds a population and derives `sample_snps` from its genomes.
    pub fn from_genomes(genomes: Vec<Genome>) -> Self {
        let mut counts: IndexMap<MutationId, usize> = IndexMap::new();
        for genome in &genomes {
            for mutation in genome.mutations() {
                *counts.entry(*mutation).or_insert(0) += 1;
            }
        }

        let num_genomes = genomes.len() as f64;
        let sample_snps = counts
            .into_iter()
            .map(|(mutation, count)| (mutation, count as f64 / num_genomes))
            .collect();

        Self {
            genomes,
            sample_snps,
        }
    }

    /// Builds a population from an externally computed frequency table.
    ///
    /// Every proportion must lie in `[0, 1]`.
    pub fn with_sample_snps(
        genomes: Vec<Genome>,
        sample_snps: IndexMap<MutationId, f64>,
    ) -> Result<Self> {
        for (mutation, proportion) in &sample_snps {
            check_proportion(*proportion)
                .map_err(|e| anyhow!("Invalid sample frequency for mutation {}: {}", mutation, e))?;
        }
        Ok(Self {
            genomes,
            sample_snps,
        })
    }

    /// Draws `sample_size` genomes without replacement and recomputes frequencies on the draw.
    ///
    /// The drawn genomes are in random order. If `sample_size` is at least the
    /// population size, the whole population is returned shuffled.
    pub fn sample<R: Rng + ?Sized>(&self, sample_size: usize, rng: &mut R) -> Population {
        let amount = sample_size.min(self.genomes.len());
        let drawn = index::sample(rng, self.genomes.len(), amount)
            .iter()
            .map(|i| self.genomes[i].clone())
            .collect();
        Population::from_genomes(drawn)
    }

    pub fn genomes(&self) -> &[Genome] {
        &self.genomes
    }

    pub fn sample_snps(&self) -> &IndexMap<MutationId, f64> {
        &self.sample_snps
    }

    pub fn len(&self) -> usize {
        self.genomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genomes.is_empty()
    }
}

impl SampleFrequencies for Population {
    fn proportion(&self, mutation: &MutationId) -> Option<f64> {
        self.sample_snps.get(mutation).copied()
    }
}

impl SampleFrequencies for IndexMap<MutationId, f64> {
    fn proportion(&self, mutation: &MutationId) -> Option<f64> {
        self.get(mutation).copied()
    }
}

impl SampleFrequencies for HashMap<MutationId, f64> {
    fn proportion(&self, mutation: &MutationId) -> Option<f64> {
        self.get(mutation).copied()
    }
}
