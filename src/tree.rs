//! Partitioning of two reference genomes into ancestry branches, and annotation
//! of every branch mutation with its sample frequency in both populations.
//!
//! A [`Tree`] is built once per (source genome, recipient genome, source
//! population, recipient population) and is immutable afterwards; the tier
//! checks only read it.

use crate::{
    genome::{MutationId, MutationSet},
    model::{Params, Side},
    population::SampleFrequencies,
    tiers::{self, CompositeClumpiness, Tier1Result, Tier2Result, TreeReport},
    util::{check_proportion, Result},
};
use anyhow::anyhow;
use indexmap::{IndexMap, IndexSet};
use serde::Serialize;

/// Sample frequencies of one mutation in the source and recipient populations.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Proportions {
    pub source_proportion: f64,
    pub recipient_proportion: f64,
}

impl Proportions {
    pub fn new(source_proportion: f64, recipient_proportion: f64) -> Self {
        Self {
            source_proportion,
            recipient_proportion,
        }
    }

    pub fn get(&self, side: Side) -> f64 {
        match side {
            Side::Source => self.source_proportion,
            Side::Recipient => self.recipient_proportion,
        }
    }
}

/// Annotated branch, in first-seen mutation order.
pub type Branch = IndexMap<MutationId, Proportions>;

/// Mutation ids of the three branches, before annotation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partition {
    pub shared: IndexSet<MutationId>,
    pub source: IndexSet<MutationId>,
    pub recipient: IndexSet<MutationId>,
}

/// Splits the mutations of two reference genomes into shared, source-private
/// and recipient-private sets.
///
/// Source genome mutations are scanned first, then recipient ones, so each set
/// keeps the order in which its mutations first appear.
pub fn categorize_mutations<S, R>(source_genome: &S, recipient_genome: &R) -> Partition
where
    S: MutationSet + ?Sized,
    R: MutationSet + ?Sized,
{
    let mut partition = Partition::default();

    for mutation in source_genome.mutations() {
        if recipient_genome.contains_mutation(mutation) {
            partition.shared.insert(*mutation);
        } else {
            partition.source.insert(*mutation);
        }
    }

    for mutation in recipient_genome
        .mutations()
        .filter(|m| !source_genome.contains_mutation(m))
    {
        partition.recipient.insert(*mutation);
    }

    partition
}

/// Annotated shared, source and recipient branches.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Branches {
    pub shared: Branch,
    pub source: Branch,
    pub recipient: Branch,
}

/// Attaches source and recipient sample proportions to every partitioned mutation.
///
/// A mutation missing from a sample gets proportion 0. A recorded proportion
/// outside `[0, 1]` is an error.
pub fn assign_proportions<S, R>(
    partition: &Partition,
    source_population: &S,
    recipient_population: &R,
) -> Result<Branches>
where
    S: SampleFrequencies + ?Sized,
    R: SampleFrequencies + ?Sized,
{
    let annotate = |ids: &IndexSet<MutationId>| -> Result<Branch> {
        ids.iter()
            .map(|mutation| {
                let source_proportion =
                    lookup_proportion(source_population, mutation, Side::Source)?;
                let recipient_proportion =
                    lookup_proportion(recipient_population, mutation, Side::Recipient)?;
                Ok((
                    *mutation,
                    Proportions::new(source_proportion, recipient_proportion),
                ))
            })
            .collect()
    };

    Ok(Branches {
        shared: annotate(&partition.shared)?,
        source: annotate(&partition.source)?,
        recipient: annotate(&partition.recipient)?,
    })
}

fn lookup_proportion<P: SampleFrequencies + ?Sized>(
    population: &P,
    mutation: &MutationId,
    side: Side,
) -> Result<f64> {
    match population.proportion(mutation) {
        Some(proportion) => check_proportion(proportion).map_err(|e| {
            anyhow!(
                "Invalid {} proportion for mutation {}: {}",
                side,
                mutation,
                e
            )
        }),
        None => Ok(0.0),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    branches: Branches,
}

impl Tree {
    /// Partitions the reference genomes and annotates the branches.
    pub fn new<SG, RG, SP, RP>(
        source_genome: &SG,
        recipient_genome: &RG,
        source_population: &SP,
        recipient_population: &RP,
    ) -> Result<Self>
    where
        SG: MutationSet + ?Sized,
        RG: MutationSet + ?Sized,
        SP: SampleFrequencies + ?Sized,
        RP: SampleFrequencies + ?Sized,
    {
        let partition = categorize_mutations(source_genome, recipient_genome);
        let branches = assign_proportions(&partition, source_population, recipient_population)?;
        log::trace!(
            "Tree branches: shared={}, source={}, recipient={}",
            branches.shared.len(),
            branches.source.len(),
            branches.recipient.len()
        );
        Ok(Self { branches })
    }

    pub fn shared_branch(&self) -> &Branch {
        &self.branches.shared
    }

    pub fn source_branch(&self) -> &Branch {
        &self.branches.source
    }

    pub fn recipient_branch(&self) -> &Branch {
        &self.branches.recipient
    }

    pub fn branches(&self) -> &Branches {
        &self.branches
    }

    pub fn check_tier_1(&self) -> Tier1Result {
        tiers::check_tier_1(&self.branches.shared)
    }

    pub fn check_tier_2(&self) -> Tier2Result {
        tiers::check_tier_2(&self.branches.source, &self.branches.recipient)
    }

    pub fn check_clumpiness_composite(&self, params: &Params) -> CompositeClumpiness {
        tiers::check_clumpiness_composite(&self.branches, params.num_bins, params.entropy_base)
    }

    /// Runs all three tiers.
    pub fn report(&self, params: &Params) -> TreeReport {
        TreeReport {
            tier_1: self.check_tier_1(),
            tier_2: self.check_tier_2(),
            tier_3: self.check_clumpiness_composite(params),
        }
    }
}
