//! Tier checks over annotated branches.
//!
//! * Tier 1: segregating shared mutations (incomplete lineage sorting).
//! * Tier 2: private mutations still segregating in the other population.
//! * Tier 3: entropy of binned proportions ("clumpiness") per lineage.
//!
//! Every check reports its raw counts or entropies. [`Signal`] is derived from
//! them by comparing the source-side value with the recipient-side value.

use crate::{
    math::{bin_proportions, entropy},
    model::{EntropyBase, Side, Signal},
    tree::{Branch, Branches, Proportions},
    util::sign_of_difference,
};
use serde::Serialize;

/// Number of branch mutations whose `side` proportion is strictly between 0 and 1.
pub fn count_segregating(branch: &Branch, side: Side) -> usize {
    branch
        .values()
        .map(|p| p.get(side))
        .filter(|&proportion| proportion > 0.0 && proportion < 1.0)
        .count()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Tier1Result {
    pub source_segregating: usize,
    pub recipient_segregating: usize,
}

impl Tier1Result {
    pub fn signal(&self) -> Signal {
        Signal::from_sign(sign_of_difference(
            self.source_segregating,
            self.recipient_segregating,
        ))
    }
}

/// Segregating shared-branch mutations, measured in each population.
pub fn check_tier_1(shared_branch: &Branch) -> Tier1Result {
    Tier1Result {
        source_segregating: count_segregating(shared_branch, Side::Source),
        recipient_segregating: count_segregating(shared_branch, Side::Recipient),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Tier2Result {
    /// Recipient-private mutations segregating in the source sample
    pub source_segregating_on_recipient: usize,
    /// Source-private mutations segregating in the recipient sample
    pub recipient_segregating_on_source: usize,
}

impl Tier2Result {
    pub fn signal(&self) -> Signal {
        Signal::from_sign(sign_of_difference(
            self.source_segregating_on_recipient,
            self.recipient_segregating_on_source,
        ))
    }
}

/// Private mutations of one lineage that keep partial frequency in the other population.
pub fn check_tier_2(source_branch: &Branch, recipient_branch: &Branch) -> Tier2Result {
    Tier2Result {
        source_segregating_on_recipient: count_segregating(recipient_branch, Side::Source),
        recipient_segregating_on_source: count_segregating(source_branch, Side::Recipient),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Clumpiness {
    pub source_entropy: f64,
    pub recipient_entropy: f64,
}

impl Clumpiness {
    /// `Correct` when the recipient side is more clumped (lower entropy) than the source side.
    pub fn signal(&self) -> Signal {
        Signal::from_sign(sign_of_difference(
            self.source_entropy,
            self.recipient_entropy,
        ))
    }
}

/// Entropy of the binned source-side and recipient-side proportions of a branch.
///
/// An empty branch gives 0 on both sides.
pub fn check_clumpiness(branch: &Branch, num_bins: usize, base: EntropyBase) -> Clumpiness {
    clumpiness_of(branch.values(), num_bins, base)
}

fn clumpiness_of<'a, I>(entries: I, num_bins: usize, base: EntropyBase) -> Clumpiness
where
    I: IntoIterator<Item = &'a Proportions>,
{
    let (source, recipient): (Vec<f64>, Vec<f64>) = entries
        .into_iter()
        .map(|p| (p.source_proportion, p.recipient_proportion))
        .unzip();

    Clumpiness {
        source_entropy: entropy(&bin_proportions(&source, num_bins), base),
        recipient_entropy: entropy(&bin_proportions(&recipient, num_bins), base),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CompositeClumpiness {
    /// Shared and source-private mutations
    pub ancestral_to_source: Clumpiness,
    /// Shared and recipient-private mutations
    pub ancestral_to_recipient: Clumpiness,
}

/// Clumpiness along the ancestral-to-source and ancestral-to-recipient lineages.
pub fn check_clumpiness_composite(
    branches: &Branches,
    num_bins: usize,
    base: EntropyBase,
) -> CompositeClumpiness {
    // branches are disjoint, chaining is their union
    CompositeClumpiness {
        ancestral_to_source: clumpiness_of(
            branches.shared.values().chain(branches.source.values()),
            num_bins,
            base,
        ),
        ancestral_to_recipient: clumpiness_of(
            branches.shared.values().chain(branches.recipient.values()),
            num_bins,
            base,
        ),
    }
}

/// All tier results of one tree.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TreeReport {
    pub tier_1: Tier1Result,
    pub tier_2: Tier2Result,
    pub tier_3: CompositeClumpiness,
}
