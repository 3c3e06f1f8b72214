//! Reference genomes as ordered sets of mutation identifiers.

use indexmap::IndexSet;
use serde::Serialize;

/// Opaque identifier of a single mutation event.
pub type MutationId = u64;

/// Read access to the mutations carried by a genome.
///
/// Iteration order must be stable, branch contents follow it.
pub trait MutationSet {
    fn contains_mutation(&self, mutation: &MutationId) -> bool;
    fn mutations(&self) -> Box<dyn Iterator<Item = &MutationId> + '_>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Genome {
    mutations: IndexSet<MutationId>,
}

impl Genome {
    /// Builds a genome from mutation ids, keeping first-seen order. Repeated ids collapse.
    pub fn new(mutations: impl IntoIterator<Item = MutationId>) -> Self {
        Self {
            mutations: mutations.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.mutations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }
}

impl MutationSet for Genome {
    fn contains_mutation(&self, mutation: &MutationId) -> bool {
        self.mutations.contains(mutation)
    }

    fn mutations(&self) -> Box<dyn Iterator<Item = &MutationId> + '_> {
        Box::new(self.mutations.iter())
    }
}

impl FromIterator<MutationId> for Genome {
    fn from_iter<I: IntoIterator<Item = MutationId>>(iter: I) -> Self {
        Genome::new(iter)
    }
}
