//! KmerIndex: direct-addressed lookup from a packed 12-mer to its run of exact descriptors.
//!
//! The table has one `u32` slot per possible window value (`4^12` entries). Slot value is the
//! id of the first exact descriptor with that `seq`, plus one; zero means no exact descriptor.

use log::debug;

use crate::encode::{KMER_MASK, KMER_SPACE};
use crate::feature::FeatureDescriptor;
use crate::store::FeatureStore;

/// Read-only index over a [`FeatureStore`]. Safe to share across scans and threads.
pub struct KmerIndex {
    store: FeatureStore,
    table: Vec<u32>,
    distinct: usize,
}

impl KmerIndex {
    /// Derive the lookup table from a validated store.
    pub fn build(store: FeatureStore) -> Self {
        let mut table = vec![0u32; KMER_SPACE];
        let mut distinct = 0usize;
        for (id, d) in store.exact().iter().enumerate() {
            let slot = &mut table[(d.seq & KMER_MASK) as usize];
            if *slot == 0 {
                *slot = id as u32 + 1;
                distinct += 1;
            }
        }
        debug!(
            "kmer index: {} exact descriptors over {} distinct 12-mers, {} degenerate",
            store.exact().len(),
            distinct,
            store.degenerate().len()
        );
        KmerIndex {
            store,
            table,
            distinct,
        }
    }

    /// The underlying descriptors.
    #[inline]
    pub fn store(&self) -> &FeatureStore {
        &self.store
    }

    /// Number of distinct exact values present.
    #[inline]
    pub fn distinct_kmers(&self) -> usize {
        self.distinct
    }

    /// Id of the first exact descriptor whose `seq` equals `kmer`.
    #[inline]
    pub fn probe(&self, kmer: u32) -> Option<usize> {
        match self.table[(kmer & KMER_MASK) as usize] {
            0 => None,
            slot => Some(slot as usize - 1),
        }
    }

    /// Contiguous run of exact descriptors equal to `kmer`, starting at the returned id.
    pub fn exact_run(&self, kmer: u32) -> Option<(usize, &[FeatureDescriptor])> {
        let first = self.probe(kmer)?;
        let exact = &self.store.exact()[first..];
        let len = exact
            .iter()
            .take_while(|d| d.seq == kmer && d.is_exact())
            .count();
        Some((first, &exact[..len]))
    }
}
