//! Feature database builder: named feature sequences → sorted descriptor list.
//!
//! Each feature (and, unless it is an enzyme site or a palindrome, its reverse complement as a
//! separate feature) is cut into 12-base fragments. A trailing piece shorter than the minimum
//! fragment length borrows bases from the previous fragment to make a full 12-mer and records
//! how many bases it borrowed as `shift`. Other short pieces become degenerate descriptors
//! whose mask covers only their real bases.

use log::{debug, info};
use rayon::prelude::*;
use thiserror::Error;

use crate::encode::{KTUP, encode_kmer, prefix_mask, revcomp};
use crate::feature::FeatureDescriptor;
use crate::store::{FeatureError, FeatureStore};

#[derive(Debug, Error)]
/// Errors returned by the database builder.
pub enum BuildError {
    /// Sequence contains something other than A/C/G/T/N.
    #[error("feature {name:?}: bad nucleotide {byte:?} at {pos}")]
    BadNucleotide { name: String, byte: char, pos: usize },
    /// Built descriptors failed store validation.
    #[error(transparent)]
    Store(#[from] FeatureError),
}

/// Input feature.
#[derive(Clone, Debug)]
pub struct FeatureSource {
    pub name: String,
    pub sequence: String,
    /// Enzyme sites are searched on the given strand only.
    pub enzyme: bool,
}

impl FeatureSource {
    pub fn new(name: impl Into<String>, sequence: impl Into<String>) -> Self {
        FeatureSource {
            name: name.into(),
            sequence: sequence.into(),
            enzyme: false,
        }
    }

    pub fn enzyme(mut self, yes: bool) -> Self {
        self.enzyme = yes;
        self
    }
}

/// One entry of the feature table: which input a `feature_index` stands for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeatureEntry {
    pub feature_index: u32,
    pub name: String,
    pub antisense: bool,
    pub length: usize,
}

/// Build output.
#[derive(Clone, Debug)]
pub struct FeatureDb {
    pub features: Vec<FeatureEntry>,
    pub descriptors: Vec<FeatureDescriptor>,
}

impl FeatureDb {
    /// Validate into a [`FeatureStore`].
    pub fn into_store(self) -> Result<FeatureStore, BuildError> {
        Ok(FeatureStore::from_descriptors(self.descriptors)?)
    }
}

/// Build-time configuration.
#[derive(Clone, Debug)]
pub struct BuildConfig {
    min_frag: usize,
    antisense: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            min_frag: 6,
            antisense: true,
        }
    }
}

impl BuildConfig {
    /// Minimum feature length, and the length under which a tail fragment is merged (default 6).
    pub fn min_frag(mut self, n: usize) -> Self {
        self.min_frag = n.clamp(1, KTUP);
        self
    }
    /// Add reverse-complement features for non-enzymes (default: true).
    pub fn antisense(mut self, yes: bool) -> Self {
        self.antisense = yes;
        self
    }
}

/// Build the descriptor list for `sources`.
pub fn build_feature_db(
    sources: &[FeatureSource],
    cfg: &BuildConfig,
) -> Result<FeatureDb, BuildError> {
    let mut features = Vec::new();
    let mut strands: Vec<(u32, &str, Vec<u8>)> = Vec::new();
    for src in sources {
        let seq = src.sequence.trim().as_bytes();
        if seq.len() < cfg.min_frag {
            debug!("skipping short feature {:?} ({} bases)", src.name, seq.len());
            continue;
        }
        let name = src.name.as_str();
        check_bases(name, seq)?;
        let sense = seq.to_ascii_uppercase();
        let mut push = |bases: Vec<u8>, antisense: bool| {
            let feature_index = features.len() as u32;
            features.push(FeatureEntry {
                feature_index,
                name: name.to_string(),
                antisense,
                length: bases.len(),
            });
            strands.push((feature_index, name, bases));
        };
        let rc = revcomp(&sense);
        let add_rc = cfg.antisense && !src.enzyme && rc != sense;
        push(sense, false);
        if add_rc {
            push(rc, true);
        }
    }

    let per_feature: Vec<Vec<FeatureDescriptor>> = strands
        .par_iter()
        .map(|(feature_index, name, bases)| fragment(*feature_index, name, bases, cfg.min_frag))
        .collect::<Result<_, _>>()?;

    let (mut exact, degenerate): (Vec<_>, Vec<_>) = per_feature
        .into_iter()
        .flatten()
        .partition(FeatureDescriptor::is_exact);
    exact.sort_by_key(|d| d.seq);
    exact.extend(degenerate);

    info!(
        "built {} descriptors for {} features",
        exact.len(),
        features.len()
    );
    Ok(FeatureDb {
        features,
        descriptors: exact,
    })
}

fn fragment(
    feature_index: u32,
    name: &str,
    bases: &[u8],
    min_frag: usize,
) -> Result<Vec<FeatureDescriptor>, BuildError> {
    let pieces: Vec<&[u8]> = bases.chunks(KTUP).collect();
    let mut out = Vec::with_capacity(pieces.len());
    for (i, piece) in pieces.iter().enumerate() {
        let mut shift = 0;
        let mut merged = Vec::new();
        let mut frag: &[u8] = piece;
        if piece.len() < min_frag && i > 0 {
            let left = piece.len();
            shift = (KTUP - left) as u32;
            merged.extend_from_slice(&pieces[i - 1][left..]);
            merged.extend_from_slice(piece);
            frag = &merged;
        }
        let seq = encode_kmer(frag).ok_or_else(|| BuildError::BadNucleotide {
            name: name.to_string(),
            byte: '?',
            pos: i * KTUP,
        })?;
        let mask = if frag.len() == KTUP { 0 } else { prefix_mask(frag.len()) };
        out.push(FeatureDescriptor {
            feature_index,
            fragment_index: i as u32,
            mask,
            seq,
            shift,
        });
    }
    Ok(out)
}

/// Only A, C, G, T and N (any case) are accepted.
fn check_bases(name: &str, seq: &[u8]) -> Result<(), BuildError> {
    match seq
        .iter()
        .position(|b| !matches!(b.to_ascii_uppercase(), b'A' | b'C' | b'G' | b'T' | b'N'))
    {
        Some(pos) => Err(BuildError::BadNucleotide {
            name: name.to_string(),
            byte: seq[pos] as char,
            pos,
        }),
        None => Ok(()),
    }
}
