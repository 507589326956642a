//! FeatureStore: the ordered descriptor collection parsed from a feature file.
//!
//! Format: line 1 holds the record count `N`; each of the next `N` non-blank lines holds
//! `feature_index,fragment_index,mask,seq,shift` (a trailing comma is allowed). Fields are read
//! with a numeric-prefix conversion, so trailing junk after the digits is ignored.
//!
//! Descriptors are kept in two runs: exact ones (grouped by `seq`) followed by degenerate ones.
//! A descriptor's id is its position in that concatenation.

use std::collections::HashMap;
use std::path::Path;

use log::{debug, warn};
use thiserror::Error;

use crate::encode::KMER_MASK;
use crate::feature::FeatureDescriptor;

/// Largest accepted record count.
pub const MAX_FEATURES: usize = 1024 * 1024;

const FIELDS: usize = 5;

#[derive(Debug, Error)]
/// Errors returned while loading or validating descriptors.
pub enum FeatureError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Nothing to read.
    #[error("feature file is empty")]
    Empty,
    /// First line does not start with a count.
    #[error("unreadable feature count header: {0:?}")]
    BadHeader(String),
    /// Declared count over [`MAX_FEATURES`].
    #[error("declared feature count {0} exceeds the limit of {max}", max = MAX_FEATURES)]
    TooMany(u64),
    /// Fewer records than declared.
    #[error("feature file declares {declared} records but holds {found}")]
    Truncated { declared: usize, found: usize },
    /// Record with fewer than five fields.
    #[error("record {record}: expected 5 comma-separated fields, found {found}")]
    ShortRecord { record: usize, found: usize },
    /// Exact pattern wider than a 12-mer.
    #[error("record {record}: exact pattern value {seq} does not fit a 12-mer")]
    SeqOutOfRange { record: usize, seq: u32 },
    /// Exact descriptor after the degenerate run started.
    #[error("record {record}: exact descriptor follows the degenerate run starting at {boundary}")]
    ExactAfterDegenerate { record: usize, boundary: usize },
    /// Same exact value in two separate runs.
    #[error("record {record}: exact pattern value {seq} recurs apart from its run at {first}")]
    ScatteredExact { record: usize, seq: u32, first: usize },
}

/// Immutable, validated descriptor collection.
#[derive(Clone, Debug, Default)]
pub struct FeatureStore {
    exact: Vec<FeatureDescriptor>,
    degenerate: Vec<FeatureDescriptor>,
}

impl FeatureStore {
    /// Read and parse a feature file.
    pub fn load_path(path: &Path) -> Result<Self, FeatureError> {
        let text = std::fs::read_to_string(path)?;
        let store = Self::load(&text)?;
        debug!(
            "loaded {} descriptors from {} ({} exact, {} degenerate)",
            store.len(),
            path.display(),
            store.exact.len(),
            store.degenerate.len()
        );
        Ok(store)
    }

    /// Parse feature file text.
    pub fn load(text: &str) -> Result<Self, FeatureError> {
        if text.trim().is_empty() {
            return Err(FeatureError::Empty);
        }
        let mut lines = text.lines();
        let header = lines.next().unwrap_or_default();
        let declared = header_count(header)?;

        let mut loader = Loader::with_capacity(declared);
        for line in lines.filter(|l| !l.trim().is_empty()).take(declared) {
            let record = loader.len();
            let d = parse_record(line, record)?;
            loader.push(d)?;
        }
        if loader.len() < declared {
            return Err(FeatureError::Truncated {
                declared,
                found: loader.len(),
            });
        }
        Ok(loader.finish())
    }

    /// Build from descriptors already in memory, with the same ordering checks as [`load`].
    ///
    /// [`load`]: FeatureStore::load
    pub fn from_descriptors<I>(descriptors: I) -> Result<Self, FeatureError>
    where
        I: IntoIterator<Item = FeatureDescriptor>,
    {
        let descriptors = descriptors.into_iter();
        let mut loader = Loader::with_capacity(descriptors.size_hint().0);
        for d in descriptors {
            if loader.len() >= MAX_FEATURES {
                return Err(FeatureError::TooMany(loader.len() as u64 + 1));
            }
            loader.push(d)?;
        }
        Ok(loader.finish())
    }

    /// Total number of descriptors.
    #[inline]
    pub fn len(&self) -> usize {
        self.exact.len() + self.degenerate.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Id of the first degenerate descriptor (equals `len()` when there is none).
    #[inline]
    pub fn boundary(&self) -> usize {
        self.exact.len()
    }

    /// Exact run, sorted into groups of equal `seq`.
    #[inline]
    pub fn exact(&self) -> &[FeatureDescriptor] {
        &self.exact
    }

    /// Degenerate run in file order.
    #[inline]
    pub fn degenerate(&self) -> &[FeatureDescriptor] {
        &self.degenerate
    }

    /// Descriptor by id.
    #[inline]
    pub fn get(&self, id: usize) -> Option<&FeatureDescriptor> {
        if id < self.exact.len() {
            self.exact.get(id)
        } else {
            self.degenerate.get(id - self.exact.len())
        }
    }

    /// All descriptors in id order.
    pub fn iter(&self) -> impl Iterator<Item = &FeatureDescriptor> {
        self.exact.iter().chain(self.degenerate.iter())
    }
}

/// Incremental validator shared by the text loader and [`FeatureStore::from_descriptors`].
struct Loader {
    exact: Vec<FeatureDescriptor>,
    degenerate: Vec<FeatureDescriptor>,
    first_seen: HashMap<u32, usize>,
}

impl Loader {
    fn with_capacity(n: usize) -> Self {
        Loader {
            exact: Vec::with_capacity(n),
            degenerate: Vec::new(),
            first_seen: HashMap::new(),
        }
    }

    fn len(&self) -> usize {
        self.exact.len() + self.degenerate.len()
    }

    fn push(&mut self, d: FeatureDescriptor) -> Result<(), FeatureError> {
        let record = self.len();
        if !d.is_exact() {
            if d.seq & !d.mask != 0 {
                warn!(
                    "record {record}: pattern {:#x} has bits outside mask {:#x} and can never match",
                    d.seq, d.mask
                );
            }
            self.degenerate.push(d);
            return Ok(());
        }

        if !self.degenerate.is_empty() {
            return Err(FeatureError::ExactAfterDegenerate {
                record,
                boundary: self.exact.len(),
            });
        }
        if d.seq > KMER_MASK {
            return Err(FeatureError::SeqOutOfRange { record, seq: d.seq });
        }
        // Equal values must sit in one contiguous run starting at their first sighting.
        let continues_run = self.exact.last().is_some_and(|prev| prev.seq == d.seq);
        if let Some(&first) = self.first_seen.get(&d.seq) {
            if !continues_run {
                return Err(FeatureError::ScatteredExact {
                    record,
                    seq: d.seq,
                    first,
                });
            }
        } else {
            self.first_seen.insert(d.seq, record);
        }
        self.exact.push(d);
        Ok(())
    }

    fn finish(self) -> FeatureStore {
        FeatureStore {
            exact: self.exact,
            degenerate: self.degenerate,
        }
    }
}

fn header_count(line: &str) -> Result<usize, FeatureError> {
    let s = line.trim_start();
    let digits: &str = &s[..s.bytes().take_while(u8::is_ascii_digit).count()];
    if digits.is_empty() {
        return Err(FeatureError::BadHeader(line.to_string()));
    }
    let n = digits.bytes().fold(0u64, |acc, b| {
        acc.saturating_mul(10).saturating_add((b - b'0') as u64)
    });
    if n > MAX_FEATURES as u64 {
        return Err(FeatureError::TooMany(n));
    }
    Ok(n as usize)
}

fn parse_record(line: &str, record: usize) -> Result<FeatureDescriptor, FeatureError> {
    let mut fields = [0u32; FIELDS];
    let mut found = 0;
    for (slot, raw) in fields.iter_mut().zip(line.split(',')) {
        *slot = numeric_prefix(raw);
        found += 1;
    }
    if found < FIELDS {
        return Err(FeatureError::ShortRecord { record, found });
    }
    let [feature_index, fragment_index, mask, seq, shift] = fields;
    Ok(FeatureDescriptor {
        feature_index,
        fragment_index,
        mask,
        seq,
        shift,
    })
}

/// Leading-digits conversion: skips leading whitespace, accepts a sign, stops at the first
/// non-digit. No digits reads as 0; negative values wrap.
pub(crate) fn numeric_prefix(field: &str) -> u32 {
    let s = field.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let v = rest
        .bytes()
        .take_while(u8::is_ascii_digit)
        .fold(0u32, |acc, b| {
            acc.wrapping_mul(10).wrapping_add((b - b'0') as u32)
        });
    if negative { v.wrapping_neg() } else { v }
}
