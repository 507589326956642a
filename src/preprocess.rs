//! Raw sequence cleanup ahead of scanning.
//!
//! Whitespace is dropped, letters are uppercased and anything outside `{A,G,C,T}` (including the
//! `N` and `*` wildcards) becomes `A`. The cleaned bases are capped at a maximum length and then
//! stored twice back to back so that circular sites can be found without modular indexing.

use crate::encode::{MAP_LUT, NOT_A_BASE};

/// Default cap on cleaned sequence length.
pub const MAX_SEQ_LEN: usize = 600_000;

/// A normalized sequence held in doubled form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CleanedSequence {
    doubled: Vec<u8>,
    len: usize,
    truncated: bool,
}

impl CleanedSequence {
    /// Length of the cleaned (undoubled) sequence.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether input was cut at the length cap.
    #[inline]
    pub fn truncated(&self) -> bool {
        self.truncated
    }

    /// Cleaned bases, one copy.
    #[inline]
    pub fn bases(&self) -> &[u8] {
        &self.doubled[..self.len]
    }

    /// Cleaned bases followed by themselves again.
    #[inline]
    pub fn doubled(&self) -> &[u8] {
        &self.doubled
    }
}

/// Clean `raw` and keep at most `max_len` bases.
pub fn normalize(raw: &[u8], max_len: usize) -> CleanedSequence {
    let mut doubled = Vec::with_capacity(2 * raw.len().min(max_len));
    let mut truncated = false;
    for &c in raw {
        if c.is_ascii_whitespace() {
            continue;
        }
        if doubled.len() >= max_len {
            truncated = true;
            break;
        }
        doubled.push(clean_base(c));
    }
    let len = doubled.len();
    doubled.extend_from_within(..len);
    CleanedSequence {
        doubled,
        len,
        truncated,
    }
}

#[inline]
fn clean_base(c: u8) -> u8 {
    match MAP_LUT[c as usize] {
        NOT_A_BASE => b'A',
        _ => c.to_ascii_uppercase(),
    }
}
