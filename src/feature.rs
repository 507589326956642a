//! Descriptor and match records shared by the loader, the index and the scanner.

use crate::encode::KTUP;

/// One fragment pattern to look for.
///
/// `mask == 0` marks an exact descriptor whose `seq` is a full packed 12-mer.
/// Otherwise a window value `v` matches iff `(v & mask) == seq`.
#[derive(Copy, Clone, Default, PartialEq, Eq, Debug, Hash)]
pub struct FeatureDescriptor {
    /// Feature this fragment belongs to.
    pub feature_index: u32,
    /// Ordinal of the fragment within its feature.
    pub fragment_index: u32,
    /// Bits of the window that must match; 0 for an exact pattern.
    pub mask: u32,
    /// Packed pattern value.
    pub seq: u32,
    /// Offset to add to [`Match::start`] to get the fragment's true start.
    pub shift: u32,
}

impl FeatureDescriptor {
    #[inline]
    pub fn is_exact(&self) -> bool {
        self.mask == 0
    }

    /// Whether a packed window value satisfies this descriptor.
    #[inline]
    pub fn matches(&self, window: u32) -> bool {
        if self.is_exact() {
            window == self.seq
        } else {
            window & self.mask == self.seq
        }
    }
}

/// A reported hit.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub struct Match {
    pub feature_index: u32,
    pub fragment_index: u32,
    /// 0-based index of the last base of the matching window.
    pub position: usize,
    pub shift: u32,
}

impl Match {
    pub(crate) fn new(d: &FeatureDescriptor, position: usize) -> Self {
        Match {
            feature_index: d.feature_index,
            fragment_index: d.fragment_index,
            position,
            shift: d.shift,
        }
    }

    /// 0-based index of the first base of the matching window.
    #[inline]
    pub fn start(&self) -> usize {
        self.position + 1 - KTUP
    }

    /// Position as written in match output (1-based).
    #[inline]
    pub fn output_position(&self) -> usize {
        self.position + 1
    }
}

impl std::fmt::Display for Match {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.feature_index,
            self.fragment_index,
            self.output_position(),
            self.shift
        )
    }
}
