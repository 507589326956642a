//! Match engine: resumable, base-by-base scan of a sequence against a [`KmerIndex`].
//!
//! A 24-bit rolling value holds the last 12 bases. Once the window is full, every position
//! probes the exact table and tests the whole degenerate run. Descriptors satisfied by the
//! window are marked active and queued; the queue is reported one match per call *before* the
//! next base is consumed, so detection at position `p` surfaces on the following call(s) with
//! position `p`. All mutable state lives in [`ScanState`], owned by exactly one scan.

use std::collections::VecDeque;
use std::iter::FusedIterator;

use rayon::prelude::*;

use crate::encode::{KMER_MASK, KTUP, scan_code};
use crate::feature::Match;
use crate::index::KmerIndex;
use crate::preprocess::{CleanedSequence, MAX_SEQ_LEN, normalize};

/// Scan-time configuration.
#[derive(Clone, Debug)]
pub struct ScanConfig {
    max_seq_len: usize,
    circular: bool,
    threads: Option<usize>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_seq_len: MAX_SEQ_LEN,
            circular: true,
            threads: None,
        }
    }
}

impl ScanConfig {
    /// Cap on cleaned sequence length (default 600,000).
    pub fn max_seq_len(mut self, n: usize) -> Self {
        self.max_seq_len = n;
        self
    }
    /// Treat sequences as circular (default: true).
    pub fn circular(mut self, yes: bool) -> Self {
        self.circular = yes;
        self
    }
    /// Fix the number of threads used by rayon for batch scans.
    pub fn threads(mut self, n: usize) -> Self {
        self.threads = Some(n);
        self
    }

    pub fn is_circular(&self) -> bool {
        self.circular
    }
    pub fn thread_count(&self) -> Option<usize> {
        self.threads
    }

    /// Normalize raw input with this configuration's length cap.
    pub fn prepare(&self, raw: &[u8]) -> CleanedSequence {
        normalize(raw, self.max_seq_len)
    }
}

/// Per-scan mutable state: cursor, rolling window, activation flags and report queue.
///
/// A state is tied to the index it was created for and to one sequence buffer; pass both
/// unchanged to every [`step`](ScanState::step).
#[derive(Clone, Debug)]
pub struct ScanState {
    cursor: usize,
    sval: u32,
    active: Vec<bool>,
    pending: VecDeque<u32>,
    pending_position: usize,
}

impl ScanState {
    /// Fresh state for scanning against `index`.
    pub fn new(index: &KmerIndex) -> Self {
        ScanState {
            cursor: 0,
            sval: 0,
            active: vec![false; index.store().len()],
            pending: VecDeque::new(),
            pending_position: 0,
        }
    }

    /// Index of the next base to consume.
    #[inline]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Number of queued activations not yet reported.
    #[inline]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Advance until the next match. `None` once `seq` is exhausted and the queue is empty.
    pub fn step(&mut self, index: &KmerIndex, seq: &[u8]) -> Option<Match> {
        debug_assert_eq!(self.active.len(), index.store().len());
        loop {
            while let Some(id) = self.pending.pop_front() {
                let id = id as usize;
                if std::mem::take(&mut self.active[id]) {
                    if let Some(d) = index.store().get(id) {
                        return Some(Match::new(d, self.pending_position));
                    }
                }
            }

            let &base = seq.get(self.cursor)?;
            let position = self.cursor;
            self.cursor += 1;
            self.sval = (self.sval << 2) | scan_code(base);
            if position < KTUP - 1 {
                continue;
            }
            self.sval &= KMER_MASK;
            self.activate(index, position);
        }
    }

    fn activate(&mut self, index: &KmerIndex, position: usize) {
        self.pending_position = position;
        let sval = self.sval;
        if let Some((first, run)) = index.exact_run(sval) {
            for id in first..first + run.len() {
                self.enqueue(id);
            }
        }
        let store = index.store();
        let boundary = store.boundary();
        for (k, d) in store.degenerate().iter().enumerate() {
            if d.matches(sval) {
                self.enqueue(boundary + k);
            }
        }
    }

    #[inline]
    fn enqueue(&mut self, id: usize) {
        if !self.active[id] {
            self.active[id] = true;
            self.pending.push_back(id as u32);
        }
    }
}

/// Iterator over all matches of one linear scan.
pub struct MatchIterator<'a> {
    index: &'a KmerIndex,
    seq: &'a [u8],
    state: ScanState,
}

impl<'a> MatchIterator<'a> {
    pub fn new(index: &'a KmerIndex, seq: &'a [u8]) -> Self {
        Self::resume(index, seq, ScanState::new(index))
    }

    /// Continue a scan suspended with [`into_state`](MatchIterator::into_state).
    pub fn resume(index: &'a KmerIndex, seq: &'a [u8], state: ScanState) -> Self {
        MatchIterator { index, seq, state }
    }

    /// Suspend the scan, keeping cursor and queue.
    pub fn into_state(self) -> ScanState {
        self.state
    }

    #[inline]
    pub fn cursor(&self) -> usize {
        self.state.cursor()
    }
}

impl Iterator for MatchIterator<'_> {
    type Item = Match;

    #[inline]
    fn next(&mut self) -> Option<Match> {
        self.state.step(self.index, self.seq)
    }
}

impl FusedIterator for MatchIterator<'_> {}

/// Matches over a doubled sequence, each circular site reported once.
///
/// A match is kept iff its window starts inside the first copy (`start < len`). Windows that
/// start in the second copy repeat sites already reported, so the scan stops there.
pub struct CircularMatches<'a> {
    inner: MatchIterator<'a>,
    len: usize,
    done: bool,
}

impl<'a> CircularMatches<'a> {
    pub fn new(index: &'a KmerIndex, seq: &'a CleanedSequence) -> Self {
        CircularMatches {
            inner: MatchIterator::new(index, seq.doubled()),
            len: seq.len(),
            done: false,
        }
    }
}

impl Iterator for CircularMatches<'_> {
    type Item = Match;

    fn next(&mut self) -> Option<Match> {
        if self.done {
            return None;
        }
        match self.inner.next() {
            Some(m) if m.start() < self.len => Some(m),
            _ => {
                // Positions never decrease, so nothing later can start in the first copy.
                self.done = true;
                None
            }
        }
    }
}

impl FusedIterator for CircularMatches<'_> {}

/// Collect all matches for one cleaned sequence.
pub fn scan_sequence(index: &KmerIndex, seq: &CleanedSequence, circular: bool) -> Vec<Match> {
    if circular {
        CircularMatches::new(index, seq).collect()
    } else {
        MatchIterator::new(index, seq.bases()).collect()
    }
}

/// Scan many sequences in parallel against one shared index. Output order follows input order.
pub fn scan_batch(
    index: &KmerIndex,
    seqs: &[CleanedSequence],
    cfg: &ScanConfig,
) -> Vec<Vec<Match>> {
    seqs.par_iter()
        .map(|s| scan_sequence(index, s, cfg.is_circular()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::encode_kmer;
    use crate::feature::FeatureDescriptor;
    use crate::store::FeatureStore;

    fn index_of(ds: Vec<FeatureDescriptor>) -> KmerIndex {
        KmerIndex::build(FeatureStore::from_descriptors(ds).unwrap())
    }

    fn exact(feature_index: u32, kmer: &[u8]) -> FeatureDescriptor {
        FeatureDescriptor {
            feature_index,
            seq: encode_kmer(kmer).unwrap(),
            ..Default::default()
        }
    }

    #[test]
    fn match_surfaces_before_the_next_base_is_read() {
        let idx = index_of(vec![exact(0, b"AAAAAAAAAAAA")]);
        let seq = b"AAAAAAAAAAAAG";
        let mut st = ScanState::new(&idx);
        let m = st.step(&idx, seq).unwrap();
        assert_eq!(m.position, 11);
        // Detected at 11 and reported with base 12 still unread.
        assert_eq!(st.cursor(), 12);
        assert!(st.step(&idx, seq).is_none());
        assert_eq!(st.cursor(), seq.len());
    }

    #[test]
    fn trailing_activation_is_flushed() {
        let idx = index_of(vec![exact(0, b"AAAAAAAAAAAA")]);
        let m: Vec<_> = MatchIterator::new(&idx, b"AAAAAAAAAAAA").collect();
        assert_eq!(m.len(), 1);
        assert_eq!(m[0].output_position(), 12);
        assert_eq!(m[0].start(), 0);
    }

    #[test]
    fn several_activations_at_one_position_come_one_per_call() {
        let a = exact(0, b"ACGTACGTACGT");
        let b = FeatureDescriptor {
            feature_index: 1,
            fragment_index: 4,
            shift: 3,
            ..a
        };
        let degenerate = FeatureDescriptor {
            feature_index: 2,
            mask: 0b11,
            seq: encode_kmer(b"AAAAAAAAAAAT").unwrap(),
            ..Default::default()
        };
        let idx = index_of(vec![a, b, degenerate]);
        let seq = b"ACGTACGTACGT";
        let mut st = ScanState::new(&idx);
        let first = st.step(&idx, seq).unwrap();
        assert_eq!(st.pending(), 2);
        let second = st.step(&idx, seq).unwrap();
        let third = st.step(&idx, seq).unwrap();
        assert!(st.step(&idx, seq).is_none());
        assert_eq!(
            [first.feature_index, second.feature_index, third.feature_index],
            [0, 1, 2]
        );
        assert_eq!((second.fragment_index, second.shift), (4, 3));
        assert!([first, second, third].iter().all(|m| m.position == 11));
    }

    #[test]
    fn suspended_scan_resumes() {
        let idx = index_of(vec![exact(0, b"GGGGGGGGGGGG")]);
        let seq = b"GGGGGGGGGGGGGG";
        let mut it = MatchIterator::new(&idx, seq);
        let first = it.next().unwrap();
        let state = it.into_state();
        let rest: Vec<_> = MatchIterator::resume(&idx, seq, state).collect();
        let all: Vec<_> = MatchIterator::new(&idx, seq).collect();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0], first);
        assert_eq!(&all[1..], &rest[..]);
    }

    #[test]
    fn non_base_bytes_read_as_a() {
        let idx = index_of(vec![exact(0, b"AAAAAAAAAAAA")]);
        assert_eq!(MatchIterator::new(&idx, b"NNNNNNNNNNNN").count(), 1);
    }

    #[test]
    fn short_and_empty_sequences() {
        let idx = index_of(vec![FeatureDescriptor {
            mask: 0b11,
            seq: 0,
            ..Default::default()
        }]);
        assert_eq!(MatchIterator::new(&idx, b"AAAAAAAAAAA").next(), None);
        let mut st = ScanState::new(&idx);
        assert_eq!(st.step(&idx, b""), None);
        assert_eq!(st.cursor(), 0);
    }

    #[test]
    fn circular_site_across_the_junction_is_reported_once() {
        let idx = index_of(vec![exact(7, b"TTTTAAAAAAAA")]);
        // Site starts at 16 and wraps to the front.
        let seq = normalize(b"AAAAAAAAGGGGCCCCTTTT", MAX_SEQ_LEN);
        let linear = scan_sequence(&idx, &seq, false);
        assert!(linear.is_empty());
        let circular = scan_sequence(&idx, &seq, true);
        assert_eq!(circular.len(), 1);
        assert_eq!(circular[0].start(), 16);
        assert_eq!(circular[0].output_position(), 28);
    }

    #[test]
    fn circular_scan_drops_second_copy_duplicates() {
        let idx = index_of(vec![exact(0, b"AAAAAAAAAAAA")]);
        let seq = normalize(b"AAAAAAAAAAAAG", MAX_SEQ_LEN);
        let m = scan_sequence(&idx, &seq, true);
        assert_eq!(m.len(), 1);
        assert_eq!(m[0].output_position(), 12);
    }

    #[test]
    fn batch_matches_sequential() {
        let idx = index_of(vec![exact(0, b"ACGTACGTACGT"), exact(1, b"CGTACGTACGTA")]);
        let cfg = ScanConfig::default().circular(false);
        let seqs: Vec<_> = [&b"ACGTACGTACGTACGT"[..], b"", b"TTTTACGTACGTACGTA"]
            .iter()
            .map(|s| cfg.prepare(s))
            .collect();
        let batch = scan_batch(&idx, &seqs, &cfg);
        for (s, got) in seqs.iter().zip(&batch) {
            assert_eq!(got, &scan_sequence(&idx, s, false));
        }
        assert!(batch[1].is_empty());
    }
}
