use frag_scan::encode::{KMER_MASK, base_mask, encode_kmer};
use frag_scan::*;

fn index_of(ds: Vec<FeatureDescriptor>) -> KmerIndex {
    KmerIndex::build(FeatureStore::from_descriptors(ds).unwrap())
}

#[test]
fn exact_site_reported_at_window_end() {
    let index = index_of(vec![FeatureDescriptor {
        feature_index: 4,
        fragment_index: 2,
        mask: 0,
        seq: encode_kmer(b"AAAAAAAAAAAA").unwrap(),
        shift: 5,
    }]);
    let hits: Vec<_> = MatchIterator::new(&index, b"AAAAAAAAAAAAG").collect();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].output_position(), 12);
    assert_eq!(hits[0].to_string(), "4 2 12 5");
}

#[test]
fn masked_last_base_fires_on_every_g() {
    let index = index_of(vec![FeatureDescriptor {
        feature_index: 1,
        fragment_index: 0,
        mask: base_mask(11),
        seq: 1,
        shift: 0,
    }]);
    let seq = b"TCAGGATCGATGCAGTTGACGG";
    let hits: Vec<_> = MatchIterator::new(&index, seq).map(|m| m.position).collect();
    let expected: Vec<_> = (11..seq.len()).filter(|&i| seq[i] == b'G').collect();
    assert_eq!(hits, expected);
}

#[test]
fn empty_sequence_ends_immediately() {
    let index = index_of(vec![FeatureDescriptor {
        mask: 0,
        seq: 0,
        ..Default::default()
    }]);
    let mut state = ScanState::new(&index);
    assert_eq!(state.step(&index, b""), None);
    let seq = normalize(b"", MAX_SEQ_LEN);
    assert!(scan_sequence(&index, &seq, true).is_empty());
}

#[test]
fn zero_features_never_match() {
    let index = KmerIndex::build(FeatureStore::load("0\n").unwrap());
    let seq = normalize(b"ACGTTTGACCAGTAGGACCCATTAGCAAAAA", MAX_SEQ_LEN);
    assert!(scan_sequence(&index, &seq, true).is_empty());
    assert!(scan_sequence(&index, &seq, false).is_empty());
}

#[test]
fn fields_come_from_the_activating_descriptor() {
    let text = "3\n\
                10,0,0,6710886,0,\n\
                11,7,0,6710886,4,\n\
                12,1,16777215,16777215,9,\n";
    let index = KmerIndex::build(FeatureStore::load(text).unwrap());
    // 6710886 is GCGCGCGCGCGC; 16777215 with a full mask is TTTTTTTTTTTT.
    let seq = normalize(b"GCGCGCGCGCGCTTTTTTTTTTTT", MAX_SEQ_LEN);
    let hits = scan_sequence(&index, &seq, false);
    let got: Vec<_> = hits
        .iter()
        .map(|m| (m.feature_index, m.fragment_index, m.shift, m.position))
        .collect();
    assert_eq!(got, vec![(10, 0, 0, 11), (11, 7, 4, 11), (12, 1, 9, 23)]);
    assert_eq!(encode_kmer(b"TTTTTTTTTTTT"), Some(KMER_MASK));
}

#[test]
fn built_database_finds_its_own_features_once() {
    let sources = [
        FeatureSource::new("ori", "TTGAGATCCTTTTTTTCTGCGCGTAATC"),
        FeatureSource::new("EcoRI-ish", "GAATTCGGATCC").enzyme(true),
    ];
    let db = build_feature_db(&sources, &BuildConfig::default()).unwrap();
    let index = KmerIndex::build(db.into_store().unwrap());

    // Put the ori across the wrap point of a circular sequence.
    let ori = "TTGAGATCCTTTTTTTCTGCGCGTAATC";
    let raw = format!("{}CCCCCCCCCCCCCCCCCCCC{}", &ori[10..], &ori[..10]);
    let seq = normalize(raw.as_bytes(), MAX_SEQ_LEN);
    let hits = scan_sequence(&index, &seq, true);

    let ori: Vec<_> = hits
        .iter()
        .filter(|m| m.feature_index == 0)
        .map(|m| (m.fragment_index, m.start(), m.shift))
        .collect();
    // Fragment 0 wraps, so it is found last; the merged tail carries its shift.
    assert_eq!(ori, vec![(1, 2, 0), (2, 6, 8), (0, 38, 0)]);
    assert!(hits.iter().all(|m| m.start() < seq.len()));
}
