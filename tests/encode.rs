use frag_scan::encode::*;

#[test]
fn test_encode_masks_revcomp() {
    let s = b"AGCTAGCTAGCT";
    let code = encode_kmer(s).unwrap();
    // A=0 G=1 C=2 T=3, first base in the high bits
    assert_eq!(code, 0b00_01_10_11_00_01_10_11_00_01_10_11);
    assert_eq!(code & base_mask(KTUP - 1), 3);

    let rc = revcomp(s);
    assert_eq!(rc, b"AGCTAGCTAGCT".to_vec());
    assert_eq!(encode_kmer(b"AGC").unwrap() & !prefix_mask(3), 0);
}
