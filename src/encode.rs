//! K-mer encoding: 2-bit mapping, packing, masks, reverse complement.
//!
//! Conventions
//! - Base codes are A=0, G=1, C=2, T=3 (the feature file format depends on this order).
//! - A packed k-mer is **LSB-aligned**: the first base sits in the highest used bit pair,
//!   so a full 12-mer occupies the lower 24 bits.
//! - Fragments shorter than [`KTUP`] are padded on the right with A before packing.

/// Window length in bases.
pub const KTUP: usize = 12;

/// Mask for a packed full window (`4^KTUP - 1`).
pub const KMER_MASK: u32 = (1u32 << (2 * KTUP)) - 1;

/// Number of distinct packed windows (`4^KTUP`).
pub const KMER_SPACE: usize = 1usize << (2 * KTUP);

/// Sentinel in [`MAP_LUT`] for characters that are not bases.
pub const NOT_A_BASE: u8 = 0xFF;

/// 256-entry LUT: ASCII → 2-bit (A=0, G=1, C=2, T=3), [`NOT_A_BASE`] otherwise.
pub static MAP_LUT: [u8; 256] = {
    const X: u8 = NOT_A_BASE;
    let mut t = [X; 256];
    t[b'A' as usize] = 0;
    t[b'a' as usize] = 0;
    t[b'G' as usize] = 1;
    t[b'g' as usize] = 1;
    t[b'C' as usize] = 2;
    t[b'c' as usize] = 2;
    t[b'T' as usize] = 3;
    t[b't' as usize] = 3;
    t
};

/// 2-bit code via LUT. `None` if `b` is not a base.
#[inline]
pub fn map_base(b: u8) -> Option<u8> {
    let v = MAP_LUT[b as usize];
    if v <= 3 { Some(v) } else { None }
}

/// 2-bit code for a scanner input byte; anything that is not a base reads as A.
#[inline]
pub fn scan_code(b: u8) -> u32 {
    match MAP_LUT[b as usize] {
        NOT_A_BASE => 0,
        v => v as u32,
    }
}

/// Pack up to [`KTUP`] bases, right-padding with A. `N`/`n` pack as A.
///
/// Returns `None` for an empty or over-long window, or on any other non-base byte.
#[inline]
pub fn encode_kmer(window: &[u8]) -> Option<u32> {
    if window.is_empty() || window.len() > KTUP {
        return None;
    }
    let mut code: u32 = 0;
    for &b in window {
        let v = match b {
            b'N' | b'n' => 0,
            _ => map_base(b)?,
        };
        code = (code << 2) | v as u32;
    }
    Some(code << (2 * (KTUP - window.len())))
}

/// Mask selecting the leading `len` bases of a packed window.
#[inline]
pub fn prefix_mask(len: usize) -> u32 {
    let len = len.min(KTUP);
    if len == 0 {
        return 0;
    }
    KMER_MASK & !((1u32 << (2 * (KTUP - len))) - 1)
}

/// Mask selecting the single base at `offset` (0 = first base of the window).
#[inline]
pub fn base_mask(offset: usize) -> u32 {
    debug_assert!(offset < KTUP);
    0b11 << (2 * (KTUP - 1 - offset))
}

/// Reverse complement of an ASCII sequence. `N` stays `N`; other non-ACGT bytes are dropped.
pub fn revcomp(seq: &[u8]) -> Vec<u8> {
    seq.iter()
        .rev()
        .filter_map(|&b| match b.to_ascii_uppercase() {
            b'A' => Some(b'T'),
            b'T' => Some(b'A'),
            b'G' => Some(b'C'),
            b'C' => Some(b'G'),
            b'N' => Some(b'N'),
            _ => None,
        })
        .collect()
}
