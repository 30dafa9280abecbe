//! Nonce broadcast / lane packer (§4.3).
//!
//! Builds the per-iteration message block by broadcasting the immutable 15
//! words and splicing W distinct nonce values into word index 3, one per
//! lane, according to the fixed permutation π.

use crate::lanes::Lane;

/// π(i) for a given lane width: lane i carries nonce `base + PI[i]`.
///
/// W=4: (3, 2, 1, 0). W=8: (7, 6, 5, 4, 3, 2, 1, 0). This falls directly
/// out of broadcasting `base` to every lane and adding a constant vector of
/// descending indices, matching how the lane-packed nonce register was
/// historically built with `_mm_set_epi32(nonce+0, nonce+1, nonce+2,
/// nonce+3)` (high-to-low argument order puts `nonce+3` in lane 0).
pub fn lane_offsets<const W: usize, L: Lane<W>>() -> L {
    let mut offsets = [0u32; W];
    for i in 0..W {
        offsets[i] = (W - 1 - i) as u32;
    }
    L::from_array(offsets)
}

/// Word index 3 of the lane-packed round-1 block for scalar nonce `base`:
/// lane i holds `base + π(i)`.
pub fn pack_nonce_word<const W: usize, L: Lane<W>>(base: u32) -> L {
    L::splat(base).add(lane_offsets::<W, L>())
}
