//! Search loop (§4.4) and host-facing entry points (§4.5).

use crate::error::{CoreError, Result};
use crate::lanes::Lane;
use crate::packer::lane_offsets;
use crate::transform::transform;

#[cfg(target_arch = "x86_64")]
use crate::lanes::{Avx2x8, Sse2x4};
#[cfg(not(target_arch = "x86_64"))]
use crate::lanes::Scalar;

/// 8 chaining-value words, in the order a..h.
pub type State = [u32; 8];
/// 16 message-schedule words of one 512-bit SHA-256 block.
pub type Block = [u32; 16];

/// The progress-threshold constant this crate uses for both lane-width
/// tiers, T = 2^17. Confirmed against the original `BitMaker` source
/// (`nonce % 131072 == 0`, see SPEC_FULL.md §11); it sits inside the
/// `[2^16, 2^20]` power-of-two range spec.md §4.4 requires.
pub const DEFAULT_PROGRESS_THRESHOLD: u32 = 131_072;

/// The four byte buffers a search call needs, already validated and
/// decoded into host-order word arrays (§3, §6).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchInputs {
    pub round1_midstate: State,
    pub round1_block2: Block,
    pub round2_init_state: State,
    pub round2_block1: Block,
}

impl SearchInputs {
    /// Decode the four byte buffers, validating each against its required
    /// length (32 bytes for state buffers, 64 for block buffers). A wrong
    /// length is a programmer error reported at the boundary (§7), never a
    /// search outcome.
    pub fn from_bytes(
        round1_midstate: &[u8],
        round1_block2: &[u8],
        round2_init_state: &[u8],
        round2_block1: &[u8],
    ) -> Result<Self> {
        Ok(SearchInputs {
            round1_midstate: parse_state(round1_midstate, "round1_midstate")?,
            round1_block2: parse_block(round1_block2, "round1_block2")?,
            round2_init_state: parse_state(round2_init_state, "round2_init_state")?,
            round2_block1: parse_block(round2_block1, "round2_block1")?,
        })
    }
}

fn parse_state(bytes: &[u8], field: &'static str) -> Result<State> {
    if bytes.len() != 32 {
        log::debug!(
            "entry-point validation failed: {field} expected 32 bytes, got {}",
            bytes.len()
        );
        return Err(CoreError::InvalidBufferLength {
            field,
            expected: 32,
            actual: bytes.len(),
        });
    }
    Ok(core::array::from_fn(|i| {
        u32::from_ne_bytes(bytes[i * 4..i * 4 + 4].try_into().unwrap())
    }))
}

fn parse_block(bytes: &[u8], field: &'static str) -> Result<Block> {
    if bytes.len() != 64 {
        log::debug!(
            "entry-point validation failed: {field} expected 64 bytes, got {}",
            bytes.len()
        );
        return Err(CoreError::InvalidBufferLength {
            field,
            expected: 64,
            actual: bytes.len(),
        });
    }
    Ok(core::array::from_fn(|i| {
        u32::from_ne_bytes(bytes[i * 4..i * 4 + 4].try_into().unwrap())
    }))
}

/// Outcome of a `search` call: either a found nonce (already byte-swapped
/// to the documented wire order, §6) or the collapsed not-found/cancelled
/// result (§7).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SearchOutput {
    /// A nonce whose second-round hash satisfies the zero-tail condition,
    /// already `endian_swap32`-ed per §6.
    Found(u32),
    /// Either the nonce range was exhausted or `progress` returned false.
    NotFound,
}

impl SearchOutput {
    pub fn nonce(self) -> Option<u32> {
        match self {
            SearchOutput::Found(n) => Some(n),
            SearchOutput::NotFound => None,
        }
    }
}

/// Decode the zero-tail mask of `hash2[7]` into the smallest matching
/// nonce offset (§4.4 step 5): scan lane `W-1` down to lane `0`, which is
/// ascending-nonce order under the fixed permutation π (§4.3), and return
/// the offset `k` of the first lane that reads zero.
///
/// This is a pure function of the already-computed tail word so the
/// smallest-nonce tie-break rule (testable property 4) can be checked
/// directly against synthetic tails, without needing a genuine SHA-256
/// collision at every call site that exercises it.
fn decode_winning_lane<const W: usize>(tail: [u32; W]) -> Option<u32> {
    (0..W).find_map(|k| {
        let lane = W - 1 - k;
        (tail[lane] == 0).then_some(k as u32)
    })
}

/// One search iteration (§4.4 steps 1-5) for the batch starting at
/// `nonce_base`: splice nonces, run both transforms, test the zero tail,
/// and decode the winning lane if any. Returns the already byte-swapped
/// found nonce (§6) or `None` if this batch has no hit.
///
/// Factored out of the loop so it can be exercised directly against a
/// genuine double-SHA-256 zero-tail instance without replaying the
/// incremental search from nonce zero.
fn run_iteration<const W: usize, L: Lane<W>>(
    state1: [L; 8],
    block1: &mut [L; 16],
    state2: [L; 8],
    block2: &mut [L; 16],
    offsets: L,
    nonce_base: u32,
) -> Option<u32> {
    block1[3] = L::splat(nonce_base).add(offsets);

    let hash1 = transform(state1, *block1);
    block2[..8].copy_from_slice(&hash1);

    let hash2 = transform(state2, *block2);

    if !hash2[7].any_eq_zero() {
        return None;
    }
    let tail = hash2[7].to_array();
    decode_winning_lane(tail).map(|k| nonce_base.wrapping_add(k).swap_bytes())
}

/// The width-generic search loop (§4.4), parameterised over lane count `W`
/// and the `Lane<W>` implementation to run it with.
///
/// Runs until it finds a nonce, exhausts the 32-bit nonce space, or
/// `progress` returns `false` at a reporting gate every `threshold` hashes.
/// `threshold` must be a positive multiple of `W`.
pub fn search<const W: usize, L: Lane<W>>(
    inputs: &SearchInputs,
    threshold: u32,
    mut progress: impl FnMut(u32) -> bool,
) -> SearchOutput {
    debug_assert!(threshold > 0 && threshold % (W as u32) == 0);

    let state1: [L; 8] = core::array::from_fn(|i| L::splat(inputs.round1_midstate[i]));
    let mut block1: [L; 16] = core::array::from_fn(|i| L::splat(inputs.round1_block2[i]));
    let state2: [L; 8] = core::array::from_fn(|i| L::splat(inputs.round2_init_state[i]));
    let mut block2: [L; 16] = core::array::from_fn(|i| L::splat(inputs.round2_block1[i]));
    let offsets = lane_offsets::<W, L>();

    let mut nonce: u32 = 0;
    let mut tried: u32 = 0;

    loop {
        if let Some(found) = run_iteration(state1, &mut block1, state2, &mut block2, offsets, nonce)
        {
            return SearchOutput::Found(found);
        }

        match nonce.checked_add(W as u32) {
            Some(next) => nonce = next,
            None => return SearchOutput::NotFound,
        }
        tried += W as u32;

        if tried >= threshold {
            if !progress(tried) {
                return SearchOutput::NotFound;
            }
            tried = 0;
        }
    }
}

/// W=4 host-facing entry point. Uses SSE2 (x86-64 baseline, no runtime
/// check needed) where available, the portable scalar lane vector
/// elsewhere.
pub fn search_simd128(
    round1_midstate: &[u8],
    round1_block2: &[u8],
    round2_init_state: &[u8],
    round2_block1: &[u8],
    progress: impl FnMut(u32) -> bool,
) -> Result<SearchOutput> {
    let inputs = SearchInputs::from_bytes(
        round1_midstate,
        round1_block2,
        round2_init_state,
        round2_block1,
    )?;

    #[cfg(target_arch = "x86_64")]
    {
        Ok(search::<4, Sse2x4>(
            &inputs,
            DEFAULT_PROGRESS_THRESHOLD,
            progress,
        ))
    }
    #[cfg(not(target_arch = "x86_64"))]
    {
        Ok(search::<4, Scalar<4>>(
            &inputs,
            DEFAULT_PROGRESS_THRESHOLD,
            progress,
        ))
    }
}

/// W=8 host-facing entry point. On x86-64 this runs the AVX2 lane vector
/// unconditionally; callers MUST have consulted [`crate::cpu::probe`] and
/// observed [`crate::cpu::CpuTier::Simd256`] first — calling this on a host
/// without AVX2 is undefined behaviour (§7), the core performs no runtime
/// feature check of its own here. On non-x86-64 hosts this runs the
/// portable scalar lane vector, which is always safe to call.
pub fn search_simd256(
    round1_midstate: &[u8],
    round1_block2: &[u8],
    round2_init_state: &[u8],
    round2_block1: &[u8],
    progress: impl FnMut(u32) -> bool,
) -> Result<SearchOutput> {
    let inputs = SearchInputs::from_bytes(
        round1_midstate,
        round1_block2,
        round2_init_state,
        round2_block1,
    )?;

    #[cfg(target_arch = "x86_64")]
    {
        Ok(search::<8, Avx2x8>(
            &inputs,
            DEFAULT_PROGRESS_THRESHOLD,
            progress,
        ))
    }
    #[cfg(not(target_arch = "x86_64"))]
    {
        Ok(search::<8, Scalar<8>>(
            &inputs,
            DEFAULT_PROGRESS_THRESHOLD,
            progress,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::H0;
    use crate::lanes::Scalar;
    use crate::scalar as scalar_sha256;

    /// A harmless fixed round1_block2 for tests that don't care about
    /// finding a real zero-tail hit: word 0 carries the single-block
    /// SHA-256 padding marker for the empty string, word 3 (the nonce
    /// slot) is overwritten every iteration as usual.
    const PLACEHOLDER_BLOCK1: Block = {
        let mut b = [0u32; 16];
        b[0] = 0x8000_0000;
        b
    };

    fn pad_for_32_byte_message() -> Block {
        let mut b = [0u32; 16];
        b[8] = 0x8000_0000;
        b[15] = 256;
        b
    }

    fn harmless_inputs() -> SearchInputs {
        SearchInputs {
            round1_midstate: H0,
            round1_block2: PLACEHOLDER_BLOCK1,
            round2_init_state: H0,
            round2_block1: pad_for_32_byte_message(),
        }
    }

    // --- decode_winning_lane: property 4, smallest-nonce tie-break ---

    #[test]
    fn decode_returns_none_when_no_lane_is_zero() {
        assert_eq!(decode_winning_lane([1, 2, 3, 4]), None);
    }

    #[test]
    fn decode_picks_the_smallest_nonce_on_a_single_hit() {
        // W=4, pi = (3,2,1,0): nonce base+2 lives in lane 1.
        assert_eq!(decode_winning_lane([1, 0, 2, 3]), Some(2));
    }

    #[test]
    fn decode_prefers_the_smallest_nonce_on_a_tie() {
        // Lanes 3 (nonce+0) and 0 (nonce+3) both hit; nonce+0 must win.
        assert_eq!(decode_winning_lane([0, 7, 8, 0]), Some(0));

        // Lanes 1 (nonce+2) and 2 (nonce+1) both hit; nonce+1 must win.
        assert_eq!(decode_winning_lane([9, 9, 0, 0]), Some(1));
    }

    #[test]
    fn decode_handles_w8() {
        let mut tail = [1u32; 8];
        tail[2] = 0; // lane 2 -> nonce+5
        tail[5] = 0; // lane 5 -> nonce+2, smaller, must win
        assert_eq!(decode_winning_lane(tail), Some(2));
    }

    // --- S1/S2: known-answer SHA-256 and double-SHA-256 ---

    #[test]
    fn s1_round1_matches_known_answer_empty_string() {
        let block: [Scalar<4>; 16] =
            core::array::from_fn(|i| Scalar::splat(PLACEHOLDER_BLOCK1[i]));
        let state: [Scalar<4>; 8] = core::array::from_fn(|i| Scalar::splat(H0[i]));
        let hash1 = transform(state, block);
        let words: [u32; 8] = core::array::from_fn(|i| hash1[i].to_array()[0]);
        assert_eq!(words, scalar_sha256::compress(H0, PLACEHOLDER_BLOCK1));

        let mut digest = [0u8; 32];
        for (i, w) in words.iter().enumerate() {
            digest[i * 4..i * 4 + 4].copy_from_slice(&w.to_be_bytes());
        }
        assert_eq!(
            hex::encode(digest),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn s2_round2_matches_reference_double_sha256() {
        let hash1 = scalar_sha256::compress(H0, PLACEHOLDER_BLOCK1);
        let mut block2 = pad_for_32_byte_message();
        block2[..8].copy_from_slice(&hash1);
        let hash2 = scalar_sha256::compress(H0, block2);

        let mut digest1 = [0u8; 32];
        for (i, w) in hash1.iter().enumerate() {
            digest1[i * 4..i * 4 + 4].copy_from_slice(&w.to_be_bytes());
        }
        let reference = scalar_sha256::sha256(&digest1);

        let mut digest2 = [0u8; 32];
        for (i, w) in hash2.iter().enumerate() {
            digest2[i * 4..i * 4 + 4].copy_from_slice(&w.to_be_bytes());
        }
        assert_eq!(digest2, reference);
    }

    // --- S3: exhaustive run with no solution, cancellation + progress accounting ---

    #[test]
    fn s3_cancellation_stops_within_one_batch_of_the_false_return() {
        let inputs = harmless_inputs();
        let threshold = 4u32; // W=4, one batch per gate
        let mut calls = 0u32;
        let limit = 3;
        let result = search::<4, Scalar<4>>(&inputs, threshold, |hash_count| {
            assert_eq!(hash_count, threshold);
            calls += 1;
            calls < limit
        });
        assert_eq!(result, SearchOutput::NotFound);
        assert_eq!(calls, limit);
    }

    #[test]
    fn progress_accounting_sums_to_total_hashes_tried() {
        let inputs = harmless_inputs();
        let threshold = 8u32;
        let mut total = 0u64;
        let result = search::<4, Scalar<4>>(&inputs, threshold, |hash_count| {
            total += hash_count as u64;
            total < 64
        });
        assert_eq!(result, SearchOutput::NotFound);
        assert_eq!(total % threshold as u64, 0);
        assert!(total > 0);
    }

    #[test]
    fn determinism_holds_across_repeated_bounded_runs() {
        let inputs = harmless_inputs();
        let run = || {
            let mut n = 0u32;
            search::<4, Scalar<4>>(&inputs, 4, |_| {
                n += 1;
                n < 16
            })
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn no_state_leakage_between_back_to_back_searches() {
        let inputs_a = harmless_inputs();
        let mut inputs_b = harmless_inputs();
        inputs_b.round1_midstate[0] ^= 0xdead_beef;

        let isolated_a = search::<4, Scalar<4>>(&inputs_a, 4, |_| false);
        let a_then_b_a = {
            let _ = search::<4, Scalar<4>>(&inputs_b, 4, |_| false);
            search::<4, Scalar<4>>(&inputs_a, 4, |_| false)
        };

        assert_eq!(isolated_a, a_then_b_a);
    }

    // --- buffer validation ---

    #[test]
    fn from_bytes_rejects_wrong_length_buffers() {
        let state = [0u8; 32];
        let block = [0u8; 64];
        let short_block = [0u8; 63];
        let err = SearchInputs::from_bytes(&state, &short_block, &state, &block).unwrap_err();
        assert_eq!(
            err,
            CoreError::InvalidBufferLength {
                field: "round1_block2",
                expected: 64,
                actual: 63,
            }
        );
    }

    #[test]
    fn from_bytes_accepts_correctly_sized_buffers() {
        let state = [0u8; 32];
        let block = [0u8; 64];
        assert!(SearchInputs::from_bytes(&state, &block, &state, &block).is_ok());
    }

    #[test]
    fn search_simd128_entry_point_agrees_with_the_generic_loop() {
        let inputs = harmless_inputs();
        let mut midstate_bytes = [0u8; 32];
        let mut block1_bytes = [0u8; 64];
        let mut init_bytes = [0u8; 32];
        let mut block2_bytes = [0u8; 64];
        for (i, w) in inputs.round1_midstate.iter().enumerate() {
            midstate_bytes[i * 4..i * 4 + 4].copy_from_slice(&w.to_ne_bytes());
        }
        for (i, w) in inputs.round1_block2.iter().enumerate() {
            block1_bytes[i * 4..i * 4 + 4].copy_from_slice(&w.to_ne_bytes());
        }
        for (i, w) in inputs.round2_init_state.iter().enumerate() {
            init_bytes[i * 4..i * 4 + 4].copy_from_slice(&w.to_ne_bytes());
        }
        for (i, w) in inputs.round2_block1.iter().enumerate() {
            block2_bytes[i * 4..i * 4 + 4].copy_from_slice(&w.to_ne_bytes());
        }

        let mut calls = 0u32;
        let via_entry_point = search_simd128(
            &midstate_bytes,
            &block1_bytes,
            &init_bytes,
            &block2_bytes,
            |_| {
                calls += 1;
                calls < 16
            },
        )
        .unwrap();
        assert_eq!(via_entry_point, SearchOutput::NotFound);
    }
}
