//! `LaneVector<Word, W>` primitives.
//!
//! `Lane<W>` is implemented once generically over plain arrays (`Scalar`,
//! used for the scalar capability tier and as the portable fallback on
//! non-x86 hosts) and twice over real SIMD registers (`Sse2x4` for W=4,
//! `Avx2x8` for W=8). The transform itself (`transform.rs`) is written
//! once against the trait and is shared by all three.

/// W parallel 32-bit lanes with lanewise bitwise/arithmetic primitives.
///
/// Implementors must not heap-allocate in any method.
pub trait Lane<const W: usize>: Copy {
    /// All W lanes set to `x`.
    fn splat(x: u32) -> Self;

    /// Lanewise modular 32-bit addition.
    fn add(self, other: Self) -> Self;

    /// Lanewise XOR.
    fn xor(self, other: Self) -> Self;

    /// Lanewise AND.
    fn and(self, other: Self) -> Self;

    /// Lanewise `(!self) & other`, matching the hardware `andnot` instruction.
    fn andnot(self, other: Self) -> Self;

    /// Lanewise logical shift left by `n` bits (0 <= n < 32).
    fn shl(self, n: u32) -> Self;

    /// Lanewise logical shift right by `n` bits (0 <= n < 32).
    fn shr(self, n: u32) -> Self;

    /// Lanewise rotate-right by `n` bits (0 < n < 32).
    #[inline]
    fn rotr(self, n: u32) -> Self {
        self.shr(n).xor(self.shl(32 - n))
    }

    /// A fast, portable "any lane equal to zero?" predicate, implemented as
    /// a SIMD compare-and-reduce rather than a type-punned pointer read.
    fn any_eq_zero(self) -> bool;

    /// Store lanes to an array, index i holding the value of lane i.
    fn to_array(self) -> [u32; W];

    /// Load lanes from an array, index i becoming the value of lane i.
    fn from_array(words: [u32; W]) -> Self;
}

/// Portable lane vector backed by a plain array. Used for the `scalar`
/// capability tier, for non-x86 hosts, and as the cross-check oracle in
/// tests.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Scalar<const W: usize>(pub [u32; W]);

impl<const W: usize> Lane<W> for Scalar<W> {
    #[inline]
    fn splat(x: u32) -> Self {
        Scalar([x; W])
    }

    #[inline]
    fn add(self, other: Self) -> Self {
        let mut out = [0u32; W];
        for i in 0..W {
            out[i] = self.0[i].wrapping_add(other.0[i]);
        }
        Scalar(out)
    }

    #[inline]
    fn xor(self, other: Self) -> Self {
        let mut out = [0u32; W];
        for i in 0..W {
            out[i] = self.0[i] ^ other.0[i];
        }
        Scalar(out)
    }

    #[inline]
    fn and(self, other: Self) -> Self {
        let mut out = [0u32; W];
        for i in 0..W {
            out[i] = self.0[i] & other.0[i];
        }
        Scalar(out)
    }

    #[inline]
    fn andnot(self, other: Self) -> Self {
        let mut out = [0u32; W];
        for i in 0..W {
            out[i] = !self.0[i] & other.0[i];
        }
        Scalar(out)
    }

    #[inline]
    fn shl(self, n: u32) -> Self {
        let mut out = [0u32; W];
        for i in 0..W {
            out[i] = self.0[i] << n;
        }
        Scalar(out)
    }

    #[inline]
    fn shr(self, n: u32) -> Self {
        let mut out = [0u32; W];
        for i in 0..W {
            out[i] = self.0[i] >> n;
        }
        Scalar(out)
    }

    #[inline]
    fn any_eq_zero(self) -> bool {
        self.0.iter().any(|&w| w == 0)
    }

    #[inline]
    fn to_array(self) -> [u32; W] {
        self.0
    }

    #[inline]
    fn from_array(words: [u32; W]) -> Self {
        Scalar(words)
    }
}

#[cfg(target_arch = "x86_64")]
mod x86 {
    use super::Lane;
    use core::arch::x86_64::*;

    /// Four lanes held in a 128-bit SSE2 register. SSE2 is part of the
    /// x86-64 baseline, so no runtime feature check is needed to use it.
    #[derive(Copy, Clone)]
    pub struct Sse2x4(pub __m128i);

    impl Sse2x4 {
        #[inline]
        unsafe fn shift(self, n: u32, left: bool) -> Self {
            let count = _mm_set1_epi64x(n as i64);
            if left {
                Sse2x4(_mm_sll_epi32(self.0, count))
            } else {
                Sse2x4(_mm_srl_epi32(self.0, count))
            }
        }
    }

    impl Lane<4> for Sse2x4 {
        #[inline]
        fn splat(x: u32) -> Self {
            unsafe { Sse2x4(_mm_set1_epi32(x as i32)) }
        }

        #[inline]
        fn add(self, other: Self) -> Self {
            unsafe { Sse2x4(_mm_add_epi32(self.0, other.0)) }
        }

        #[inline]
        fn xor(self, other: Self) -> Self {
            unsafe { Sse2x4(_mm_xor_si128(self.0, other.0)) }
        }

        #[inline]
        fn and(self, other: Self) -> Self {
            unsafe { Sse2x4(_mm_and_si128(self.0, other.0)) }
        }

        #[inline]
        fn andnot(self, other: Self) -> Self {
            unsafe { Sse2x4(_mm_andnot_si128(self.0, other.0)) }
        }

        #[inline]
        fn shl(self, n: u32) -> Self {
            unsafe { self.shift(n, true) }
        }

        #[inline]
        fn shr(self, n: u32) -> Self {
            unsafe { self.shift(n, false) }
        }

        #[inline]
        fn any_eq_zero(self) -> bool {
            unsafe {
                let cmp = _mm_cmpeq_epi32(self.0, _mm_setzero_si128());
                _mm_movemask_epi8(cmp) != 0
            }
        }

        #[inline]
        fn to_array(self) -> [u32; 4] {
            let mut out = [0u32; 4];
            unsafe { _mm_storeu_si128(out.as_mut_ptr() as *mut __m128i, self.0) };
            out
        }

        #[inline]
        fn from_array(words: [u32; 4]) -> Self {
            unsafe { Sse2x4(_mm_loadu_si128(words.as_ptr() as *const __m128i)) }
        }
    }

    /// Eight lanes held in a 256-bit AVX2 register.
    ///
    /// Every method here delegates to an inherent `#[target_feature(enable =
    /// "avx2")]` helper: AVX2 is not part of the x86-64 baseline, so the
    /// compiler must be told explicitly that the surrounding code path has
    /// already been gated by a runtime check (see `cpu::probe`).
    #[derive(Copy, Clone)]
    pub struct Avx2x8(pub __m256i);

    impl Avx2x8 {
        #[target_feature(enable = "avx2")]
        #[inline]
        unsafe fn splat_impl(x: u32) -> Self {
            Avx2x8(_mm256_set1_epi32(x as i32))
        }

        #[target_feature(enable = "avx2")]
        #[inline]
        unsafe fn add_impl(self, other: Self) -> Self {
            Avx2x8(_mm256_add_epi32(self.0, other.0))
        }

        #[target_feature(enable = "avx2")]
        #[inline]
        unsafe fn xor_impl(self, other: Self) -> Self {
            Avx2x8(_mm256_xor_si256(self.0, other.0))
        }

        #[target_feature(enable = "avx2")]
        #[inline]
        unsafe fn and_impl(self, other: Self) -> Self {
            Avx2x8(_mm256_and_si256(self.0, other.0))
        }

        #[target_feature(enable = "avx2")]
        #[inline]
        unsafe fn andnot_impl(self, other: Self) -> Self {
            Avx2x8(_mm256_andnot_si256(self.0, other.0))
        }

        #[target_feature(enable = "avx2")]
        #[inline]
        unsafe fn shift_impl(self, n: u32, left: bool) -> Self {
            let count = _mm_set1_epi64x(n as i64);
            if left {
                Avx2x8(_mm256_sll_epi32(self.0, count))
            } else {
                Avx2x8(_mm256_srl_epi32(self.0, count))
            }
        }

        #[target_feature(enable = "avx2")]
        #[inline]
        unsafe fn any_eq_zero_impl(self) -> bool {
            let cmp = _mm256_cmpeq_epi32(self.0, _mm256_setzero_si256());
            _mm256_movemask_epi8(cmp) != 0
        }

        #[target_feature(enable = "avx2")]
        #[inline]
        unsafe fn to_array_impl(self) -> [u32; 8] {
            let mut out = [0u32; 8];
            _mm256_storeu_si256(out.as_mut_ptr() as *mut __m256i, self.0);
            out
        }

        #[target_feature(enable = "avx2")]
        #[inline]
        unsafe fn from_array_impl(words: [u32; 8]) -> Self {
            Avx2x8(_mm256_loadu_si256(words.as_ptr() as *const __m256i))
        }
    }

    impl Lane<8> for Avx2x8 {
        #[inline]
        fn splat(x: u32) -> Self {
            unsafe { Self::splat_impl(x) }
        }

        #[inline]
        fn add(self, other: Self) -> Self {
            unsafe { self.add_impl(other) }
        }

        #[inline]
        fn xor(self, other: Self) -> Self {
            unsafe { self.xor_impl(other) }
        }

        #[inline]
        fn and(self, other: Self) -> Self {
            unsafe { self.and_impl(other) }
        }

        #[inline]
        fn andnot(self, other: Self) -> Self {
            unsafe { self.andnot_impl(other) }
        }

        #[inline]
        fn shl(self, n: u32) -> Self {
            unsafe { self.shift_impl(n, true) }
        }

        #[inline]
        fn shr(self, n: u32) -> Self {
            unsafe { self.shift_impl(n, false) }
        }

        #[inline]
        fn any_eq_zero(self) -> bool {
            unsafe { self.any_eq_zero_impl() }
        }

        #[inline]
        fn to_array(self) -> [u32; 8] {
            unsafe { self.to_array_impl() }
        }

        #[inline]
        fn from_array(words: [u32; 8]) -> Self {
            unsafe { Self::from_array_impl(words) }
        }
    }
}

#[cfg(target_arch = "x86_64")]
pub use x86::{Avx2x8, Sse2x4};
