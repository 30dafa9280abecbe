//! CPU capability probe (§4.2).

/// SIMD tiers the search loop can run at. The report is a snapshot taken at
/// call time; the core assumes it does not change for the lifetime of the
/// process.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CpuTier {
    /// No usable SIMD width; use the portable scalar transform.
    Scalar,
    /// 128-bit SIMD, 4 lanes of 32-bit words (SSE2/SSSE3).
    Simd128,
    /// 256-bit SIMD, 8 lanes of 32-bit words (AVX).
    Simd256,
}

/// Detect the best SIMD tier available on the current host.
///
/// AVX2 implies `Simd256` (the 8-lane transform is built on AVX2 integer
/// intrinsics, not merely AVX); SSE2 implies `Simd128`; anything else falls
/// back to `Scalar`. Other ISAs substitute their own analogous runtime
/// probe — the rest of the core depends only on the reported tier.
pub fn probe() -> CpuTier {
    #[cfg(all(target_arch = "x86_64", feature = "std"))]
    {
        let tier = if is_x86_feature_detected!("avx2") {
            CpuTier::Simd256
        } else if is_x86_feature_detected!("sse2") {
            CpuTier::Simd128
        } else {
            CpuTier::Scalar
        };
        log::debug!("cpu capability probe: {:?}", tier);
        return tier;
    }

    // SSE2 is part of the x86-64 baseline ABI, so a `no_std` build (where
    // `is_x86_feature_detected!` is unavailable, it's a `std` macro) can
    // still safely report `Simd128` without a runtime check.
    #[cfg(all(target_arch = "x86_64", not(feature = "std")))]
    {
        log::debug!("cpu capability probe: {:?}", CpuTier::Simd128);
        return CpuTier::Simd128;
    }

    #[cfg(not(target_arch = "x86_64"))]
    {
        log::debug!("cpu capability probe: {:?}", CpuTier::Scalar);
        CpuTier::Scalar
    }
}
