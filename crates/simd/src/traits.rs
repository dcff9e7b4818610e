//! Core SIMD lane abstraction traits
//!
//! This module defines the capability interface that every execution tier
//! implements. Kernels are written once against `SimdVector` and compile to
//! the tier's native instructions; the tier is a performance choice, never a
//! semantic one.

/// Abstract vector of `LANES` consecutive `f32` elements.
///
/// All backends (scalar, AVX2, AVX-512, NEON) implement this trait with
/// functionally identical behavior. Integer results are bit-identical across
/// backends; floating-point reductions agree within standard rounding error
/// because every backend reduces through a fixed pairwise tree.
///
/// # Tail handling
///
/// Buffers whose width is not a multiple of `LANES` are finished with a
/// [`TailMask`]: masked loads read only the enabled lanes (substituting a
/// caller-chosen neutral value elsewhere) and masked stores write only the
/// enabled lanes. No memory outside the caller's slice is ever touched.
pub trait SimdVector: Copy + Sized {
    /// Per-lane enable pattern for tail loads and stores.
    type Mask: TailMask;

    /// Number of lanes (1 scalar, 4 NEON, 8 AVX2, 16 AVX-512).
    const LANES: usize;

    /// Byte alignment required by the aligned load/store forms.
    const ALIGN: usize;

    /// Broadcast one value to all lanes.
    fn splat(value: f32) -> Self;

    /// All lanes zero.
    fn zero() -> Self;

    /// Unaligned load of `LANES` elements.
    ///
    /// # Panics
    ///
    /// Panics if `slice.len() < LANES`.
    fn from_slice(slice: &[f32]) -> Self;

    /// Aligned load of `LANES` elements.
    ///
    /// The caller must have proven (once per call, from the base pointer and
    /// stride) that `slice` starts on an `ALIGN`-byte boundary. Debug builds
    /// assert this.
    fn from_slice_aligned(slice: &[f32]) -> Self;

    /// Masked load: lanes `0..mask.len()` come from `slice`, the remaining
    /// lanes hold `fill`. Reads no element at or past `slice[mask.len()]`.
    ///
    /// # Panics
    ///
    /// Panics if `slice.len() < mask.len()`.
    fn from_slice_masked(slice: &[f32], mask: Self::Mask, fill: f32) -> Self;

    /// Unaligned store of `LANES` elements.
    fn to_slice(self, slice: &mut [f32]);

    /// Aligned store; same alignment contract as [`Self::from_slice_aligned`].
    fn to_slice_aligned(self, slice: &mut [f32]);

    /// Masked store: writes lanes `0..mask.len()` and leaves every other
    /// element of `slice` untouched.
    fn to_slice_masked(self, slice: &mut [f32], mask: Self::Mask);

    /// Lane-wise addition.
    fn add(self, rhs: Self) -> Self;

    /// Lane-wise subtraction.
    fn sub(self, rhs: Self) -> Self;

    /// Lane-wise multiplication.
    fn mul(self, rhs: Self) -> Self;

    /// Lane-wise minimum.
    fn min(self, rhs: Self) -> Self;

    /// Lane-wise maximum.
    fn max(self, rhs: Self) -> Self;

    /// Fused multiply-add: `self * b + c`.
    fn fma(self, b: Self, c: Self) -> Self;

    /// Sum of all lanes, reduced through a fixed pairwise tree.
    fn horizontal_sum(self) -> f32;

    /// Minimum across all lanes.
    fn horizontal_min(self) -> f32;

    /// Maximum across all lanes.
    fn horizontal_max(self) -> f32;
}

/// Per-lane enable pattern restricting a load or store to the first
/// `len` lanes of a vector.
///
/// A mask is computed once per call from the row width and reused for every
/// row; it is never stored beyond the call.
pub trait TailMask: Copy {
    /// Mask enabling lanes `0..len`.
    ///
    /// # Panics
    ///
    /// Panics unless `0 < len <= LANES` of the associated vector type.
    fn tail(len: usize) -> Self;

    /// Number of enabled lanes.
    fn len(self) -> usize;
}
