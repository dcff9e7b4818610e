//! AVX-512 backend implementation (x86/x86_64)
//!
//! 16-lane (512-bit) operations. Requires AVX-512F+BW+DQ+VL (Intel
//! Skylake-X 2017+, AMD Zen 4+); the runtime dispatcher only selects this
//! backend after verifying the full feature set.
//!
//! Tail handling uses native `__mmask16` predication; masked loads and stores
//! fault only on enabled lanes, so tails never touch memory past the caller's
//! buffer.

#![cfg(any(target_arch = "x86", target_arch = "x86_64"))]

use crate::traits::{SimdVector, TailMask};

#[cfg(target_arch = "x86_64")]
use core::arch::x86_64::*;

#[cfg(target_arch = "x86")]
use core::arch::x86::*;

/// AVX-512 vector wrapper (16 lanes of f32)
#[derive(Copy, Clone)]
#[repr(transparent)]
pub struct Avx512Vector(__m512);

/// AVX-512 tail mask (`__mmask16` with the low `len` bits set)
#[derive(Copy, Clone)]
pub struct Avx512Mask {
    raw: __mmask16,
    len: usize,
}

impl TailMask for Avx512Mask {
    #[inline(always)]
    fn tail(len: usize) -> Self {
        assert!(len > 0 && len <= 16, "AVX-512 tail length out of range");
        Avx512Mask {
            raw: u16::MAX >> (16 - len),
            len,
        }
    }

    #[inline(always)]
    fn len(self) -> usize {
        self.len
    }
}

impl SimdVector for Avx512Vector {
    type Mask = Avx512Mask;

    const LANES: usize = 16;
    const ALIGN: usize = 64;

    #[inline(always)]
    fn splat(value: f32) -> Self {
        unsafe { Avx512Vector(_mm512_set1_ps(value)) }
    }

    #[inline(always)]
    fn zero() -> Self {
        unsafe { Avx512Vector(_mm512_setzero_ps()) }
    }

    #[inline(always)]
    fn from_slice(slice: &[f32]) -> Self {
        assert!(
            slice.len() >= Self::LANES,
            "slice too short for AVX-512 load"
        );
        unsafe { Avx512Vector(_mm512_loadu_ps(slice.as_ptr())) }
    }

    #[inline(always)]
    fn from_slice_aligned(slice: &[f32]) -> Self {
        assert!(
            slice.len() >= Self::LANES,
            "slice too short for AVX-512 load"
        );
        debug_assert_eq!(slice.as_ptr() as usize % Self::ALIGN, 0);
        unsafe { Avx512Vector(_mm512_load_ps(slice.as_ptr())) }
    }

    #[inline(always)]
    fn from_slice_masked(slice: &[f32], mask: Self::Mask, fill: f32) -> Self {
        assert!(slice.len() >= mask.len, "slice too short for masked load");
        unsafe {
            Avx512Vector(_mm512_mask_loadu_ps(
                _mm512_set1_ps(fill),
                mask.raw,
                slice.as_ptr(),
            ))
        }
    }

    #[inline(always)]
    fn to_slice(self, slice: &mut [f32]) {
        assert!(
            slice.len() >= Self::LANES,
            "slice too short for AVX-512 store"
        );
        unsafe { _mm512_storeu_ps(slice.as_mut_ptr(), self.0) }
    }

    #[inline(always)]
    fn to_slice_aligned(self, slice: &mut [f32]) {
        assert!(
            slice.len() >= Self::LANES,
            "slice too short for AVX-512 store"
        );
        debug_assert_eq!(slice.as_ptr() as usize % Self::ALIGN, 0);
        unsafe { _mm512_store_ps(slice.as_mut_ptr(), self.0) }
    }

    #[inline(always)]
    fn to_slice_masked(self, slice: &mut [f32], mask: Self::Mask) {
        assert!(slice.len() >= mask.len, "slice too short for masked store");
        unsafe { _mm512_mask_storeu_ps(slice.as_mut_ptr(), mask.raw, self.0) }
    }

    #[inline(always)]
    fn add(self, rhs: Self) -> Self {
        unsafe { Avx512Vector(_mm512_add_ps(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn sub(self, rhs: Self) -> Self {
        unsafe { Avx512Vector(_mm512_sub_ps(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn mul(self, rhs: Self) -> Self {
        unsafe { Avx512Vector(_mm512_mul_ps(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn min(self, rhs: Self) -> Self {
        unsafe { Avx512Vector(_mm512_min_ps(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn max(self, rhs: Self) -> Self {
        unsafe { Avx512Vector(_mm512_max_ps(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn fma(self, b: Self, c: Self) -> Self {
        unsafe { Avx512Vector(_mm512_fmadd_ps(self.0, b.0, c.0)) }
    }

    #[inline(always)]
    fn horizontal_sum(self) -> f32 {
        // _mm512_reduce_add_ps lowers to the same 16 -> 8 -> 4 -> 2 -> 1 tree
        unsafe { _mm512_reduce_add_ps(self.0) }
    }

    #[inline(always)]
    fn horizontal_min(self) -> f32 {
        unsafe { _mm512_reduce_min_ps(self.0) }
    }

    #[inline(always)]
    fn horizontal_max(self) -> f32 {
        unsafe { _mm512_reduce_max_ps(self.0) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn avx512_available() -> bool {
        std::arch::is_x86_feature_detected!("avx512f")
            && std::arch::is_x86_feature_detected!("avx512bw")
            && std::arch::is_x86_feature_detected!("avx512dq")
            && std::arch::is_x86_feature_detected!("avx512vl")
    }

    #[test]
    fn masked_ops_touch_only_enabled_lanes() {
        if !avx512_available() {
            return;
        }
        let src = [1.0, 2.0, 3.0, 4.0, 5.0];
        let m = Avx512Mask::tail(5);
        let v = Avx512Vector::from_slice_masked(&src, m, 9.0);

        let mut full = [0.0f32; 16];
        v.to_slice(&mut full);
        assert_eq!(&full[..5], &src);
        assert!(full[5..].iter().all(|&x| x == 9.0));

        let mut out = [-1.0f32; 16];
        v.to_slice_masked(&mut out[..5], m);
        assert_eq!(&out[..5], &src);
        assert!(out[5..].iter().all(|&x| x == -1.0));
    }

    #[test]
    fn tail_mask_bit_pattern() {
        let m = Avx512Mask::tail(5);
        assert_eq!(m.raw, 0b0001_1111);
        assert_eq!(m.len(), 5);
    }
}
