//! Generic kernel engine.
//!
//! Every kernel here is written once over the `SimdVector` lane trait and
//! follows the same row discipline: an aligned-prefix of whole vectors
//! (aligned or unaligned loads, decided once per call from the base pointers
//! and strides), then a masked tail covering the remaining `width % LANES`
//! elements. The split is computed from the width only and reused for every
//! row.

pub mod conv;
pub mod elementwise;
pub mod pooling;
pub(crate) mod rowbuf;
pub mod stats;

use vexel_simd::{SimdVector, TailMask};

/// Largest multiple of `step` not exceeding `len`.
#[inline(always)]
pub(crate) fn align_lo(len: usize, step: usize) -> usize {
    len - len % step
}

/// Smallest multiple of `step` not below `len`.
#[inline(always)]
pub(crate) fn align_hi(len: usize, step: usize) -> usize {
    len.div_ceil(step) * step
}

/// One-per-call alignment proof: the fast load/store form is legal for every
/// row start iff the base pointer sits on the tier's boundary and the row
/// stride keeps it there.
#[inline(always)]
pub(crate) fn plane_aligned<V: SimdVector>(buf: &[f32], stride: usize) -> bool {
    buf.as_ptr() as usize % V::ALIGN == 0 && stride % V::LANES == 0
}

/// Load dispatching on the proven-alignment flag.
#[inline(always)]
pub(crate) fn load<V: SimdVector, const ALIGNED: bool>(slice: &[f32]) -> V {
    if ALIGNED {
        V::from_slice_aligned(slice)
    } else {
        V::from_slice(slice)
    }
}

/// Store dispatching on the proven-alignment flag.
#[inline(always)]
pub(crate) fn store<V: SimdVector, const ALIGNED: bool>(value: V, slice: &mut [f32]) {
    if ALIGNED {
        value.to_slice_aligned(slice)
    } else {
        value.to_slice(slice)
    }
}

/// Aligned-prefix / masked-tail decomposition of one row width.
///
/// `aligned + tail.len() == width` for every width and tier; the mask is
/// `None` exactly when the width is a whole number of vectors.
pub(crate) struct RowSplit<V: SimdVector> {
    pub aligned: usize,
    pub tail: Option<V::Mask>,
}

impl<V: SimdVector> RowSplit<V> {
    #[inline(always)]
    pub(crate) fn new(width: usize) -> Self {
        let aligned = align_lo(width, V::LANES);
        let rest = width - aligned;
        RowSplit {
            aligned,
            tail: (rest > 0).then(|| V::Mask::tail(rest)),
        }
    }
}
