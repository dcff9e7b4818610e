//! Elementwise vector kernels.
//!
//! The accumulating primitives of the library: plain vector adds, scaled adds
//! (the backward convolution's small-image building block), and the dot
//! product. The main loops run a four-vector unrolled prefix, then single
//! vectors, then the masked tail.

use super::{align_lo, load, plane_aligned, store, RowSplit};
use vexel_simd::SimdVector;

/// `dst[i] += src[i]`
pub fn add_vector<V: SimdVector>(src: &[f32], dst: &mut [f32]) {
    if plane_aligned::<V>(src, 0) && plane_aligned::<V>(dst, 0) {
        add_vector_body::<V, true>(src, dst);
    } else {
        add_vector_body::<V, false>(src, dst);
    }
}

fn add_vector_body<V: SimdVector, const ALIGNED: bool>(src: &[f32], dst: &mut [f32]) {
    let len = src.len();
    let quad = align_lo(len, 4 * V::LANES);
    let split = RowSplit::<V>::new(len);
    let mut i = 0;
    while i < quad {
        for step in 0..4 {
            let at = i + step * V::LANES;
            let sum = load::<V, ALIGNED>(&src[at..]).add(load::<V, ALIGNED>(&dst[at..]));
            store::<V, ALIGNED>(sum, &mut dst[at..]);
        }
        i += 4 * V::LANES;
    }
    while i < split.aligned {
        let sum = load::<V, ALIGNED>(&src[i..]).add(load::<V, ALIGNED>(&dst[i..]));
        store::<V, ALIGNED>(sum, &mut dst[i..]);
        i += V::LANES;
    }
    if let Some(m) = split.tail {
        let sum = V::from_slice_masked(&src[i..], m, 0.0)
            .add(V::from_slice_masked(&dst[i..], m, 0.0));
        sum.to_slice_masked(&mut dst[i..], m);
    }
}

/// `dst[i] += value`
pub fn add_value<V: SimdVector>(value: f32, dst: &mut [f32]) {
    if plane_aligned::<V>(dst, 0) {
        add_value_body::<V, true>(value, dst);
    } else {
        add_value_body::<V, false>(value, dst);
    }
}

fn add_value_body<V: SimdVector, const ALIGNED: bool>(value: f32, dst: &mut [f32]) {
    let value = V::splat(value);
    let len = dst.len();
    let quad = align_lo(len, 4 * V::LANES);
    let split = RowSplit::<V>::new(len);
    let mut i = 0;
    while i < quad {
        for step in 0..4 {
            let at = i + step * V::LANES;
            store::<V, ALIGNED>(load::<V, ALIGNED>(&dst[at..]).add(value), &mut dst[at..]);
        }
        i += 4 * V::LANES;
    }
    while i < split.aligned {
        store::<V, ALIGNED>(load::<V, ALIGNED>(&dst[i..]).add(value), &mut dst[i..]);
        i += V::LANES;
    }
    if let Some(m) = split.tail {
        let sum = V::from_slice_masked(&dst[i..], m, 0.0).add(value);
        sum.to_slice_masked(&mut dst[i..], m);
    }
}

/// `dst[i] += src[i] * value`
pub fn add_multiplied<V: SimdVector>(src: &[f32], value: f32, dst: &mut [f32]) {
    if plane_aligned::<V>(src, 0) && plane_aligned::<V>(dst, 0) {
        add_multiplied_body::<V, true>(src, value, dst);
    } else {
        add_multiplied_body::<V, false>(src, value, dst);
    }
}

fn add_multiplied_body<V: SimdVector, const ALIGNED: bool>(
    src: &[f32],
    value: f32,
    dst: &mut [f32],
) {
    let value = V::splat(value);
    let len = src.len();
    let quad = align_lo(len, 4 * V::LANES);
    let split = RowSplit::<V>::new(len);
    let mut i = 0;
    while i < quad {
        for step in 0..4 {
            let at = i + step * V::LANES;
            let sum = load::<V, ALIGNED>(&src[at..]).fma(value, load::<V, ALIGNED>(&dst[at..]));
            store::<V, ALIGNED>(sum, &mut dst[at..]);
        }
        i += 4 * V::LANES;
    }
    while i < split.aligned {
        let sum = load::<V, ALIGNED>(&src[i..]).fma(value, load::<V, ALIGNED>(&dst[i..]));
        store::<V, ALIGNED>(sum, &mut dst[i..]);
        i += V::LANES;
    }
    if let Some(m) = split.tail {
        let sum = V::from_slice_masked(&src[i..], m, 0.0)
            .fma(value, V::from_slice_masked(&dst[i..], m, 0.0));
        sum.to_slice_masked(&mut dst[i..], m);
    }
}

/// Dot product of two equally long vectors.
///
/// Four partial vector accumulators over the unrolled prefix, combined
/// pairwise, then one horizontal reduction at the very end. The fixed
/// combination tree keeps results stable across tiers.
pub fn product_sum<V: SimdVector>(a: &[f32], b: &[f32]) -> f32 {
    if plane_aligned::<V>(a, 0) && plane_aligned::<V>(b, 0) {
        product_sum_body::<V, true>(a, b)
    } else {
        product_sum_body::<V, false>(a, b)
    }
}

fn product_sum_body<V: SimdVector, const ALIGNED: bool>(a: &[f32], b: &[f32]) -> f32 {
    let len = a.len();
    let quad = align_lo(len, 4 * V::LANES);
    let split = RowSplit::<V>::new(len);
    let mut sums = [V::zero(); 4];
    let mut i = 0;
    while i < quad {
        for (step, sum) in sums.iter_mut().enumerate() {
            let at = i + step * V::LANES;
            *sum = load::<V, ALIGNED>(&a[at..]).fma(load::<V, ALIGNED>(&b[at..]), *sum);
        }
        i += 4 * V::LANES;
    }
    let mut acc = sums[0].add(sums[1]).add(sums[2].add(sums[3]));
    while i < split.aligned {
        acc = load::<V, ALIGNED>(&a[i..]).fma(load::<V, ALIGNED>(&b[i..]), acc);
        i += V::LANES;
    }
    if let Some(m) = split.tail {
        acc = V::from_slice_masked(&a[i..], m, 0.0)
            .fma(V::from_slice_masked(&b[i..], m, 0.0), acc);
    }
    acc.horizontal_sum()
}
