//! Plane statistics kernels.
//!
//! Whole-plane reductions over strided f32 planes. Each keeps its vector
//! accumulators across the full scan and reduces horizontally exactly once at
//! the end; masked tails substitute the reduction's neutral value so disabled
//! lanes never perturb the result.

use super::{load, plane_aligned, RowSplit};
use vexel_simd::SimdVector;

/// Sum of every element of the plane.
pub fn value_sum<V: SimdVector>(
    src: &[f32],
    stride: usize,
    width: usize,
    height: usize,
) -> f32 {
    if plane_aligned::<V>(src, stride) {
        value_sum_body::<V, true>(src, stride, width, height)
    } else {
        value_sum_body::<V, false>(src, stride, width, height)
    }
}

fn value_sum_body<V: SimdVector, const ALIGNED: bool>(
    src: &[f32],
    stride: usize,
    width: usize,
    height: usize,
) -> f32 {
    let split = RowSplit::<V>::new(width);
    let mut acc = V::zero();
    for row in 0..height {
        let base = row * stride;
        let mut col = 0;
        while col < split.aligned {
            acc = acc.add(load::<V, ALIGNED>(&src[base + col..]));
            col += V::LANES;
        }
        if let Some(m) = split.tail {
            acc = acc.add(V::from_slice_masked(&src[base + col..], m, 0.0));
        }
    }
    acc.horizontal_sum()
}

/// Sum of the squares of every element of the plane.
pub fn square_sum<V: SimdVector>(
    src: &[f32],
    stride: usize,
    width: usize,
    height: usize,
) -> f32 {
    if plane_aligned::<V>(src, stride) {
        square_sum_body::<V, true>(src, stride, width, height)
    } else {
        square_sum_body::<V, false>(src, stride, width, height)
    }
}

fn square_sum_body<V: SimdVector, const ALIGNED: bool>(
    src: &[f32],
    stride: usize,
    width: usize,
    height: usize,
) -> f32 {
    let split = RowSplit::<V>::new(width);
    let mut acc = V::zero();
    for row in 0..height {
        let base = row * stride;
        let mut col = 0;
        while col < split.aligned {
            let v = load::<V, ALIGNED>(&src[base + col..]);
            acc = v.fma(v, acc);
            col += V::LANES;
        }
        if let Some(m) = split.tail {
            let v = V::from_slice_masked(&src[base + col..], m, 0.0);
            acc = v.fma(v, acc);
        }
    }
    acc.horizontal_sum()
}

/// Minimum, maximum, and mean of the plane in one pass.
pub fn min_max_mean<V: SimdVector>(
    src: &[f32],
    stride: usize,
    width: usize,
    height: usize,
) -> (f32, f32, f32) {
    if plane_aligned::<V>(src, stride) {
        min_max_mean_body::<V, true>(src, stride, width, height)
    } else {
        min_max_mean_body::<V, false>(src, stride, width, height)
    }
}

fn min_max_mean_body<V: SimdVector, const ALIGNED: bool>(
    src: &[f32],
    stride: usize,
    width: usize,
    height: usize,
) -> (f32, f32, f32) {
    let split = RowSplit::<V>::new(width);
    let mut lo = V::splat(f32::INFINITY);
    let mut hi = V::splat(f32::NEG_INFINITY);
    let mut sum = V::zero();
    for row in 0..height {
        let base = row * stride;
        let mut col = 0;
        while col < split.aligned {
            let v = load::<V, ALIGNED>(&src[base + col..]);
            lo = lo.min(v);
            hi = hi.max(v);
            sum = sum.add(v);
            col += V::LANES;
        }
        if let Some(m) = split.tail {
            let at = &src[base + col..];
            lo = lo.min(V::from_slice_masked(at, m, f32::INFINITY));
            hi = hi.max(V::from_slice_masked(at, m, f32::NEG_INFINITY));
            sum = sum.add(V::from_slice_masked(at, m, 0.0));
        }
    }
    let mean = sum.horizontal_sum() / (width * height) as f32;
    (lo.horizontal_min(), hi.horizontal_max(), mean)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vexel_simd::ScalarVector;

    #[test]
    fn reductions_on_a_strided_plane() {
        // 3x2 plane with stride 4; the padding column must never contribute
        let src = [1.0, 2.0, 3.0, 99.0, 4.0, 5.0, 6.0, 99.0];
        assert_eq!(value_sum::<ScalarVector>(&src, 4, 3, 2), 21.0);
        assert_eq!(square_sum::<ScalarVector>(&src, 4, 3, 2), 91.0);
        let (lo, hi, mean) = min_max_mean::<ScalarVector>(&src, 4, 3, 2);
        assert_eq!(lo, 1.0);
        assert_eq!(hi, 6.0);
        assert!((mean - 3.5).abs() < 1e-6);
    }
}
