//! Small-kernel 2D convolution: forward, backward, and weight-gradient sums.
//!
//! The kernel size `K` (2..=5) is a compile-time parameter; each size gets its
//! own fully unrolled specialization through monomorphization. All three
//! operations accumulate into their destination rather than overwriting it, so
//! repeated calls compose across channels and batches.
//!
//! Geometry conventions (`width`/`height` always name the smaller plane):
//!
//! - forward: `width`/`height` are the OUTPUT dims; the source plane is
//!   `(width + K - 1) x (height + K - 1)`.
//! - backward: `width`/`height` are the dims of the incoming difference
//!   (`src`); the destination plane is `(width + K - 1) x (height + K - 1)`.
//! - gradient: `width`/`height` are the dims of `dst` (the difference); `src`
//!   is the larger input plane.

use super::elementwise::add_multiplied;
use super::rowbuf::RowBuffer;
use super::{align_lo, load, plane_aligned, store, RowSplit};
use vexel_simd::SimdVector;

/// Pixel-count threshold below which the backward pass recomputes rows with
/// scaled adds instead of building the circular row buffer. A tuning constant,
/// not a semantic switch: both strategies produce identical results.
pub const BACKWARD_SMALL_AREA: usize = 1024;

#[inline(always)]
fn forward_taps<V: SimdVector, const K: usize>(weights: &[f32]) -> [[V; K]; K] {
    core::array::from_fn(|y| core::array::from_fn(|x| V::splat(weights[y * K + x])))
}

/// Taps in reversed order, turning the correlation-form weights into the
/// convolution form the backward window needs.
#[inline(always)]
fn backward_taps<V: SimdVector, const K: usize>(weights: &[f32]) -> [[V; K]; K] {
    core::array::from_fn(|y| {
        core::array::from_fn(|x| V::splat(weights[K * K - 1 - (y * K + x)]))
    })
}

/// Horizontal K-tap convolution of one row segment. The first tap may use the
/// proven-aligned load; the shifted taps are inherently unaligned.
#[inline(always)]
fn row_convolution<V: SimdVector, const K: usize, const ALIGNED: bool>(
    src: &[f32],
    taps: &[V; K],
) -> V {
    let mut sum = load::<V, ALIGNED>(src).mul(taps[0]);
    for k in 1..K {
        sum = V::from_slice(&src[k..]).fma(taps[k], sum);
    }
    sum
}

/// Masked-tail form of [`row_convolution`]; every tap load substitutes zero in
/// the disabled lanes, so the garbage never reaches an enabled store lane.
#[inline(always)]
fn row_convolution_masked<V: SimdVector, const K: usize>(
    src: &[f32],
    taps: &[V; K],
    m: V::Mask,
) -> V {
    let mut sum = V::from_slice_masked(src, m, 0.0).mul(taps[0]);
    for k in 1..K {
        sum = V::from_slice_masked(&src[k..], m, 0.0).fma(taps[k], sum);
    }
    sum
}

// ---------------------------------------------------------------------------
// Forward
// ---------------------------------------------------------------------------

/// Forward convolution: dot each `K x K` source window with the weight set
/// and add the result into `dst`.
pub fn forward<V: SimdVector, const K: usize>(
    src: &[f32],
    src_stride: usize,
    width: usize,
    height: usize,
    weights: &[f32],
    dst: &mut [f32],
    dst_stride: usize,
) {
    if plane_aligned::<V>(src, src_stride) && plane_aligned::<V>(dst, dst_stride) {
        forward_body::<V, K, true>(src, src_stride, width, height, weights, dst, dst_stride);
    } else {
        forward_body::<V, K, false>(src, src_stride, width, height, weights, dst, dst_stride);
    }
}

fn forward_body<V: SimdVector, const K: usize, const ALIGNED: bool>(
    src: &[f32],
    src_stride: usize,
    width: usize,
    height: usize,
    weights: &[f32],
    dst: &mut [f32],
    dst_stride: usize,
) {
    let taps = forward_taps::<V, K>(weights);
    let split = RowSplit::<V>::new(width);
    for row in 0..height {
        let s = row * src_stride;
        let d = row * dst_stride;
        let mut col = 0;
        while col < split.aligned {
            let mut sum = row_convolution::<V, K, ALIGNED>(&src[s + col..], &taps[0]);
            for ky in 1..K {
                sum = sum.add(row_convolution::<V, K, ALIGNED>(
                    &src[s + ky * src_stride + col..],
                    &taps[ky],
                ));
            }
            let acc = load::<V, ALIGNED>(&dst[d + col..]).add(sum);
            store::<V, ALIGNED>(acc, &mut dst[d + col..]);
            col += V::LANES;
        }
        if let Some(m) = split.tail {
            let mut sum = row_convolution_masked::<V, K>(&src[s + col..], &taps[0], m);
            for ky in 1..K {
                sum = sum.add(row_convolution_masked::<V, K>(
                    &src[s + ky * src_stride + col..],
                    &taps[ky],
                    m,
                ));
            }
            let acc = V::from_slice_masked(&dst[d + col..], m, 0.0).add(sum);
            acc.to_slice_masked(&mut dst[d + col..], m);
        }
    }
}

// ---------------------------------------------------------------------------
// Backward
// ---------------------------------------------------------------------------

/// Backward convolution, selecting the small- or large-image strategy by
/// total pixel count.
pub fn backward<V: SimdVector, const K: usize>(
    src: &[f32],
    src_stride: usize,
    width: usize,
    height: usize,
    weights: &[f32],
    dst: &mut [f32],
    dst_stride: usize,
) {
    if width * height < BACKWARD_SMALL_AREA {
        backward_small::<V, K>(src, src_stride, width, height, weights, dst, dst_stride);
    } else {
        backward_large::<V, K>(src, src_stride, width, height, weights, dst, dst_stride);
    }
}

/// Small-image strategy: scatter each source row onto the padded destination
/// with one scaled add per tap. No scratch storage; the per-call setup cost of
/// the row buffer would dominate at these sizes.
pub fn backward_small<V: SimdVector, const K: usize>(
    src: &[f32],
    src_stride: usize,
    width: usize,
    height: usize,
    weights: &[f32],
    dst: &mut [f32],
    dst_stride: usize,
) {
    for row in 0..height {
        let s = &src[row * src_stride..row * src_stride + width];
        for dy in 0..K {
            let d = (row + dy) * dst_stride;
            for dx in 0..K {
                add_multiplied::<V>(s, weights[dy * K + dx], &mut dst[d + dx..d + dx + width]);
            }
        }
    }
}

/// Large-image strategy: gather through the circular row buffer with the
/// reversed weight set over the logically padded window.
pub fn backward_large<V: SimdVector, const K: usize>(
    src: &[f32],
    src_stride: usize,
    width: usize,
    height: usize,
    weights: &[f32],
    dst: &mut [f32],
    dst_stride: usize,
) {
    if plane_aligned::<V>(dst, dst_stride) {
        backward_large_body::<V, K, true>(src, src_stride, width, height, weights, dst, dst_stride);
    } else {
        backward_large_body::<V, K, false>(src, src_stride, width, height, weights, dst, dst_stride);
    }
}

fn backward_large_body<V: SimdVector, const K: usize, const ALIGNED: bool>(
    src: &[f32],
    src_stride: usize,
    width: usize,
    height: usize,
    weights: &[f32],
    dst: &mut [f32],
    dst_stride: usize,
) {
    let mut buffer = RowBuffer::<K>::new(width, V::LANES);
    let out_w = width + K - 1;
    let out_h = height + K - 1;
    let taps = backward_taps::<V, K>(weights);
    let split = RowSplit::<V>::new(out_w);
    for row in 0..out_h {
        let next = (row < height).then(|| &src[row * src_stride..row * src_stride + width]);
        buffer.rotate(next);
        let d = row * dst_stride;
        let mut col = 0;
        while col < split.aligned {
            // Buffer rows are internal scratch with no alignment promise
            let mut sum = row_convolution::<V, K, false>(&buffer.row(0)[col..], &taps[0]);
            for ky in 1..K {
                sum = sum.add(row_convolution::<V, K, false>(&buffer.row(ky)[col..], &taps[ky]));
            }
            let acc = load::<V, ALIGNED>(&dst[d + col..]).add(sum);
            store::<V, ALIGNED>(acc, &mut dst[d + col..]);
            col += V::LANES;
        }
        if let Some(m) = split.tail {
            let mut sum = row_convolution_masked::<V, K>(&buffer.row(0)[col..], &taps[0], m);
            for ky in 1..K {
                sum = sum.add(row_convolution_masked::<V, K>(
                    &buffer.row(ky)[col..],
                    &taps[ky],
                    m,
                ));
            }
            let acc = V::from_slice_masked(&dst[d + col..], m, 0.0).add(sum);
            acc.to_slice_masked(&mut dst[d + col..], m);
        }
    }
}

// ---------------------------------------------------------------------------
// Weight gradient
// ---------------------------------------------------------------------------

/// Accumulate one difference row into the `K x K` tap accumulators.
#[inline(always)]
fn sum_taps_1x1<V: SimdVector, const K: usize, const ALIGNED: bool>(
    src: &[f32],
    src_stride: usize,
    d: V,
    acc: &mut [[V; K]; K],
) {
    for ky in 0..K {
        let r = ky * src_stride;
        for kx in 0..K {
            let s = if kx == 0 {
                load::<V, ALIGNED>(&src[r..])
            } else {
                V::from_slice(&src[r + kx..])
            };
            acc[ky][kx] = d.fma(s, acc[ky][kx]);
        }
    }
}

#[inline(always)]
fn sum_taps_1x1_masked<V: SimdVector, const K: usize>(
    src: &[f32],
    src_stride: usize,
    d: V,
    m: V::Mask,
    acc: &mut [[V; K]; K],
) {
    for ky in 0..K {
        let r = ky * src_stride;
        for kx in 0..K {
            let s = V::from_slice_masked(&src[r + kx..], m, 0.0);
            acc[ky][kx] = d.fma(s, acc[ky][kx]);
        }
    }
}

/// Row-pair variant: two difference rows share the `K - 1` interior source
/// rows, halving the source loads. Accumulation order per tap is unchanged,
/// so the result matches the single-row variant exactly.
#[inline(always)]
fn sum_taps_2x1<V: SimdVector, const K: usize, const ALIGNED: bool>(
    src: &[f32],
    src_stride: usize,
    d0: V,
    d1: V,
    acc: &mut [[V; K]; K],
) {
    for j in 0..=K {
        let r = j * src_stride;
        for kx in 0..K {
            let s = if kx == 0 {
                load::<V, ALIGNED>(&src[r..])
            } else {
                V::from_slice(&src[r + kx..])
            };
            if j < K {
                acc[j][kx] = d0.fma(s, acc[j][kx]);
            }
            if j >= 1 {
                acc[j - 1][kx] = d1.fma(s, acc[j - 1][kx]);
            }
        }
    }
}

#[inline(always)]
fn sum_taps_2x1_masked<V: SimdVector, const K: usize>(
    src: &[f32],
    src_stride: usize,
    d0: V,
    d1: V,
    m: V::Mask,
    acc: &mut [[V; K]; K],
) {
    for j in 0..=K {
        let r = j * src_stride;
        for kx in 0..K {
            let s = V::from_slice_masked(&src[r + kx..], m, 0.0);
            if j < K {
                acc[j][kx] = d0.fma(s, acc[j][kx]);
            }
            if j >= 1 {
                acc[j - 1][kx] = d1.fma(s, acc[j - 1][kx]);
            }
        }
    }
}

/// Weight-gradient accumulation: `sums[ky*K + kx] += Σ dst[y][x] *
/// src[y + ky][x + kx]`, reduced horizontally once after the full scan.
pub fn gradient<V: SimdVector, const K: usize>(
    src: &[f32],
    src_stride: usize,
    dst: &[f32],
    dst_stride: usize,
    width: usize,
    height: usize,
    sums: &mut [f32],
) {
    if plane_aligned::<V>(src, src_stride) && plane_aligned::<V>(dst, dst_stride) {
        gradient_body::<V, K, true>(src, src_stride, dst, dst_stride, width, height, sums);
    } else {
        gradient_body::<V, K, false>(src, src_stride, dst, dst_stride, width, height, sums);
    }
}

fn gradient_body<V: SimdVector, const K: usize, const ALIGNED: bool>(
    src: &[f32],
    src_stride: usize,
    dst: &[f32],
    dst_stride: usize,
    width: usize,
    height: usize,
    sums: &mut [f32],
) {
    let mut acc = [[V::zero(); K]; K];
    let split = RowSplit::<V>::new(width);
    let pair_rows = align_lo(height, 2);
    let mut row = 0;
    while row < pair_rows {
        let s = row * src_stride;
        let d = row * dst_stride;
        let mut col = 0;
        if K == 2 {
            // Block variant for the smallest kernel: two rows and two
            // adjacent vector columns per iteration
            let doubled = align_lo(split.aligned, 2 * V::LANES);
            while col < doubled {
                for half in [0, V::LANES] {
                    let at = col + half;
                    let d0 = load::<V, ALIGNED>(&dst[d + at..]);
                    let d1 = load::<V, ALIGNED>(&dst[d + dst_stride + at..]);
                    sum_taps_2x1::<V, K, ALIGNED>(&src[s + at..], src_stride, d0, d1, &mut acc);
                }
                col += 2 * V::LANES;
            }
        }
        while col < split.aligned {
            let d0 = load::<V, ALIGNED>(&dst[d + col..]);
            let d1 = load::<V, ALIGNED>(&dst[d + dst_stride + col..]);
            sum_taps_2x1::<V, K, ALIGNED>(&src[s + col..], src_stride, d0, d1, &mut acc);
            col += V::LANES;
        }
        if let Some(m) = split.tail {
            let d0 = V::from_slice_masked(&dst[d + col..], m, 0.0);
            let d1 = V::from_slice_masked(&dst[d + dst_stride + col..], m, 0.0);
            sum_taps_2x1_masked::<V, K>(&src[s + col..], src_stride, d0, d1, m, &mut acc);
        }
        row += 2;
    }
    while row < height {
        let s = row * src_stride;
        let d = row * dst_stride;
        let mut col = 0;
        while col < split.aligned {
            let dv = load::<V, ALIGNED>(&dst[d + col..]);
            sum_taps_1x1::<V, K, ALIGNED>(&src[s + col..], src_stride, dv, &mut acc);
            col += V::LANES;
        }
        if let Some(m) = split.tail {
            let dv = V::from_slice_masked(&dst[d + col..], m, 0.0);
            sum_taps_1x1_masked::<V, K>(&src[s + col..], src_stride, dv, m, &mut acc);
        }
        row += 1;
    }
    // One horizontal reduction per tap, after the full scan
    for ky in 0..K {
        for kx in 0..K {
            sums[ky * K + kx] += acc[ky][kx].horizontal_sum();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vexel_simd::ScalarVector;

    fn conv_forward_reference<const K: usize>(
        src: &[f32],
        ss: usize,
        w: usize,
        h: usize,
        weights: &[f32],
    ) -> Vec<f32> {
        let mut out = vec![0.0f32; w * h];
        for y in 0..h {
            for x in 0..w {
                let mut sum = 0.0;
                for ky in 0..K {
                    for kx in 0..K {
                        sum += src[(y + ky) * ss + x + kx] * weights[ky * K + kx];
                    }
                }
                out[y * w + x] = sum;
            }
        }
        out
    }

    #[test]
    fn forward_matches_reference_3x3() {
        let (w, h) = (5, 4);
        let ss = w + 2;
        let src: Vec<f32> = (0..ss * (h + 2)).map(|i| (i % 11) as f32 - 5.0).collect();
        let weights: Vec<f32> = (0..9).map(|i| (i as f32 - 4.0) * 0.25).collect();

        let mut dst = vec![0.0f32; w * h];
        forward::<ScalarVector, 3>(&src, ss, w, h, &weights, &mut dst, w);
        let expected = conv_forward_reference::<3>(&src, ss, w, h, &weights);
        for (a, b) in dst.iter().zip(&expected) {
            assert!((a - b).abs() < 1e-5, "{a} vs {b}");
        }
    }

    #[test]
    fn backward_strategies_agree() {
        let (w, h) = (7, 5);
        let src: Vec<f32> = (0..w * h).map(|i| (i % 7) as f32 - 3.0).collect();
        let weights: Vec<f32> = (0..4).map(|i| i as f32 * 0.5 - 0.75).collect();
        let (ow, oh) = (w + 1, h + 1);

        let mut small = vec![0.0f32; ow * oh];
        backward_small::<ScalarVector, 2>(&src, w, w, h, &weights, &mut small, ow);

        let mut large = vec![0.0f32; ow * oh];
        backward_large::<ScalarVector, 2>(&src, w, w, h, &weights, &mut large, ow);

        for (a, b) in small.iter().zip(&large) {
            assert!((a - b).abs() < 1e-4, "{a} vs {b}");
        }
    }

    #[test]
    fn gradient_matches_reference_2x2() {
        let (w, h) = (6, 5);
        let ss = w + 1;
        let src: Vec<f32> = (0..ss * (h + 1)).map(|i| (i % 5) as f32 * 0.5).collect();
        let dst: Vec<f32> = (0..w * h).map(|i| ((i % 3) as f32) - 1.0).collect();

        let mut sums = [0.0f32; 4];
        gradient::<ScalarVector, 2>(&src, ss, &dst, w, w, h, &mut sums);

        let mut expected = [0.0f32; 4];
        for y in 0..h {
            for x in 0..w {
                for ky in 0..2 {
                    for kx in 0..2 {
                        expected[ky * 2 + kx] += dst[y * w + x] * src[(y + ky) * ss + x + kx];
                    }
                }
            }
        }
        for (a, b) in sums.iter().zip(&expected) {
            assert!((a - b).abs() < 1e-4, "{a} vs {b}");
        }
    }
}
