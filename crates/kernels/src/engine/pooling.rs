//! Max-pooling kernels.
//!
//! Both kernels split the window into a vectorized vertical max (lane-wise,
//! into a scratch row) and a horizontal fold. The 3x3 kernel's horizontal
//! fold stays vectorized through shifted loads over the padded scratch row;
//! the 2x2 kernel's stride-2 pair fold is scalar, which keeps the engine free
//! of cross-lane shuffles.

use super::{load, plane_aligned, store, RowSplit};
use vexel_simd::SimdVector;

/// Lane-wise max of two source rows into `tmp[..width]`.
#[inline(always)]
fn row_pair_max<V: SimdVector, const ALIGNED: bool>(a: &[f32], b: &[f32], tmp: &mut [f32]) {
    let width = tmp.len();
    let split = RowSplit::<V>::new(width);
    let mut col = 0;
    while col < split.aligned {
        let m = load::<V, ALIGNED>(&a[col..]).max(load::<V, ALIGNED>(&b[col..]));
        m.to_slice(&mut tmp[col..]);
        col += V::LANES;
    }
    if let Some(m) = split.tail {
        let v = V::from_slice_masked(&a[col..], m, f32::NEG_INFINITY)
            .max(V::from_slice_masked(&b[col..], m, f32::NEG_INFINITY));
        v.to_slice_masked(&mut tmp[col..], m);
    }
}

/// Fold adjacent column pairs of `tmp` into one output row; an odd trailing
/// column passes through unchanged (partial-window max).
#[inline(always)]
fn fold_column_pairs(tmp: &[f32], dst_row: &mut [f32]) {
    let width = tmp.len();
    let even = width - width % 2;
    let mut x = 0;
    let mut o = 0;
    while x < even {
        dst_row[o] = tmp[x].max(tmp[x + 1]);
        x += 2;
        o += 1;
    }
    if x < width {
        dst_row[o] = tmp[x];
    }
}

/// 2x2 window, stride 2. Output is `ceil(width/2) x ceil(height/2)`; odd
/// edges take the max of the partial window.
pub fn max_pool_2x2<V: SimdVector>(
    src: &[f32],
    src_stride: usize,
    width: usize,
    height: usize,
    dst: &mut [f32],
    dst_stride: usize,
) {
    if plane_aligned::<V>(src, src_stride) {
        max_pool_2x2_body::<V, true>(src, src_stride, width, height, dst, dst_stride);
    } else {
        max_pool_2x2_body::<V, false>(src, src_stride, width, height, dst, dst_stride);
    }
}

fn max_pool_2x2_body<V: SimdVector, const ALIGNED: bool>(
    src: &[f32],
    src_stride: usize,
    width: usize,
    height: usize,
    dst: &mut [f32],
    dst_stride: usize,
) {
    let even_h = height - height % 2;
    let mut tmp = vec![0.0f32; width];
    let mut out = 0;
    let mut row = 0;
    while row < even_h {
        let a = row * src_stride;
        let b = a + src_stride;
        row_pair_max::<V, ALIGNED>(&src[a..], &src[b..], &mut tmp);
        fold_column_pairs(&tmp, &mut dst[out * dst_stride..]);
        row += 2;
        out += 1;
    }
    if row < height {
        let a = row * src_stride;
        tmp.copy_from_slice(&src[a..a + width]);
        fold_column_pairs(&tmp, &mut dst[out * dst_stride..]);
    }
}

/// Lane-wise max of three source rows into `tmp[..width]`.
#[inline(always)]
fn row_triple_max<V: SimdVector, const ALIGNED: bool>(
    a: &[f32],
    b: &[f32],
    c: &[f32],
    tmp: &mut [f32],
) {
    let width = tmp.len();
    let split = RowSplit::<V>::new(width);
    let mut col = 0;
    while col < split.aligned {
        let m = load::<V, ALIGNED>(&a[col..])
            .max(load::<V, ALIGNED>(&b[col..]))
            .max(load::<V, ALIGNED>(&c[col..]));
        m.to_slice(&mut tmp[col..]);
        col += V::LANES;
    }
    if let Some(m) = split.tail {
        let v = V::from_slice_masked(&a[col..], m, f32::NEG_INFINITY)
            .max(V::from_slice_masked(&b[col..], m, f32::NEG_INFINITY))
            .max(V::from_slice_masked(&c[col..], m, f32::NEG_INFINITY));
        v.to_slice_masked(&mut tmp[col..], m);
    }
}

/// 3x3 window, stride 1, same-size output; the window clamps at the plane
/// edges (equivalent to replicating the border row/column).
pub fn max_pool_3x3<V: SimdVector>(
    src: &[f32],
    src_stride: usize,
    width: usize,
    height: usize,
    dst: &mut [f32],
    dst_stride: usize,
) {
    if plane_aligned::<V>(src, src_stride) {
        max_pool_3x3_body::<V, true>(src, src_stride, width, height, dst, dst_stride);
    } else {
        max_pool_3x3_body::<V, false>(src, src_stride, width, height, dst, dst_stride);
    }
}

fn max_pool_3x3_body<V: SimdVector, const ALIGNED: bool>(
    src: &[f32],
    src_stride: usize,
    width: usize,
    height: usize,
    dst: &mut [f32],
    dst_stride: usize,
) {
    // Scratch row with one replicated pad element per side, so the
    // horizontal fold can use plain shifted loads
    let mut tmp = vec![0.0f32; width + 2];
    let split = RowSplit::<V>::new(width);
    for row in 0..height {
        let above = row.saturating_sub(1) * src_stride;
        let here = row * src_stride;
        let below = (row + 1).min(height - 1) * src_stride;
        {
            let (pad, body) = tmp.split_at_mut(1);
            row_triple_max::<V, ALIGNED>(
                &src[above..],
                &src[here..],
                &src[below..],
                &mut body[..width],
            );
            pad[0] = body[0];
        }
        tmp[width + 1] = tmp[width];

        let d = row * dst_stride;
        let mut col = 0;
        while col < split.aligned {
            let m = V::from_slice(&tmp[col..])
                .max(V::from_slice(&tmp[col + 1..]))
                .max(V::from_slice(&tmp[col + 2..]));
            store::<V, ALIGNED>(m, &mut dst[d + col..]);
            col += V::LANES;
        }
        if let Some(m) = split.tail {
            let v = V::from_slice_masked(&tmp[col..], m, f32::NEG_INFINITY)
                .max(V::from_slice_masked(&tmp[col + 1..], m, f32::NEG_INFINITY))
                .max(V::from_slice_masked(&tmp[col + 2..], m, f32::NEG_INFINITY));
            v.to_slice_masked(&mut dst[d + col..], m);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vexel_simd::ScalarVector;

    #[test]
    fn pool_2x2_with_odd_edges() {
        // 3x3 plane, stride 3
        let src = [1.0, 5.0, 2.0, 3.0, 4.0, 8.0, 9.0, 0.0, 7.0];
        let mut dst = [0.0f32; 4];
        max_pool_2x2::<ScalarVector>(&src, 3, 3, 3, &mut dst, 2);
        assert_eq!(dst, [5.0, 8.0, 9.0, 7.0]);
    }

    #[test]
    fn pool_3x3_clamps_edges() {
        // 4x3 plane, stride 4; every output is the max over the clamped
        // 3x3 neighborhood
        let src = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0, 12.0];
        let mut dst = [0.0f32; 12];
        max_pool_3x3::<ScalarVector>(&src, 4, 4, 3, &mut dst, 4);
        assert_eq!(&dst[..4], &[6.0, 7.0, 8.0, 8.0]);
        assert_eq!(&dst[4..8], &[10.0, 11.0, 12.0, 12.0]);
        assert_eq!(&dst[8..], &[10.0, 11.0, 12.0, 12.0]);
    }
}
