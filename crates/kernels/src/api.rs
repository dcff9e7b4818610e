//! Public operation surface.
//!
//! Flat functions over caller-owned buffers, mirroring the engine's geometry
//! conventions: planes are described by `(slice, stride, width, height)` with
//! the stride in elements. Every entry point validates its geometry
//! unconditionally, resolves one implementation through the dispatch table,
//! and calls it; the resolved implementation never allocates anything beyond
//! per-call scratch.

use crate::dispatch::table_for;
use crate::error::{KernelError, Result};

/// Kernel side length derived from the flat weight count.
#[inline]
fn kernel_size(count: usize) -> Result<usize> {
    match count {
        4 => Ok(2),
        9 => Ok(3),
        16 => Ok(4),
        25 => Ok(5),
        _ => Err(KernelError::InvalidWeightCount { count }),
    }
}

/// Validate one plane description against its backing slice.
fn check_plane(len: usize, stride: usize, width: usize, height: usize) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(KernelError::EmptyPlane);
    }
    if stride < width {
        return Err(KernelError::StrideTooSmall { stride, width });
    }
    let required = stride * (height - 1) + width;
    if len < required {
        return Err(KernelError::BufferTooSmall { required, len });
    }
    Ok(())
}

fn check_equal_len(left: usize, right: usize) -> Result<()> {
    if left != right {
        return Err(KernelError::LengthMismatch { left, right });
    }
    Ok(())
}

/// Convolve `src` with a `K x K` weight set and ADD the result into `dst`.
///
/// `width`/`height` are the output dims; `src` must cover
/// `(width + K - 1) x (height + K - 1)`. `K` is derived from `weights.len()`
/// (4, 9, 16, or 25). Accumulation into `dst` lets callers compose input
/// channels with repeated calls.
pub fn add_convolution_forward(
    src: &[f32],
    src_stride: usize,
    width: usize,
    height: usize,
    weights: &[f32],
    dst: &mut [f32],
    dst_stride: usize,
) -> Result<()> {
    let k = kernel_size(weights.len())?;
    check_plane(src.len(), src_stride, width + k - 1, height + k - 1)?;
    check_plane(dst.len(), dst_stride, width, height)?;
    let table = table_for(width);
    (table.conv_forward[k - 2])(src, src_stride, width, height, weights, dst, dst_stride);
    Ok(())
}

/// Propagate a difference plane back through a `K x K` convolution and ADD
/// the result into the source-sized `dst`.
///
/// `width`/`height` are the dims of `src` (the difference); `dst` must cover
/// `(width + K - 1) x (height + K - 1)`. Internally picks the small- or
/// large-image strategy at [`crate::BACKWARD_SMALL_AREA`] pixels; the two are
/// numerically equivalent.
pub fn add_convolution_backward(
    src: &[f32],
    src_stride: usize,
    width: usize,
    height: usize,
    weights: &[f32],
    dst: &mut [f32],
    dst_stride: usize,
) -> Result<()> {
    let k = kernel_size(weights.len())?;
    check_plane(src.len(), src_stride, width, height)?;
    check_plane(dst.len(), dst_stride, width + k - 1, height + k - 1)?;
    let table = table_for(width);
    (table.conv_backward[k - 2])(src, src_stride, width, height, weights, dst, dst_stride);
    Ok(())
}

/// Accumulate per-tap weight gradients: for every tap `(kx, ky)`,
/// `sums[ky*K + kx] += Σ dst[y][x] * src[y + ky][x + kx]` over the whole
/// difference plane.
///
/// `width`/`height` are the dims of `dst` (the difference); `src` must cover
/// `(width + K - 1) x (height + K - 1)`; `sums` must hold at least `K * K`
/// elements and is accumulated into, not overwritten, so channels and batches
/// sum across repeated calls. `K` is derived from `sums.len()` the same way
/// weights are.
pub fn add_convolution_gradient(
    src: &[f32],
    src_stride: usize,
    dst: &[f32],
    dst_stride: usize,
    width: usize,
    height: usize,
    sums: &mut [f32],
) -> Result<()> {
    let k = kernel_size(sums.len())?;
    check_plane(src.len(), src_stride, width + k - 1, height + k - 1)?;
    check_plane(dst.len(), dst_stride, width, height)?;
    let table = table_for(width);
    (table.conv_gradient[k - 2])(src, src_stride, dst, dst_stride, width, height, sums);
    Ok(())
}

/// `dst[i] += src[i]`.
pub fn add_vector(src: &[f32], dst: &mut [f32]) -> Result<()> {
    check_equal_len(src.len(), dst.len())?;
    if src.is_empty() {
        return Ok(());
    }
    (table_for(src.len()).add_vector)(src, dst);
    Ok(())
}

/// `dst[i] += value`.
pub fn add_value(value: f32, dst: &mut [f32]) {
    if dst.is_empty() {
        return;
    }
    (table_for(dst.len()).add_value)(value, dst);
}

/// `dst[i] += src[i] * value`.
pub fn add_multiplied(src: &[f32], value: f32, dst: &mut [f32]) -> Result<()> {
    check_equal_len(src.len(), dst.len())?;
    if src.is_empty() {
        return Ok(());
    }
    (table_for(src.len()).add_multiplied)(src, value, dst);
    Ok(())
}

/// Dot product of two equally long vectors.
pub fn product_sum(a: &[f32], b: &[f32]) -> Result<f32> {
    check_equal_len(a.len(), b.len())?;
    if a.is_empty() {
        return Ok(0.0);
    }
    Ok((table_for(a.len()).product_sum)(a, b))
}

/// Sum of every element of a strided plane.
pub fn value_sum(src: &[f32], stride: usize, width: usize, height: usize) -> Result<f32> {
    check_plane(src.len(), stride, width, height)?;
    Ok((table_for(width).value_sum)(src, stride, width, height))
}

/// Sum of squares of every element of a strided plane.
pub fn square_sum(src: &[f32], stride: usize, width: usize, height: usize) -> Result<f32> {
    check_plane(src.len(), stride, width, height)?;
    Ok((table_for(width).square_sum)(src, stride, width, height))
}

/// Minimum, maximum, and mean of a strided plane, in one pass.
pub fn min_max_mean(
    src: &[f32],
    stride: usize,
    width: usize,
    height: usize,
) -> Result<(f32, f32, f32)> {
    check_plane(src.len(), stride, width, height)?;
    Ok((table_for(width).min_max_mean)(src, stride, width, height))
}

/// 2x2 max-pooling with stride 2. Output plane is
/// `ceil(width/2) x ceil(height/2)`; odd edges take the partial-window max.
pub fn max_pool_2x2(
    src: &[f32],
    src_stride: usize,
    width: usize,
    height: usize,
    dst: &mut [f32],
    dst_stride: usize,
) -> Result<()> {
    check_plane(src.len(), src_stride, width, height)?;
    check_plane(dst.len(), dst_stride, width.div_ceil(2), height.div_ceil(2))?;
    (table_for(width).max_pool_2x2)(src, src_stride, width, height, dst, dst_stride);
    Ok(())
}

/// 3x3 max-pooling with stride 1 and same-size output; the window clamps at
/// the plane edges. Requires at least a 2x2 plane.
pub fn max_pool_3x3(
    src: &[f32],
    src_stride: usize,
    width: usize,
    height: usize,
    dst: &mut [f32],
    dst_stride: usize,
) -> Result<()> {
    if width < 2 || height < 2 {
        return Err(KernelError::PlaneTooSmall { width, height, min: 2 });
    }
    check_plane(src.len(), src_stride, width, height)?;
    check_plane(dst.len(), dst_stride, width, height)?;
    (table_for(width).max_pool_3x3)(src, src_stride, width, height, dst, dst_stride);
    Ok(())
}
