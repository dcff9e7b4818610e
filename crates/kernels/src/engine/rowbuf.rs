//! Circular row buffer for the backward convolution's large-image path.
//!
//! Holds the last `K` logical source rows, each left-padded by `K - 1` zero
//! columns so the reversed-weight window can slide across the padded width
//! without branching. Rotation swaps row offsets; the storage is allocated
//! once per call and never reallocated.

use super::align_hi;

pub(crate) struct RowBuffer<const K: usize> {
    data: Vec<f32>,
    stride: usize,
    rows: [usize; K],
    width: usize,
}

impl<const K: usize> RowBuffer<K> {
    /// Zero-initialized buffer for a source row of `width` elements, with the
    /// row stride rounded up to the tier's lane count.
    pub(crate) fn new(width: usize, lanes: usize) -> Self {
        let stride = align_hi(width + 2 * (K - 1), lanes);
        RowBuffer {
            data: vec![0.0; K * stride],
            stride,
            rows: core::array::from_fn(|i| i * stride),
            width,
        }
    }

    /// Drop the oldest row, shift the rest up, and fill the newest slot from
    /// `src` (or with zeros once the logical source is exhausted). The copy
    /// lands `K - 1` columns in, preserving the left zero padding.
    pub(crate) fn rotate(&mut self, src: Option<&[f32]>) {
        let recycled = self.rows[0];
        let slot = &mut self.data[recycled + K - 1..recycled + K - 1 + self.width];
        match src {
            Some(row) => slot.copy_from_slice(row),
            None => slot.fill(0.0),
        }
        for i in 0..K - 1 {
            self.rows[i] = self.rows[i + 1];
        }
        self.rows[K - 1] = recycled;
    }

    /// The `index`-th row, oldest first. The slice spans the full padded
    /// stride so window loads past `width + K - 1` stay in bounds.
    #[inline(always)]
    pub(crate) fn row(&self, index: usize) -> &[f32] {
        &self.data[self.rows[index]..self.rows[index] + self.stride]
    }
}
