//! Per-tier kernel function-pointer table.
//!
//! One `KernelTable` is instantiated per admitted capability tier by
//! monomorphizing the generic engine over that tier's lane type. After the
//! one-time build the dispatcher only ever reads these tables, so dispatch
//! costs a single indirect call.

use crate::engine::{conv, elementwise, pooling, stats};
use vexel_simd::SimdVector;

pub(crate) type ConvFn = fn(&[f32], usize, usize, usize, &[f32], &mut [f32], usize);
pub(crate) type GradientFn = fn(&[f32], usize, &[f32], usize, usize, usize, &mut [f32]);
pub(crate) type MapFn = fn(&[f32], &mut [f32]);
pub(crate) type FillFn = fn(f32, &mut [f32]);
pub(crate) type AxpyFn = fn(&[f32], f32, &mut [f32]);
pub(crate) type DotFn = fn(&[f32], &[f32]) -> f32;
pub(crate) type ReduceFn = fn(&[f32], usize, usize, usize) -> f32;
pub(crate) type StatFn = fn(&[f32], usize, usize, usize) -> (f32, f32, f32);
pub(crate) type PoolFn = fn(&[f32], usize, usize, usize, &mut [f32], usize);

/// Resolved implementations for one capability tier. Convolution entries are
/// indexed by `K - 2` for `K` in 2..=5.
pub(crate) struct KernelTable {
    pub lanes: usize,
    pub conv_forward: [ConvFn; 4],
    pub conv_backward: [ConvFn; 4],
    pub conv_gradient: [GradientFn; 4],
    pub add_vector: MapFn,
    pub add_value: FillFn,
    pub add_multiplied: AxpyFn,
    pub product_sum: DotFn,
    pub value_sum: ReduceFn,
    pub square_sum: ReduceFn,
    pub min_max_mean: StatFn,
    pub max_pool_2x2: PoolFn,
    pub max_pool_3x3: PoolFn,
}

impl KernelTable {
    /// Build the table for one lane type. The kernel-size specializations are
    /// closed over 2..=5; there is no runtime-sized convolution path.
    pub(crate) fn of<V: SimdVector>() -> Self {
        KernelTable {
            lanes: V::LANES,
            conv_forward: [
                conv::forward::<V, 2>,
                conv::forward::<V, 3>,
                conv::forward::<V, 4>,
                conv::forward::<V, 5>,
            ],
            conv_backward: [
                conv::backward::<V, 2>,
                conv::backward::<V, 3>,
                conv::backward::<V, 4>,
                conv::backward::<V, 5>,
            ],
            conv_gradient: [
                conv::gradient::<V, 2>,
                conv::gradient::<V, 3>,
                conv::gradient::<V, 4>,
                conv::gradient::<V, 5>,
            ],
            add_vector: elementwise::add_vector::<V>,
            add_value: elementwise::add_value::<V>,
            add_multiplied: elementwise::add_multiplied::<V>,
            product_sum: elementwise::product_sum::<V>,
            value_sum: stats::value_sum::<V>,
            square_sum: stats::square_sum::<V>,
            min_max_mean: stats::min_max_mean::<V>,
            max_pool_2x2: pooling::max_pool_2x2::<V>,
            max_pool_3x3: pooling::max_pool_3x3::<V>,
        }
    }
}
