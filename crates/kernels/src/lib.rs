#![warn(missing_docs)]
#![warn(clippy::all)]

//! vexel-kernels: capability-dispatched pixel and tensor kernels
//!
//! A library of strided-plane numeric kernels — small-kernel 2D convolution
//! (forward, backward, weight gradients), max-pooling, elementwise
//! accumulation, and plane statistics — that binds each public operation to
//! the fastest implementation the running CPU supports.
//!
//! # Dispatch
//!
//! CPU capabilities are probed once per process. Tiers are ordered widest
//! vector first (AVX-512 → AVX2 → NEON → scalar) and a call resolves to the
//! first admitted tier whose vector width fits the call's data width; the
//! scalar tier is the unconditional terminal fallback, so a machine without
//! vector units silently runs the same operations slower. The tier is a
//! performance choice, never a semantic one: integer results are
//! bit-identical across tiers and float results agree within standard
//! rounding error.
//!
//! # Buffers
//!
//! All buffers belong to the caller and are described by
//! `(slice, stride, width, height)` with the stride in elements. The library
//! allocates only transient per-call scratch (the backward convolution's row
//! buffer, pooling's scratch row). Preconditions are checked unconditionally
//! and reported as [`KernelError`] — never silently corrupted memory.
//!
//! # Example
//!
//! ```
//! use vexel_kernels as vexel;
//!
//! // 3x3 identity kernel reproduces the source interior
//! let weights = [0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0];
//! let src: Vec<f32> = (0..36).map(|i| i as f32).collect(); // 6x6
//! let mut dst = vec![0.0f32; 16]; // 4x4 output
//! vexel::add_convolution_forward(&src, 6, 4, 4, &weights, &mut dst, 4)?;
//! assert_eq!(dst[0], src[7]);
//! # Ok::<(), vexel::KernelError>(())
//! ```

mod api;
mod dispatch;
pub mod engine;
mod error;
mod table;

pub use api::{
    add_convolution_backward, add_convolution_forward, add_convolution_gradient, add_multiplied,
    add_value, add_vector, max_pool_2x2, max_pool_3x3, min_max_mean, product_sum, square_sum,
    value_sum,
};
pub use dispatch::{active_backend, capability_mask, Backend, CpuFeatures};
pub use engine::conv::BACKWARD_SMALL_AREA;
pub use error::{KernelError, Result};

// Re-export the lane abstraction for callers that want to instantiate the
// engine's building blocks directly.
pub use vexel_simd as simd;

/// Library version string, for diagnostics.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
