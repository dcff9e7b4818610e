#![no_std]
#![warn(missing_docs)]
#![warn(clippy::all)]

//! vexel-simd: trait-based SIMD lane abstraction with masked tails
//!
//! This crate defines the vector-lane capability interface that the vexel
//! kernel engine is written against, plus one concrete backend per capability
//! tier (scalar → NEON → AVX2 → AVX-512). Kernels written once over
//! [`SimdVector`] compile to each tier's native instructions; runtime tier
//! selection lives in the `vexel-kernels` crate.
//!
//! The interface deliberately carries the three load/store forms the kernels
//! need and nothing more:
//!
//! - aligned loads/stores for the proven-aligned fast path,
//! - unaligned loads/stores for everything else,
//! - masked loads/stores driven by a [`TailMask`] for sub-vector row tails,
//!   guaranteed never to touch memory outside the caller's slice.
//!
//! # Feature Flags
//!
//! - `avx2`: compile the AVX2 backend (x86/x86_64)
//! - `avx512`: compile the AVX-512 backend (x86/x86_64)
//! - `neon`: compile the NEON backend (aarch64)

#[cfg(test)]
extern crate std;

// Core trait definitions
pub mod traits;

// Backend implementations
pub mod backends;

// Public re-exports for convenience
pub use traits::{SimdVector, TailMask};

pub use backends::scalar::{ScalarMask, ScalarVector};

#[cfg(all(feature = "avx2", any(target_arch = "x86", target_arch = "x86_64")))]
pub use backends::avx2::{Avx2Mask, Avx2Vector};

#[cfg(all(feature = "avx512", any(target_arch = "x86", target_arch = "x86_64")))]
pub use backends::avx512::{Avx512Mask, Avx512Vector};

#[cfg(all(feature = "neon", target_arch = "aarch64"))]
pub use backends::neon::{NeonMask, NeonVector};
