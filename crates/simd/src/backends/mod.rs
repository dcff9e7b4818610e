//! SIMD backend implementations
//!
//! One module per capability tier. The scalar backend always compiles; the
//! accelerated backends are gated on cargo features and only compile for the
//! architectures that carry them. Selecting between compiled backends at
//! runtime is the dispatcher's job (see the `vexel-kernels` crate) — nothing
//! here probes the CPU.

// Scalar backend (always available as fallback)
pub mod scalar;

// Platform-specific backends (feature-gated)
#[cfg(feature = "avx2")]
pub mod avx2;

#[cfg(feature = "avx512")]
pub mod avx512;

#[cfg(feature = "neon")]
pub mod neon;
