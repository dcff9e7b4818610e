//! Kernel precondition errors.
//!
//! Every public entry point validates its buffer geometry before touching
//! memory and reports violations through [`KernelError`]. The checks run
//! unconditionally — a handful of integer comparisons per call is negligible
//! next to the per-row vector work. Capability absence is never an error;
//! missing tiers degrade silently to scalar inside the dispatcher.

use core::fmt;

/// Result alias used by every public kernel entry point.
pub type Result<T> = core::result::Result<T, KernelError>;

/// Precondition violation at a public kernel entry point.
///
/// There is no recoverable or transient failure class in this library: every
/// variant is a programmer error at the call site, reported instead of
/// silently corrupting memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum KernelError {
    /// Width or height is zero.
    EmptyPlane,
    /// Row stride is smaller than the row width (in elements).
    StrideTooSmall {
        /// Provided stride, in elements.
        stride: usize,
        /// Minimum acceptable stride.
        width: usize,
    },
    /// A buffer is too short for the described plane geometry.
    BufferTooSmall {
        /// Required length, `stride * (height - 1) + width`.
        required: usize,
        /// Actual slice length.
        len: usize,
    },
    /// Two slices that must be equally long are not.
    LengthMismatch {
        /// Length of the first slice.
        left: usize,
        /// Length of the second slice.
        right: usize,
    },
    /// Weight count is not one of 4, 9, 16, or 25.
    InvalidWeightCount {
        /// Provided number of weights.
        count: usize,
    },
    /// The plane is smaller than the kernel's minimum footprint.
    PlaneTooSmall {
        /// Provided width.
        width: usize,
        /// Provided height.
        height: usize,
        /// Minimum width and height required.
        min: usize,
    },
}

impl fmt::Display for KernelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            KernelError::EmptyPlane => write!(f, "plane width and height must be non-zero"),
            KernelError::StrideTooSmall { stride, width } => {
                write!(f, "row stride {stride} is smaller than row width {width}")
            }
            KernelError::BufferTooSmall { required, len } => {
                write!(f, "buffer holds {len} elements, plane needs {required}")
            }
            KernelError::LengthMismatch { left, right } => {
                write!(f, "slice lengths differ: {left} vs {right}")
            }
            KernelError::InvalidWeightCount { count } => {
                write!(f, "{count} weights do not form a 2x2..5x5 kernel")
            }
            KernelError::PlaneTooSmall { width, height, min } => {
                write!(f, "plane {width}x{height} is below the {min}x{min} minimum")
            }
        }
    }
}

impl std::error::Error for KernelError {}
