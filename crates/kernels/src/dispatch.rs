//! Runtime capability dispatch.
//!
//! CPU features are probed once per process; the admitted tiers and their
//! kernel tables are built under a one-time-initialization guard and are
//! immutable afterwards (single writer, then many readers). Per-call
//! resolution walks the tiers widest-first and takes the first whose lane
//! count fits the call's data width — a couple of integer comparisons, never
//! a capability re-probe. The scalar tier terminates the walk unconditionally,
//! so resolution cannot fail and capability absence is never an error.

use crate::table::KernelTable;
use once_cell::sync::Lazy;
use vexel_simd::ScalarVector;

#[cfg(all(feature = "avx2", target_arch = "x86_64"))]
use vexel_simd::Avx2Vector;

#[cfg(all(feature = "avx512", target_arch = "x86_64"))]
use vexel_simd::Avx512Vector;

#[cfg(all(feature = "neon", target_arch = "aarch64"))]
use vexel_simd::NeonVector;

/// CPU feature detection results.
///
/// Resolved once against the host at first use and immutable thereafter;
/// tiers never become available or unavailable mid-run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuFeatures {
    /// AVX2 support (x86_64)
    pub has_avx2: bool,
    /// FMA3 support (x86_64; required alongside AVX2)
    pub has_fma: bool,
    /// AVX-512 Foundation (x86_64)
    pub has_avx512_f: bool,
    /// AVX-512 Byte & Word operations (x86_64)
    pub has_avx512_bw: bool,
    /// AVX-512 Doubleword & Quadword operations (x86_64)
    pub has_avx512_dq: bool,
    /// AVX-512 Vector Length extensions (x86_64)
    pub has_avx512_vl: bool,
}

impl CpuFeatures {
    /// Probe the host CPU.
    ///
    /// On x86_64 this runs CPUID through the `cpufeatures` crate (cached
    /// after the first call). On aarch64 every field is false — NEON is
    /// mandatory there and needs no probing. Other architectures report no
    /// accelerated capabilities at all.
    pub fn detect() -> Self {
        #[cfg(target_arch = "x86_64")]
        {
            cpufeatures::new!(cpuid_avx2, "avx2");
            cpufeatures::new!(cpuid_fma, "fma");
            cpufeatures::new!(cpuid_avx512f, "avx512f");
            cpufeatures::new!(cpuid_avx512bw, "avx512bw");
            cpufeatures::new!(cpuid_avx512dq, "avx512dq");
            cpufeatures::new!(cpuid_avx512vl, "avx512vl");

            Self {
                has_avx2: cpuid_avx2::get(),
                has_fma: cpuid_fma::get(),
                has_avx512_f: cpuid_avx512f::get(),
                has_avx512_bw: cpuid_avx512bw::get(),
                has_avx512_dq: cpuid_avx512dq::get(),
                has_avx512_vl: cpuid_avx512vl::get(),
            }
        }

        #[cfg(not(target_arch = "x86_64"))]
        {
            Self {
                has_avx2: false,
                has_fma: false,
                has_avx512_f: false,
                has_avx512_bw: false,
                has_avx512_dq: false,
                has_avx512_vl: false,
            }
        }
    }

    /// Full AVX-512 support: Foundation plus the BW/DQ/VL extensions the
    /// kernels rely on.
    pub fn has_avx512_full(&self) -> bool {
        self.has_avx512_f && self.has_avx512_bw && self.has_avx512_dq && self.has_avx512_vl
    }
}

/// One capability tier, widest first in probe order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// AVX-512 tier (x86_64, 16 lanes)
    Avx512,
    /// AVX2 tier (x86_64, 8 lanes)
    Avx2,
    /// NEON tier (aarch64, 4 lanes)
    Neon,
    /// Scalar tier (any platform, terminal fallback)
    Scalar,
}

impl Backend {
    /// Backend name for logging and diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Backend::Avx512 => "avx512",
            Backend::Avx2 => "avx2",
            Backend::Neon => "neon",
            Backend::Scalar => "scalar",
        }
    }

    /// Vector width of the tier, in f32 elements. Doubles as the tier's
    /// minimum effective width: a call narrower than one vector falls through
    /// to the next tier.
    pub fn lanes(&self) -> usize {
        match self {
            Backend::Avx512 => 16,
            Backend::Avx2 => 8,
            Backend::Neon => 4,
            Backend::Scalar => 1,
        }
    }

    /// Bit assigned to this tier in [`capability_mask`].
    pub fn bit(&self) -> u32 {
        match self {
            Backend::Scalar => 1 << 0,
            Backend::Neon => 1 << 1,
            Backend::Avx2 => 1 << 2,
            Backend::Avx512 => 1 << 3,
        }
    }
}

/// Admitted tiers with their kernel tables, widest first, scalar last.
static TIERS: Lazy<Vec<(Backend, KernelTable)>> = Lazy::new(build_tiers);

fn build_tiers() -> Vec<(Backend, KernelTable)> {
    let mut tiers: Vec<(Backend, KernelTable)> = Vec::new();

    if cfg!(feature = "force-scalar") {
        tiers.push((Backend::Scalar, KernelTable::of::<ScalarVector>()));
        log::debug!("kernel dispatch pinned to scalar tier");
        return tiers;
    }

    let features = CpuFeatures::detect();

    #[cfg(all(feature = "avx512", target_arch = "x86_64"))]
    if features.has_avx512_full() {
        tiers.push((Backend::Avx512, KernelTable::of::<Avx512Vector>()));
    }

    #[cfg(all(feature = "avx2", target_arch = "x86_64"))]
    if features.has_avx2 && features.has_fma {
        tiers.push((Backend::Avx2, KernelTable::of::<Avx2Vector>()));
    }

    #[cfg(all(feature = "neon", target_arch = "aarch64"))]
    tiers.push((Backend::Neon, KernelTable::of::<NeonVector>()));

    tiers.push((Backend::Scalar, KernelTable::of::<ScalarVector>()));

    log::debug!(
        "kernel dispatch tiers: {:?} (features {:?})",
        tiers.iter().map(|(b, _)| b.name()).collect::<Vec<_>>(),
        features,
    );
    tiers
}

/// Resolve the table for one call, given the call's data width.
#[inline]
pub(crate) fn table_for(width: usize) -> &'static KernelTable {
    for (_, table) in TIERS.iter() {
        if table.lanes <= width {
            return table;
        }
    }
    // Scalar has one lane, so only width == 0 reaches this; callers validate
    // geometry first, but degrade gracefully anyway.
    &TIERS.last().expect("scalar tier always present").1
}

/// The tier a call of the given width resolves to, purely informational.
pub fn active_backend(width: usize) -> Backend {
    for (backend, table) in TIERS.iter() {
        if table.lanes <= width {
            return *backend;
        }
    }
    Backend::Scalar
}

/// Bitmask of admitted tiers (see [`Backend::bit`]), purely informational.
pub fn capability_mask() -> u32 {
    TIERS.iter().fold(0, |mask, (backend, _)| mask | backend.bit())
}
