//! Property tests for the masked-tail load/store contract.
//!
//! For every tail length the masked forms must read exactly the enabled
//! elements (substituting the fill everywhere else) and write exactly the
//! enabled elements (leaving everything else untouched). The accelerated
//! backends are checked only when the host CPU supports them.

use proptest::prelude::*;
use vexel_simd::{ScalarVector, SimdVector, TailMask};

fn check_masked_contract<V: SimdVector>(values: &[f32], fill: f32) {
    let len = values.len().min(V::LANES).max(1);
    let m = V::Mask::tail(len);
    assert_eq!(m.len(), len);

    let v = V::from_slice_masked(&values[..len], m, fill);
    let mut expanded = vec![0.0f32; V::LANES];
    v.to_slice(&mut expanded);
    assert_eq!(&expanded[..len], &values[..len], "enabled lanes");
    assert!(
        expanded[len..].iter().all(|&x| x == fill),
        "disabled lanes must hold the fill"
    );

    let mut out = vec![f32::MAX; V::LANES];
    v.to_slice_masked(&mut out[..len], m);
    assert_eq!(&out[..len], &values[..len], "masked store writes the tail");
    assert!(
        out[len..].iter().all(|&x| x == f32::MAX),
        "masked store must not write past the tail"
    );
}

fn check_roundtrip<V: SimdVector>(values: &[f32]) {
    if values.len() < V::LANES {
        return;
    }
    let v = V::from_slice(values);
    let mut out = vec![0.0f32; V::LANES];
    v.to_slice(&mut out);
    assert_eq!(&out[..], &values[..V::LANES]);

    let sum: f32 = values[..V::LANES].iter().sum();
    assert!((v.horizontal_sum() - sum).abs() <= 1e-4 * sum.abs().max(1.0));
}

proptest! {
    #[test]
    fn scalar_masked_contract(
        values in prop::collection::vec(-100.0f32..100.0, 1..4),
        fill in -10.0f32..10.0,
    ) {
        check_masked_contract::<ScalarVector>(&values, fill);
        check_roundtrip::<ScalarVector>(&values);
    }

    #[cfg(all(feature = "avx2", target_arch = "x86_64"))]
    #[test]
    fn avx2_masked_contract(
        values in prop::collection::vec(-100.0f32..100.0, 1..16),
        fill in -10.0f32..10.0,
    ) {
        if std::arch::is_x86_feature_detected!("avx2") {
            check_masked_contract::<vexel_simd::Avx2Vector>(&values, fill);
            check_roundtrip::<vexel_simd::Avx2Vector>(&values);
        }
    }

    #[cfg(all(feature = "avx512", target_arch = "x86_64"))]
    #[test]
    fn avx512_masked_contract(
        values in prop::collection::vec(-100.0f32..100.0, 1..24),
        fill in -10.0f32..10.0,
    ) {
        let full = std::arch::is_x86_feature_detected!("avx512f")
            && std::arch::is_x86_feature_detected!("avx512bw")
            && std::arch::is_x86_feature_detected!("avx512dq")
            && std::arch::is_x86_feature_detected!("avx512vl");
        if full {
            check_masked_contract::<vexel_simd::Avx512Vector>(&values, fill);
            check_roundtrip::<vexel_simd::Avx512Vector>(&values);
        }
    }

    #[cfg(all(feature = "neon", target_arch = "aarch64"))]
    #[test]
    fn neon_masked_contract(
        values in prop::collection::vec(-100.0f32..100.0, 1..8),
        fill in -10.0f32..10.0,
    ) {
        check_masked_contract::<vexel_simd::NeonVector>(&values, fill);
        check_roundtrip::<vexel_simd::NeonVector>(&values);
    }
}
