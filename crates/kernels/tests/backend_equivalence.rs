//! Backend equivalence tests.
//!
//! Every compiled lane type must produce the same results as the scalar
//! reference for every kernel — integers exactly, floats within rounding
//! (1e-4 relative). The accelerated checks only run when the host CPU
//! actually supports the tier, mirroring what the runtime dispatcher would
//! admit.

use vexel_kernels::engine::{conv, elementwise, pooling, stats};
use vexel_kernels::simd::{ScalarVector, SimdVector};

const EPSILON: f32 = 1e-4;

fn assert_close(a: &[f32], b: &[f32], context: &str) {
    assert_eq!(a.len(), b.len(), "{context}: length mismatch");
    for (i, (x, y)) in a.iter().zip(b.iter()).enumerate() {
        let tol = EPSILON * x.abs().max(y.abs()).max(1.0);
        assert!((x - y).abs() <= tol, "{context}: index {i}: {x} vs {y}");
    }
}

fn assert_scalar_close(a: f32, b: f32, context: &str) {
    let tol = EPSILON * a.abs().max(b.abs()).max(1.0);
    assert!((a - b).abs() <= tol, "{context}: {a} vs {b}");
}

fn plane(len: usize, seed: u32) -> Vec<f32> {
    let mut state = seed.wrapping_mul(2654435761).max(1);
    (0..len)
        .map(|_| {
            state = state.wrapping_mul(1664525).wrapping_add(1013904223);
            ((state >> 16) & 0xFF) as f32 / 32.0 - 4.0
        })
        .collect()
}

fn check_conv<V: SimdVector, const K: usize>(name: &str) {
    // Widths chosen to hit the aligned prefix, the unrolled prefix, and
    // tails of every length for vectors up to 16 lanes
    for (w, h) in [(1, 1), (5, 3), (16, 4), (17, 3), (31, 5), (64, 6), (67, 7)] {
        let ss = w + K - 1;
        let src = plane(ss * (h + K - 1), (w * h) as u32);
        let weights: Vec<f32> = (0..K * K).map(|i| (i as f32 - 2.0) / 8.0).collect();

        // forward
        let mut got = plane(w * h, 1);
        let mut want = got.clone();
        conv::forward::<V, K>(&src, ss, w, h, &weights, &mut got, w);
        conv::forward::<ScalarVector, K>(&src, ss, w, h, &weights, &mut want, w);
        assert_close(&got, &want, &format!("{name} forward {K}x{K} {w}x{h}"));

        // backward, both strategies
        let diff = plane(w * h, (w + h) as u32);
        let (ow, oh) = (w + K - 1, h + K - 1);
        let mut got = vec![0.0f32; ow * oh];
        let mut want = vec![0.0f32; ow * oh];
        conv::backward_small::<V, K>(&diff, w, w, h, &weights, &mut got, ow);
        conv::backward_small::<ScalarVector, K>(&diff, w, w, h, &weights, &mut want, ow);
        assert_close(&got, &want, &format!("{name} backward small {K}x{K} {w}x{h}"));

        let mut got = vec![0.0f32; ow * oh];
        let mut want = vec![0.0f32; ow * oh];
        conv::backward_large::<V, K>(&diff, w, w, h, &weights, &mut got, ow);
        conv::backward_large::<ScalarVector, K>(&diff, w, w, h, &weights, &mut want, ow);
        assert_close(&got, &want, &format!("{name} backward large {K}x{K} {w}x{h}"));

        // gradient
        let mut got = vec![0.0f32; K * K];
        let mut want = vec![0.0f32; K * K];
        conv::gradient::<V, K>(&src, ss, &diff, w, w, h, &mut got);
        conv::gradient::<ScalarVector, K>(&src, ss, &diff, w, w, h, &mut want);
        assert_close(&got, &want, &format!("{name} gradient {K}x{K} {w}x{h}"));
    }
}

fn check_elementwise_and_stats<V: SimdVector>(name: &str) {
    for len in [1, 3, 8, 15, 16, 17, 63, 64, 65, 200] {
        let a = plane(len, len as u32);
        let b = plane(len, (len + 1) as u32);

        let mut got = b.clone();
        let mut want = b.clone();
        elementwise::add_vector::<V>(&a, &mut got);
        elementwise::add_vector::<ScalarVector>(&a, &mut want);
        assert_close(&got, &want, &format!("{name} add_vector len {len}"));

        let mut got = b.clone();
        let mut want = b.clone();
        elementwise::add_value::<V>(0.75, &mut got);
        elementwise::add_value::<ScalarVector>(0.75, &mut want);
        assert_close(&got, &want, &format!("{name} add_value len {len}"));

        let mut got = b.clone();
        let mut want = b.clone();
        elementwise::add_multiplied::<V>(&a, -1.5, &mut got);
        elementwise::add_multiplied::<ScalarVector>(&a, -1.5, &mut want);
        assert_close(&got, &want, &format!("{name} add_multiplied len {len}"));

        assert_scalar_close(
            elementwise::product_sum::<V>(&a, &b),
            elementwise::product_sum::<ScalarVector>(&a, &b),
            &format!("{name} product_sum len {len}"),
        );
    }

    for (w, h, stride) in [(1, 1, 1), (7, 3, 9), (16, 4, 16), (33, 5, 40)] {
        let src = plane(stride * (h - 1) + w, (w * h) as u32);

        assert_scalar_close(
            stats::value_sum::<V>(&src, stride, w, h),
            stats::value_sum::<ScalarVector>(&src, stride, w, h),
            &format!("{name} value_sum {w}x{h}"),
        );
        assert_scalar_close(
            stats::square_sum::<V>(&src, stride, w, h),
            stats::square_sum::<ScalarVector>(&src, stride, w, h),
            &format!("{name} square_sum {w}x{h}"),
        );
        let got = stats::min_max_mean::<V>(&src, stride, w, h);
        let want = stats::min_max_mean::<ScalarVector>(&src, stride, w, h);
        assert_eq!(got.0, want.0, "{name} min {w}x{h}");
        assert_eq!(got.1, want.1, "{name} max {w}x{h}");
        assert_scalar_close(got.2, want.2, &format!("{name} mean {w}x{h}"));
    }
}

fn check_pooling<V: SimdVector>(name: &str) {
    for (w, h) in [(2, 2), (7, 5), (16, 6), (17, 7), (33, 9)] {
        let src = plane(w * h, (w ^ h) as u32);

        let (pw, ph) = (w.div_ceil(2), h.div_ceil(2));
        let mut got = vec![0.0f32; pw * ph];
        let mut want = vec![0.0f32; pw * ph];
        pooling::max_pool_2x2::<V>(&src, w, w, h, &mut got, pw);
        pooling::max_pool_2x2::<ScalarVector>(&src, w, w, h, &mut want, pw);
        assert_eq!(got, want, "{name} max_pool_2x2 {w}x{h}");

        let mut got = vec![0.0f32; w * h];
        let mut want = vec![0.0f32; w * h];
        pooling::max_pool_3x3::<V>(&src, w, w, h, &mut got, w);
        pooling::max_pool_3x3::<ScalarVector>(&src, w, w, h, &mut want, w);
        assert_eq!(got, want, "{name} max_pool_3x3 {w}x{h}");
    }
}

fn check_backend<V: SimdVector>(name: &str) {
    check_conv::<V, 2>(name);
    check_conv::<V, 3>(name);
    check_conv::<V, 4>(name);
    check_conv::<V, 5>(name);
    check_elementwise_and_stats::<V>(name);
    check_pooling::<V>(name);
}

#[test]
fn scalar_backend_is_self_consistent() {
    check_backend::<ScalarVector>("scalar");
}

#[cfg(all(feature = "avx2", target_arch = "x86_64"))]
#[test]
fn avx2_matches_scalar() {
    if !std::arch::is_x86_feature_detected!("avx2") || !std::arch::is_x86_feature_detected!("fma")
    {
        eprintln!("AVX2/FMA not available, skipping");
        return;
    }
    check_backend::<vexel_kernels::simd::Avx2Vector>("avx2");
}

#[cfg(all(feature = "avx512", target_arch = "x86_64"))]
#[test]
fn avx512_matches_scalar() {
    let full = std::arch::is_x86_feature_detected!("avx512f")
        && std::arch::is_x86_feature_detected!("avx512bw")
        && std::arch::is_x86_feature_detected!("avx512dq")
        && std::arch::is_x86_feature_detected!("avx512vl");
    if !full {
        eprintln!("AVX-512 not available, skipping");
        return;
    }
    check_backend::<vexel_kernels::simd::Avx512Vector>("avx512");
}

#[cfg(all(feature = "neon", target_arch = "aarch64"))]
#[test]
fn neon_matches_scalar() {
    check_backend::<vexel_kernels::simd::NeonVector>("neon");
}
