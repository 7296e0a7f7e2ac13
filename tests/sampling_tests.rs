//! SSAO sample table tests
//!
//! Tests for:
//! - Seeded determinism of the kernel and noise tables
//! - Kernel shape (count, hemisphere, length range)
//! - Noise shape (count, Z = 0)
//! - Upload byte layout

use prism::SampleTables;
use prism::resources::ssao::{KERNEL_SIZE, KERNEL_TEXTURE_SIZE, NOISE_TEXTURE_SIZE};

// ============================================================================
// Helper
// ============================================================================

const EPSILON: f32 = 1e-5;

// ============================================================================
// Determinism
// ============================================================================

#[test]
fn same_seed_produces_identical_tables() {
    let a = SampleTables::generate(7);
    let b = SampleTables::generate(7);
    assert_eq!(a, b);
    assert_eq!(a.kernel_bytes(), b.kernel_bytes());
    assert_eq!(a.noise_bytes(), b.noise_bytes());
}

#[test]
fn different_seeds_produce_different_tables() {
    let a = SampleTables::generate(1);
    let b = SampleTables::generate(2);
    assert_ne!(a.kernel(), b.kernel());
    assert_ne!(a.noise(), b.noise());
}

// ============================================================================
// Kernel
// ============================================================================

#[test]
fn kernel_fills_its_texture() {
    let tables = SampleTables::default();
    assert_eq!(tables.kernel().len(), KERNEL_SIZE);
    assert_eq!(
        KERNEL_SIZE,
        (KERNEL_TEXTURE_SIZE * KERNEL_TEXTURE_SIZE) as usize
    );
}

#[test]
fn kernel_samples_lie_in_the_upper_hemisphere() {
    let tables = SampleTables::generate(1234);
    for (i, sample) in tables.kernel().iter().enumerate() {
        let length = sample.truncate().length();
        assert!(sample.z >= 0.0, "sample {i} below the surface: {sample}");
        assert!(
            length >= 0.1 - EPSILON && length <= 1.0 + EPSILON,
            "sample {i} length {length} out of [0.1, 1]"
        );
        assert!((sample.w - 1.0).abs() < EPSILON);
    }
}

// ============================================================================
// Noise
// ============================================================================

#[test]
fn noise_is_a_flat_rotation_tile() {
    let tables = SampleTables::generate(99);
    assert_eq!(
        tables.noise().len(),
        (NOISE_TEXTURE_SIZE * NOISE_TEXTURE_SIZE) as usize
    );
    for texel in tables.noise() {
        assert_eq!(texel.z, 0.0);
        assert!(texel.x >= -1.0 && texel.x < 1.0);
        assert!(texel.y >= -1.0 && texel.y < 1.0);
    }
}

#[test]
fn upload_bytes_are_rgba32_float_texels() {
    let tables = SampleTables::default();
    assert_eq!(tables.kernel_bytes().len(), KERNEL_SIZE * 16);
    assert_eq!(
        tables.noise_bytes().len(),
        (NOISE_TEXTURE_SIZE * NOISE_TEXTURE_SIZE) as usize * 16
    );

    let first = tables.kernel()[0];
    let bytes = &tables.kernel_bytes()[0..4];
    let x = f32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    assert_eq!(x, first.x);
}
