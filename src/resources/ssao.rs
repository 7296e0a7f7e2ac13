//! SSAO (Screen Space Ambient Occlusion) Configuration
//!
//! This module defines the SSAO settings as pure data and generates the two
//! precomputed sample tables the occlusion shader reads:
//!
//! 1. A 64-sample hemisphere kernel, stored as an 8×8 `Rgba32Float` image.
//!    Each sample is a normalized direction in the +Z hemisphere scaled by
//!    `lerp(0.1, 1.0, s²)` for a random `s`, which concentrates samples near
//!    the shaded point.
//! 2. A 128×128 rotation noise tile, stored as a repeat-wrapped
//!    `Rgba32Float` image. Each texel holds a random XY rotation vector
//!    (Z = 0) used to rotate the kernel per pixel.
//!
//! Both tables come from a single seeded `StdRng`: the same seed always
//! produces byte-identical tables.

use glam::{Vec3, Vec4};
use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};

// ============================================================================
// SsaoSettings
// ============================================================================

/// Ambient occlusion parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SsaoSettings {
    pub enabled: bool,
    /// Multiplier applied to the occluded sample ratio.
    pub intensity: f32,
    /// Kernel radius in view-space units.
    pub radius: f32,
    /// Depth bias preventing self-occlusion on flat surfaces.
    pub bias: f32,
    /// Step (in texels) of the bilateral blur taps.
    pub blur_radius: f32,
    /// Depth sensitivity of the bilateral blur. Higher keeps edges crisper.
    pub blur_sharpness: f32,
}

impl Default for SsaoSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            intensity: 5.0,
            radius: 12.0,
            bias: 0.01,
            blur_radius: 2.0,
            blur_sharpness: 10.0,
        }
    }
}

// ============================================================================
// Kernel & Noise Generation
// ============================================================================

/// Number of hemisphere samples.
pub const KERNEL_SIZE: usize = 64;
/// Edge length of the square image the kernel is stored in.
pub const KERNEL_TEXTURE_SIZE: u32 = 8;
/// Edge length of the rotation noise tile.
pub const NOISE_TEXTURE_SIZE: u32 = 128;
/// Seed used when the caller does not provide one.
pub const DEFAULT_SAMPLE_SEED: u64 = 42;

/// The SSAO kernel and rotation noise, ready for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleTables {
    kernel: Vec<Vec4>,
    noise: Vec<Vec4>,
}

impl SampleTables {
    /// Generates both tables from `seed`.
    #[must_use]
    pub fn generate(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let kernel = generate_kernel(&mut rng);
        let noise = generate_noise(&mut rng);
        Self { kernel, noise }
    }

    #[inline]
    #[must_use]
    pub fn kernel(&self) -> &[Vec4] {
        &self.kernel
    }

    #[inline]
    #[must_use]
    pub fn noise(&self) -> &[Vec4] {
        &self.noise
    }

    /// Kernel as tightly packed `Rgba32Float` texels.
    #[must_use]
    pub fn kernel_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.kernel)
    }

    /// Noise tile as tightly packed `Rgba32Float` texels.
    #[must_use]
    pub fn noise_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.noise)
    }
}

impl Default for SampleTables {
    fn default() -> Self {
        Self::generate(DEFAULT_SAMPLE_SEED)
    }
}

fn generate_kernel(rng: &mut StdRng) -> Vec<Vec4> {
    (0..KERNEL_SIZE)
        .map(|_| {
            let direction = Vec3::new(
                rng.random_range(-1.0..1.0),
                rng.random_range(-1.0..1.0),
                rng.random_range(0.0..1.0),
            )
            .normalize_or(Vec3::Z);

            let scale: f32 = rng.random_range(0.0..1.0);
            let sample = direction * lerp(0.1, 1.0, scale * scale);

            sample.extend(1.0)
        })
        .collect()
}

fn generate_noise(rng: &mut StdRng) -> Vec<Vec4> {
    let texels = (NOISE_TEXTURE_SIZE * NOISE_TEXTURE_SIZE) as usize;
    (0..texels)
        .map(|_| {
            Vec4::new(
                rng.random_range(-1.0..1.0),
                rng.random_range(-1.0..1.0),
                0.0,
                1.0,
            )
        })
        .collect()
}

fn lerp(a: f32, b: f32, f: f32) -> f32 {
    a + f * (b - a)
}
