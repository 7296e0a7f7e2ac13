//! Color encoding, luminance and tone mapping.

use glam::{Vec3, Vec4};

/// Largest value RGBM can represent.
pub const RGBM_RANGE: f32 = 8.0;

const LUMINANCE: Vec3 = Vec3::new(0.2126, 0.7152, 0.0722);

#[inline]
#[must_use]
pub fn luminance(color: Vec3) -> f32 {
    color.dot(LUMINANCE)
}

#[inline]
#[must_use]
pub fn decode_rgbm(rgbm: Vec4) -> Vec3 {
    rgbm.truncate() * rgbm.w * RGBM_RANGE
}

/// Encodes linear HDR color. The multiplier is rounded up to the next
/// 8-bit step so the stored RGB never exceeds 1.
#[must_use]
pub fn encode_rgbm(color: Vec3) -> Vec4 {
    let c = color.max(Vec3::ZERO);
    let peak = c.max_element().max(1e-6);
    let m = ((peak / RGBM_RANGE).clamp(0.0, 1.0) * 255.0).ceil() / 255.0;
    (c / (m * RGBM_RANGE))
        .clamp(Vec3::ZERO, Vec3::ONE)
        .extend(m)
}

// ============================================================================
// Tone Mapping
// ============================================================================

const A: f32 = 0.15;
const B: f32 = 0.50;
const C: f32 = 0.10;
const D: f32 = 0.20;
const E: f32 = 0.02;
const F: f32 = 0.30;
const WHITE_POINT: f32 = 11.2;
const EXPOSURE_BIAS: f32 = 2.0;

fn filmic_curve(x: Vec3) -> Vec3 {
    (x * (A * x + C * B) + D * E) / (x * (A * x + B) + D * F) - E / F
}

/// Uncharted 2 filmic curve, normalized so the white point maps to 1.
#[must_use]
pub fn tonemap_uncharted2(color: Vec3) -> Vec3 {
    let white_scale = Vec3::ONE / filmic_curve(Vec3::splat(WHITE_POINT));
    filmic_curve(color * EXPOSURE_BIAS) * white_scale
}

/// Output of the bloom threshold pass for one pixel.
#[must_use]
pub fn bloom_threshold(color: Vec3, emissive: Vec3, threshold: f32) -> Vec3 {
    let sum = color + emissive;
    if luminance(sum) > threshold {
        sum
    } else {
        Vec3::ZERO
    }
}
