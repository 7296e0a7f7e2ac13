//! CPU evaluation of the per-pixel effect math.
//!
//! These functions compute exactly what the WGSL programs compute for one
//! pixel, which lets the numeric behavior of the effects be checked without
//! a GPU. They read the same inputs the shaders bind: NDC depth in
//! `[0, 1]`, decoded view-space normals and the generated sample tables.

pub mod encoding;
pub mod occlusion;

pub use encoding::{
    RGBM_RANGE, bloom_threshold, decode_rgbm, encode_rgbm, luminance, tonemap_uncharted2,
};
pub use occlusion::{GAUSSIAN_WEIGHTS, GBufferView, ambient_occlusion, bilateral_blur_1d};

use glam::{Mat4, Vec2, Vec3, Vec4, Vec4Swizzles};

/// Eye distance of NDC depth `d` for a `[0, 1]` depth range projection.
#[inline]
#[must_use]
pub fn linear_depth(d: f32, near: f32, far: f32) -> f32 {
    near * far / (far - d * (far - near))
}

/// View-space position behind `uv` (top-left origin) at NDC depth `d`.
#[must_use]
pub fn view_position(inverse_projection: &Mat4, uv: Vec2, d: f32) -> Vec3 {
    let clip = *inverse_projection * Vec4::new(uv.x * 2.0 - 1.0, 1.0 - uv.y * 2.0, d, 1.0);
    clip.xyz() / clip.w
}

/// Projects a view-space point to `(uv, ndc_depth)`.
#[must_use]
pub fn project(projection: &Mat4, position: Vec3) -> (Vec2, f32) {
    let clip = *projection * position.extend(1.0);
    let ndc = clip.xyz() / clip.w;
    (Vec2::new(ndc.x * 0.5 + 0.5, 0.5 - ndc.y * 0.5), ndc.z)
}

/// Tap spacing multiplier of the depth-of-field blur.
///
/// Zero on the focus plane, `radius` beyond `range` units from it.
#[must_use]
pub fn dof_blur_scale(linear_depth: f32, focus_depth: f32, range: f32, radius: f32) -> f32 {
    if range <= 0.0 {
        return radius;
    }
    ((linear_depth - focus_depth).abs() / range).clamp(0.0, 1.0) * radius
}

/// Fraction of fog blended over a surface `distance` units away.
#[must_use]
pub fn fog_amount(distance: f32, start: f32, density: f32) -> f32 {
    1.0 - (-(distance - start).max(0.0) * density).exp()
}

#[inline]
pub(crate) fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_depth_spans_near_to_far() {
        assert!((linear_depth(0.0, 0.1, 100.0) - 0.1).abs() < 1e-6);
        assert!((linear_depth(1.0, 0.1, 100.0) - 100.0).abs() < 1e-3);
    }

    #[test]
    fn projection_round_trips_through_view_position() {
        let projection = Mat4::perspective_rh(std::f32::consts::FRAC_PI_4, 1.5, 0.1, 100.0);
        let point = Vec3::new(0.7, -0.4, -6.0);
        let (uv, d) = project(&projection, point);
        let back = view_position(&projection.inverse(), uv, d);
        assert!((back - point).length() < 1e-3);
    }

    #[test]
    fn dof_scale_is_zero_in_focus() {
        assert_eq!(dof_blur_scale(6.76, 6.76, 5.0, 1.0), 0.0);
        assert_eq!(dof_blur_scale(100.0, 6.76, 5.0, 1.0), 1.0);
    }

    #[test]
    fn fog_starts_after_offset() {
        assert_eq!(fog_amount(3.0, 5.0, 0.15), 0.0);
        assert!(fog_amount(50.0, 5.0, 0.15) > 0.99);
    }
}
