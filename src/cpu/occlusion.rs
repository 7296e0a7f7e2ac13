//! Ambient occlusion and bilateral blur.

use glam::{Mat3, Mat4, Vec2, Vec3, Vec4Swizzles};

use super::{project, smoothstep, view_position};
use crate::resources::ssao::{KERNEL_SIZE, NOISE_TEXTURE_SIZE};
use crate::resources::{SampleTables, SsaoSettings};

/// Weights of the center tap and the four taps on each side.
pub const GAUSSIAN_WEIGHTS: [f32; 5] = [
    0.227_027_03,
    0.194_594_6,
    0.121_621_62,
    0.054_054_055,
    0.016_216_217,
];

/// Read-only view of the depth and normal buffers, row-major, top row
/// first.
#[derive(Debug, Clone, Copy)]
pub struct GBufferView<'a> {
    pub width: u32,
    pub height: u32,
    /// NDC depth, `1.0` where nothing was rendered.
    pub depth: &'a [f32],
    /// Decoded view-space normals.
    pub normals: &'a [Vec3],
}

impl GBufferView<'_> {
    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    fn texel(&self, uv: Vec2) -> (u32, u32) {
        let x = (uv.x * self.width as f32).floor().clamp(0.0, (self.width - 1) as f32);
        let y = (uv.y * self.height as f32).floor().clamp(0.0, (self.height - 1) as f32);
        (x as u32, y as u32)
    }

    /// Depth of the texel under `uv` (no filtering, edges clamped).
    #[must_use]
    pub fn depth_at(&self, uv: Vec2) -> f32 {
        let (x, y) = self.texel(uv);
        self.depth.get(self.index(x, y)).copied().unwrap_or(1.0)
    }

    #[must_use]
    pub fn uv(&self, x: u32, y: u32) -> Vec2 {
        Vec2::new(
            (x as f32 + 0.5) / self.width as f32,
            (y as f32 + 0.5) / self.height as f32,
        )
    }
}

/// Occlusion factor of pixel `(x, y)`: `1.0` is fully lit.
#[must_use]
pub fn ambient_occlusion(
    view: &GBufferView<'_>,
    projection: &Mat4,
    near: f32,
    settings: &SsaoSettings,
    tables: &SampleTables,
    x: u32,
    y: u32,
) -> f32 {
    let uv = view.uv(x, y);
    let d = view.depth_at(uv);
    if d >= 1.0 {
        return 1.0;
    }

    let inverse_projection = projection.inverse();
    let origin = view_position(&inverse_projection, uv, d);
    let normal = view
        .normals
        .get(view.index(x, y))
        .copied()
        .unwrap_or(Vec3::Z)
        .normalize_or(Vec3::Z);

    let noise_index = (y % NOISE_TEXTURE_SIZE) * NOISE_TEXTURE_SIZE + x % NOISE_TEXTURE_SIZE;
    let rotation = tables.noise()[noise_index as usize].xyz();
    let tangent = (rotation - normal * rotation.dot(normal))
        .normalize_or(normal.any_orthonormal_vector());
    let tbn = Mat3::from_cols(tangent, normal.cross(tangent), normal);

    let mut occluded = 0.0;
    for k in tables.kernel() {
        let sample = origin + tbn * k.xyz() * settings.radius;
        if sample.z >= -near {
            continue;
        }
        let (sample_uv, _) = project(projection, sample);
        if sample_uv.cmplt(Vec2::ZERO).any() || sample_uv.cmpgt(Vec2::ONE).any() {
            continue;
        }

        let scene_z = view_position(&inverse_projection, sample_uv, view.depth_at(sample_uv)).z;
        let range = smoothstep(0.0, 1.0, settings.radius / (origin.z - scene_z).abs().max(1e-4));
        if scene_z >= sample.z + settings.bias {
            occluded += range;
        }
    }

    (1.0 - settings.intensity * occluded / KERNEL_SIZE as f32).clamp(0.0, 1.0)
}

/// One axis of the bilateral blur over a row of scalar values.
///
/// Taps sit `step` samples apart (rounded to the nearest sample and clamped
/// to the row) and are weighted by `exp(-sharpness * |depth - center|)`.
///
/// The row is as long as the shorter of `values` and `depths`; an `index`
/// outside it yields `0.0`.
#[must_use]
pub fn bilateral_blur_1d(
    values: &[f32],
    depths: &[f32],
    index: usize,
    step: f32,
    sharpness: f32,
) -> f32 {
    let len = values.len().min(depths.len());
    if index >= len {
        return 0.0;
    }
    let last = len - 1;
    let center_depth = depths[index];

    let mut sum = values[index] * GAUSSIAN_WEIGHTS[0];
    let mut total = GAUSSIAN_WEIGHTS[0];
    for (i, &weight) in GAUSSIAN_WEIGHTS.iter().enumerate().skip(1) {
        for side in [-1.0, 1.0] {
            let position = (index as f32 + step * i as f32 * side).round().clamp(0.0, last as f32);
            let tap = position as usize;
            let w = weight * (-sharpness * (depths[tap] - center_depth).abs()).exp();
            sum += values[tap] * w;
            total += w;
        }
    }
    sum / total
}
