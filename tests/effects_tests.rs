//! Effect math tests
//!
//! Tests for:
//! - Ambient occlusion on synthetic G-buffers (flat wall, floor/wall corner)
//! - Bilateral blur edge preservation and row bounds
//! - Bloom threshold
//! - Filmic tone mapping
//! - RGBM encoding
//! - Depth-of-field and fog factors

use std::f32::consts::FRAC_PI_4;

use glam::{Mat4, Vec3};
use prism::cpu::{
    GBufferView, ambient_occlusion, bilateral_blur_1d, bloom_threshold, decode_rgbm,
    dof_blur_scale, encode_rgbm, fog_amount, luminance, project, tonemap_uncharted2,
    view_position,
};
use prism::{SampleTables, SsaoSettings};

// ============================================================================
// Helper
// ============================================================================

const EPSILON: f32 = 1e-4;
const NEAR: f32 = 0.1;
const FAR: f32 = 100.0;
const SIZE: u32 = 128;

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn vec3_approx(a: Vec3, b: Vec3, tolerance: f32) -> bool {
    (a - b).abs().max_element() < tolerance
}

fn projection() -> Mat4 {
    Mat4::perspective_rh(FRAC_PI_4, 1.0, NEAR, FAR)
}

fn settings(radius: f32) -> SsaoSettings {
    SsaoSettings {
        enabled: true,
        radius,
        ..SsaoSettings::default()
    }
}

/// Ray casts every pixel against `surfaces` (plane point, normal) and
/// returns NDC depth plus view-space normals.
fn rasterize(surfaces: &[(Vec3, Vec3)]) -> (Vec<f32>, Vec<Vec3>) {
    let projection = projection();
    let inverse = projection.inverse();
    let mut depth = vec![1.0; (SIZE * SIZE) as usize];
    let mut normals = vec![Vec3::Z; (SIZE * SIZE) as usize];

    let grid = GBufferView {
        width: SIZE,
        height: SIZE,
        depth: &[],
        normals: &[],
    };
    for y in 0..SIZE {
        for x in 0..SIZE {
            let ray = view_position(&inverse, grid.uv(x, y), 1.0).normalize();
            let hit = surfaces
                .iter()
                .filter_map(|&(point, normal)| {
                    let facing = ray.dot(normal);
                    if facing >= 0.0 {
                        return None;
                    }
                    let t = point.dot(normal) / facing;
                    (t > 0.0).then_some((t, normal))
                })
                .min_by(|a, b| a.0.total_cmp(&b.0));

            if let Some((t, normal)) = hit {
                let index = (y * SIZE + x) as usize;
                depth[index] = project(&projection, ray * t).1;
                normals[index] = normal;
            }
        }
    }
    (depth, normals)
}

fn pixel_of(point: Vec3) -> (u32, u32) {
    let (uv, _) = project(&projection(), point);
    (
        (uv.x * SIZE as f32).floor() as u32,
        (uv.y * SIZE as f32).floor() as u32,
    )
}

// ============================================================================
// Ambient Occlusion
// ============================================================================

#[test]
fn flat_wall_facing_the_camera_is_unoccluded() {
    let (depth, normals) = rasterize(&[(Vec3::new(0.0, 0.0, -5.0), Vec3::Z)]);
    let view = GBufferView {
        width: SIZE,
        height: SIZE,
        depth: &depth,
        normals: &normals,
    };
    let tables = SampleTables::default();

    for (x, y) in [(SIZE / 2, SIZE / 2), (10, 20), (100, 90)] {
        let ao = ambient_occlusion(&view, &projection(), NEAR, &settings(0.5), &tables, x, y);
        assert!(approx(ao, 1.0), "pixel ({x}, {y}) occluded: {ao}");
    }
}

#[test]
fn background_is_unoccluded() {
    let depth = vec![1.0; (SIZE * SIZE) as usize];
    let normals = vec![Vec3::Z; (SIZE * SIZE) as usize];
    let view = GBufferView {
        width: SIZE,
        height: SIZE,
        depth: &depth,
        normals: &normals,
    };
    let ao = ambient_occlusion(
        &view,
        &projection(),
        NEAR,
        &settings(1.0),
        &SampleTables::default(),
        5,
        5,
    );
    assert_eq!(ao, 1.0);
}

#[test]
fn floor_meeting_a_wall_is_darkened() {
    let (depth, normals) = rasterize(&[
        (Vec3::new(0.0, -2.0, 0.0), Vec3::Y),
        (Vec3::new(0.0, 0.0, -10.0), Vec3::Z),
    ]);
    let view = GBufferView {
        width: SIZE,
        height: SIZE,
        depth: &depth,
        normals: &normals,
    };
    let tables = SampleTables::default();

    let (x, y) = pixel_of(Vec3::new(0.0, -2.0, -9.7));
    assert_eq!(normals[(y * SIZE + x) as usize], Vec3::Y);

    let ao = ambient_occlusion(&view, &projection(), NEAR, &settings(1.0), &tables, x, y);
    assert!(ao < 1.0, "corner should be occluded, got {ao}");
    assert!(ao >= 0.0);
}

#[test]
fn stronger_intensity_darkens_more() {
    let (depth, normals) = rasterize(&[
        (Vec3::new(0.0, -2.0, 0.0), Vec3::Y),
        (Vec3::new(0.0, 0.0, -10.0), Vec3::Z),
    ]);
    let view = GBufferView {
        width: SIZE,
        height: SIZE,
        depth: &depth,
        normals: &normals,
    };
    let tables = SampleTables::default();
    let (x, y) = pixel_of(Vec3::new(0.0, -2.0, -9.7));

    let weak = SsaoSettings {
        intensity: 1.0,
        ..settings(1.0)
    };
    let strong = SsaoSettings {
        intensity: 4.0,
        ..settings(1.0)
    };
    let a = ambient_occlusion(&view, &projection(), NEAR, &weak, &tables, x, y);
    let b = ambient_occlusion(&view, &projection(), NEAR, &strong, &tables, x, y);
    assert!(b < a);
}

// ============================================================================
// Bilateral Blur
// ============================================================================

#[test]
fn bilateral_blur_does_not_cross_depth_edges() {
    let values = [0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0];
    let split = [1.0, 1.0, 1.0, 1.0, 10.0, 10.0, 10.0, 10.0];
    let flat = [1.0; 8];

    let across_edge = bilateral_blur_1d(&values, &split, 3, 1.0, 10.0);
    let without_edge = bilateral_blur_1d(&values, &flat, 3, 1.0, 10.0);

    assert!(across_edge < 1e-3, "blur leaked across the edge: {across_edge}");
    assert!(without_edge > 0.1);
}

#[test]
fn bilateral_blur_keeps_constant_signal() {
    let values = [0.6; 16];
    let depths: Vec<f32> = (0..16).map(|i| i as f32 * 0.01).collect();
    for index in [0, 7, 15] {
        assert!(approx(bilateral_blur_1d(&values, &depths, index, 2.0, 10.0), 0.6));
    }
}

#[test]
fn bilateral_blur_uses_the_shorter_row() {
    let values = [0.6; 16];
    let depths = [1.0; 4];

    assert!(approx(bilateral_blur_1d(&values, &depths, 3, 4.0, 10.0), 0.6));
    assert_eq!(bilateral_blur_1d(&values, &depths, 4, 1.0, 10.0), 0.0);
    assert_eq!(bilateral_blur_1d(&values, &[], 0, 1.0, 10.0), 0.0);
}

// ============================================================================
// Bloom
// ============================================================================

#[test]
fn dim_pixels_do_not_bloom() {
    let color = Vec3::splat(0.5);
    assert!(approx(luminance(color), 0.5));
    assert_eq!(bloom_threshold(color, Vec3::ZERO, 1.0), Vec3::ZERO);
}

#[test]
fn emissive_pushes_pixels_over_the_threshold() {
    let color = Vec3::splat(0.5);
    let emissive = Vec3::new(1.0, 0.8, 0.2);
    assert_eq!(bloom_threshold(color, emissive, 1.0), color + emissive);
}

// ============================================================================
// Tone Mapping & Encoding
// ============================================================================

#[test]
fn tonemap_is_monotonic_and_bounded() {
    assert!(vec3_approx(tonemap_uncharted2(Vec3::ZERO), Vec3::ZERO, EPSILON));

    let mut previous = 0.0;
    for i in 1..64 {
        let x = i as f32 * 0.1;
        let mapped = tonemap_uncharted2(Vec3::splat(x)).x;
        assert!(mapped > previous, "not increasing at {x}");
        previous = mapped;
    }
    // Exposure bias 2: the white point is reached at 5.6.
    assert!(approx(tonemap_uncharted2(Vec3::splat(5.6)).y, 1.0));
}

#[test]
fn rgbm_round_trips_in_range_colors() {
    for color in [
        Vec3::new(2.0, 0.5, 0.1),
        Vec3::new(0.01, 0.02, 0.03),
        Vec3::splat(7.5),
    ] {
        let encoded = encode_rgbm(color);
        assert!(encoded.truncate().max_element() <= 1.0);
        assert!(vec3_approx(decode_rgbm(encoded), color, 1e-4));
    }
}

#[test]
fn rgbm_saturates_above_its_range() {
    let decoded = decode_rgbm(encode_rgbm(Vec3::new(20.0, 4.0, 0.0)));
    assert!(approx(decoded.x, 8.0));
    assert!(approx(decoded.y, 4.0));
}

// ============================================================================
// Depth of Field & Fog
// ============================================================================

#[test]
fn dof_footprint_grows_away_from_focus() {
    let near = dof_blur_scale(6.0, 6.76, 5.0, 2.0);
    let far = dof_blur_scale(9.0, 6.76, 5.0, 2.0);
    assert!(near < far);
    assert!(approx(dof_blur_scale(50.0, 6.76, 5.0, 2.0), 2.0));
    assert!(approx(dof_blur_scale(6.76, 6.76, 0.0, 2.0), 2.0));
}

#[test]
fn fog_thickens_with_distance() {
    let a = fog_amount(10.0, 5.0, 0.15);
    let b = fog_amount(20.0, 5.0, 0.15);
    assert!(a > 0.0 && a < b && b < 1.0);
    assert!(approx(a, 1.0 - (-0.75f32).exp()));
}
