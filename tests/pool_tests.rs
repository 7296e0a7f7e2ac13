//! Render target pool tests
//!
//! Tests for:
//! - Allocation against the pool viewport (full and scaled extents)
//! - ensure_sized: floor rounding, one batch per change, idempotence
//! - A failed reallocation leaves the pool viewport unchanged
//! - Fixed targets never follow the viewport
//! - write_pixels adopts the uploaded extent

use prism::device::{DeviceLimits, FilterMode, WrapMode};
use prism::renderer::target::{RenderTargetDesc, TargetSize};
use prism::{HeadlessDevice, PixelFormat, PrismError, RenderTargetPool, Viewport};

// ============================================================================
// Helper
// ============================================================================

fn pool_with_targets(device: &mut HeadlessDevice) -> (RenderTargetPool, [prism::TargetHandle; 3]) {
    let mut pool = RenderTargetPool::new(Viewport::sized(800, 600));
    let full = pool
        .create(device, RenderTargetDesc::new("full", PixelFormat::Rgba16Float))
        .unwrap();
    let half = pool
        .create(
            device,
            RenderTargetDesc::new("half", PixelFormat::Rgba8).scaled(0.5),
        )
        .unwrap();
    let fixed = pool
        .create(
            device,
            RenderTargetDesc::new("fixed", PixelFormat::Rgba32Float).fixed(8, 8),
        )
        .unwrap();
    (pool, [full, half, fixed])
}

fn size_of(pool: &RenderTargetPool, handle: prism::TargetHandle) -> (u32, u32) {
    pool.get(handle).unwrap().size()
}

// ============================================================================
// Allocation
// ============================================================================

#[test]
fn create_sizes_targets_against_the_viewport() {
    let mut device = HeadlessDevice::new();
    let (pool, [full, half, fixed]) = pool_with_targets(&mut device);

    assert_eq!(pool.len(), 3);
    assert_eq!(size_of(&pool, full), (800, 600));
    assert_eq!(size_of(&pool, half), (400, 300));
    assert_eq!(size_of(&pool, fixed), (8, 8));
    assert_eq!(device.texture_count(), 3);

    let gpu = pool.gpu_texture(half).unwrap();
    let texture = device.texture(gpu).unwrap();
    assert_eq!((texture.width, texture.height), (400, 300));
    assert_eq!(texture.format, PixelFormat::Rgba8);
}

#[test]
fn descriptor_builders_set_sampling() {
    let desc = RenderTargetDesc::new("noise", PixelFormat::Rgba32Float)
        .fixed(128, 128)
        .repeat()
        .linear();
    assert_eq!(desc.wrap, WrapMode::Repeat);
    assert_eq!(desc.filter, FilterMode::Linear);
    assert_eq!(
        desc.size,
        TargetSize::Fixed {
            width: 128,
            height: 128
        }
    );
}

#[test]
fn scaled_extent_is_floored_and_never_empty() {
    let size = TargetSize::ViewportScaled(0.5);
    assert_eq!(size.resolve(&Viewport::sized(801, 601)), (400, 300));
    assert_eq!(size.resolve(&Viewport::sized(1, 1)), (1, 1));
    assert!(size.follows_viewport());
    assert!(!TargetSize::Fixed { width: 2, height: 2 }.follows_viewport());
}

// ============================================================================
// ensure_sized
// ============================================================================

#[test]
fn ensure_sized_reallocates_changed_targets_in_one_batch() {
    let mut device = HeadlessDevice::new();
    let (mut pool, [full, half, fixed]) = pool_with_targets(&mut device);

    let report = pool
        .ensure_sized(&mut device, Viewport::sized(400, 300))
        .unwrap();

    assert_eq!(report.len(), 2);
    assert!(report.reallocated.contains(&full));
    assert!(report.reallocated.contains(&half));
    assert_eq!(pool.batches(), 1);

    assert_eq!(size_of(&pool, full), (400, 300));
    assert_eq!(size_of(&pool, half), (200, 150));
    assert_eq!(size_of(&pool, fixed), (8, 8));
    assert_eq!(pool.viewport(), Viewport::sized(400, 300));

    let gpu = pool.gpu_texture(full).unwrap();
    assert_eq!(device.texture(gpu).unwrap().allocations, 2);
    assert_eq!(pool.get(full).unwrap().generation(), 1);
}

#[test]
fn ensure_sized_is_idempotent() {
    let mut device = HeadlessDevice::new();
    let (mut pool, [full, ..]) = pool_with_targets(&mut device);

    pool.ensure_sized(&mut device, Viewport::sized(640, 480))
        .unwrap();
    let again = pool
        .ensure_sized(&mut device, Viewport::sized(640, 480))
        .unwrap();

    assert!(again.is_empty());
    assert_eq!(pool.batches(), 1);
    let gpu = pool.gpu_texture(full).unwrap();
    assert_eq!(device.texture(gpu).unwrap().allocations, 2);
}

#[test]
fn ensure_sized_skips_targets_whose_floor_is_unchanged() {
    let mut device = HeadlessDevice::new();
    let (mut pool, [full, half, _]) = pool_with_targets(&mut device);

    // 801 * 0.5 still floors to 400.
    let report = pool
        .ensure_sized(&mut device, Viewport::sized(801, 600))
        .unwrap();

    assert_eq!(report.reallocated.as_slice(), &[full]);
    assert_eq!(size_of(&pool, half), (400, 300));
}

#[test]
fn handles_survive_resizes() {
    let mut device = HeadlessDevice::new();
    let (mut pool, [full, ..]) = pool_with_targets(&mut device);
    let before = pool.gpu_texture(full).unwrap();

    pool.ensure_sized(&mut device, Viewport::sized(320, 200))
        .unwrap();
    pool.ensure_sized(&mut device, Viewport::sized(1024, 768))
        .unwrap();

    assert!(pool.contains(full));
    assert_eq!(pool.gpu_texture(full).unwrap(), before);
    assert_eq!(pool.batches(), 2);
}

#[test]
fn failed_reallocation_keeps_the_previous_viewport() {
    let mut device = HeadlessDevice::with_limits(DeviceLimits {
        max_texture_dimension_2d: 1024,
        ..DeviceLimits::default()
    });
    let mut pool = RenderTargetPool::new(Viewport::sized(800, 600));
    // Iterated first: resized before the full-size target fails.
    let half = pool
        .create(
            &mut device,
            RenderTargetDesc::new("half", PixelFormat::Rgba8).scaled(0.5),
        )
        .unwrap();
    let full = pool
        .create(&mut device, RenderTargetDesc::new("full", PixelFormat::Rgba8))
        .unwrap();

    let result = pool.ensure_sized(&mut device, Viewport::sized(2000, 600));

    assert!(matches!(result, Err(PrismError::Device(_))));
    assert_eq!(pool.viewport(), Viewport::sized(800, 600));
    assert_eq!(pool.batches(), 0);
    assert_eq!(size_of(&pool, full), (800, 600));

    // Retrying the old viewport restores the partially resized target.
    let report = pool
        .ensure_sized(&mut device, Viewport::sized(800, 600))
        .unwrap();
    assert_eq!(report.reallocated.as_slice(), &[half]);
    assert_eq!(size_of(&pool, half), (400, 300));
}

// ============================================================================
// write_pixels
// ============================================================================

#[test]
fn write_pixels_adopts_the_uploaded_extent() {
    let mut device = HeadlessDevice::new();
    let mut pool = RenderTargetPool::new(Viewport::sized(64, 64));
    let lut = pool
        .create(
            &mut device,
            RenderTargetDesc::new("lut", PixelFormat::Rgba8).fixed(1, 1),
        )
        .unwrap();

    let pixels = vec![255u8; 4 * 16 * 4];
    pool.write_pixels(&mut device, lut, 16, 4, &pixels).unwrap();

    assert_eq!(size_of(&pool, lut), (16, 4));
    let texture = device.texture(pool.gpu_texture(lut).unwrap()).unwrap();
    assert_eq!((texture.width, texture.height), (16, 4));
    assert_eq!(texture.data.as_deref(), Some(pixels.as_slice()));

    // A later viewport change leaves fixed targets alone.
    pool.ensure_sized(&mut device, Viewport::sized(32, 32))
        .unwrap();
    assert_eq!(size_of(&pool, lut), (16, 4));
}

#[test]
fn write_pixels_rejects_mismatched_data() {
    let mut device = HeadlessDevice::new();
    let mut pool = RenderTargetPool::new(Viewport::sized(64, 64));
    let lut = pool
        .create(
            &mut device,
            RenderTargetDesc::new("lut", PixelFormat::Rgba8).fixed(2, 2),
        )
        .unwrap();

    let err = pool
        .write_pixels(&mut device, lut, 2, 2, &[0u8; 3])
        .unwrap_err();
    assert!(matches!(
        err,
        PrismError::TextureDataSize {
            expected: 16,
            actual: 3
        }
    ));
    assert_eq!(size_of(&pool, lut), (2, 2));
}
