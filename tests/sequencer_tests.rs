//! Pass sequencer tests
//!
//! Tests for:
//! - Descriptor validation (missing targets, feedback loops, attachments)
//! - Stage ordering and per-frame scheduling, repeated stages
//! - Ping-pong execution: each pass reads what the previous one wrote
//! - Viewport defaulting and uniform resolution at execution time
//! - Program deduplication

use glam::Vec2;
use prism::device::{ClearPolicy, GpuDevice, MeshId, RecordedTarget};
use prism::renderer::graph::{
    FrameParam, FrameParams, PassDesc, PassSequencer, ProgramCache, Stage, StageSet, UniformData,
    pack_uniforms, uniform_block_size,
};
use prism::renderer::shaders::ShaderLibrary;
use prism::renderer::target::RenderTargetDesc;
use prism::{HeadlessDevice, PixelFormat, PrismError, RenderTargetPool, TargetHandle, Viewport};

// ============================================================================
// Helper
// ============================================================================

struct Fixture {
    device: HeadlessDevice,
    pool: RenderTargetPool,
    shaders: ShaderLibrary,
    programs: ProgramCache,
    mesh: MeshId,
    a: TargetHandle,
    b: TargetHandle,
    half: TargetHandle,
}

impl Fixture {
    fn new() -> Self {
        let mut device = HeadlessDevice::new();
        let mut pool = RenderTargetPool::new(Viewport::sized(64, 32));
        let a = pool
            .create(&mut device, RenderTargetDesc::new("a", PixelFormat::Rgba8))
            .unwrap();
        let b = pool
            .create(&mut device, RenderTargetDesc::new("b", PixelFormat::Rgba8))
            .unwrap();
        let half = pool
            .create(
                &mut device,
                RenderTargetDesc::new("half", PixelFormat::Rgba8).scaled(0.5),
            )
            .unwrap();
        let mesh = device.create_quad_mesh().unwrap();
        Self {
            device,
            pool,
            shaders: ShaderLibrary::new().unwrap(),
            programs: ProgramCache::new(),
            mesh,
            a,
            b,
            half,
        }
    }

    fn build(&mut self, passes: Vec<PassDesc>) -> prism::Result<PassSequencer> {
        PassSequencer::new(
            &mut self.device,
            &self.pool,
            &self.shaders,
            &mut self.programs,
            self.mesh,
            passes,
        )
    }
}

fn blur(name: &'static str, stage: Stage, from: TargetHandle, to: TargetHandle) -> PassDesc {
    PassDesc::new(name, stage, "gaussian_blur")
        .writes(to)
        .reads("image", from)
        .target_size("size", from)
        .constant("direction", UniformData::Vec2(Vec2::new(0.5, 0.0)))
        .param("radius", FrameParam::BloomRadius)
}

// ============================================================================
// Validation
// ============================================================================

#[test]
fn missing_input_target_is_rejected() {
    let mut fx = Fixture::new();

    // A handle from a larger pool that this pool never issued.
    let mut other = RenderTargetPool::new(Viewport::sized(8, 8));
    let mut scratch = HeadlessDevice::new();
    let mut foreign = None;
    for name in ["x", "y", "z", "w"] {
        foreign = Some(
            other
                .create(&mut scratch, RenderTargetDesc::new(name, PixelFormat::Rgba8))
                .unwrap(),
        );
    }
    let foreign = foreign.unwrap();
    assert!(!fx.pool.contains(foreign));

    let err = fx
        .build(vec![blur("bad", Stage::Bloom, foreign, fx.a)])
        .err()
        .unwrap();
    assert!(matches!(
        err,
        PrismError::MissingTarget {
            pass: "bad",
            input: "image"
        }
    ));
}

#[test]
fn sampling_own_attachment_is_a_feedback_loop() {
    let mut fx = Fixture::new();
    let err = fx
        .build(vec![blur("loop", Stage::Bloom, fx.a, fx.a)])
        .err()
        .unwrap();
    assert!(matches!(
        err,
        PrismError::FeedbackLoop {
            pass: "loop",
            input: "image"
        }
    ));
}

#[test]
fn attachments_must_share_an_extent() {
    let mut fx = Fixture::new();
    let pass = PassDesc::new("mrt", Stage::Bloom, "gaussian_blur")
        .writes(fx.a)
        .writes(fx.half)
        .reads("image", fx.b);
    let err = fx.build(vec![pass]).err().unwrap();
    assert!(matches!(err, PrismError::AttachmentMismatch { pass: "mrt", .. }));
}

#[test]
fn pass_without_color_attachment_is_rejected() {
    let mut fx = Fixture::new();
    let pass = PassDesc::new("empty", Stage::Bloom, "gaussian_blur").reads("image", fx.a);
    assert!(matches!(
        fx.build(vec![pass]),
        Err(PrismError::AttachmentMismatch { .. })
    ));
}

#[test]
fn unknown_shader_fails_construction() {
    let mut fx = Fixture::new();
    let pass = PassDesc::new("nope", Stage::Bloom, "does_not_exist")
        .writes(fx.a)
        .reads("image", fx.b);
    assert!(matches!(fx.build(vec![pass]), Err(PrismError::Shader(_))));
}

// ============================================================================
// Ordering & Scheduling
// ============================================================================

#[test]
fn passes_are_ordered_by_stage_then_declaration() {
    let mut fx = Fixture::new();
    let (a, b) = (fx.a, fx.b);
    let sequencer = fx
        .build(vec![
            blur("smaa-1", Stage::Antialiasing, a, b),
            blur("bloom-1", Stage::Bloom, a, b),
            blur("ao-1", Stage::AmbientOcclusion, a, b),
            blur("bloom-2", Stage::Bloom, b, a),
            blur("dof-1", Stage::DepthOfField, a, b),
        ])
        .unwrap();

    let names: Vec<_> = sequencer.passes().map(|p| p.name).collect();
    assert_eq!(names, vec!["ao-1", "dof-1", "bloom-1", "bloom-2", "smaa-1"]);
}

#[test]
fn schedule_keeps_only_enabled_stages() {
    let mut fx = Fixture::new();
    let (a, b) = (fx.a, fx.b);
    let sequencer = fx
        .build(vec![
            blur("ao", Stage::AmbientOcclusion, a, b),
            blur("bloom", Stage::Bloom, b, a),
            blur("smaa", Stage::Antialiasing, a, b),
        ])
        .unwrap();

    let schedule = sequencer.schedule(StageSet::BLOOM | StageSet::ANTIALIASING);
    assert_eq!(schedule.names().collect::<Vec<_>>(), vec!["bloom", "smaa"]);
    assert!(!schedule.contains("ao"));
    assert!(sequencer.schedule(StageSet::empty()).is_empty());
}

#[test]
fn repeated_stages_run_as_a_unit() {
    let mut fx = Fixture::new();
    let (a, b) = (fx.a, fx.b);
    let sequencer = fx
        .build(vec![
            blur("dof-h", Stage::DepthOfField, a, b),
            blur("dof-v", Stage::DepthOfField, b, a),
            blur("smaa", Stage::Antialiasing, a, b),
        ])
        .unwrap();

    let schedule = sequencer.schedule_repeated(StageSet::all(), |stage| match stage {
        Stage::DepthOfField => 2,
        _ => 0,
    });
    assert_eq!(
        schedule.names().collect::<Vec<_>>(),
        vec!["dof-h", "dof-v", "dof-h", "dof-v", "smaa"]
    );

    let count = sequencer
        .execute(&mut fx.device, &fx.pool, &FrameParams::default(), &schedule)
        .unwrap();
    assert_eq!(count, 5);
    // Every iteration ends where the next one starts.
    let gpu_a = fx.pool.gpu_texture(a).unwrap();
    assert_eq!(fx.device.draws()[2].textures, vec![gpu_a]);
}

// ============================================================================
// Execution
// ============================================================================

#[test]
fn ping_pong_reads_what_the_previous_pass_wrote() {
    let mut fx = Fixture::new();
    let (a, b) = (fx.a, fx.b);
    let sequencer = fx
        .build(vec![
            blur("h", Stage::AmbientOcclusion, a, b),
            blur("v", Stage::AmbientOcclusion, b, a),
        ])
        .unwrap();

    let schedule = sequencer.schedule(StageSet::all());
    let count = sequencer
        .execute(&mut fx.device, &fx.pool, &FrameParams::default(), &schedule)
        .unwrap();
    assert_eq!(count, 2);

    let gpu_a = fx.pool.gpu_texture(a).unwrap();
    let gpu_b = fx.pool.gpu_texture(b).unwrap();
    let draws = fx.device.draws();
    assert_eq!(draws[0].textures, vec![gpu_a]);
    assert_eq!(draws[0].color_targets(), &[gpu_b]);
    assert_eq!(draws[1].textures, vec![gpu_b]);
    assert_eq!(draws[1].color_targets(), &[gpu_a]);
}

#[test]
fn viewport_defaults_to_destination_extent() {
    let mut fx = Fixture::new();
    let (a, b, half) = (fx.a, fx.b, fx.half);
    let sequencer = fx
        .build(vec![
            blur("down", Stage::Bloom, a, half),
            blur("fixed", Stage::Bloom, half, b).viewport(Viewport::new(4, 4, 8, 8)),
        ])
        .unwrap();

    let schedule = sequencer.schedule(StageSet::BLOOM);
    sequencer
        .execute(&mut fx.device, &fx.pool, &FrameParams::default(), &schedule)
        .unwrap();

    let draws = fx.device.draws();
    assert_eq!(draws[0].viewport, Viewport::sized(32, 16));
    assert_eq!(draws[1].viewport, Viewport::new(4, 4, 8, 8));
    assert!(matches!(draws[0].target, RecordedTarget::Textures { .. }));
}

#[test]
fn clear_policy_is_forwarded() {
    let mut fx = Fixture::new();
    let (a, b) = (fx.a, fx.b);
    let cleared = ClearPolicy::color([0.0, 0.0, 0.0, 1.0]);
    let sequencer = fx
        .build(vec![blur("c", Stage::Bloom, a, b).clear(cleared)])
        .unwrap();

    let schedule = sequencer.schedule(StageSet::BLOOM);
    sequencer
        .execute(&mut fx.device, &fx.pool, &FrameParams::default(), &schedule)
        .unwrap();
    assert_eq!(fx.device.draws()[0].clear, cleared);
}

#[test]
fn uniforms_resolve_current_values() {
    let mut fx = Fixture::new();
    let pass = blur("u", Stage::Bloom, fx.half, fx.a);

    let mut frame = FrameParams::default();
    frame.bloom.radius = 3.0;
    let bytes = pack_uniforms(&pass.uniforms, &frame, &fx.pool).unwrap();
    assert_eq!(bytes.len() as u64, uniform_block_size(&pass.uniforms));

    let floats: Vec<f32> = bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();
    // size (vec2), direction (vec2), radius
    assert_eq!(&floats[0..5], &[32.0, 16.0, 0.5, 0.0, 3.0]);

    fx.pool
        .ensure_sized(&mut fx.device, Viewport::sized(128, 64))
        .unwrap();
    let bytes = pack_uniforms(&pass.uniforms, &frame, &fx.pool).unwrap();
    assert_eq!(f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]), 64.0);
}

// ============================================================================
// Programs
// ============================================================================

#[test]
fn identical_programs_are_shared() {
    let mut fx = Fixture::new();
    let (a, b) = (fx.a, fx.b);
    fx.build(vec![
        blur("h", Stage::Bloom, a, b),
        blur("v", Stage::Bloom, b, a),
    ])
    .unwrap();

    assert_eq!(fx.programs.len(), 1);
    assert_eq!(fx.device.program_count(), 1);
}
