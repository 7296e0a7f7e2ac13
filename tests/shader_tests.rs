//! Shader template tests
//!
//! Tests for:
//! - Every embedded template renders for every define combination
//! - Chunk inclusion and encoding switches
//! - The program set built by a camera

use prism::renderer::shaders::{ShaderDefines, ShaderLibrary};
use prism::{Camera, CameraDescriptor, HeadlessDevice, Viewport};

// ============================================================================
// Helper
// ============================================================================

const TEMPLATES: [&str; 9] = [
    "bilateral_blur",
    "bloom_threshold",
    "composite",
    "gaussian_blur",
    "smaa_blend",
    "smaa_copy",
    "smaa_edges",
    "smaa_weights",
    "ssao",
];

fn all_defines() -> Vec<ShaderDefines> {
    let mut out = Vec::new();
    for input_rgbm in [false, true] {
        for output_rgbm in [false, true] {
            for srgb_output in [false, true] {
                out.push(ShaderDefines {
                    input_rgbm,
                    output_rgbm,
                    srgb_output,
                });
            }
        }
    }
    out
}

// ============================================================================
// Templates
// ============================================================================

#[test]
fn template_names_lists_top_level_programs() {
    let mut names: Vec<String> = ShaderLibrary::template_names().collect();
    names.sort();
    assert_eq!(names, TEMPLATES);
}

#[test]
fn every_template_renders_with_every_define_combination() {
    let library = ShaderLibrary::new().unwrap();
    for name in TEMPLATES {
        for defines in all_defines() {
            let source = library
                .render(name, &defines)
                .unwrap_or_else(|e| panic!("{name} {defines:?}: {e}"));
            assert!(source.contains("fn vs_main"), "{name}: missing vertex stage");
            assert!(source.contains("fn fs_main"), "{name}: missing fragment stage");
            assert!(!source.contains("{$"), "{name}: unexpanded template block");
            assert!(!source.contains("$}"), "{name}: unexpanded template block");
        }
    }
}

#[test]
fn encoding_switches_select_rgbm_paths() {
    let library = ShaderLibrary::new().unwrap();

    let linear = library
        .render("gaussian_blur", &ShaderDefines::default())
        .unwrap();
    assert!(linear.contains("return texel.rgb;"));
    assert!(linear.contains("return vec4<f32>(color, 1.0);"));

    let rgbm = library
        .render(
            "gaussian_blur",
            &ShaderDefines {
                input_rgbm: true,
                output_rgbm: true,
                srgb_output: false,
            },
        )
        .unwrap();
    assert!(rgbm.contains("return decode_rgbm(texel);"));
    assert!(rgbm.contains("return encode_rgbm(color);"));
}

#[test]
fn unknown_template_is_an_error() {
    let library = ShaderLibrary::new().unwrap();
    assert!(library.render("missing", &ShaderDefines::default()).is_err());
}

// ============================================================================
// Programs
// ============================================================================

#[test]
fn camera_compiles_each_distinct_program_once() {
    let mut device = HeadlessDevice::new();
    let camera = Camera::new(&mut device, CameraDescriptor::new(Viewport::sized(64, 64))).unwrap();

    assert_eq!(device.program_count(), camera.frame_graph().programs().len());
    // Both axes of every blur share a program.
    let passes = camera.frame_graph().sequencer().passes().count();
    assert!(device.program_count() < passes + 1);
}
