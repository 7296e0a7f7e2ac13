//! Bloom stage.
//!
//! ```text
//! color + emissive ──bloom-threshold──▶ bloom-V   (half resolution)
//! bloom-V          ──bloom-blur-h────▶ bloom-H
//! bloom-H          ──bloom-blur-v────▶ bloom-V
//! ```
//!
//! The compositor samples bloom-V.

use super::blur::{self, BlurAxis};
use crate::device::ClearPolicy;
use crate::renderer::FrameTargets;
use crate::renderer::graph::{FrameParam, PassDesc, Stage};

pub const BLOOM_THRESHOLD: &str = "bloom-threshold";
pub const BLOOM_BLUR_H: &str = "bloom-blur-h";
pub const BLOOM_BLUR_V: &str = "bloom-blur-v";

/// Resolution of the bloom buffers relative to the viewport.
pub const BLOOM_SCALE: f32 = 0.5;

#[must_use]
pub fn passes(targets: &FrameTargets) -> Vec<PassDesc> {
    let stage = Stage::Bloom;

    let threshold = PassDesc::new(BLOOM_THRESHOLD, stage, "bloom_threshold")
        .writes(targets.bloom_v)
        .clear(ClearPolicy::color([0.0, 0.0, 0.0, 1.0]))
        .reads("image", targets.color)
        .reads("emissive", targets.emissive)
        .param("threshold", FrameParam::BloomThreshold);

    vec![
        threshold,
        blur::gaussian(
            BLOOM_BLUR_H,
            stage,
            targets.bloom_v,
            targets.bloom_h,
            BlurAxis::Horizontal,
            FrameParam::BloomRadius,
        ),
        blur::gaussian(
            BLOOM_BLUR_V,
            stage,
            targets.bloom_h,
            targets.bloom_v,
            BlurAxis::Vertical,
            FrameParam::BloomRadius,
        ),
    ]
}
