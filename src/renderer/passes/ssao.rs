//! Ambient occlusion stage.
//!
//! ```text
//! depth + normal + noise + kernel ──ssao──▶ AO
//! AO      ──ao-blur-h──▶ AO-blur
//! AO-blur ──ao-blur-v──▶ AO
//! ```
//!
//! The blur ping-pongs back into the AO target, which is what the
//! compositor samples.

use super::blur::{BilateralBlur, BlurAxis};
use crate::device::ClearPolicy;
use crate::renderer::FrameTargets;
use crate::renderer::graph::{FrameParam, PassDesc, Stage};

pub const SSAO: &str = "ssao";
pub const AO_BLUR_H: &str = "ao-blur-h";
pub const AO_BLUR_V: &str = "ao-blur-v";

#[must_use]
pub fn passes(targets: &FrameTargets) -> Vec<PassDesc> {
    let stage = Stage::AmbientOcclusion;
    let blur = BilateralBlur::ambient_occlusion();

    let occlusion = PassDesc::new(SSAO, stage, "ssao")
        .writes(targets.ao)
        .clear(ClearPolicy::color([0.0, 0.0, 0.0, 1.0]))
        .reads("depth", targets.depth)
        .reads("normal", targets.normal)
        .reads("noise", targets.ssao_noise)
        .reads("kernel", targets.ssao_kernel)
        .param("projection", FrameParam::Projection)
        .param("inverse_projection", FrameParam::InverseProjection)
        .target_size("size", targets.ao)
        .param("intensity", FrameParam::SsaoIntensity)
        .param("radius", FrameParam::SsaoRadius)
        .param("bias", FrameParam::SsaoBias)
        .param("near", FrameParam::Near)
        .param("far", FrameParam::Far);

    vec![
        occlusion,
        blur.pass(
            AO_BLUR_H,
            stage,
            targets.ao,
            targets.ao_blur,
            targets.depth,
            BlurAxis::Horizontal,
        ),
        blur.pass(
            AO_BLUR_V,
            stage,
            targets.ao_blur,
            targets.ao,
            targets.depth,
            BlurAxis::Vertical,
        ),
    ]
}
