//! Separable blur passes.
//!
//! Two programs cover every blur of the frame graph:
//!
//! - **Bilateral**: 9-tap Gaussian whose weights fall off with the depth
//!   difference to the center tap, so blur never bleeds across silhouettes.
//!   Ambient occlusion uses it with a neutral focus band; depth of field
//!   additionally scales the tap spacing by the distance to the focus
//!   plane.
//! - **Gaussian**: plain 9-tap Gaussian used by bloom.
//!
//! Each blur runs as a horizontal and a vertical pass. The step between
//! taps is `direction * radius` texels with `direction` one of
//! [`BlurAxis::direction`].

use glam::Vec2;

use crate::renderer::graph::{FrameParam, PassDesc, Stage, UniformData, UniformValue};
use crate::renderer::pool::TargetHandle;

pub const BILATERAL_SHADER: &str = "bilateral_blur";
pub const GAUSSIAN_SHADER: &str = "gaussian_blur";

/// Depth sensitivity of the depth-of-field blur.
pub const DOF_EDGE_SHARPNESS: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlurAxis {
    Horizontal,
    Vertical,
}

impl BlurAxis {
    #[must_use]
    pub fn direction(self) -> Vec2 {
        match self {
            Self::Horizontal => Vec2::new(0.5, 0.0),
            Self::Vertical => Vec2::new(0.0, 0.5),
        }
    }
}

/// Uniform sources of a bilateral blur.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BilateralBlur {
    pub radius: UniformValue,
    pub sharpness: UniformValue,
    pub focus_depth: UniformValue,
    pub focus_range: UniformValue,
}

impl BilateralBlur {
    /// Focus band disabled: `dof_depth = 0`, `dof_range = 0`.
    #[must_use]
    pub fn ambient_occlusion() -> Self {
        Self {
            radius: UniformValue::Param(FrameParam::SsaoBlurRadius),
            sharpness: UniformValue::Param(FrameParam::SsaoBlurSharpness),
            focus_depth: UniformValue::Const(UniformData::F32(0.0)),
            focus_range: UniformValue::Const(UniformData::F32(0.0)),
        }
    }

    #[must_use]
    pub fn depth_of_field() -> Self {
        Self {
            radius: UniformValue::Param(FrameParam::DofRadius),
            sharpness: UniformValue::Const(UniformData::F32(DOF_EDGE_SHARPNESS)),
            focus_depth: UniformValue::Param(FrameParam::DofDepth),
            focus_range: UniformValue::Param(FrameParam::DofRange),
        }
    }

    #[must_use]
    pub fn pass(
        &self,
        name: &'static str,
        stage: Stage,
        source: TargetHandle,
        destination: TargetHandle,
        depth: TargetHandle,
        axis: BlurAxis,
    ) -> PassDesc {
        PassDesc::new(name, stage, BILATERAL_SHADER)
            .writes(destination)
            .reads("image", source)
            .reads("depth", depth)
            .target_size("size", source)
            .constant("direction", UniformData::Vec2(axis.direction()))
            .param("near", FrameParam::Near)
            .param("far", FrameParam::Far)
            .uniform("radius", self.radius)
            .uniform("sharpness", self.sharpness)
            .uniform("dof_depth", self.focus_depth)
            .uniform("dof_range", self.focus_range)
    }
}

/// Plain Gaussian blur pass from `source` into `destination`.
#[must_use]
pub fn gaussian(
    name: &'static str,
    stage: Stage,
    source: TargetHandle,
    destination: TargetHandle,
    axis: BlurAxis,
    radius: FrameParam,
) -> PassDesc {
    PassDesc::new(name, stage, GAUSSIAN_SHADER)
        .writes(destination)
        .reads("image", source)
        .target_size("size", source)
        .constant("direction", UniformData::Vec2(axis.direction()))
        .param("radius", radius)
}
