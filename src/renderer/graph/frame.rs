//! Per-frame parameters.
//!
//! [`FrameParams`] is the snapshot of camera state and effect settings a
//! frame is rendered with. Pass uniforms reference it through
//! [`FrameParam`] so a descriptor built once at initialization always
//! uploads the current values.

use glam::{Mat4, Vec2};

use super::uniforms::{UniformData, UniformKind};
use crate::camera::CameraConfig;
use crate::resources::{BloomSettings, DofSettings, FogSettings, SsaoSettings};

/// Camera matrices and effect settings of one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameParams {
    pub projection: Mat4,
    pub inverse_projection: Mat4,
    pub view: Mat4,
    pub near: f32,
    pub far: f32,
    pub exposure: f32,
    pub ssao: SsaoSettings,
    pub dof: DofSettings,
    pub bloom: BloomSettings,
    pub fog: FogSettings,
    pub fxaa: bool,
}

impl FrameParams {
    #[must_use]
    pub fn new(config: &CameraConfig, projection: Mat4, view: Mat4) -> Self {
        Self {
            projection,
            inverse_projection: projection.inverse(),
            view,
            near: config.near,
            far: config.far,
            exposure: config.exposure,
            ssao: config.ssao,
            dof: config.dof,
            bloom: config.bloom,
            fog: config.fog,
            fxaa: config.fxaa,
        }
    }

    /// Current value of `param`.
    #[must_use]
    pub fn resolve(&self, param: FrameParam) -> UniformData {
        match param {
            FrameParam::Projection => UniformData::Mat4(self.projection),
            FrameParam::InverseProjection => UniformData::Mat4(self.inverse_projection),
            FrameParam::View => UniformData::Mat4(self.view),
            FrameParam::Near => UniformData::F32(self.near),
            FrameParam::Far => UniformData::F32(self.far),
            FrameParam::SsaoIntensity => UniformData::F32(self.ssao.intensity),
            FrameParam::SsaoRadius => UniformData::F32(self.ssao.radius),
            FrameParam::SsaoBias => UniformData::F32(self.ssao.bias),
            FrameParam::SsaoBlurRadius => UniformData::F32(self.ssao.blur_radius),
            FrameParam::SsaoBlurSharpness => UniformData::F32(self.ssao.blur_sharpness),
            FrameParam::DofDepth => UniformData::F32(self.dof.depth),
            FrameParam::DofRange => UniformData::F32(self.dof.range),
            FrameParam::DofRadius => UniformData::F32(self.dof.radius),
            FrameParam::BloomThreshold => UniformData::F32(self.bloom.threshold),
            FrameParam::BloomRadius => UniformData::F32(self.bloom.radius),
        }
    }
}

impl Default for FrameParams {
    fn default() -> Self {
        Self::new(&CameraConfig::default(), Mat4::IDENTITY, Mat4::IDENTITY)
    }
}

/// A uniform whose value is read from [`FrameParams`] at execution time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameParam {
    Projection,
    InverseProjection,
    View,
    Near,
    Far,
    SsaoIntensity,
    SsaoRadius,
    SsaoBias,
    SsaoBlurRadius,
    SsaoBlurSharpness,
    DofDepth,
    DofRange,
    DofRadius,
    BloomThreshold,
    BloomRadius,
}

impl FrameParam {
    #[must_use]
    pub const fn kind(self) -> UniformKind {
        match self {
            Self::Projection | Self::InverseProjection | Self::View => UniformKind::Mat4,
            _ => UniformKind::F32,
        }
    }
}

/// Extent of a target as a uniform.
#[inline]
#[must_use]
pub fn size_uniform(size: (u32, u32)) -> UniformData {
    UniformData::Vec2(Vec2::new(size.0 as f32, size.1 as f32))
}
