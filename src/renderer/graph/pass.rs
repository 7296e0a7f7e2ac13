//! Pass descriptors.
//!
//! A [`PassDesc`] is a full-screen draw described entirely by data: which
//! shader template it runs, which targets it renders into, what it
//! samples and which uniform values it uploads. Descriptors are built once
//! when the frame graph is created and never mutated afterwards.

use smallvec::SmallVec;

use super::frame::FrameParam;
use super::stage::Stage;
use super::uniforms::{UniformData, UniformKind};
use crate::device::{ClearPolicy, Viewport};
use crate::renderer::pool::TargetHandle;

/// A named sampled target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureInput {
    pub name: &'static str,
    pub target: TargetHandle,
}

/// Source of a uniform member.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Const(UniformData),
    Param(FrameParam),
    /// Current `(width, height)` of a target, as `vec2<f32>`.
    TargetSize(TargetHandle),
}

impl UniformValue {
    #[must_use]
    pub const fn kind(&self) -> UniformKind {
        match self {
            Self::Const(data) => data.kind(),
            Self::Param(param) => param.kind(),
            Self::TargetSize(_) => UniformKind::Vec2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UniformEntry {
    pub name: &'static str,
    pub value: UniformValue,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PassDesc {
    pub name: &'static str,
    pub stage: Stage,
    /// Shader template rendered for this pass.
    pub shader: &'static str,
    pub color: SmallVec<[TargetHandle; 2]>,
    pub depth: Option<TargetHandle>,
    pub clear: ClearPolicy,
    pub inputs: SmallVec<[TextureInput; 4]>,
    pub uniforms: Vec<UniformEntry>,
    /// Explicit viewport; the destination's full extent when `None`.
    pub viewport: Option<Viewport>,
}

impl PassDesc {
    #[must_use]
    pub fn new(name: &'static str, stage: Stage, shader: &'static str) -> Self {
        Self {
            name,
            stage,
            shader,
            color: SmallVec::new(),
            depth: None,
            clear: ClearPolicy::LOAD,
            inputs: SmallVec::new(),
            uniforms: Vec::new(),
            viewport: None,
        }
    }

    #[must_use]
    pub fn writes(mut self, target: TargetHandle) -> Self {
        self.color.push(target);
        self
    }

    #[must_use]
    pub fn depth(mut self, target: TargetHandle) -> Self {
        self.depth = Some(target);
        self
    }

    #[must_use]
    pub fn clear(mut self, clear: ClearPolicy) -> Self {
        self.clear = clear;
        self
    }

    /// Adds a sampled input. Inputs bind in declaration order.
    #[must_use]
    pub fn reads(mut self, name: &'static str, target: TargetHandle) -> Self {
        self.inputs.push(TextureInput { name, target });
        self
    }

    /// Adds a uniform member. Members pack in declaration order.
    #[must_use]
    pub fn uniform(mut self, name: &'static str, value: UniformValue) -> Self {
        self.uniforms.push(UniformEntry { name, value });
        self
    }

    #[must_use]
    pub fn constant(self, name: &'static str, data: UniformData) -> Self {
        self.uniform(name, UniformValue::Const(data))
    }

    #[must_use]
    pub fn param(self, name: &'static str, param: FrameParam) -> Self {
        self.uniform(name, UniformValue::Param(param))
    }

    #[must_use]
    pub fn target_size(self, name: &'static str, target: TargetHandle) -> Self {
        self.uniform(name, UniformValue::TargetSize(target))
    }

    #[must_use]
    pub fn viewport(mut self, viewport: Viewport) -> Self {
        self.viewport = Some(viewport);
        self
    }

    #[must_use]
    pub fn input(&self, name: &str) -> Option<TargetHandle> {
        self.inputs.iter().find(|i| i.name == name).map(|i| i.target)
    }

    #[must_use]
    pub fn uniform_value(&self, name: &str) -> Option<UniformValue> {
        self.uniforms.iter().find(|u| u.name == name).map(|u| u.value)
    }

    /// Whether the pass renders into `target`.
    #[must_use]
    pub fn attaches(&self, target: TargetHandle) -> bool {
        self.color.contains(&target) || self.depth == Some(target)
    }
}
