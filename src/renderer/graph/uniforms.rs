//! Uniform block packing.
//!
//! Pass uniforms are declared as an ordered list of named values and packed
//! into bytes following the WGSL uniform address-space layout, so the WGSL
//! struct only has to declare the same members in the same order:
//!
//! | Type          | Align | Size |
//! |---------------|-------|------|
//! | `f32`         | 4     | 4    |
//! | `vec2<f32>`   | 8     | 8    |
//! | `vec3<f32>`   | 16    | 12   |
//! | `vec4<f32>`   | 16    | 16   |
//! | `mat4x4<f32>` | 16    | 64   |
//!
//! The block is padded to a multiple of 16 bytes.

use glam::{Mat4, Vec2, Vec3, Vec4};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniformKind {
    F32,
    Vec2,
    Vec3,
    Vec4,
    Mat4,
}

impl UniformKind {
    #[must_use]
    pub const fn align(self) -> usize {
        match self {
            Self::F32 => 4,
            Self::Vec2 => 8,
            Self::Vec3 | Self::Vec4 | Self::Mat4 => 16,
        }
    }

    #[must_use]
    pub const fn size(self) -> usize {
        match self {
            Self::F32 => 4,
            Self::Vec2 => 8,
            Self::Vec3 => 12,
            Self::Vec4 => 16,
            Self::Mat4 => 64,
        }
    }
}

/// A concrete uniform value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformData {
    F32(f32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat4(Mat4),
}

impl UniformData {
    #[must_use]
    pub const fn kind(&self) -> UniformKind {
        match self {
            Self::F32(_) => UniformKind::F32,
            Self::Vec2(_) => UniformKind::Vec2,
            Self::Vec3(_) => UniformKind::Vec3,
            Self::Vec4(_) => UniformKind::Vec4,
            Self::Mat4(_) => UniformKind::Mat4,
        }
    }

    /// Boolean flag as the shaders read it (`> 0.5` is true).
    #[must_use]
    pub fn flag(value: bool) -> Self {
        Self::F32(if value { 1.0 } else { 0.0 })
    }
}

#[inline]
fn align_to(offset: usize, align: usize) -> usize {
    offset.div_ceil(align) * align
}

/// Byte size of a block holding `kinds` in order, padded to 16.
#[must_use]
pub fn block_size(kinds: impl IntoIterator<Item = UniformKind>) -> usize {
    let end = kinds
        .into_iter()
        .fold(0, |offset, kind| align_to(offset, kind.align()) + kind.size());
    align_to(end.max(16), 16)
}

/// Appends values with WGSL alignment.
#[derive(Debug, Default)]
pub struct UniformWriter {
    bytes: Vec<u8>,
}

impl UniformWriter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, value: UniformData) -> &mut Self {
        let offset = align_to(self.bytes.len(), value.kind().align());
        self.bytes.resize(offset, 0);
        match value {
            UniformData::F32(v) => self.bytes.extend_from_slice(bytemuck::bytes_of(&v)),
            UniformData::Vec2(v) => self.bytes.extend_from_slice(bytemuck::bytes_of(&v)),
            UniformData::Vec3(v) => self.bytes.extend_from_slice(bytemuck::bytes_of(&v)),
            UniformData::Vec4(v) => self.bytes.extend_from_slice(bytemuck::bytes_of(&v)),
            UniformData::Mat4(v) => self.bytes.extend_from_slice(bytemuck::bytes_of(&v)),
        }
        self
    }

    #[must_use]
    pub fn finish(mut self) -> Vec<u8> {
        let len = align_to(self.bytes.len().max(16), 16);
        self.bytes.resize(len, 0);
        self.bytes
    }
}
