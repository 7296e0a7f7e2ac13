//! Render Target descriptions.
//!
//! A render target is a named GPU image whose extent either follows the
//! camera viewport (scaled) or is fixed. Targets holding HDR scene color
//! additionally carry the color encoding shaders must use to read and
//! write them.

use crate::device::{FilterMode, GpuTextureId, PixelFormat, Viewport, WrapMode};

/// How color values are stored in a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ColorEncoding {
    #[default]
    Linear,
    /// RGB * M packed into 8-bit channels (`M` in alpha, range 0..8).
    Rgbm,
}

/// Extent policy of a target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TargetSize {
    /// `floor(viewport * scale)`, at least one pixel.
    ViewportScaled(f32),
    Fixed { width: u32, height: u32 },
}

impl TargetSize {
    /// Pixel extent for `viewport`.
    ///
    /// Scaled extents are clamped to one pixel, so below a viewport of
    /// `1 / scale` pixels they exceed `floor(viewport * scale)`. No target
    /// may have a zero extent.
    #[must_use]
    pub fn resolve(&self, viewport: &Viewport) -> (u32, u32) {
        match *self {
            Self::ViewportScaled(scale) => (
                ((viewport.width as f32 * scale).floor() as u32).max(1),
                ((viewport.height as f32 * scale).floor() as u32).max(1),
            ),
            Self::Fixed { width, height } => (width, height),
        }
    }

    #[inline]
    #[must_use]
    pub fn follows_viewport(&self) -> bool {
        matches!(self, Self::ViewportScaled(_))
    }
}

/// Immutable description of a render target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderTargetDesc {
    pub name: &'static str,
    pub format: PixelFormat,
    pub encoding: ColorEncoding,
    pub filter: FilterMode,
    pub wrap: WrapMode,
    pub size: TargetSize,
}

impl RenderTargetDesc {
    /// Full-viewport, nearest-filtered, clamped, linear-encoded target.
    #[must_use]
    pub const fn new(name: &'static str, format: PixelFormat) -> Self {
        Self {
            name,
            format,
            encoding: ColorEncoding::Linear,
            filter: FilterMode::Nearest,
            wrap: WrapMode::ClampToEdge,
            size: TargetSize::ViewportScaled(1.0),
        }
    }

    #[must_use]
    pub const fn scaled(mut self, scale: f32) -> Self {
        self.size = TargetSize::ViewportScaled(scale);
        self
    }

    #[must_use]
    pub const fn fixed(mut self, width: u32, height: u32) -> Self {
        self.size = TargetSize::Fixed { width, height };
        self
    }

    #[must_use]
    pub const fn linear(mut self) -> Self {
        self.filter = FilterMode::Linear;
        self
    }

    #[must_use]
    pub const fn repeat(mut self) -> Self {
        self.wrap = WrapMode::Repeat;
        self
    }

    #[must_use]
    pub const fn encoding(mut self, encoding: ColorEncoding) -> Self {
        self.encoding = encoding;
        self
    }
}

/// A live target owned by the [`RenderTargetPool`](super::pool::RenderTargetPool).
#[derive(Debug, Clone)]
pub struct RenderTarget {
    pub(crate) desc: RenderTargetDesc,
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) gpu: GpuTextureId,
    pub(crate) generation: u32,
}

impl RenderTarget {
    #[inline]
    #[must_use]
    pub fn desc(&self) -> &RenderTargetDesc {
        &self.desc
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.desc.name
    }

    #[inline]
    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    #[inline]
    #[must_use]
    pub fn format(&self) -> PixelFormat {
        self.desc.format
    }

    #[inline]
    #[must_use]
    pub fn encoding(&self) -> ColorEncoding {
        self.desc.encoding
    }

    #[inline]
    #[must_use]
    pub fn gpu_texture(&self) -> GpuTextureId {
        self.gpu
    }

    /// Bumped every time the GPU storage is recreated.
    #[inline]
    #[must_use]
    pub fn generation(&self) -> u32 {
        self.generation
    }
}
