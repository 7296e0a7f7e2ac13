//! GPU Device Abstraction
//!
//! The frame graph never talks to a graphics API directly. Everything it
//! needs from the GPU goes through the [`GpuDevice`] trait:
//!
//! - allocate, resize and upload images
//! - build a render program (vertex + fragment WGSL, attachment formats)
//! - allocate the full-screen quad buffers
//! - issue one draw into a set of attachments or the display target
//!
//! Two implementations ship with the crate:
//!
//! | Device | Use case |
//! |--------|----------|
//! | [`HeadlessDevice`] | Records every call; used by tests and tooling |
//! | [`WgpuDevice`]     | Wraps an existing `wgpu::Device` + `wgpu::Queue` |

pub mod headless;
pub mod wgpu_device;

pub use headless::{HeadlessDevice, HeadlessProgram, HeadlessTexture, RecordedDraw, RecordedTarget};
pub use wgpu_device::WgpuDevice;

use serde::{Deserialize, Serialize};

use crate::errors::Result;

// ============================================================================
// Formats & Sampling
// ============================================================================

/// Pixel storage format of a GPU image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    Rgba8,
    Rgba8Srgb,
    Bgra8,
    Bgra8Srgb,
    Rgba16Float,
    Rgba32Float,
    Depth32,
}

impl PixelFormat {
    #[must_use]
    pub const fn bytes_per_pixel(self) -> u32 {
        match self {
            Self::Rgba8 | Self::Rgba8Srgb | Self::Bgra8 | Self::Bgra8Srgb | Self::Depth32 => 4,
            Self::Rgba16Float => 8,
            Self::Rgba32Float => 16,
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_depth(self) -> bool {
        matches!(self, Self::Depth32)
    }

    /// Whether the hardware applies the sRGB transfer function on store.
    #[inline]
    #[must_use]
    pub const fn is_srgb(self) -> bool {
        matches!(self, Self::Rgba8Srgb | Self::Bgra8Srgb)
    }

    /// How a shader must declare and sample this format.
    #[must_use]
    pub const fn sample_kind(self) -> SampleKind {
        match self {
            Self::Depth32 => SampleKind::Depth,
            Self::Rgba32Float => SampleKind::Unfilterable,
            _ => SampleKind::Filterable,
        }
    }
}

/// Shader-side binding kind of a sampled texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleKind {
    Filterable,
    Unfilterable,
    Depth,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FilterMode {
    #[default]
    Nearest,
    Linear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WrapMode {
    #[default]
    ClampToEdge,
    Repeat,
}

/// Description of a GPU image allocation.
#[derive(Debug, Clone, Copy)]
pub struct TextureDesc<'a> {
    pub label: &'a str,
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub filter: FilterMode,
    pub wrap: WrapMode,
}

// ============================================================================
// Handles
// ============================================================================

/// Device-side image id. Stays valid across [`GpuDevice::reallocate_texture`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GpuTextureId(pub(crate) u32);

impl GpuTextureId {
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramId(pub(crate) u32);

impl ProgramId {
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshId(pub(crate) u32);

// ============================================================================
// Programs & Draws
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceLimits {
    pub max_color_attachments: u32,
    pub max_texture_dimension_2d: u32,
}

impl Default for DeviceLimits {
    fn default() -> Self {
        Self {
            max_color_attachments: 8,
            max_texture_dimension_2d: 8192,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthState {
    pub format: PixelFormat,
    pub test: bool,
    pub write: bool,
}

/// Render program description.
///
/// Binding layout convention shared by every shader in the crate:
/// `@binding(0)` is the uniform block, input `i` occupies
/// `@binding(1 + 2i)` (texture) and `@binding(2 + 2i)` (sampler).
#[derive(Debug, Clone, Copy)]
pub struct ProgramDesc<'a> {
    pub label: &'a str,
    /// WGSL module exposing `vs_main` and `fs_main`.
    pub source: &'a str,
    pub color_formats: &'a [PixelFormat],
    pub depth: Option<DepthState>,
    pub inputs: &'a [SampleKind],
    pub uniform_size: u64,
}

/// What to do with attachment contents when a draw begins.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ClearPolicy {
    pub color: Option<[f32; 4]>,
    pub depth: Option<f32>,
}

impl ClearPolicy {
    /// Keep existing contents.
    pub const LOAD: Self = Self {
        color: None,
        depth: None,
    };

    #[must_use]
    pub const fn color(rgba: [f32; 4]) -> Self {
        Self {
            color: Some(rgba),
            depth: None,
        }
    }

    #[must_use]
    pub const fn color_and_depth(rgba: [f32; 4], depth: f32) -> Self {
        Self {
            color: Some(rgba),
            depth: Some(depth),
        }
    }
}

/// Pixel rectangle; also the camera's viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Viewport {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    #[must_use]
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Viewport anchored at the origin.
    #[must_use]
    pub const fn sized(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    #[inline]
    #[must_use]
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }
}

#[derive(Debug, Clone, Copy)]
pub enum DrawTarget<'a> {
    Textures {
        color: &'a [GpuTextureId],
        depth: Option<GpuTextureId>,
    },
    /// The surface the device currently presents to.
    Display,
}

/// One full draw: program, attachments, inputs and uniform bytes.
#[derive(Debug, Clone, Copy)]
pub struct DrawCall<'a> {
    pub label: &'a str,
    pub program: ProgramId,
    pub mesh: MeshId,
    pub target: DrawTarget<'a>,
    pub clear: ClearPolicy,
    pub textures: &'a [GpuTextureId],
    pub uniforms: &'a [u8],
    pub viewport: Viewport,
}

/// Full-screen quad in clip space.
pub const QUAD_VERTICES: [[f32; 2]; 4] = [[-1.0, -1.0], [1.0, -1.0], [1.0, 1.0], [-1.0, 1.0]];
pub const QUAD_INDICES: [u16; 6] = [0, 1, 2, 0, 2, 3];

// ============================================================================
// GpuDevice
// ============================================================================

/// The graphics-device surface consumed by the frame graph.
pub trait GpuDevice {
    fn limits(&self) -> DeviceLimits;

    /// Format of the display target the compositor renders into.
    fn display_format(&self) -> PixelFormat;

    fn create_texture(&mut self, desc: &TextureDesc<'_>) -> Result<GpuTextureId>;

    /// Recreates the storage of `id` at a new size. Contents are undefined
    /// afterwards; the id stays valid.
    fn reallocate_texture(&mut self, id: GpuTextureId, width: u32, height: u32) -> Result<()>;

    /// Replaces the whole image. Reallocates first when the extent differs.
    fn write_texture(
        &mut self,
        id: GpuTextureId,
        width: u32,
        height: u32,
        data: &[u8],
    ) -> Result<()>;

    fn create_program(&mut self, desc: &ProgramDesc<'_>) -> Result<ProgramId>;

    /// Allocates vertex/index buffers for [`QUAD_VERTICES`] / [`QUAD_INDICES`].
    fn create_quad_mesh(&mut self) -> Result<MeshId>;

    fn draw(&mut self, call: &DrawCall<'_>) -> Result<()>;

    /// Submits everything recorded since the previous call.
    fn end_frame(&mut self) -> Result<()>;
}

/// Byte count of a tightly packed image.
#[must_use]
pub(crate) fn image_byte_len(width: u32, height: u32, format: PixelFormat) -> usize {
    width as usize * height as usize * format.bytes_per_pixel() as usize
}
